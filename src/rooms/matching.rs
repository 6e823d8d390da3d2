//! Vote ledger and unanimous-match arbiter.
//!
//! A match occurs when every current member has voted Yes on the same card.
//! Members can leave mid-session, so the detector always works against a
//! fresh snapshot: a departing member's vote requirement naturally drops.
//!
//! "No" is represented by the absence of a vote entry, never by a write,
//! which keeps the ledger append-only and per-card voter enumeration
//! trivial.

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::CoreResult;
use crate::model::RoomStatus;
use crate::rooms::{
    FIELD_MATCHED_CARD_ID, FIELD_STATUS, NODE_MEMBERS, NODE_VOTES, room_path, vote_card_path,
};
use crate::store::StoreAdapter;

/// Whether all current members have voted Yes on a card.
pub fn is_match(vote_count: usize, member_count: usize) -> bool {
    member_count > 0 && vote_count >= member_count
}

/// Live member count from a full room snapshot (0 if the node is missing).
pub fn member_count(snapshot: &Value) -> usize {
    snapshot
        .get(NODE_MEMBERS)
        .and_then(Value::as_object)
        .map_or(0, |members| members.len())
}

/// Yes-vote count for a card from a full room snapshot (0 if missing).
pub fn vote_count(snapshot: &Value, card_id: &str) -> usize {
    snapshot
        .get(NODE_VOTES)
        .and_then(|votes| votes.get(card_id))
        .and_then(Value::as_object)
        .map_or(0, |voters| voters.len())
}

/// Outcome of a recorded Yes vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Set when this vote completed unanimity on the card.
    pub matched: Option<String>,
}

/// Record a Yes vote and arbitrate for a match against a fresh snapshot.
///
/// On unanimity, `matchedCardId` is written before `status`: observers act
/// on the `matched` status by reading `matchedCardId` first, and per-path
/// ordering makes the id visible by then. Two concurrent voters may both
/// observe unanimity and both write the pair; the writes are idempotent and
/// the redundancy is harmless.
pub async fn cast_yes(
    store: &dyn StoreAdapter,
    code: &str,
    uid: &str,
    card_id: &str,
) -> CoreResult<VoteOutcome> {
    store
        .write_field(&vote_card_path(code, card_id), uid, Value::Bool(true))
        .await?;
    debug!(%code, %uid, card_id, "vote recorded");

    let Some(snapshot) = store.read_once(&room_path(code)).await? else {
        // Room deleted between the write and the check; nothing to arbitrate.
        return Ok(VoteOutcome { matched: None });
    };
    let members = member_count(&snapshot);
    let votes = vote_count(&snapshot, card_id);
    debug!(%code, card_id, votes, members, "match check");

    if !is_match(votes, members) {
        return Ok(VoteOutcome { matched: None });
    }

    let room = room_path(code);
    store
        .write_field(&room, FIELD_MATCHED_CARD_ID, json!(card_id))
        .await?;
    store
        .write_field(&room, FIELD_STATUS, json!(RoomStatus::Matched))
        .await?;
    info!(%code, card_id, "match found");
    Ok(VoteOutcome {
        matched: Some(card_id.to_string()),
    })
}
