//! Room schema as it lives in the store. Key names are authoritative and
//! must match the wire schema exactly; serde renames carry that contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::CoreError;

/// Session phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Members may still join; the deck has not been dealt.
    Waiting,
    /// All members flip through the shared deck and vote.
    Swiping,
    /// Every current member voted Yes on the same card.
    Matched,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Swiping => "swiping",
            RoomStatus::Matched => "matched",
        };
        write!(f, "{name}")
    }
}

/// One participant's entry under `members/{participantId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Non-empty display name.
    pub display_name: String,
    /// Opaque optional tag used only for display.
    #[serde(default)]
    pub attribute: String,
    /// Wall-clock milliseconds at join time.
    pub joined_at: i64,
    /// Exactly one member per live room carries `true`.
    #[serde(default)]
    pub host: bool,
}

impl From<&Member> for Value {
    fn from(member: &Member) -> Self {
        json!({
            "displayName": member.display_name,
            "attribute": member.attribute,
            "joinedAt": member.joined_at,
            "host": member.host,
        })
    }
}

/// Full snapshot of a room subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Identifier of the current host; reassigned on host transfer.
    pub host_id: String,
    /// Identifier of the original creator; never changes.
    pub created_by: String,
    /// Wall-clock milliseconds at creation.
    pub created_at: i64,
    /// Current session phase.
    pub status: RoomStatus,
    /// Shared catalog page; 0 means unset.
    #[serde(default)]
    pub current_page: i64,
    /// Decisive card identifier; present iff `status` is `matched`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_card_id: Option<String>,
    /// Participant identifier → member entry, in lexicographic key order.
    #[serde(default)]
    pub members: BTreeMap<String, Member>,
    /// Card identifier → set of Yes voters (presence = Yes).
    #[serde(default)]
    pub votes: BTreeMap<String, BTreeMap<String, bool>>,
}

impl Room {
    /// Parse a raw store snapshot, mapping malformed data to a typed error.
    pub fn from_snapshot(code: &str, snapshot: Value) -> Result<Self, CoreError> {
        serde_json::from_value(snapshot).map_err(|err| CoreError::Corrupt {
            code: code.to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_wire_keys_are_exact() {
        let member = Member {
            display_name: "Ana".into(),
            attribute: "she/her".into(),
            joined_at: 1_700_000_000_000,
            host: true,
        };
        let value = Value::from(&member);
        assert_eq!(value["displayName"], json!("Ana"));
        assert_eq!(value["attribute"], json!("she/her"));
        assert_eq!(value["joinedAt"], json!(1_700_000_000_000_i64));
        assert_eq!(value["host"], json!(true));

        let parsed: Member = serde_json::from_value(value).expect("parse");
        assert_eq!(parsed, member);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RoomStatus::Waiting).expect("value"), json!("waiting"));
        assert_eq!(serde_json::to_value(RoomStatus::Swiping).expect("value"), json!("swiping"));
        assert_eq!(serde_json::to_value(RoomStatus::Matched).expect("value"), json!("matched"));
    }

    #[test]
    fn room_snapshot_parses_with_optional_fields_missing() {
        let snapshot = json!({
            "hostId": "u1",
            "createdBy": "u1",
            "createdAt": 123,
            "status": "waiting",
        });
        let room = Room::from_snapshot("AB12CD", snapshot).expect("parse");
        assert_eq!(room.current_page, 0);
        assert_eq!(room.matched_card_id, None);
        assert!(room.members.is_empty());
        assert!(room.votes.is_empty());
    }

    #[test]
    fn malformed_snapshot_is_reported_as_corrupt() {
        let err = Room::from_snapshot("AB12CD", json!({"status": "waiting"}))
            .expect_err("missing required fields");
        assert!(matches!(err, CoreError::Corrupt { .. }));
    }
}
