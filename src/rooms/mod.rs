//! Room coordination protocol: code minting, membership, phase machine,
//! deck pagination, and the vote ledger with its match arbiter.

/// Room-code minter.
pub mod codes;
/// Vote ledger and unanimous-match arbiter.
pub mod matching;
/// Room creation, admission, departure, and host transfer.
pub mod membership;
/// Shared-deck pagination protocol.
pub mod pagination;
/// Legal phase transitions.
pub mod phase;

use crate::store::StorePath;

/// Root node for all rooms.
pub const NODE_ROOMS: &str = "rooms";
/// Child node holding the member map.
pub const NODE_MEMBERS: &str = "members";
/// Child node holding the per-card vote sets.
pub const NODE_VOTES: &str = "votes";
/// Field naming the current host.
pub const FIELD_HOST_ID: &str = "hostId";
/// Field holding the session phase.
pub const FIELD_STATUS: &str = "status";
/// Field holding the shared catalog page (0 = unset).
pub const FIELD_CURRENT_PAGE: &str = "currentPage";
/// Field naming the decisive card once matched.
pub const FIELD_MATCHED_CARD_ID: &str = "matchedCardId";
/// Member field flagging the host.
pub const FIELD_HOST: &str = "host";

/// `rooms/{code}`
pub fn room_path(code: &str) -> StorePath {
    StorePath::new([NODE_ROOMS, code])
}

/// `rooms/{code}/members`
pub fn members_path(code: &str) -> StorePath {
    room_path(code).child(NODE_MEMBERS)
}

/// `rooms/{code}/members/{uid}`
pub fn member_path(code: &str, uid: &str) -> StorePath {
    members_path(code).child(uid)
}

/// `rooms/{code}/votes/{cardId}`
pub fn vote_card_path(code: &str, card_id: &str) -> StorePath {
    room_path(code).child(NODE_VOTES).child(card_id)
}

/// `rooms/{code}/status`
pub fn status_path(code: &str) -> StorePath {
    room_path(code).child(FIELD_STATUS)
}

/// `rooms/{code}/currentPage`
pub fn current_page_path(code: &str) -> StorePath {
    room_path(code).child(FIELD_CURRENT_PAGE)
}

/// `rooms/{code}/matchedCardId`
pub fn matched_card_path(code: &str) -> StorePath {
    room_path(code).child(FIELD_MATCHED_CARD_ID)
}
