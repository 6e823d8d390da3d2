//! Data model shared across the coordination core: the room schema stored
//! under `rooms/{code}` and the catalog collaborator shapes.

/// Catalog card shapes.
pub mod card;
/// Room, member, and status schema.
pub mod room;

pub use card::{Card, CardDetail};
pub use room::{Member, Room, RoomStatus};

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
