//! Events a room session delivers to its driver.

use indexmap::IndexSet;

use crate::catalog::CatalogError;
use crate::model::{Card, Member, RoomStatus};
use crate::store::StoreError;

/// Tagged notification delivered over the session's event channel.
///
/// One channel per session keeps driver-side handling on a single
/// serialization domain, matching the store's per-path delivery order.
#[derive(Debug)]
pub enum SessionEvent {
    /// A member entry appeared (including the replay at attach time).
    MemberAdded {
        /// Participant identifier.
        uid: String,
        /// Member entry as stored.
        member: Member,
    },
    /// An existing member entry changed (e.g. a host flag flip).
    MemberChanged {
        /// Participant identifier.
        uid: String,
        /// Updated member entry.
        member: Member,
    },
    /// A member entry was removed.
    MemberRemoved {
        /// Participant identifier.
        uid: String,
    },
    /// This session's own member entry now carries the host flag.
    HostGranted,
    /// The room status changed; delivered exactly once per transition.
    PhaseChanged {
        /// New session phase.
        status: RoomStatus,
    },
    /// A catalog page was ingested and appended to the deck.
    DeckAppended {
        /// Page that was fetched.
        page: u32,
        /// Cards actually appended (duplicates by id are dropped).
        added: Vec<Card>,
    },
    /// The pagination sentinel cleared the local deck.
    DeckReset,
    /// The live voter set of the focused card changed.
    VotersChanged {
        /// Card the voters belong to.
        card_id: String,
        /// Participants with a recorded Yes, in arrival order.
        voters: IndexSet<String>,
    },
    /// Every current member voted Yes on this card.
    MatchAnnounced {
        /// The decisive card.
        card_id: String,
    },
    /// A subscription-level transport fault. The subscription stays
    /// attached; re-subscribing is the driver's decision.
    StoreFault {
        /// Which subscription faulted.
        context: &'static str,
        /// The transport error, surfaced exactly once.
        error: StoreError,
    },
    /// Fetching a catalog page failed; the deck is left as it was.
    CatalogFault {
        /// Page the fetch targeted.
        page: u32,
        /// The catalog error.
        error: CatalogError,
    },
}
