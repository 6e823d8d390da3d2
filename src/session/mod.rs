//! Client session facade.
//!
//! One [`RoomSession`] per participant per room. The facade owns the
//! subscriptions a client holds against the store, folds their events into
//! local state (member roster, deck, voter set), and forwards everything to
//! the driver over a single event channel. All state flows through the
//! store: the facade never short-circuits a local write into a local event,
//! so every participant (host included) converges through the same
//! subscription callbacks.

pub mod events;

pub use events::SessionEvent;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use indexmap::{IndexMap, IndexSet};
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogResult};
use crate::config::AppConfig;
use crate::error::{CoreError, CoreResult};
use crate::model::{Card, CardDetail, Member, RoomStatus};
use crate::rooms::{
    FIELD_CURRENT_PAGE, FIELD_STATUS, codes, current_page_path, matched_card_path, matching,
    matching::VoteOutcome, members_path, membership, pagination,
    pagination::{PageAction, PageTracker},
    phase,
    phase::PhaseEvent,
    room_path, status_path, vote_card_path,
};
use crate::store::{ChildEvent, StoreAdapter, SubscriptionHandle, ValueEvent};

/// Identity handed to the facade by the authentication collaborator.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Stable participant identifier.
    pub uid: String,
    /// Non-empty display name.
    pub display_name: String,
    /// Opaque optional tag used only for display.
    pub attribute: String,
}

/// Subscription handles a session holds, grouped by lifetime.
///
/// `lobby` lives for the whole session; `page` and `votes` belong to the
/// swiping phase and can be released early while the lobby stays attached.
#[derive(Default)]
struct HandleGroups {
    lobby: Vec<SubscriptionHandle>,
    page: Option<SubscriptionHandle>,
    votes: Option<SubscriptionHandle>,
}

struct SessionShared {
    store: Arc<dyn StoreAdapter>,
    catalog: Arc<dyn Catalog>,
    config: AppConfig,
    participant: Participant,
    code: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    members: RwLock<IndexMap<String, Member>>,
    deck: RwLock<IndexMap<String, Card>>,
    voters: RwLock<IndexSet<String>>,
    focused: StdMutex<Option<String>>,
    status: RwLock<Option<RoomStatus>>,
    is_host: AtomicBool,
    page: Mutex<PageTracker>,
    groups: StdMutex<HandleGroups>,
}

impl SessionShared {
    /// Event delivery never fails the pipeline; a dropped receiver only
    /// means the driver went away.
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Attach the shared `currentPage` subscription if it is not already
    /// live, starting pagination from a clean slate.
    async fn attach_page(self: &Arc<Self>) {
        if lock(&self.groups).page.is_some() {
            return;
        }
        *self.page.lock().await = PageTracker::new();
        let had_cards = {
            let mut deck = self.deck.write().await;
            let had = !deck.is_empty();
            deck.clear();
            had
        };
        if had_cards {
            self.emit(SessionEvent::DeckReset);
        }

        let sub = self.store.subscribe_value(&current_page_path(&self.code));
        {
            let mut groups = lock(&self.groups);
            if groups.page.is_some() {
                // Lost a re-attach race; dropping `sub` detaches it.
                return;
            }
            groups.page = Some(sub.handle);
        }
        tokio::spawn(run_page(self.clone(), sub.events));
    }
}

/// Poison-tolerant lock: subscription bookkeeping stays usable even if a
/// panicking task held the mutex.
fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A participant's live attachment to one room.
///
/// Constructed via [`RoomSession::create`] or [`RoomSession::join`], both of
/// which also hand back the event channel the facade feeds.
pub struct RoomSession {
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("code", &self.shared.code)
            .finish_non_exhaustive()
    }
}

impl RoomSession {
    /// Mint a fresh room, enter it as host, and attach.
    pub async fn create(
        store: Arc<dyn StoreAdapter>,
        catalog: Arc<dyn Catalog>,
        config: AppConfig,
        participant: Participant,
    ) -> CoreResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let code = codes::mint(store.as_ref(), config.code_attempts).await?;
        membership::create_room(
            store.as_ref(),
            &code,
            &participant.uid,
            &participant.display_name,
            &participant.attribute,
        )
        .await?;
        Self::attach(store, catalog, config, participant, code, true).await
    }

    /// Join an existing waiting room by code and attach.
    pub async fn join(
        store: Arc<dyn StoreAdapter>,
        catalog: Arc<dyn Catalog>,
        config: AppConfig,
        participant: Participant,
        code: &str,
    ) -> CoreResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        membership::join_room(
            store.as_ref(),
            code,
            &participant.uid,
            &participant.display_name,
            &participant.attribute,
            config.room_capacity,
        )
        .await?;
        Self::attach(store, catalog, config, participant, code.to_string(), false).await
    }

    async fn attach(
        store: Arc<dyn StoreAdapter>,
        catalog: Arc<dyn Catalog>,
        config: AppConfig,
        participant: Participant,
        code: String,
        is_host: bool,
    ) -> CoreResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let (events, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(SessionShared {
            store,
            catalog,
            config,
            participant,
            code,
            events,
            members: RwLock::new(IndexMap::new()),
            deck: RwLock::new(IndexMap::new()),
            voters: RwLock::new(IndexSet::new()),
            focused: StdMutex::new(None),
            status: RwLock::new(None),
            is_host: AtomicBool::new(is_host),
            page: Mutex::new(PageTracker::new()),
            groups: StdMutex::new(HandleGroups::default()),
        });

        let members = shared
            .store
            .subscribe_children(&members_path(&shared.code));
        let status = shared.store.subscribe_value(&status_path(&shared.code));
        {
            let mut groups = lock(&shared.groups);
            groups.lobby.push(members.handle);
            groups.lobby.push(status.handle);
        }
        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(run_members(shared.clone(), members.events));
        tokio::spawn(run_status(shared.clone(), status.events, ready_tx));

        // The subscription's replay is the authoritative initial status. A
        // separate one-shot read could race a concurrent phase write and
        // make the replay look stale, so the replay drives everything; wait
        // for it to be folded in so phase checks are answerable on return.
        let _ = ready_rx.await;

        debug!(code = %shared.code, uid = %shared.participant.uid, "session attached");
        Ok((Self { shared }, receiver))
    }

    /// Code of the room this session is attached to.
    pub fn code(&self) -> &str {
        &self.shared.code
    }

    /// Identity this session acts as.
    pub fn participant(&self) -> &Participant {
        &self.shared.participant
    }

    /// Whether this session currently believes it is the host.
    pub fn is_host(&self) -> bool {
        self.shared.is_host.load(Ordering::SeqCst)
    }

    /// Locally observed session phase.
    pub async fn status(&self) -> Option<RoomStatus> {
        *self.shared.status.read().await
    }

    /// Current roster, keyed by participant identifier in arrival order.
    pub async fn members(&self) -> IndexMap<String, Member> {
        self.shared.members.read().await.clone()
    }

    /// Materialized deck in append order.
    pub async fn deck(&self) -> Vec<Card> {
        self.shared.deck.read().await.values().cloned().collect()
    }

    /// Voter set of the focused card.
    pub async fn voters(&self) -> IndexSet<String> {
        self.shared.voters.read().await.clone()
    }

    /// Start the session: `waiting` becomes `swiping` and the shared deck's
    /// first page is dealt. Host-only.
    pub async fn start_swiping(&self) -> CoreResult<()> {
        self.ensure_host("start swiping")?;
        let next = self.checked_transition(PhaseEvent::Start, "start swiping").await?;
        let shared = &self.shared;
        let room = room_path(&shared.code);
        shared.store.write_field(&room, FIELD_STATUS, json!(next)).await?;
        let page = pagination::initial_page(&shared.code, shared.config.page_window);
        shared
            .store
            .write_field(&room, FIELD_CURRENT_PAGE, json!(page))
            .await?;
        info!(code = %shared.code, page, "swiping started");
        Ok(())
    }

    /// Advance the shared deck by one catalog page. Host-only, swiping-only.
    ///
    /// The next page is derived from the stored `currentPage`, not from the
    /// local tracker, so host-serialized calls stay monotone even when the
    /// host's own fetch is still in flight.
    pub async fn load_more_page(&self) -> CoreResult<u32> {
        self.ensure_host("load more")?;
        let status = *self.shared.status.read().await;
        if status != Some(RoomStatus::Swiping) {
            return Err(CoreError::IllegalTransition {
                action: "load more",
                from: status,
            });
        }
        let shared = &self.shared;
        let current = shared
            .store
            .read_once(&current_page_path(&shared.code))
            .await?
            .and_then(|value| value.as_i64())
            .unwrap_or(0);
        let next = (current.max(0) + 1) as u32;
        shared
            .store
            .write_field(&room_path(&shared.code), FIELD_CURRENT_PAGE, json!(next))
            .await?;
        info!(code = %shared.code, page = next, "shared deck advanced");
        Ok(next)
    }

    /// Restart a matched session into a fresh swiping round. Host-only.
    ///
    /// Write order matters: the `0` sentinel clears every client's deck
    /// before the status flip, and the fresh initial page lands last.
    pub async fn restart_from_match(&self) -> CoreResult<()> {
        self.ensure_host("restart from match")?;
        let next = self
            .checked_transition(PhaseEvent::Restart, "restart from match")
            .await?;
        let shared = &self.shared;
        let room = room_path(&shared.code);
        shared
            .store
            .write_field(&room, FIELD_CURRENT_PAGE, json!(0))
            .await?;
        shared.store.delete(&matched_card_path(&shared.code)).await?;
        shared.store.write_field(&room, FIELD_STATUS, json!(next)).await?;
        let page = pagination::initial_page(&shared.code, shared.config.page_window);
        shared
            .store
            .write_field(&room, FIELD_CURRENT_PAGE, json!(page))
            .await?;
        info!(code = %shared.code, page, "session restarted");
        Ok(())
    }

    /// Record a Yes vote on a card and arbitrate for a match.
    pub async fn cast_yes(&self, card_id: &str) -> CoreResult<VoteOutcome> {
        matching::cast_yes(
            self.shared.store.as_ref(),
            &self.shared.code,
            &self.shared.participant.uid,
            card_id,
        )
        .await
    }

    /// Follow the live voter set of one card, releasing the previous card's
    /// subscription. At most one vote subscription is live per session.
    pub async fn focus_card(&self, card_id: &str) {
        let shared = &self.shared;
        lock(&shared.groups).votes = None;
        *lock(&shared.focused) = Some(card_id.to_string());
        shared.voters.write().await.clear();

        let sub = shared
            .store
            .subscribe_children(&vote_card_path(&shared.code, card_id));
        lock(&shared.groups).votes = Some(sub.handle);
        tokio::spawn(run_votes(shared.clone(), card_id.to_string(), sub.events));
    }

    /// Resolved detail view of a card, in the session's locale.
    pub async fn card_detail(&self, card_id: &str) -> CatalogResult<CardDetail> {
        self.shared
            .catalog
            .fetch_detail(card_id, &self.shared.config.locale)
            .await
    }

    /// Whether `uid` is currently a member, read once from the store.
    pub async fn member_of(&self, uid: &str) -> CoreResult<Option<Member>> {
        membership::get_member(self.shared.store.as_ref(), &self.shared.code, uid).await
    }

    /// Leave the room, releasing every subscription first so the session
    /// never observes its own departure.
    pub async fn leave_room(self) -> CoreResult<()> {
        self.detach_all();
        membership::leave_room(
            self.shared.store.as_ref(),
            &self.shared.code,
            &self.shared.participant.uid,
        )
        .await
    }

    /// Release every subscription this session holds.
    pub fn detach_all(&self) {
        let mut groups = lock(&self.shared.groups);
        groups.lobby.clear();
        groups.page = None;
        groups.votes = None;
    }

    /// Release only the swiping-phase subscriptions (`currentPage` and the
    /// focused card's voters). The roster and status stay attached: a
    /// matched view still needs to see the host restart.
    pub fn detach_swiping_only(&self) {
        let mut groups = lock(&self.shared.groups);
        groups.page = None;
        groups.votes = None;
    }

    fn ensure_host(&self, action: &'static str) -> CoreResult<()> {
        if self.is_host() {
            Ok(())
        } else {
            Err(CoreError::NotHost { action })
        }
    }

    async fn checked_transition(
        &self,
        event: PhaseEvent,
        action: &'static str,
    ) -> CoreResult<RoomStatus> {
        let current = *self.shared.status.read().await;
        let Some(from) = current else {
            return Err(CoreError::IllegalTransition { action, from: None });
        };
        phase::compute_transition(from, event)
            .map_err(|_| CoreError::IllegalTransition { action, from: Some(from) })
    }
}

async fn run_members(
    shared: Arc<SessionShared>,
    mut events: mpsc::UnboundedReceiver<ChildEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChildEvent::Added { key, value } => apply_member(&shared, key, value, true).await,
            ChildEvent::Changed { key, value } => apply_member(&shared, key, value, false).await,
            ChildEvent::Removed { key } => {
                shared.members.write().await.shift_remove(&key);
                shared.emit(SessionEvent::MemberRemoved { uid: key });
            }
            ChildEvent::Fault(error) => shared.emit(SessionEvent::StoreFault {
                context: "members",
                error,
            }),
        }
    }
}

async fn apply_member(shared: &Arc<SessionShared>, uid: String, value: Value, added: bool) {
    let member: Member = match serde_json::from_value(value) {
        Ok(member) => member,
        Err(err) => {
            warn!(%uid, error = %err, "ignoring malformed member entry");
            return;
        }
    };
    if uid == shared.participant.uid
        && member.host
        && !shared.is_host.swap(true, Ordering::SeqCst)
    {
        info!(code = %shared.code, %uid, "host role granted");
        shared.emit(SessionEvent::HostGranted);
    }
    shared.members.write().await.insert(uid.clone(), member.clone());
    let event = if added {
        SessionEvent::MemberAdded { uid, member }
    } else {
        SessionEvent::MemberChanged { uid, member }
    };
    shared.emit(event);
}

async fn run_status(
    shared: Arc<SessionShared>,
    mut events: mpsc::UnboundedReceiver<ValueEvent>,
    ready: oneshot::Sender<()>,
) {
    let mut ready = Some(ready);
    while let Some(event) = events.recv().await {
        match event {
            ValueEvent::Changed(Some(value)) => {
                let status: RoomStatus = match serde_json::from_value(value) {
                    Ok(status) => status,
                    Err(err) => {
                        warn!(code = %shared.code, error = %err, "unknown status value");
                        continue;
                    }
                };
                let fresh = {
                    let mut current = shared.status.write().await;
                    if *current == Some(status) {
                        false
                    } else {
                        *current = Some(status);
                        true
                    }
                };
                if !fresh {
                    continue;
                }
                shared.emit(SessionEvent::PhaseChanged { status });
                match status {
                    RoomStatus::Waiting => {}
                    RoomStatus::Swiping => shared.attach_page().await,
                    RoomStatus::Matched => announce_match(&shared).await,
                }
            }
            // Room deleted; the roster subscription carries the news.
            ValueEvent::Changed(None) => {}
            ValueEvent::Fault(error) => shared.emit(SessionEvent::StoreFault {
                context: "status",
                error,
            }),
        }
        // First event handled in full, side effects included; the session
        // is now safe to hand to the driver.
        if let Some(tx) = ready.take() {
            let _ = tx.send(());
        }
    }
}

/// Read `matchedCardId` after a `matched` status flip. The arbiter writes
/// the id before the status, so this read-after always finds it.
async fn announce_match(shared: &Arc<SessionShared>) {
    match shared.store.read_once(&matched_card_path(&shared.code)).await {
        Ok(Some(value)) => match value.as_str() {
            Some(card_id) => shared.emit(SessionEvent::MatchAnnounced {
                card_id: card_id.to_string(),
            }),
            None => warn!(code = %shared.code, "matchedCardId is not a string"),
        },
        Ok(None) => warn!(code = %shared.code, "matched status without matchedCardId"),
        Err(error) => shared.emit(SessionEvent::StoreFault {
            context: "matchedCardId",
            error,
        }),
    }
}

async fn run_page(shared: Arc<SessionShared>, mut events: mpsc::UnboundedReceiver<ValueEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ValueEvent::Changed(Some(value)) => {
                let Some(page) = value.as_i64() else {
                    warn!(code = %shared.code, "currentPage is not an integer");
                    continue;
                };
                let action = shared.page.lock().await.observe(page);
                match action {
                    PageAction::Ignore => {}
                    PageAction::Reset => {
                        shared.deck.write().await.clear();
                        shared.emit(SessionEvent::DeckReset);
                    }
                    PageAction::Fetch(page) => ingest_page(&shared, page).await,
                }
            }
            ValueEvent::Changed(None) => {}
            ValueEvent::Fault(error) => shared.emit(SessionEvent::StoreFault {
                context: "currentPage",
                error,
            }),
        }
    }
}

/// Fetch one catalog page and append its cards to the deck, deduplicating
/// by card id so page drift across fetches cannot duplicate entries.
async fn ingest_page(shared: &Arc<SessionShared>, page: u32) {
    match shared.catalog.fetch_page(page, &shared.config.locale).await {
        Ok(cards) => {
            let added: Vec<Card> = {
                let mut deck = shared.deck.write().await;
                let mut added = Vec::new();
                for card in cards {
                    if !deck.contains_key(&card.id) {
                        deck.insert(card.id.clone(), card.clone());
                        added.push(card);
                    }
                }
                added
            };
            debug!(code = %shared.code, page, added = added.len(), "deck page ingested");
            shared.emit(SessionEvent::DeckAppended { page, added });
        }
        Err(error) => shared.emit(SessionEvent::CatalogFault { page, error }),
    }
}

async fn run_votes(
    shared: Arc<SessionShared>,
    card_id: String,
    mut events: mpsc::UnboundedReceiver<ChildEvent>,
) {
    while let Some(event) = events.recv().await {
        // A stale loop for a previously focused card must not touch state.
        if lock(&shared.focused).as_deref() != Some(card_id.as_str()) {
            break;
        }
        match event {
            ChildEvent::Added { key, .. } => {
                let voters = {
                    let mut voters = shared.voters.write().await;
                    voters.insert(key);
                    voters.clone()
                };
                shared.emit(SessionEvent::VotersChanged {
                    card_id: card_id.clone(),
                    voters,
                });
            }
            ChildEvent::Removed { key } => {
                let voters = {
                    let mut voters = shared.voters.write().await;
                    voters.shift_remove(&key);
                    voters.clone()
                };
                shared.emit(SessionEvent::VotersChanged {
                    card_id: card_id.clone(),
                    voters,
                });
            }
            // A vote entry only ever holds `true`; changes carry no news.
            ChildEvent::Changed { .. } => {}
            ChildEvent::Fault(error) => shared.emit(SessionEvent::StoreFault {
                context: "votes",
                error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::catalog::ScriptedCatalog;
    use crate::store::memory::MemoryStore;

    fn participant(uid: &str, name: &str) -> Participant {
        Participant {
            uid: uid.to_string(),
            display_name: name.to_string(),
            attribute: String::new(),
        }
    }

    fn harness() -> (Arc<dyn StoreAdapter>, Arc<dyn Catalog>, AppConfig) {
        (
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedCatalog::generated(120, 5)),
            AppConfig::default(),
        )
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event within deadline")
            .expect("channel open")
    }

    async fn wait_for(
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
        mut pred: impl FnMut(&SessionEvent) -> bool,
    ) -> SessionEvent {
        loop {
            let event = next_event(rx).await;
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn create_attaches_as_host_in_a_waiting_room() {
        let (store, catalog, config) = harness();
        let (session, mut rx) =
            RoomSession::create(store, catalog, config, participant("u1", "Ana"))
                .await
                .expect("create");

        assert!(session.is_host());
        assert_eq!(session.status().await, Some(RoomStatus::Waiting));

        let event = wait_for(&mut rx, |e| matches!(e, SessionEvent::MemberAdded { .. })).await;
        let SessionEvent::MemberAdded { uid, member } = event else {
            unreachable!()
        };
        assert_eq!(uid, "u1");
        assert!(member.host);
        assert_eq!(session.members().await.len(), 1);
    }

    #[tokio::test]
    async fn joiner_sees_the_existing_roster_and_is_not_host() {
        let (store, catalog, config) = harness();
        let (host, _host_rx) = RoomSession::create(
            store.clone(),
            catalog.clone(),
            config.clone(),
            participant("u1", "Ana"),
        )
        .await
        .expect("create");

        let (joiner, mut rx) = RoomSession::join(
            store,
            catalog,
            config,
            participant("u2", "Bo"),
            host.code(),
        )
        .await
        .expect("join");

        assert!(!joiner.is_host());
        wait_for(&mut rx, |e| {
            matches!(e, SessionEvent::MemberAdded { uid, .. } if uid == "u1")
        })
        .await;
        wait_for(&mut rx, |e| {
            matches!(e, SessionEvent::MemberAdded { uid, .. } if uid == "u2")
        })
        .await;
    }

    #[tokio::test]
    async fn non_host_start_is_refused_without_a_write() {
        let (store, catalog, config) = harness();
        let (host, _host_rx) = RoomSession::create(
            store.clone(),
            catalog.clone(),
            config.clone(),
            participant("u1", "Ana"),
        )
        .await
        .expect("create");
        let (joiner, _rx) = RoomSession::join(
            store.clone(),
            catalog,
            config,
            participant("u2", "Bo"),
            host.code(),
        )
        .await
        .expect("join");

        let err = joiner.start_swiping().await.expect_err("not host");
        assert!(matches!(err, CoreError::NotHost { .. }));
        let status = store
            .read_once(&status_path(host.code()))
            .await
            .expect("read");
        assert_eq!(status, Some(json!("waiting")));
    }

    #[tokio::test]
    async fn start_is_refused_outside_the_waiting_phase() {
        let (store, catalog, config) = harness();
        let (host, mut rx) = RoomSession::create(store, catalog, config, participant("u1", "Ana"))
            .await
            .expect("create");

        host.start_swiping().await.expect("start");
        wait_for(&mut rx, |e| {
            matches!(
                e,
                SessionEvent::PhaseChanged {
                    status: RoomStatus::Swiping
                }
            )
        })
        .await;

        let err = host.start_swiping().await.expect_err("already swiping");
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                from: Some(RoomStatus::Swiping),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn focused_card_replays_existing_voters() {
        let (store, catalog, config) = harness();
        let (host, mut host_rx) = RoomSession::create(
            store.clone(),
            catalog.clone(),
            config.clone(),
            participant("u1", "Ana"),
        )
        .await
        .expect("create");
        let (joiner, _rx) = RoomSession::join(
            store,
            catalog,
            config,
            participant("u2", "Bo"),
            host.code(),
        )
        .await
        .expect("join");

        host.start_swiping().await.expect("start");
        joiner.cast_yes("42").await.expect("vote");

        host.focus_card("42").await;
        let event = wait_for(&mut host_rx, |e| {
            matches!(e, SessionEvent::VotersChanged { .. })
        })
        .await;
        let SessionEvent::VotersChanged { card_id, voters } = event else {
            unreachable!()
        };
        assert_eq!(card_id, "42");
        assert!(voters.contains("u2"));
    }
}
