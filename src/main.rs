//! Demo driver: a scripted two-participant session against the in-memory
//! store, exercising create, join, start, vote, match, restart, and leave.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use reelmatch::catalog::{Catalog, ScriptedCatalog};
use reelmatch::config::AppConfig;
use reelmatch::model::{Card, RoomStatus};
use reelmatch::session::{Participant, RoomSession, SessionEvent};
use reelmatch::store::StoreAdapter;
use reelmatch::store::memory::MemoryStore;

const EVENT_DEADLINE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let store: Arc<dyn StoreAdapter> = Arc::new(MemoryStore::new());
    let catalog: Arc<dyn Catalog> = Arc::new(ScriptedCatalog::generated(120, 5));
    let config = AppConfig::load();

    let (host, mut host_rx) = RoomSession::create(
        store.clone(),
        catalog.clone(),
        config.clone(),
        participant("Ana"),
    )
    .await?;
    info!(code = host.code(), "room created");

    let (guest, mut guest_rx) = RoomSession::join(
        store,
        catalog,
        config,
        participant("Bo"),
        host.code(),
    )
    .await?;
    info!(code = guest.code(), "guest joined");

    host.start_swiping().await?;
    let first_page = wait_for_deck(&mut host_rx).await?;
    wait_for_deck(&mut guest_rx).await?;
    let card = first_page
        .first()
        .context("catalog page was empty")?
        .clone();
    info!(card = %card.title, "both participants vote yes on the first card");

    host.focus_card(&card.id).await;
    guest.cast_yes(&card.id).await?;
    let outcome = host.cast_yes(&card.id).await?;
    info!(matched = ?outcome.matched, "host voted");

    let matched = wait_for_match(&mut guest_rx).await?;
    let detail = guest.card_detail(&matched).await?;
    info!(card_id = %matched, title = %detail.card.title, "guest observed the match");

    host.restart_from_match().await?;
    wait_for_phase(&mut guest_rx, RoomStatus::Swiping).await?;
    wait_for_deck(&mut guest_rx).await?;
    info!("session restarted into a fresh round");

    guest.leave_room().await?;
    host.leave_room().await?;
    info!("all participants left; room deleted");
    Ok(())
}

/// Stand-in for the identities an authentication layer would hand out.
fn participant(name: &str) -> Participant {
    Participant {
        uid: Uuid::new_v4().to_string(),
        display_name: name.to_string(),
        attribute: String::new(),
    }
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> anyhow::Result<SessionEvent> {
    timeout(EVENT_DEADLINE, rx.recv())
        .await
        .context("timed out waiting for a session event")?
        .context("session event channel closed")
}

/// Skip forward to the next deck append and return its cards.
async fn wait_for_deck(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> anyhow::Result<Vec<Card>> {
    loop {
        if let SessionEvent::DeckAppended { added, .. } = next_event(rx).await? {
            return Ok(added);
        }
    }
}

async fn wait_for_match(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> anyhow::Result<String> {
    loop {
        if let SessionEvent::MatchAnnounced { card_id } = next_event(rx).await? {
            return Ok(card_id);
        }
    }
}

async fn wait_for_phase(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    wanted: RoomStatus,
) -> anyhow::Result<()> {
    loop {
        if let SessionEvent::PhaseChanged { status } = next_event(rx).await?
            && status == wanted
        {
            return Ok(());
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
