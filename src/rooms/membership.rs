//! Membership manager: room creation, admission, departure, and host
//! transfer.
//!
//! Host transfer is observational: this module writes the new host's flag
//! and `hostId`, and each client promotes itself the instant it sees its
//! own `host` flag flip through its member subscription.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::model::{Member, Room, RoomStatus, now_ms};
use crate::rooms::{FIELD_HOST, FIELD_HOST_ID, member_path, members_path, room_path};
use crate::store::StoreAdapter;

/// Create `rooms/{code}` with `uid` as host and sole member.
///
/// Two ordered writes, not one flat map: hierarchical paths must never be
/// encoded as composite keys, and the member subtree only exists once the
/// room node does.
pub async fn create_room(
    store: &dyn StoreAdapter,
    code: &str,
    uid: &str,
    display_name: &str,
    attribute: &str,
) -> CoreResult<()> {
    let created_at = now_ms();
    let metadata = json!({
        FIELD_HOST_ID: uid,
        "createdBy": uid,
        "createdAt": created_at,
        "status": RoomStatus::Waiting,
    });
    store.write(&room_path(code), metadata).await?;

    let member = Member {
        display_name: display_name.to_string(),
        attribute: attribute.to_string(),
        joined_at: created_at,
        host: true,
    };
    store
        .write(&member_path(code, uid), Value::from(&member))
        .await?;
    info!(%code, %uid, "room created");
    Ok(())
}

/// Admit `uid` into an existing waiting room.
///
/// The check-then-write is non-atomic: two joiners racing at capacity
/// `capacity - 1` may both land. An accepted weakness of the transport;
/// the excess is tolerated downstream.
pub async fn join_room(
    store: &dyn StoreAdapter,
    code: &str,
    uid: &str,
    display_name: &str,
    attribute: &str,
    capacity: usize,
) -> CoreResult<()> {
    let Some(snapshot) = store.read_once(&room_path(code)).await? else {
        return Err(CoreError::NotFound {
            code: code.to_string(),
        });
    };
    let room = Room::from_snapshot(code, snapshot)?;

    if room.status != RoomStatus::Waiting {
        return Err(CoreError::AlreadyStarted {
            code: code.to_string(),
        });
    }
    if room.members.len() >= capacity {
        return Err(CoreError::Capacity {
            code: code.to_string(),
        });
    }

    let member = Member {
        display_name: display_name.to_string(),
        attribute: attribute.to_string(),
        joined_at: now_ms(),
        host: false,
    };
    store
        .write(&member_path(code, uid), Value::from(&member))
        .await?;
    info!(%code, %uid, "joined room");
    Ok(())
}

/// Remove `uid` from the room.
///
/// The last member leaving deletes the entire room node. When the host
/// leaves with others remaining, the first remaining member in key order is
/// promoted; the store's lexicographic child ordering makes that tie-break
/// identical across observers.
pub async fn leave_room(store: &dyn StoreAdapter, code: &str, uid: &str) -> CoreResult<()> {
    let members = store.read_once(&members_path(code)).await?;
    let Some(members) = members.as_ref().and_then(Value::as_object) else {
        // Room already gone; leaving is a no-op.
        return Ok(());
    };

    if members.len() <= 1 {
        store.delete(&room_path(code)).await?;
        info!(%code, %uid, "last member left; room deleted");
        return Ok(());
    }

    let leaving_was_host = members
        .get(uid)
        .and_then(|member| member.get(FIELD_HOST))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    store.delete(&member_path(code, uid)).await?;
    debug!(%code, %uid, "member removed");

    if leaving_was_host {
        // First remaining member in the pre-removal snapshot's key order.
        if let Some(next_host) = members.keys().find(|key| key.as_str() != uid) {
            store
                .write_field(&member_path(code, next_host), FIELD_HOST, Value::Bool(true))
                .await?;
            store
                .write_field(&room_path(code), FIELD_HOST_ID, json!(next_host))
                .await?;
            info!(%code, new_host = %next_host, "host transferred");
        }
    }
    Ok(())
}

/// One-shot read of a single member; `None` when the user is not in the
/// room.
pub async fn get_member(
    store: &dyn StoreAdapter,
    code: &str,
    uid: &str,
) -> CoreResult<Option<Member>> {
    let Some(snapshot) = store.read_once(&member_path(code, uid)).await? else {
        return Ok(None);
    };
    let member = serde_json::from_value(snapshot).map_err(|err| CoreError::Corrupt {
        code: code.to_string(),
        message: err.to_string(),
    })?;
    Ok(Some(member))
}

/// One-shot read of every member, keyed by participant identifier.
pub async fn load_members(
    store: &dyn StoreAdapter,
    code: &str,
) -> CoreResult<BTreeMap<String, Member>> {
    let Some(snapshot) = store.read_once(&members_path(code)).await? else {
        return Ok(BTreeMap::new());
    };
    serde_json::from_value(snapshot).map_err(|err| CoreError::Corrupt {
        code: code.to_string(),
        message: err.to_string(),
    })
}
