//! In-memory mirror of the persisted room metadata map.
//!
//! Reads are served from the mirror; every change is written through to the
//! [`SettingsStore`]. A failed write is logged and the mirror keeps the new value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::common::clock::Clock;
use crate::config::store::SettingsStore;
use crate::talk::types::RoomMeta;

pub struct RoomMetaStore {
    mirror: Mutex<HashMap<String, RoomMeta>>,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl RoomMetaStore {
    /// Initialize the mirror from storage; unreadable storage starts empty.
    pub fn load(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        let initial = store.load_room_meta().unwrap_or_else(|e| {
            tracing::warn!("room metadata unreadable, starting empty: {e:#}");
            HashMap::new()
        });
        Self {
            mirror: Mutex::new(initial),
            store,
            clock,
        }
    }

    /// Replace the mirror with what storage currently holds.
    pub fn reload(&self) {
        match self.store.load_room_meta() {
            Ok(fresh) => {
                if let Ok(mut guard) = self.mirror.lock() {
                    *guard = fresh;
                }
            }
            Err(e) => tracing::warn!("room metadata reload failed: {e:#}"),
        }
    }

    pub fn get(&self, token: &str) -> Option<RoomMeta> {
        self.mirror.lock().ok()?.get(token).cloned()
    }

    pub fn all(&self) -> HashMap<String, RoomMeta> {
        self.mirror
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Apply `change` to the entry for `token` (created if absent), stamp and persist it.
    pub fn update(&self, token: &str, change: impl FnOnce(&mut RoomMeta)) -> RoomMeta {
        let now = self.clock.unix_millis();
        let (entry, snapshot) = {
            let Ok(mut guard) = self.mirror.lock() else {
                let mut entry = RoomMeta::default();
                change(&mut entry);
                return entry;
            };
            let entry = guard.entry(token.to_string()).or_default();
            change(entry);
            entry.updated_at = now;
            (entry.clone(), guard.clone())
        };
        self.persist(&snapshot);
        entry
    }

    pub fn remove(&self, token: &str) -> Option<RoomMeta> {
        let (removed, snapshot) = {
            let mut guard = self.mirror.lock().ok()?;
            let removed = guard.remove(token)?;
            (removed, guard.clone())
        };
        self.persist(&snapshot);
        Some(removed)
    }

    /// The stored lobby state already matches what the calendar event asks for.
    pub fn lobby_in_sync(&self, token: &str, enable: bool, start: Option<i64>) -> bool {
        self.get(token).is_some_and(|meta| {
            meta.lobby_enabled == enable && (!enable || meta.start_timestamp == start)
        })
    }

    /// The room was handed to a delegate other than `current_user`.
    ///
    /// Edits by the organizer after delegation must not re-sync the room, since
    /// the organizer is no longer a moderator there.
    pub fn delegation_conflict(&self, token: &str, current_user: &str) -> bool {
        self.get(token).is_some_and(|meta| {
            meta.delegated
                && meta
                    .delegate_id
                    .as_deref()
                    .is_some_and(|id| id.to_lowercase() != current_user.trim().to_lowercase())
        })
    }

    fn persist(&self, snapshot: &HashMap<String, RoomMeta>) {
        if let Err(e) = self.store.save_room_meta(snapshot) {
            tracing::warn!("room metadata not persisted: {e:#}");
        }
    }
}
