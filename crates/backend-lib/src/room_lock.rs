// ============================
// crates/backend-lib/src/room_lock.rs
// ============================
//! Per-room serialization of mutating operations.
//!
//! Each room id maps to its own async mutex, created on first use. Waiters are
//! served in FIFO order, so mutations for one room run one at a time in arrival
//! order while other rooms proceed independently. An entry is dropped from the
//! map as soon as its last guard is released with nobody waiting.
use dashmap::DashMap;
use metrics::gauge;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::metrics as keys;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Registry of per-room locks
#[derive(Clone, Default)]
pub struct RoomLocks {
    locks: Arc<LockMap>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room_id`
    pub async fn acquire(&self, room_id: &str) -> RoomGuard {
        // cloned under the shard lock, so reclamation in RoomGuard::drop sees it
        let mutex = self
            .locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        gauge!(keys::ROOM_LOCKS_ACTIVE).set(self.locks.len() as f64);

        let guard = mutex.lock_owned().await;
        RoomGuard {
            guard: Some(guard),
            room_id: room_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of rooms with a live lock entry
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one room, released on drop
pub struct RoomGuard {
    guard: Option<OwnedMutexGuard<()>>,
    room_id: String,
    locks: Arc<LockMap>,
}

impl RoomGuard {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // only the map's own handle left: nobody holds or waits on this room
        self.locks
            .remove_if(&self.room_id, |_, mutex| Arc::strong_count(mutex) == 1);
        gauge!(keys::ROOM_LOCKS_ACTIVE).set(self.locks.len() as f64);
    }
}
