// ============================
// crates/backend-lib/src/storage/memory.rs
// ============================
//! In-memory ephemeral tier with per-entry expiry.
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::{LiveRoom, RoomRegistry};
use crate::error::StorageError;

#[derive(Debug, Clone)]
struct LiveEntry {
    room: LiveRoom,
    expires_at: Option<Instant>,
}

impl LiveEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Live room entries kept in process memory.
///
/// With a TTL every write pushes the entry's expiry forward, so a room stays
/// live while it is being used and lapses once it goes quiet.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    rooms: Arc<DashMap<String, LiveEntry>>,
    ttl: Option<Duration>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryRegistry {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn entry_for(&self, room: LiveRoom) -> LiveEntry {
        LiveEntry {
            room,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// Number of entries, expired ones included until the next purge
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Drop expired entries, returns how many were evicted
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.rooms.len();
        self.rooms.retain(|_, entry| !entry.is_expired(now));
        let evicted = before.saturating_sub(self.rooms.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired live rooms");
        }
        evicted
    }

    /// Periodically purge expired entries until the handle is aborted
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.purge_expired();
            }
        })
    }
}

#[async_trait]
impl RoomRegistry for MemoryRegistry {
    async fn create_live(&self, room: LiveRoom) -> Result<(), StorageError> {
        let now = Instant::now();
        match self.rooms.entry(room.id.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return Err(StorageError::AlreadyExists(room.id));
                }
                occupied.insert(self.entry_for(room));
            },
            Entry::Vacant(vacant) => {
                vacant.insert(self.entry_for(room));
            },
        }
        Ok(())
    }

    async fn get_live(&self, room_id: &str) -> Result<Option<LiveRoom>, StorageError> {
        let now = Instant::now();
        let live = self
            .rooms
            .get(room_id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.room.clone());
        if live.is_none() {
            self.rooms.remove_if(room_id, |_, entry| entry.is_expired(now));
        }
        Ok(live)
    }

    async fn save_live(&self, room: &LiveRoom) -> Result<(), StorageError> {
        self.rooms.insert(room.id.clone(), self.entry_for(room.clone()));
        Ok(())
    }

    async fn contains_live(&self, room_id: &str) -> Result<bool, StorageError> {
        Ok(self.get_live(room_id).await?.is_some())
    }

    async fn remove_live(&self, room_id: &str) -> Result<(), StorageError> {
        self.rooms.remove(room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchparty_common::VideoState;

    fn live(id: &str) -> LiveRoom {
        LiveRoom {
            id: id.to_string(),
            video: VideoState::stopped_at_start("https://example/video/abc"),
            messages: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_get_save() {
        let registry = MemoryRegistry::default();
        registry.create_live(live("r1")).await.unwrap();
        assert!(matches!(
            registry.create_live(live("r1")).await,
            Err(StorageError::AlreadyExists(_))
        ));

        let mut room = registry.get_live("r1").await.unwrap().unwrap();
        room.video.duration = 12.0;
        registry.save_live(&room).await.unwrap();

        assert_eq!(registry.get_live("r1").await.unwrap().unwrap().video.duration, 12.0);
        assert!(registry.contains_live("r1").await.unwrap());
        assert!(!registry.contains_live("r2").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = MemoryRegistry::default();
        registry.create_live(live("r1")).await.unwrap();
        registry.remove_live("r1").await.unwrap();
        registry.remove_live("r1").await.unwrap();
        assert!(registry.get_live("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let registry = MemoryRegistry::new(Some(Duration::from_millis(20)));
        registry.create_live(live("r1")).await.unwrap();
        registry.create_live(live("r2")).await.unwrap();
        assert!(registry.contains_live("r1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!registry.contains_live("r1").await.unwrap());
        assert_eq!(registry.purge_expired(), 1);
        assert!(registry.is_empty());

        // an expired slot can be reused
        registry.create_live(live("r1")).await.unwrap();
        assert!(registry.contains_live("r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweeper_purges() {
        let registry = MemoryRegistry::new(Some(Duration::from_millis(10)));
        registry.create_live(live("r1")).await.unwrap();
        let sweeper = registry.spawn_sweeper(Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.len(), 0);
        sweeper.abort();
    }
}
