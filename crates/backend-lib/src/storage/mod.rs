// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage ports for the two tiers a room is split across.
//!
//! * [`RoomRegistry`] is the ephemeral tier: live playback state, evictable.
//! * [`RoomDirectory`] is the durable tier: playlist, name and membership ids.
//! * [`UserDirectory`] holds participant records.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use watchparty_common::{ChatMessage, PlaylistItem, RoomId, User, UserId, VideoState};

use crate::error::StorageError;

pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFileStorage;
pub use memory::MemoryRegistry;

/// Ephemeral entry of a room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LiveRoom {
    pub id: RoomId,
    pub video: VideoState,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Durable record of a room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub playlist: Vec<PlaylistItem>,
    /// Membership, stored as user ids
    #[serde(default)]
    pub users: Vec<UserId>,
}

/// Ephemeral tier: low-latency key/value access by room id
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Insert a new live entry, failing if one is already present
    async fn create_live(&self, room: LiveRoom) -> Result<(), StorageError>;

    async fn get_live(&self, room_id: &str) -> Result<Option<LiveRoom>, StorageError>;

    /// Overwrite the live entry
    async fn save_live(&self, room: &LiveRoom) -> Result<(), StorageError>;

    async fn contains_live(&self, room_id: &str) -> Result<bool, StorageError>;

    /// Drop the live entry. Removing a missing entry succeeds.
    async fn remove_live(&self, room_id: &str) -> Result<(), StorageError>;
}

/// Durable tier: whole-document room records with joined member lookups
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Insert a new record, failing if one is already present
    async fn create_room(&self, record: RoomRecord) -> Result<(), StorageError>;

    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRecord>, StorageError>;

    /// Overwrite the whole record
    async fn save_room(&self, record: &RoomRecord) -> Result<(), StorageError>;

    async fn remove_room(&self, room_id: &str) -> Result<(), StorageError>;

    /// Fetch the record with its membership expanded into user records.
    /// Ids whose user record is gone are left out.
    async fn get_room_with_members(
        &self,
        room_id: &str,
    ) -> Result<Option<(RoomRecord, Vec<User>)>, StorageError>;
}

/// Participant records, independent of room membership storage
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create_user(&self, user: User) -> Result<(), StorageError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError>;

    async fn find_user_by_session(&self, session_handle: &str)
        -> Result<Option<User>, StorageError>;

    /// Update an existing record. A record that is gone is
    /// [`StorageError::Missing`], never recreated.
    async fn save_user(&self, user: &User) -> Result<(), StorageError>;

    /// Returns whether a record was deleted
    async fn remove_user(&self, user_id: &str) -> Result<bool, StorageError>;
}
