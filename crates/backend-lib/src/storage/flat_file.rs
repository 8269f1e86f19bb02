// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file implementation of the durable tier and the user directory.
//!
//! Layout under the root directory:
//! * `rooms/<room_id>.json` holds a [`RoomRecord`]
//! * `users/<user_id>.json` holds a [`User`]
//!
//! User writes and deletes are serialized so an update never lands on a record
//! deleted underneath it.
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs as tokio_fs, sync::Mutex};
use watchparty_common::User;

use super::{RoomDirectory, RoomRecord, UserDirectory};
use crate::error::StorageError;

const ROOMS_DIR: &str = "rooms";
const USERS_DIR: &str = "users";

/// Flat-file implementation of [`RoomDirectory`] and [`UserDirectory`]
#[derive(Clone, Debug)]
pub struct FlatFileStorage {
    root: PathBuf,
    user_writes: Arc<Mutex<()>>,
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ROOMS_DIR))?;
        fs::create_dir_all(root.join(USERS_DIR))?;
        Ok(Self {
            root,
            user_writes: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, dir: &str, key: &str) -> Option<PathBuf> {
        is_safe_key(key).then(|| self.root.join(dir).join(format!("{key}.json")))
    }

    fn writable_path(&self, dir: &str, key: &str) -> Result<PathBuf, StorageError> {
        self.path(dir, key)
            .ok_or_else(|| StorageError::Unavailable(format!("invalid storage key {key:?}")))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file so readers never see a half-written document
    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn create_json<T: Serialize>(path: &Path, key: &str, value: &T) -> Result<(), StorageError> {
        if tokio_fs::try_exists(path).await? {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        Self::write_json(path, value).await
    }

    async fn remove_file(path: &Path) -> Result<bool, StorageError> {
        match tokio_fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RoomDirectory for FlatFileStorage {
    async fn create_room(&self, record: RoomRecord) -> Result<(), StorageError> {
        let path = self.writable_path(ROOMS_DIR, &record.id)?;
        Self::create_json(&path, &record.id, &record).await
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRecord>, StorageError> {
        match self.path(ROOMS_DIR, room_id) {
            Some(path) => Self::read_json(&path).await,
            None => Ok(None),
        }
    }

    async fn save_room(&self, record: &RoomRecord) -> Result<(), StorageError> {
        let path = self.writable_path(ROOMS_DIR, &record.id)?;
        Self::write_json(&path, record).await
    }

    async fn remove_room(&self, room_id: &str) -> Result<(), StorageError> {
        if let Some(path) = self.path(ROOMS_DIR, room_id) {
            Self::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn get_room_with_members(
        &self,
        room_id: &str,
    ) -> Result<Option<(RoomRecord, Vec<User>)>, StorageError> {
        let Some(record) = self.get_room(room_id).await? else {
            return Ok(None);
        };

        let mut members = Vec::with_capacity(record.users.len());
        for user_id in &record.users {
            match self.get_user(user_id).await? {
                Some(user) => members.push(user),
                None => tracing::warn!(room_id, user_id = %user_id, "member has no user record"),
            }
        }

        Ok(Some((record, members)))
    }
}

#[async_trait]
impl UserDirectory for FlatFileStorage {
    async fn create_user(&self, user: User) -> Result<(), StorageError> {
        let path = self.writable_path(USERS_DIR, &user.id)?;
        let _write = self.user_writes.lock().await;
        Self::create_json(&path, &user.id, &user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        match self.path(USERS_DIR, user_id) {
            Some(path) => Self::read_json(&path).await,
            None => Ok(None),
        }
    }

    async fn find_user_by_session(
        &self,
        session_handle: &str,
    ) -> Result<Option<User>, StorageError> {
        if session_handle.is_empty() {
            return Ok(None);
        }

        let mut entries = tokio_fs::read_dir(self.root.join(USERS_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(user) = Self::read_json::<User>(&path).await? {
                if user.session_handle == session_handle {
                    return Ok(Some(user));
                }
            }
        }

        Ok(None)
    }

    async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let path = self.writable_path(USERS_DIR, &user.id)?;
        let _write = self.user_writes.lock().await;
        if !tokio_fs::try_exists(&path).await? {
            return Err(StorageError::Missing(user.id.clone()));
        }
        Self::write_json(&path, user).await
    }

    async fn remove_user(&self, user_id: &str) -> Result<bool, StorageError> {
        let Some(path) = self.path(USERS_DIR, user_id) else {
            return Ok(false);
        };
        let _write = self.user_writes.lock().await;
        Self::remove_file(&path).await
    }
}
