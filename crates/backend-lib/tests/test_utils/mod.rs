//! Shared setup for the coordinator integration tests.
//!
//! Wraps the real storage adapters with switchable faults and write counters so
//! tests can break one tier at a precise step of a two-tier operation.
#![allow(dead_code)]

use async_trait::async_trait;
use backend_lib::coordinator::{CreateRoom, RoomCoordinator};
use backend_lib::error::{AppError, StorageError};
use backend_lib::provider::PlaylistProvider;
use backend_lib::storage::{
    FlatFileStorage, LiveRoom, MemoryRegistry, RoomDirectory, RoomRecord, RoomRegistry,
    UserDirectory,
};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use watchparty_common::{Room, User};

/// Fault switch: never trips, or trips after a number of successful calls
#[derive(Debug)]
pub struct Fault(AtomicI64);

impl Default for Fault {
    fn default() -> Self {
        Self(AtomicI64::new(-1))
    }
}

impl Fault {
    /// Fail every call from now on
    pub fn fail(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    /// Let `n` calls through, then fail
    pub fn fail_after(&self, n: i64) {
        self.0.store(n, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.0.store(-1, Ordering::SeqCst);
    }

    fn check(&self, what: &str) -> Result<(), StorageError> {
        match self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                (left > 0).then(|| left - 1)
            }) {
            Err(0) => Err(StorageError::Unavailable(format!("injected {what} failure"))),
            _ => Ok(()),
        }
    }
}

/// Ephemeral tier with faults
#[derive(Default)]
pub struct FlakyRegistry {
    pub inner: MemoryRegistry,
    pub create: Fault,
    pub save: Fault,
    pub remove: Fault,
    pub writes: AtomicUsize,
}

impl FlakyRegistry {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: MemoryRegistry::new(Some(ttl)),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomRegistry for FlakyRegistry {
    async fn create_live(&self, room: LiveRoom) -> Result<(), StorageError> {
        self.create.check("live create")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_live(room).await
    }

    async fn get_live(&self, room_id: &str) -> Result<Option<LiveRoom>, StorageError> {
        self.inner.get_live(room_id).await
    }

    async fn save_live(&self, room: &LiveRoom) -> Result<(), StorageError> {
        self.save.check("live save")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_live(room).await
    }

    async fn contains_live(&self, room_id: &str) -> Result<bool, StorageError> {
        self.inner.contains_live(room_id).await
    }

    async fn remove_live(&self, room_id: &str) -> Result<(), StorageError> {
        self.remove.check("live remove")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_live(room_id).await
    }
}

/// Durable tier and user directory with faults
pub struct FlakyStorage {
    pub inner: FlatFileStorage,
    pub create_room: Fault,
    pub save_room: Fault,
    pub create_user: Fault,
    pub remove_user: Fault,
    pub room_writes: AtomicUsize,
    user_save_delay_ms: AtomicU64,
}

impl FlakyStorage {
    pub fn new(inner: FlatFileStorage) -> Self {
        Self {
            inner,
            create_room: Fault::default(),
            save_room: Fault::default(),
            create_user: Fault::default(),
            remove_user: Fault::default(),
            room_writes: AtomicUsize::new(0),
            user_save_delay_ms: AtomicU64::new(0),
        }
    }

    /// Hold every user update for `delay` before it reaches the disk
    pub fn delay_user_saves(&self, delay: Duration) {
        self.user_save_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn room_writes(&self) -> usize {
        self.room_writes.load(Ordering::SeqCst)
    }

    /// Number of user records on disk
    pub fn user_count(&self) -> usize {
        std::fs::read_dir(self.inner.root().join("users"))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl RoomDirectory for FlakyStorage {
    async fn create_room(&self, record: RoomRecord) -> Result<(), StorageError> {
        self.create_room.check("room create")?;
        self.room_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_room(record).await
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRecord>, StorageError> {
        self.inner.get_room(room_id).await
    }

    async fn save_room(&self, record: &RoomRecord) -> Result<(), StorageError> {
        self.save_room.check("room save")?;
        self.room_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_room(record).await
    }

    async fn remove_room(&self, room_id: &str) -> Result<(), StorageError> {
        self.room_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_room(room_id).await
    }

    async fn get_room_with_members(
        &self,
        room_id: &str,
    ) -> Result<Option<(RoomRecord, Vec<User>)>, StorageError> {
        self.inner.get_room_with_members(room_id).await
    }
}

#[async_trait]
impl UserDirectory for FlakyStorage {
    async fn create_user(&self, user: User) -> Result<(), StorageError> {
        self.create_user.check("user create")?;
        self.inner.create_user(user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        self.inner.get_user(user_id).await
    }

    async fn find_user_by_session(&self, session_handle: &str) -> Result<Option<User>, StorageError> {
        self.inner.find_user_by_session(session_handle).await
    }

    async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let delay = self.user_save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.save_user(user).await
    }

    async fn remove_user(&self, user_id: &str) -> Result<bool, StorageError> {
        self.remove_user.check("user remove")?;
        self.inner.remove_user(user_id).await
    }
}

/// What the scripted provider answers with
#[derive(Debug, Clone)]
pub enum Script {
    Links(Vec<String>),
    Fail,
    Hang,
}

/// Playlist provider returning canned answers
pub struct ScriptedProvider {
    script: Mutex<Script>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }
}

#[async_trait]
impl PlaylistProvider for ScriptedProvider {
    async fn expand(&self, _list_id: &str) -> Result<Vec<String>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Links(links) => Ok(links),
            Script::Fail => Err(AppError::ExternalService("provider refused".to_string())),
            Script::Hang => std::future::pending::<Result<Vec<String>, AppError>>().await,
        }
    }
}

/// Coordinator wired to flaky tiers in a temp directory
pub struct Harness {
    pub coordinator: RoomCoordinator,
    pub registry: Arc<FlakyRegistry>,
    pub storage: Arc<FlakyStorage>,
    pub provider: Arc<ScriptedProvider>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_registry(FlakyRegistry::default())
    }

    pub fn with_registry(registry: FlakyRegistry) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let storage = Arc::new(FlakyStorage::new(
            FlatFileStorage::new(dir.path()).expect("flat file storage"),
        ));
        let registry = Arc::new(registry);
        let provider = Arc::new(ScriptedProvider::new(Script::Fail));

        let coordinator = RoomCoordinator::new(
            registry.clone(),
            storage.clone(),
            storage.clone(),
            provider.clone(),
        )
        .with_provider_timeout(Duration::from_millis(100));

        Self {
            coordinator,
            registry,
            storage,
            provider,
            _dir: dir,
        }
    }

    /// Room "Movie Night" owned by alice
    pub async fn create_room(&self) -> Room {
        self.coordinator
            .create_room(create_request(None))
            .await
            .expect("create room")
    }
}

pub fn create_request(id: Option<&str>) -> CreateRoom {
    CreateRoom {
        id: id.map(str::to_string),
        username: "alice".to_string(),
        room_name: "Movie Night".to_string(),
        video_url: "https://example/video/abc".to_string(),
    }
}

pub fn links(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|n| format!("https://example/video/{n}"))
        .collect()
}
