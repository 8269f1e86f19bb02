// ============================
// crates/backend-lib/src/coordinator.rs
// ============================
//! Room coordination across the ephemeral and durable tiers.
//!
//! Field precedence when composing a [`Room`]: the durable record owns `name`,
//! `playlist` and `users`; the live entry owns `video` and `messages`. The id is
//! checked for equality, never merged.
//!
//! Every mutation runs under the room's [`RoomLocks`] entry. Two-tier writes that
//! fail halfway are compensated; if the compensation fails as well the room is
//! recorded in the [`RepairJournal`] and the call returns [`AppError::Divergent`].
use chrono::Utc;
use metrics::counter;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use watchparty_common::{
    ChatMessage, PlaylistItem, Role, Room, RoomId, User, VideoState, VideoStatus, SYSTEM_USERNAME,
};

use crate::error::{AppError, StorageError};
use crate::metrics as keys;
use crate::playlist::{self, PlaylistCommand, Shift};
use crate::provider::PlaylistProvider;
use crate::reconcile::{PendingRepair, ReconcileOutcome, RepairJournal};
use crate::room_lock::RoomLocks;
use crate::storage::{LiveRoom, RoomDirectory, RoomRecord, RoomRegistry, UserDirectory};
use crate::validation::{self, ValidationError};

/// Attempts at finding a free generated room id
const ROOM_ID_ATTEMPTS: usize = 8;

/// Request to open a new room
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    /// Caller-chosen id; generated when absent
    #[serde(default)]
    pub id: Option<RoomId>,
    pub username: String,
    pub room_name: String,
    pub video_url: String,
}

/// Request to join a live room
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub id: RoomId,
    pub username: String,
}

/// What a rename applies to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenameTarget {
    User,
    Room,
}

/// Request to rename a participant or a room
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChangeName {
    /// Room the request is issued in
    pub id: RoomId,
    /// Session of the participant to rename, used for [`RenameTarget::User`]
    #[serde(default)]
    pub session_handle: String,
    #[serde(rename = "type")]
    pub target: RenameTarget,
    pub name: String,
}

/// Result of a rename
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum Renamed {
    User(User),
    Room(Room),
}

/// Anything carrying a mutable display name
pub trait Rename {
    fn apply_name(&mut self, name: String);
}

impl Rename for User {
    fn apply_name(&mut self, name: String) {
        self.username = name;
    }
}

impl Rename for RoomRecord {
    fn apply_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A rename target after lookup
enum Resolved {
    User(User),
    Room(LiveRoom, RoomRecord),
}

impl Resolved {
    fn renamable(&mut self) -> &mut dyn Rename {
        match self {
            Resolved::User(user) => user as &mut dyn Rename,
            Resolved::Room(_, record) => record,
        }
    }
}

/// Room ids look like `123-456-789`
fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    format!(
        "{}-{}-{}",
        rng.random_range(100..1000),
        rng.random_range(100..1000),
        rng.random_range(100..1000)
    )
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn system_message(text: String) -> ChatMessage {
    ChatMessage {
        id: generate_id(),
        username: SYSTEM_USERNAME.to_string(),
        text,
        created_at: Utc::now(),
    }
}

fn ensure_member(record: &RoomRecord, user_id: &str) -> Result<(), AppError> {
    if record.users.iter().any(|id| id == user_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("user {user_id} in room {}", record.id)))
    }
}

/// Merge both tiers into the view handed to the session layer
pub fn compose(live: LiveRoom, record: RoomRecord, users: Vec<User>) -> Result<Room, AppError> {
    if live.id != record.id {
        return Err(AppError::Divergent {
            room_id: record.id,
            detail: format!("live entry carries id {}", live.id),
        });
    }

    Ok(Room {
        id: record.id,
        name: record.name,
        video: live.video,
        playlist: record.playlist,
        users,
        messages: live.messages,
    })
}

/// Orchestrates room operations over both storage tiers
#[derive(Clone)]
pub struct RoomCoordinator {
    registry: Arc<dyn RoomRegistry>,
    directory: Arc<dyn RoomDirectory>,
    users: Arc<dyn UserDirectory>,
    provider: Arc<dyn PlaylistProvider>,
    locks: RoomLocks,
    journal: RepairJournal,
    provider_timeout: Duration,
}

impl RoomCoordinator {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        directory: Arc<dyn RoomDirectory>,
        users: Arc<dyn UserDirectory>,
        provider: Arc<dyn PlaylistProvider>,
    ) -> Self {
        Self {
            registry,
            directory,
            users,
            provider,
            locks: RoomLocks::new(),
            journal: RepairJournal::new(),
            provider_timeout: Duration::from_secs(10),
        }
    }

    /// Bound for one provider expansion
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn journal(&self) -> &RepairJournal {
        &self.journal
    }

    pub fn locks(&self) -> &RoomLocks {
        &self.locks
    }

    // ---- single-tier lookups ----

    /// Ephemeral entry of a room
    pub async fn find_live_room(&self, room_id: &str) -> Result<LiveRoom, AppError> {
        self.registry
            .get_live(room_id)
            .await?
            .ok_or_else(|| AppError::room_not_found(room_id))
    }

    /// Durable record of a room, membership as ids
    pub async fn find_room_record(&self, room_id: &str) -> Result<RoomRecord, AppError> {
        self.directory
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::room_not_found(room_id))
    }

    async fn record_with_members(&self, room_id: &str) -> Result<(RoomRecord, Vec<User>), AppError> {
        self.directory
            .get_room_with_members(room_id)
            .await?
            .ok_or_else(|| AppError::room_not_found(room_id))
    }

    /// Re-read the durable side and merge it with `live`
    async fn view_with(&self, live: LiveRoom) -> Result<Room, AppError> {
        let (record, members) = self.record_with_members(&live.id).await?;
        compose(live, record, members)
    }

    pub async fn find_user(&self, user_id: &str) -> Result<User, AppError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))
    }

    pub async fn find_user_by_session(&self, session_handle: &str) -> Result<User, AppError> {
        validation::require(session_handle, "session handle")?;
        self.users
            .find_user_by_session(session_handle)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with session {session_handle}")))
    }

    /// `user_id` as a member of `room_id`; a user from another room does not resolve
    pub async fn find_member(&self, room_id: &str, user_id: &str) -> Result<User, AppError> {
        let user = self.find_user(user_id).await?;
        let record = self.find_room_record(room_id).await?;
        ensure_member(&record, user_id)?;
        Ok(user)
    }

    /// Role of `user_id` inside `room_id`
    pub async fn member_role(&self, room_id: &str, user_id: &str) -> Result<Role, AppError> {
        Ok(self.find_member(room_id, user_id).await?.role)
    }

    /// Update a user record that must still exist
    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.save_user(user).await {
            Err(StorageError::Missing(_)) => Err(AppError::user_not_found(&user.id)),
            other => Ok(other?),
        }
    }

    // ---- room lifecycle ----

    /// Open a room: owner record, then the live entry, then the durable record
    #[tracing::instrument(skip(self))]
    pub async fn create_room(&self, request: CreateRoom) -> Result<Room, AppError> {
        let username = validation::validate_username(&request.username)?.to_string();
        let room_name = validation::validate_room_name(&request.room_name)?.to_string();
        let video_url = validation::validate_link(&request.video_url)?.to_string();

        let (room_id, _guard) = match request.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => {
                let room_id = validation::validate_room_id(id)?.to_string();
                let guard = self.locks.acquire(&room_id).await;
                if self.is_taken(&room_id).await? {
                    return Err(ValidationError::RoomIdTaken(room_id).into());
                }
                (room_id, guard)
            },
            None => self.claim_generated_id().await?,
        };

        let owner = User {
            id: generate_id(),
            session_handle: String::new(),
            username: username.clone(),
            role: Role::Owner,
        };
        self.users.create_user(owner.clone()).await?;

        let live = LiveRoom {
            id: room_id.clone(),
            video: VideoState::stopped_at_start(video_url),
            messages: vec![system_message(format!("Room created by {username}"))],
        };
        if let Err(e) = self.registry.create_live(live.clone()).await {
            self.discard_user(&owner.id).await;
            return Err(e.into());
        }

        let record = RoomRecord {
            id: room_id.clone(),
            name: room_name,
            playlist: Vec::new(),
            users: vec![owner.id.clone()],
        };
        if let Err(e) = self.directory.create_room(record.clone()).await {
            self.discard_user(&owner.id).await;
            if let Err(rollback) = self.registry.remove_live(&room_id).await {
                counter!(keys::TIER_DIVERGENCE).increment(1);
                self.journal.record(&room_id, PendingRepair::OrphanedLive);
                return Err(AppError::Divergent {
                    room_id,
                    detail: format!("durable create failed ({e}); live rollback failed ({rollback})"),
                });
            }
            counter!(keys::TIER_COMPENSATED).increment(1);
            tracing::warn!(room_id = %room_id, error = %e, "durable create failed, live entry rolled back");
            return Err(e.into());
        }

        counter!(keys::ROOM_CREATED).increment(1);
        tracing::info!(room_id = %room_id, owner = %owner.id, "room created");
        compose(live, record, vec![owner])
    }

    async fn is_taken(&self, room_id: &str) -> Result<bool, AppError> {
        Ok(self.registry.contains_live(room_id).await?
            || self.directory.get_room(room_id).await?.is_some())
    }

    async fn claim_generated_id(&self) -> Result<(RoomId, crate::room_lock::RoomGuard), AppError> {
        for _ in 0..ROOM_ID_ATTEMPTS {
            let room_id = generate_room_id();
            let guard = self.locks.acquire(&room_id).await;
            if !self.is_taken(&room_id).await? {
                return Ok((room_id, guard));
            }
        }
        Err(AppError::Internal("could not allocate a free room id".to_string()))
    }

    /// Best-effort removal of a user record created by a failed operation
    async fn discard_user(&self, user_id: &str) {
        if let Err(e) = self.users.remove_user(user_id).await {
            tracing::warn!(user_id, error = %e, "could not discard user record");
        }
    }

    /// Join a live room as a guest
    pub async fn join_room(&self, request: JoinRoom) -> Result<Room, AppError> {
        self.join_room_as(request).await.map(|(room, _)| room)
    }

    /// Join a live room as a guest, also returning the new participant
    #[tracing::instrument(skip(self), fields(room_id = %request.id))]
    pub async fn join_room_as(&self, request: JoinRoom) -> Result<(Room, User), AppError> {
        let room_id = validation::validate_room_id(&request.id)?;
        let username = validation::validate_username(&request.username)?;

        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        // liveness decides whether the room exists
        let live = self.find_live_room(room_id).await?;
        let mut record = self.find_room_record(room_id).await?;

        let user = User {
            id: generate_id(),
            session_handle: String::new(),
            username: username.to_string(),
            role: Role::Guest,
        };
        self.users.create_user(user.clone()).await?;

        record.users.push(user.id.clone());
        if let Err(e) = self.directory.save_room(&record).await {
            self.discard_user(&user.id).await;
            return Err(e.into());
        }

        counter!(keys::ROOM_JOINED).increment(1);
        tracing::info!(room_id, user_id = %user.id, "user joined");
        let room = self.view_with(live).await?;
        Ok((room, user))
    }

    /// Merged view; both tiers must know the room
    pub async fn find_room(&self, room_id: &str) -> Result<Room, AppError> {
        validation::validate_room_id(room_id)?;
        self.repair_if_pending(room_id).await?;

        let live = self.find_live_room(room_id).await?;
        self.view_with(live).await
    }

    /// Whether the room is live; only the ephemeral tier is consulted
    pub async fn is_exist(&self, room_id: &str) -> Result<bool, AppError> {
        if room_id.is_empty() {
            return Err(ValidationError::EmptyRoomId.into());
        }
        Ok(self.registry.contains_live(room_id).await?)
    }

    // ---- playback, ephemeral tier only ----

    async fn update_video(
        &self,
        room_id: &str,
        apply: impl FnOnce(&mut VideoState) + Send,
    ) -> Result<VideoState, AppError> {
        validation::validate_room_id(room_id)?;
        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let mut live = self.find_live_room(room_id).await?;
        apply(&mut live.video);
        self.registry.save_live(&live).await?;
        Ok(live.video)
    }

    pub async fn play_video(&self, room_id: &str) -> Result<VideoState, AppError> {
        self.update_video(room_id, |video| video.status = VideoStatus::Playing)
            .await
    }

    pub async fn stop_video(&self, room_id: &str) -> Result<VideoState, AppError> {
        self.update_video(room_id, |video| video.status = VideoStatus::Stopped)
            .await
    }

    /// Seek to `duration` seconds
    pub async fn jump_in_video(&self, room_id: &str, duration: f64) -> Result<VideoState, AppError> {
        let duration = validation::validate_duration(duration)?;
        self.update_video(room_id, move |video| video.duration = duration)
            .await
    }

    pub async fn get_video_duration(&self, room_id: &str) -> Result<f64, AppError> {
        validation::validate_room_id(room_id)?;
        Ok(self.find_live_room(room_id).await?.video.duration)
    }

    /// Load the playlist head as the current video.
    ///
    /// Returns `None` without touching either tier when the playlist is empty.
    #[tracing::instrument(skip(self))]
    pub async fn skip_video(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        validation::validate_room_id(room_id)?;
        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let mut live = self.find_live_room(room_id).await?;
        let record = self.find_room_record(room_id).await?;

        let mut advanced = record.clone();
        let Some(head) = playlist::pop_front(&mut advanced.playlist) else {
            return Ok(None);
        };
        let video = VideoState::stopped_at_start(head.link);

        self.directory.save_room(&advanced).await?;

        live.video = video.clone();
        if let Err(e) = self.registry.save_live(&live).await {
            if let Err(rollback) = self.directory.save_room(&record).await {
                counter!(keys::TIER_DIVERGENCE).increment(1);
                self.journal
                    .record(room_id, PendingRepair::VideoBehind(video));
                return Err(AppError::Divergent {
                    room_id: room_id.to_string(),
                    detail: format!("live write failed ({e}); playlist restore failed ({rollback})"),
                });
            }
            counter!(keys::TIER_COMPENSATED).increment(1);
            tracing::warn!(room_id, error = %e, "live write failed, playlist restored");
            return Err(e.into());
        }

        counter!(keys::VIDEO_SKIPPED).increment(1);
        self.view_with(live).await.map(Some)
    }

    // ---- membership ----

    /// Remove a member and delete their user record. Returns the removed user.
    #[tracing::instrument(skip(self))]
    pub async fn kick_user_from_room(&self, room_id: &str, user_id: &str) -> Result<User, AppError> {
        validation::validate_room_id(room_id)?;
        validation::require(user_id, "user id")?;
        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let previous = self.find_room_record(room_id).await?;
        let user = self.find_user(user_id).await?;

        let mut record = previous.clone();
        let Some(index) = record.users.iter().position(|id| id == user_id) else {
            return Err(AppError::NotFound(format!("user {user_id} in room {room_id}")));
        };
        record.users.remove(index);
        self.directory.save_room(&record).await?;

        if let Err(e) = self.users.remove_user(user_id).await {
            if let Err(rollback) = self.directory.save_room(&previous).await {
                counter!(keys::TIER_DIVERGENCE).increment(1);
                self.journal
                    .record(room_id, PendingRepair::OrphanedUser(user_id.to_string()));
                return Err(AppError::Divergent {
                    room_id: room_id.to_string(),
                    detail: format!("user delete failed ({e}); membership restore failed ({rollback})"),
                });
            }
            counter!(keys::TIER_COMPENSATED).increment(1);
            return Err(e.into());
        }

        counter!(keys::USER_KICKED).increment(1);
        tracing::info!(room_id, user_id, "user kicked");
        Ok(user)
    }

    /// Late-bind a participant's live session handle. A user kicked meanwhile
    /// stays deleted.
    pub async fn attach_session(&self, user_id: &str, session_handle: &str) -> Result<User, AppError> {
        validation::require(session_handle, "session handle")?;
        let mut user = self.find_user(user_id).await?;
        user.session_handle = session_handle.to_string();
        self.save_user(&user).await?;
        tracing::debug!(user_id, "session attached");
        Ok(user)
    }

    /// Rename exactly one target: the participant behind a session, or the room.
    /// Either way the session must belong to a member of the room.
    #[tracing::instrument(skip(self))]
    pub async fn change_name(&self, request: ChangeName) -> Result<Renamed, AppError> {
        let room_id = validation::validate_room_id(&request.id)?;
        let name = match request.target {
            RenameTarget::User => validation::validate_username(&request.name)?,
            RenameTarget::Room => validation::validate_room_name(&request.name)?,
        }
        .to_string();

        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let actor = self.find_user_by_session(&request.session_handle).await?;
        let record = self.find_room_record(room_id).await?;
        ensure_member(&record, &actor.id)?;

        let mut resolved = match request.target {
            RenameTarget::User => Resolved::User(actor),
            RenameTarget::Room => Resolved::Room(self.find_live_room(room_id).await?, record),
        };
        resolved.renamable().apply_name(name);

        match resolved {
            Resolved::User(user) => {
                self.save_user(&user).await?;
                Ok(Renamed::User(user))
            },
            Resolved::Room(live, record) => {
                self.directory.save_room(&record).await?;
                Ok(Renamed::Room(self.view_with(live).await?))
            },
        }
    }

    // ---- playlist ----

    /// Apply one playlist command and return the updated room
    pub async fn update_playlist(&self, room_id: &str, command: PlaylistCommand) -> Result<Room, AppError> {
        let room = match command {
            PlaylistCommand::Add { username, link } => {
                self.add_to_playlist(room_id, &username, &link).await?
            },
            PlaylistCommand::MoveUp { item_id } => {
                self.reorder(room_id, |p| Ok(playlist::move_up(p, &item_id)? == Shift::Moved))
                    .await?
            },
            PlaylistCommand::MoveDown { item_id } => {
                self.reorder(room_id, |p| Ok(playlist::move_down(p, &item_id)? == Shift::Moved))
                    .await?
            },
            PlaylistCommand::Remove { item_id } => {
                self.reorder(room_id, |p| Ok(playlist::remove(p, &item_id).is_some()))
                    .await?
            },
        };
        counter!(keys::PLAYLIST_UPDATED).increment(1);
        Ok(room)
    }

    /// Queue a link, or every entry of a provider playlist
    #[tracing::instrument(skip(self))]
    pub async fn add_to_playlist(&self, room_id: &str, username: &str, link: &str) -> Result<Room, AppError> {
        validation::validate_room_id(room_id)?;
        let username = validation::validate_username(username)?;
        let link = validation::validate_link(link)?;

        // expand before locking, a failure leaves the playlist untouched
        let items: Vec<PlaylistItem> = match playlist::provider_list_id(link)? {
            Some(list_id) => self
                .expand_provider_list(&list_id)
                .await?
                .iter()
                .map(|l| playlist::new_item(username, l))
                .collect(),
            None => vec![playlist::new_item(username, link)],
        };
        let added = items.len();

        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let live = self.find_live_room(room_id).await?;
        let mut record = self.find_room_record(room_id).await?;
        playlist::append(&mut record.playlist, items);
        self.directory.save_room(&record).await?;

        counter!(keys::PLAYLIST_ITEMS_ADDED).increment(added as u64);
        tracing::debug!(room_id, added, "playlist extended");
        self.view_with(live).await
    }

    async fn expand_provider_list(&self, list_id: &str) -> Result<Vec<String>, AppError> {
        match tokio::time::timeout(self.provider_timeout, self.provider.expand(list_id)).await {
            Ok(Ok(links)) => Ok(links),
            Ok(Err(e)) => {
                counter!(keys::PROVIDER_FAILURE).increment(1);
                Err(e)
            },
            Err(_) => {
                counter!(keys::PROVIDER_FAILURE).increment(1);
                Err(AppError::ExternalService(format!(
                    "provider did not answer within {:?}",
                    self.provider_timeout
                )))
            },
        }
    }

    /// Read-modify-write of the playlist. `apply` reports whether it changed
    /// anything; unchanged playlists are not written back.
    async fn reorder(
        &self,
        room_id: &str,
        apply: impl FnOnce(&mut Vec<PlaylistItem>) -> Result<bool, AppError> + Send,
    ) -> Result<Room, AppError> {
        validation::validate_room_id(room_id)?;
        let _guard = self.locks.acquire(room_id).await;
        self.apply_pending(room_id).await?;

        let live = self.find_live_room(room_id).await?;
        let mut record = self.find_room_record(room_id).await?;
        if apply(&mut record.playlist)? {
            self.directory.save_room(&record).await?;
        }
        self.view_with(live).await
    }

    // ---- reconciliation ----

    /// Repair a room and classify the state of its two tiers
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, room_id: &str) -> Result<ReconcileOutcome, AppError> {
        validation::validate_room_id(room_id)?;
        let _guard = self.locks.acquire(room_id).await;

        if let Some(outcome) = self.apply_pending(room_id).await? {
            return Ok(outcome);
        }

        let live = self.registry.contains_live(room_id).await?;
        let durable = self.directory.get_room(room_id).await?.is_some();
        let outcome = match (live, durable) {
            (true, true) => ReconcileOutcome::Consistent,
            (true, false) => {
                self.registry.remove_live(room_id).await?;
                counter!(keys::TIER_REPAIRED).increment(1);
                tracing::warn!(room_id, "dropped live entry without durable record");
                ReconcileOutcome::OrphanDropped
            },
            (false, true) => ReconcileOutcome::Dormant,
            (false, false) => ReconcileOutcome::Missing,
        };
        Ok(outcome)
    }

    /// Apply a pending repair on a read path; only locks when something is owed
    async fn repair_if_pending(&self, room_id: &str) -> Result<(), AppError> {
        if self.journal.has_pending(room_id) {
            let _guard = self.locks.acquire(room_id).await;
            self.apply_pending(room_id).await?;
        }
        Ok(())
    }

    /// Caller must hold the room lock. A failed repair stays journaled.
    async fn apply_pending(&self, room_id: &str) -> Result<Option<ReconcileOutcome>, AppError> {
        let Some(repair) = self.journal.pending(room_id) else {
            return Ok(None);
        };

        let outcome = match repair {
            PendingRepair::OrphanedLive => {
                if self.directory.get_room(room_id).await?.is_some() {
                    ReconcileOutcome::Consistent
                } else {
                    self.registry.remove_live(room_id).await?;
                    ReconcileOutcome::OrphanDropped
                }
            },
            PendingRepair::VideoBehind(video) => match self.registry.get_live(room_id).await? {
                Some(mut live) => {
                    live.video = video;
                    self.registry.save_live(&live).await?;
                    ReconcileOutcome::VideoRestored
                },
                None => ReconcileOutcome::Dormant,
            },
            PendingRepair::OrphanedUser(user_id) => {
                let listed = self
                    .directory
                    .get_room(room_id)
                    .await?
                    .is_some_and(|record| record.users.contains(&user_id));
                if listed {
                    ReconcileOutcome::Consistent
                } else {
                    self.users.remove_user(&user_id).await?;
                    ReconcileOutcome::UserDropped
                }
            },
        };

        self.journal.resolve(room_id);
        counter!(keys::TIER_REPAIRED).increment(1);
        tracing::info!(room_id, ?outcome, "pending repair applied");
        Ok(Some(outcome))
    }
}
