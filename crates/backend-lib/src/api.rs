// ============================
// crates/backend-lib/src/api.rs
// ============================
//! HTTP routes in front of the coordinator.
//!
//! Gated routes resolve the acting participant from the `x-user-id` header,
//! look up their role in the target room and check it against the permission
//! policy before calling into the coordinator. Queued items are credited to the
//! acting participant.
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use watchparty_common::{Room, User};

use crate::coordinator::{ChangeName, CreateRoom, JoinRoom, RenameTarget};
use crate::error::AppError;
use crate::permissions::{self, Action};
use crate::playlist::PlaylistCommand;
use crate::validation::ValidationError;
use crate::AppState;

/// Header naming the acting participant
pub const USER_HEADER: &str = "x-user-id";

type Shared = State<Arc<AppState>>;

/// Create the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(find_room))
        .route("/rooms/{id}/exists", get(room_exists))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/playlist", post(update_playlist))
        .route("/rooms/{id}/video/play", post(play_video))
        .route("/rooms/{id}/video/stop", post(stop_video))
        .route("/rooms/{id}/video/jump", post(jump_in_video))
        .route("/rooms/{id}/video/duration", get(video_duration))
        .route("/rooms/{id}/video/skip", post(skip_video))
        .route("/rooms/{id}/users/{user_id}", delete(kick_user))
        .route("/rooms/{id}/name", post(change_name))
        .route("/rooms/{id}/reconcile", post(reconcile))
        .route("/users/{id}/session", put(attach_session))
        .with_state(state)
}

/// Resolve the caller as a member of `room_id` and check their role against `action`
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    room_id: &str,
    action: Action,
) -> Result<User, AppError> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(USER_HEADER))?;

    let actor = state.coordinator.find_member(room_id, user_id).await?;
    permissions::authorize(actor.role, action)?;
    Ok(actor)
}

async fn health() -> &'static str {
    "ok"
}

async fn create_room(
    State(state): Shared,
    Json(request): Json<CreateRoom>,
) -> Result<impl IntoResponse, AppError> {
    let room = state.coordinator.create_room(request).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn find_room(State(state): Shared, Path(id): Path<String>) -> Result<Json<Room>, AppError> {
    Ok(Json(state.coordinator.find_room(&id).await?))
}

async fn room_exists(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let exists = state.coordinator.is_exist(&id).await?;
    Ok(Json(json!({ "exists": exists })))
}

#[derive(Deserialize, Debug)]
struct JoinBody {
    username: String,
}

#[derive(Serialize, Debug)]
struct Joined {
    room: Room,
    user: User,
}

async fn join_room(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<JoinBody>,
) -> Result<Json<Joined>, AppError> {
    let (room, user) = state
        .coordinator
        .join_room_as(JoinRoom {
            id,
            username: body.username,
        })
        .await?;
    Ok(Json(Joined { room, user }))
}

async fn update_playlist(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(command): Json<PlaylistCommand>,
) -> Result<Json<Room>, AppError> {
    let actor = authorize(&state, &headers, &id, Action::UpdatePlaylist).await?;
    let command = match command {
        PlaylistCommand::Add { link, .. } => PlaylistCommand::Add {
            username: actor.username,
            link,
        },
        other => other,
    };
    Ok(Json(state.coordinator.update_playlist(&id, command).await?))
}

async fn play_video(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers, &id, Action::UpdateVideoStatus).await?;
    Ok(Json(state.coordinator.play_video(&id).await?))
}

async fn stop_video(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers, &id, Action::UpdateVideoStatus).await?;
    Ok(Json(state.coordinator.stop_video(&id).await?))
}

#[derive(Deserialize, Debug)]
struct JumpBody {
    duration: f64,
}

async fn jump_in_video(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<JumpBody>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &headers, &id, Action::ChangeVideoDuration).await?;
    Ok(Json(state.coordinator.jump_in_video(&id, body.duration).await?))
}

async fn video_duration(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let duration = state.coordinator.get_video_duration(&id).await?;
    Ok(Json(json!({ "duration": duration })))
}

/// `null` body when the playlist was empty
async fn skip_video(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Option<Room>>, AppError> {
    authorize(&state, &headers, &id, Action::SkipVideo).await?;
    Ok(Json(state.coordinator.skip_video(&id).await?))
}

async fn kick_user(
    State(state): Shared,
    headers: HeaderMap,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<User>, AppError> {
    authorize(&state, &headers, &id, Action::KickUser).await?;
    Ok(Json(state.coordinator.kick_user_from_room(&id, &user_id).await?))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RenameBody {
    #[serde(default)]
    session_handle: String,
    #[serde(rename = "type")]
    target: RenameTarget,
    name: String,
}

async fn change_name(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<RenameBody>,
) -> Result<impl IntoResponse, AppError> {
    let renamed = state
        .coordinator
        .change_name(ChangeName {
            id,
            session_handle: body.session_handle,
            target: body.target,
            name: body.name,
        })
        .await?;
    Ok(Json(renamed))
}

async fn reconcile(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = state.coordinator.reconcile(&id).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    session_handle: String,
}

async fn attach_session(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<SessionBody>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        state
            .coordinator
            .attach_session(&id, &body.session_handle)
            .await?,
    ))
}
