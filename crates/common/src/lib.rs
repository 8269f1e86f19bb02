// ================
// common/src/lib.rs
// ================
//! Common types shared between the watch-party backend and its clients.
//! This module defines the merged `Room` view and the records it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a room, shared by both storage tiers
pub type RoomId = String;
/// Identifier of a participant record
pub type UserId = String;
/// Identifier of a queued playlist entry
pub type ItemId = String;

/// Role of a participant inside a room
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Moderator,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Moderator => "moderator",
            Role::Guest => "guest",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared playback status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Playing,
    Stopped,
}

/// Live playback sub-state of a room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VideoState {
    /// Link of the video currently loaded
    pub link: String,
    /// Playback position in seconds, never negative
    pub duration: f64,
    pub status: VideoStatus,
}

impl VideoState {
    /// A freshly loaded video: position zero, stopped
    pub fn stopped_at_start(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            duration: 0.0,
            status: VideoStatus::Stopped,
        }
    }
}

/// A queued video reference with submitter attribution
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub id: ItemId,
    /// Who queued the video
    pub username: String,
    pub link: String,
}

/// A participant record. One record is created per room join.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Live session handle, empty until the participant attaches a session
    #[serde(default)]
    pub session_handle: String,
    pub username: String,
    pub role: Role,
}

/// Entry in the room's ephemeral message log
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Author name used for messages generated by the server
pub const SYSTEM_USERNAME: &str = "system";

/// Merged view of a room as handed to the session layer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub video: VideoState,
    pub playlist: Vec<PlaylistItem>,
    pub users: Vec<User>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Room {
    /// Look up a member by id
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    /// The member holding the owner role, if still present
    pub fn owner(&self) -> Option<&User> {
        self.users.iter().find(|u| u.role == Role::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        assert_eq!(Role::Moderator.to_string(), "moderator");
        let role: Role = serde_json::from_str("\"guest\"").unwrap();
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn test_user_uses_camel_case_and_defaults_session() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","username":"alice","role":"owner"}"#,
        )
        .unwrap();
        assert_eq!(user.session_handle, "");

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("sessionHandle").is_some());
    }

    #[test]
    fn test_fresh_video_state() {
        let video = VideoState::stopped_at_start("https://example/video/abc");
        assert_eq!(video.duration, 0.0);
        assert_eq!(video.status, VideoStatus::Stopped);
        assert_eq!(
            serde_json::to_value(&video).unwrap()["status"],
            serde_json::json!("stopped")
        );
    }
}
