// crates/backend-lib/src/permissions.rs

//! Role based permission gate.
//!
//! The policy is a fixed table from [`Action`] to the roles allowed to perform it.
//! The session layer checks it before invoking the coordinator, so a denied request
//! never reaches a storage tier.
use serde::{Deserialize, Serialize};
use watchparty_common::Role;

use crate::error::AppError;

/// A role-gated room action
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    UpdatePlaylist,
    KickUser,
    UpdateVideoStatus,
    ChangeVideoDuration,
    SkipVideo,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::UpdatePlaylist,
        Action::KickUser,
        Action::UpdateVideoStatus,
        Action::ChangeVideoDuration,
        Action::SkipVideo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::UpdatePlaylist => "UPDATE_PLAYLIST",
            Action::KickUser => "KICK_USER",
            Action::UpdateVideoStatus => "UPDATE_VIDEO_STATUS",
            Action::ChangeVideoDuration => "CHANGE_VIDEO_DURATION",
            Action::SkipVideo => "SKIP_VIDEO",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static POLICY: [(Action, &[Role]); 5] = [
    (
        Action::UpdatePlaylist,
        &[Role::Owner, Role::Moderator, Role::Guest],
    ),
    (Action::KickUser, &[Role::Owner]),
    (Action::UpdateVideoStatus, &[Role::Owner, Role::Moderator]),
    (Action::ChangeVideoDuration, &[Role::Owner, Role::Moderator]),
    (Action::SkipVideo, &[Role::Owner, Role::Moderator]),
];

/// The full policy table, one row per action
pub fn policy() -> &'static [(Action, &'static [Role])] {
    &POLICY
}

/// Roles allowed to perform `action`
pub fn allowed_roles(action: Action) -> &'static [Role] {
    POLICY
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

/// Pure lookup: may `role` perform `action`?
pub fn enforce(role: Role, action: Action) -> bool {
    allowed_roles(action).contains(&role)
}

/// Like [`enforce`], but a denial becomes [`AppError::Forbidden`]
pub fn authorize(role: Role, action: Action) -> Result<(), AppError> {
    if enforce(role, action) {
        Ok(())
    } else {
        tracing::debug!(%role, %action, "permission denied");
        Err(AppError::Forbidden { role, action })
    }
}
