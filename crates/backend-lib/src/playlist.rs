// ============================
// crates/backend-lib/src/playlist.rs
// ============================
//! Playlist algorithms.
//!
//! Everything here is synchronous and works on the in-memory play queue. The
//! coordinator loads the durable record, applies one of these under the room
//! lock and writes the record back.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use watchparty_common::{ItemId, PlaylistItem};

use crate::error::AppError;
use crate::validation::ValidationError;

/// Marker that identifies a provider playlist reference
const PLAYLIST_MARKER: &str = "playlist";

static LIST_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").unwrap());

/// A playlist mutation requested by a participant
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PlaylistCommand {
    #[serde(rename_all = "camelCase")]
    Add {
        /// Credited participant; the HTTP layer fills in the acting member
        #[serde(default)]
        username: String,
        link: String,
    },
    #[serde(rename_all = "camelCase")]
    MoveUp { item_id: ItemId },
    #[serde(rename_all = "camelCase")]
    MoveDown { item_id: ItemId },
    #[serde(rename_all = "camelCase")]
    Remove { item_id: ItemId },
}

/// Outcome of a reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Moved,
    /// Already at the boundary in the requested direction
    AtBoundary,
}

/// Returns the provider list id if `link` references a multi-item playlist.
///
/// A link carrying the playlist marker but no list id is rejected.
pub fn provider_list_id(link: &str) -> Result<Option<String>, ValidationError> {
    if !link.contains(PLAYLIST_MARKER) {
        return Ok(None);
    }
    LIST_ID_REGEX
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| Some(m.as_str().to_string()))
        .ok_or_else(|| ValidationError::InvalidLink("playlist link has no list id".to_string()))
}

/// Build a new queue entry with a fresh id
pub fn new_item(username: &str, link: &str) -> PlaylistItem {
    PlaylistItem {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        link: link.to_string(),
    }
}

/// Append entries in the given order
pub fn append(playlist: &mut Vec<PlaylistItem>, items: impl IntoIterator<Item = PlaylistItem>) {
    playlist.extend(items);
}

fn position(playlist: &[PlaylistItem], item_id: &str) -> Result<usize, AppError> {
    playlist
        .iter()
        .position(|item| item.id == item_id)
        .ok_or_else(|| AppError::NotFound(format!("playlist item {item_id}")))
}

/// Swap the item with its predecessor; the head stays put
pub fn move_up(playlist: &mut [PlaylistItem], item_id: &str) -> Result<Shift, AppError> {
    let index = position(playlist, item_id)?;
    if index == 0 {
        return Ok(Shift::AtBoundary);
    }
    playlist.swap(index - 1, index);
    Ok(Shift::Moved)
}

/// Swap the item with its successor; the tail stays put
pub fn move_down(playlist: &mut [PlaylistItem], item_id: &str) -> Result<Shift, AppError> {
    let index = position(playlist, item_id)?;
    if index + 1 == playlist.len() {
        return Ok(Shift::AtBoundary);
    }
    playlist.swap(index, index + 1);
    Ok(Shift::Moved)
}

/// Remove the item; an id that is already gone is not an error
pub fn remove(playlist: &mut Vec<PlaylistItem>, item_id: &str) -> Option<PlaylistItem> {
    let index = playlist.iter().position(|item| item.id == item_id)?;
    Some(playlist.remove(index))
}

/// Dequeue the head for playback
pub fn pop_front(playlist: &mut Vec<PlaylistItem>) -> Option<PlaylistItem> {
    if playlist.is_empty() {
        None
    } else {
        Some(playlist.remove(0))
    }
}
