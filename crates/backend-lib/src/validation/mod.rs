// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for room, participant and playlist operations.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_ROOM_ID_LENGTH: usize = 64;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_ROOM_NAME_LENGTH: usize = 64;
const MAX_LINK_LENGTH: usize = 2048;

static ROOM_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static DISPLAY_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^<>/\\{}\[\];]*$").unwrap());
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("room id is required")]
    EmptyRoomId,

    #[error("Invalid room ID: {0}")]
    InvalidRoomId(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid room name: {0}")]
    InvalidRoomName(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Invalid duration: {0} (must be a finite, non-negative number of seconds)")]
    InvalidDuration(f64),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Room ID already in use: {0}")]
    RoomIdTaken(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a room id
pub fn validate_room_id(room_id: &str) -> ValidationResult<&str> {
    if room_id.is_empty() {
        return Err(ValidationError::EmptyRoomId);
    }

    if room_id.len() > MAX_ROOM_ID_LENGTH {
        return Err(ValidationError::InvalidRoomId(format!(
            "Room ID must be at most {MAX_ROOM_ID_LENGTH} characters"
        )));
    }

    if !ROOM_ID_REGEX.is_match(room_id) {
        return Err(ValidationError::InvalidRoomId(
            "Room ID must contain only alphanumeric characters, hyphens and underscores"
                .to_string(),
        ));
    }

    Ok(room_id)
}

fn validate_display_name(name: &str, max_len: usize) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("must be at most {max_len} characters"));
    }
    if !DISPLAY_NAME_REGEX.is_match(trimmed) {
        return Err("contains invalid characters".to_string());
    }
    Ok(trimmed)
}

/// Validate a participant's display name, returns it trimmed
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    validate_display_name(username, MAX_USERNAME_LENGTH).map_err(ValidationError::InvalidUsername)
}

/// Validate a room's display name, returns it trimmed
pub fn validate_room_name(name: &str) -> ValidationResult<&str> {
    validate_display_name(name, MAX_ROOM_NAME_LENGTH).map_err(ValidationError::InvalidRoomName)
}

/// Validate a video or playlist link
pub fn validate_link(link: &str) -> ValidationResult<&str> {
    if link.len() > MAX_LINK_LENGTH {
        return Err(ValidationError::InvalidLink(format!(
            "Link must be at most {MAX_LINK_LENGTH} characters"
        )));
    }

    if !LINK_REGEX.is_match(link) {
        return Err(ValidationError::InvalidLink(
            "Link must be an http(s) URL without whitespace".to_string(),
        ));
    }

    Ok(link)
}

/// Validate a playback position
pub fn validate_duration(duration: f64) -> ValidationResult<f64> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(ValidationError::InvalidDuration(duration));
    }
    Ok(duration)
}

/// Reject empty identifiers and handles
pub fn require<'a>(value: &'a str, field: &'static str) -> ValidationResult<&'a str> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_id() {
        assert!(validate_room_id("123-456-789").is_ok());
        assert!(validate_room_id("movie_night").is_ok());

        assert_eq!(validate_room_id(""), Err(ValidationError::EmptyRoomId));

        assert!(matches!(
            validate_room_id("room id"),
            Err(ValidationError::InvalidRoomId(_))
        ));
        assert!(matches!(
            validate_room_id("../etc/passwd"),
            Err(ValidationError::InvalidRoomId(_))
        ));

        let long_id = "a".repeat(65);
        assert!(matches!(
            validate_room_id(&long_id),
            Err(ValidationError::InvalidRoomId(_))
        ));
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice "), Ok("alice"));

        assert!(matches!(
            validate_username("   "),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("<script>"),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username(&"b".repeat(33)),
            Err(ValidationError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_validate_room_name() {
        assert_eq!(validate_room_name("Movie Night"), Ok("Movie Night"));
        assert!(matches!(
            validate_room_name(""),
            Err(ValidationError::InvalidRoomName(_))
        ));
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://example/video/abc").is_ok());
        assert!(validate_link("http://www.youtube.com/watch?v=abc").is_ok());

        assert!(matches!(
            validate_link("ftp://example/video"),
            Err(ValidationError::InvalidLink(_))
        ));
        assert!(matches!(
            validate_link("https://example/a b"),
            Err(ValidationError::InvalidLink(_))
        ));
    }

    #[test]
    fn test_validate_duration() {
        assert_eq!(validate_duration(0.0), Ok(0.0));
        assert_eq!(validate_duration(93.5), Ok(93.5));
        assert!(validate_duration(-0.5).is_err());
        assert!(validate_duration(f64::NAN).is_err());
        assert!(validate_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("abc", "item id"), Ok("abc"));
        assert_eq!(
            require(" ", "item id"),
            Err(ValidationError::MissingField("item id"))
        );
    }
}
