// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_JOINED: &str = "room.joined";
pub const ROOM_LOCKS_ACTIVE: &str = "room.locks.active";
pub const PLAYLIST_UPDATED: &str = "playlist.updated";
pub const PLAYLIST_ITEMS_ADDED: &str = "playlist.items_added";
pub const VIDEO_SKIPPED: &str = "video.skipped";
pub const USER_KICKED: &str = "user.kicked";
pub const PROVIDER_FAILURE: &str = "provider.failure";
pub const TIER_COMPENSATED: &str = "tier.compensated";
pub const TIER_DIVERGENCE: &str = "tier.divergence";
pub const TIER_REPAIRED: &str = "tier.repaired";
