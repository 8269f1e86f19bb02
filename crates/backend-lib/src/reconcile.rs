// ============================
// crates/backend-lib/src/reconcile.rs
// ============================
//! Bookkeeping for rooms whose two storage tiers drifted apart.
//!
//! When a two-tier write fails halfway and the compensating rollback fails too,
//! the coordinator records what the lagging tier still needs here. The next read
//! of that room applies it: the durable tier wins for playlist and membership,
//! the ephemeral tier is rolled forward for playback, and user records the
//! membership no longer lists are deleted.
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use watchparty_common::{RoomId, UserId, VideoState};

/// Repair owed to a room
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRepair {
    /// Live entry was written but the durable record never landed
    OrphanedLive,
    /// Durable playlist advanced, the live video has not caught up
    VideoBehind(VideoState),
    /// Member removed from the durable record, user record not yet deleted
    OrphanedUser(UserId),
}

/// Result of reconciling a room
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileOutcome {
    /// Both tiers present, nothing owed
    Consistent,
    /// Live video rolled forward to match the durable playlist
    VideoRestored,
    /// Live entry without a durable record was dropped
    OrphanDropped,
    /// User record of a removed member was deleted
    UserDropped,
    /// Durable record without a live entry, kept as history
    Dormant,
    /// Neither tier knows the room
    Missing,
}

/// Pending repairs keyed by room id
#[derive(Clone, Default, Debug)]
pub struct RepairJournal {
    pending: Arc<DashMap<RoomId, PendingRepair>>,
}

impl RepairJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, room_id: &str, repair: PendingRepair) {
        tracing::warn!(room_id, ?repair, "recording pending repair");
        self.pending.insert(room_id.to_string(), repair);
    }

    pub fn pending(&self, room_id: &str) -> Option<PendingRepair> {
        self.pending.get(room_id).map(|r| r.value().clone())
    }

    pub fn has_pending(&self, room_id: &str) -> bool {
        self.pending.contains_key(room_id)
    }

    pub fn resolve(&self, room_id: &str) {
        self.pending.remove(room_id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
