//! Pending-correlation table
//!
//! The only mutable shared structure in the engine. One entry per in-flight
//! request, keyed by correlation id: created when the dispatch starts,
//! removed exactly once when it resolves. A lock guards the map; it is
//! never held across an await point.

use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

use csms_wire::ids::{EventTrackingId, RequestId};

/// Two requests with the same correlation id were in flight at once
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request id {0} already has a pending correlation slot")]
pub struct DuplicateRequestId(pub RequestId);

/// Bookkeeping for one in-flight request
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub action: &'static str,
    pub event_tracking_id: EventTrackingId,
    pub started_at: Instant,
}

/// Concurrent map of in-flight correlation slots
#[derive(Debug, Default)]
pub struct PendingTable {
    slots: Mutex<HashMap<RequestId, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot for the given id. Fails if the id is already in flight;
    /// a duplicate is an engine error, never a silent overwrite.
    pub fn register(
        &self,
        request_id: RequestId,
        entry: PendingEntry,
    ) -> Result<(), DuplicateRequestId> {
        match self.slots.lock().entry(request_id) {
            Entry::Occupied(occupied) => Err(DuplicateRequestId(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    /// Resolve a slot, returning its entry. Exactly one resolution per
    /// registration: a second call for the same id returns `None` and is
    /// logged as an engine fault.
    pub fn complete(&self, request_id: &RequestId) -> Option<PendingEntry> {
        let removed = self.slots.lock().remove(request_id);
        if removed.is_none() {
            warn!(
                request_id = %request_id,
                "correlation slot resolved twice or never registered"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
