//! # State store: the single mutation point for the signal snapshot.
//!
//! Every write goes through [`StateStore::update`]. After the change is applied
//! the status of each [`QueueKind`] is recomputed against the previous snapshot,
//! and one `QueueStatusChanged` event is published per kind whose status differs,
//! upload first. There is no other change tracking.

use tracing::debug;

use super::snapshot::Snapshot;
use super::status::{QueueKind, QueueStatus};
use crate::events::{Bus, Event};

/// Owns the snapshot and publishes status-change notifications.
pub struct StateStore {
    snapshot: Snapshot,
    bus: Bus,
}

impl StateStore {
    /// Creates a store around an initial snapshot.
    pub fn new(snapshot: Snapshot, bus: Bus) -> Self {
        Self { snapshot, bus }
    }

    /// Read access to the current snapshot.
    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current status of `kind`.
    #[inline]
    pub fn status(&self, kind: QueueKind) -> QueueStatus {
        self.snapshot.status(kind)
    }

    /// Applies `f` to the snapshot, then publishes one notification per kind
    /// whose status changed. Returns the kinds that changed.
    pub fn update<F>(&mut self, f: F) -> Vec<QueueKind>
    where
        F: FnOnce(&mut Snapshot),
    {
        let before = QueueKind::ALL.map(|k| self.snapshot.status(k));
        f(&mut self.snapshot);

        let mut changed = Vec::new();
        for (kind, old) in QueueKind::ALL.into_iter().zip(before) {
            let new = self.snapshot.status(kind);
            if new != old {
                debug!(queue = %kind, from = %old, to = %new, "queue status changed");
                self.bus.publish(Event::status_changed(kind, new));
                changed.push(kind);
            }
        }
        changed
    }
}
