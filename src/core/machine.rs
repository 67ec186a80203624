//! # StatusMachine: the confined decision core.
//!
//! Owns the [`StateStore`], the observation handles and a shared [`Signals`]
//! adapter. Every method takes `&mut self` (or `&self` for pure reads), so
//! exclusive access is enforced by ownership: whoever holds the machine is the
//! confined context. In the default wiring that is the [`StatusActor`](super::actor)
//! task, reached through [`StatusHandle`](crate::StatusHandle).
//!
//! ## Operations
//! ```text
//! current_status(kind)            pure read
//! begin_observing_if_needed(kind) probe queues ─► start/stop observation ─► status
//! did_empty_queue(kind)           mark empty ─► stop observation if both empty
//! reattempt_disk_space_checks()   re-read free space, clear sticky flag
//! job_did_experience_error(..)    download + out-of-space ─► set sticky flag
//! handle_signal(&Event)           AppReady always; others while observing
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use tracing::debug;

use super::observation::Observation;
use crate::error::is_out_of_space;
use crate::events::{Bus, Event, EventKind};
use crate::signals::Signals;
use crate::state::{QueueKind, QueueStatus, Snapshot, StateStore};

/// Synchronous admission-control state machine for the two transfer queues.
pub struct StatusMachine {
    pub(super) store: StateStore,
    pub(super) signals: Arc<Signals>,
    pub(super) bus: Bus,
    pub(super) observation: Option<Observation>,
}

impl StatusMachine {
    /// Creates a machine whose snapshot only knows the primary-process flag.
    ///
    /// Readiness is not read here; call [`app_readiness_did_change`](Self::app_readiness_did_change)
    /// once the machine is installed in its context (the actor does this first thing).
    pub fn new(signals: Arc<Signals>, bus: Bus) -> Self {
        let snapshot = Snapshot::new(signals.is_main_app());
        Self {
            store: StateStore::new(snapshot, bus.clone()),
            signals,
            bus,
            observation: None,
        }
    }

    /// Current snapshot (read-only).
    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        self.store.snapshot()
    }

    /// Current status of `kind`. No side effects.
    #[inline]
    pub fn current_status(&self, kind: QueueKind) -> QueueStatus {
        self.store.status(kind)
    }

    /// Minimum free space needed to complete downloads.
    #[inline]
    pub fn minimum_required_disk_space(&self) -> u64 {
        self.signals.required_disk_space()
    }

    /// `true` while signal subscriptions are active.
    #[inline]
    pub fn is_observing(&self) -> bool {
        self.observation.is_some()
    }

    /// Re-reads free disk space and clears the sticky out-of-space flag.
    ///
    /// If the fresh reading is still below the requirement the download queue
    /// stays `LowDiskSpace` through the threshold rule, but the flag is cleared
    /// regardless. Without this, the user would have no way out after an
    /// out-of-space failure.
    pub fn reattempt_disk_space_checks(&mut self) {
        self.available_disk_space_maybe_did_change();
        self.store
            .update(|s| s.download_hit_out_of_space_error = false);
    }

    /// Re-measures the queues, starts or stops observation as needed, and
    /// returns the status of `kind`. Idempotent.
    pub fn begin_observing_if_needed(&mut self, kind: QueueKind) -> QueueStatus {
        self.observe_if_needed();
        self.current_status(kind)
    }

    /// Records that `kind` was just emptied by its worker.
    ///
    /// Observation is torn down only once both queues are empty; unknown
    /// emptiness counts as empty.
    pub fn did_empty_queue(&mut self, kind: QueueKind) {
        self.store.update(|s| s.set_queue_empty(kind, true));
        if self.store.snapshot().all_queues_empty() {
            self.stop_observing();
        }
    }

    /// Sets the sticky out-of-space flag and returns the download status.
    pub fn download_did_experience_out_of_space_error(&mut self) -> QueueStatus {
        self.store
            .update(|s| s.download_hit_out_of_space_error = true);
        self.current_status(QueueKind::Download)
    }

    /// Reports a job failure. Returns `None` if the error cannot affect status.
    ///
    /// Upload failures never matter; download failures matter only when they
    /// are out-of-space write errors.
    pub fn job_did_experience_error(
        &mut self,
        kind: QueueKind,
        error: &(dyn StdError + 'static),
    ) -> Option<QueueStatus> {
        match kind {
            QueueKind::Upload => None,
            QueueKind::Download if is_out_of_space(error) => {
                Some(self.download_did_experience_out_of_space_error())
            }
            QueueKind::Download => None,
        }
    }

    /// Re-reads free disk space into the snapshot.
    pub fn available_disk_space_maybe_did_change(&mut self) {
        let available = self.signals.available_disk_space();
        self.store.update(|s| s.available_disk_bytes = available);
    }

    /// Re-reads application readiness.
    pub fn app_readiness_did_change(&mut self) {
        let ready = self.signals.is_app_ready();
        self.store.update(|s| s.is_ready = ready);
    }

    /// Applies one signal event.
    ///
    /// `AppReady` is honoured at any time; every other signal only while
    /// observation is active, matching what a live subscription would deliver.
    pub fn handle_signal(&mut self, event: &Event) {
        if event.kind == EventKind::AppReady {
            self.app_readiness_did_change();
            return;
        }
        if self.is_observing() {
            self.dispatch_observed(event);
        }
    }

    pub(super) fn registration_state_did_change(&mut self) {
        let registered = self.signals.is_registered();
        self.store.update(|s| s.is_registered = Some(registered));
    }

    pub(super) fn cellular_preference_did_change(&mut self) {
        let allowed = self.signals.cellular_backup_allowed();
        self.store
            .update(|s| s.backup_on_cellular_allowed = allowed);
    }

    pub(super) fn reachability_did_change(&mut self) {
        let wifi = self.signals.wifi_reachable();
        self.store.update(|s| s.wifi_reachable = Some(wifi));
    }

    pub(super) fn battery_level_did_change(&mut self) {
        let level = self
            .observation
            .as_ref()
            .and_then(Observation::battery_level);
        self.store.update(|s| s.battery_level = level);
    }

    pub(super) fn low_power_mode_did_change(&mut self) {
        let low_power = self.signals.low_power_mode();
        self.store.update(|s| s.low_power_mode = low_power);
    }

    pub(super) fn will_enter_foreground(&mut self) {
        // No OS event exists for free-space changes; foregrounding is the
        // proactive checkpoint before the last sliver of disk is used up.
        self.available_disk_space_maybe_did_change();
    }

    pub(super) fn suspension_status_did_change(&mut self) {
        let suspended = self.signals.downloads_suspended();
        self.store.update(|s| s.downloads_suspended = suspended);
    }

    /// Releases every observation handle.
    pub fn shutdown(&mut self) {
        debug!("status machine shutting down");
        self.stop_observing();
    }
}
