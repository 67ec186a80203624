//! # StatusHandle: thread-agnostic entry points.
//!
//! Cloneable, `Send + Sync`. Mutating calls are marshalled onto the
//! [`StatusActor`](super::actor) through a bounded command channel and the
//! result comes back on a oneshot. Two calls avoid the hop when they can:
//!
//! - [`quick_check_disk_space`](StatusHandle::quick_check_disk_space) reads free
//!   space on the caller's task and only hops when space is short.
//! - [`job_did_experience_error`](StatusHandle::job_did_experience_error) filters
//!   the error on the caller's task and only hops for download out-of-space errors.

use std::error::Error as StdError;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::actor::Command;
use crate::error::{GateError, is_out_of_space};
use crate::events::{Bus, Event, EventKind};
use crate::signals::Signals;
use crate::state::{QueueKind, QueueStatus, Snapshot};

/// Handle for querying and driving the status gate.
///
/// Every async method returns [`GateError::Closed`] once the actor stopped.
#[derive(Clone)]
pub struct StatusHandle {
    tx: mpsc::Sender<Command>,
    signals: Arc<Signals>,
    bus: Bus,
    token: CancellationToken,
}

impl StatusHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<Command>,
        signals: Arc<Signals>,
        bus: Bus,
        token: CancellationToken,
    ) -> Self {
        Self {
            tx,
            signals,
            bus,
            token,
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| GateError::Closed)?;
        rx.await.map_err(|_| GateError::Closed)
    }

    /// Current status of `kind`.
    pub async fn current_status(&self, kind: QueueKind) -> Result<QueueStatus, GateError> {
        self.request(|reply| Command::Status { kind, reply }).await
    }

    /// Minimum free space needed to complete downloads. No hop, no side effects.
    pub fn minimum_required_disk_space(&self) -> u64 {
        self.signals.required_disk_space()
    }

    /// Re-reads free space and clears any past out-of-space error, so downloads
    /// can resume after the user freed space.
    pub async fn reattempt_disk_space_checks(&self) -> Result<(), GateError> {
        self.request(|reply| Command::ReattemptDiskSpaceChecks { reply })
            .await
    }

    /// Re-measures the queues, begins observing if any has work, and returns
    /// the status of `kind`.
    pub async fn begin_observing_if_needed(
        &self,
        kind: QueueKind,
    ) -> Result<QueueStatus, GateError> {
        self.request(|reply| Command::BeginObservingIfNeeded { kind, reply })
            .await
    }

    /// Fast disk check for download admission.
    ///
    /// Returns `Ok(None)` without touching the actor when free space is at
    /// least the requirement (or unknown). Otherwise refreshes the snapshot
    /// and returns the updated download status.
    pub async fn quick_check_disk_space(&self) -> Result<Option<QueueStatus>, GateError> {
        let required = self.signals.required_disk_space();
        match self.signals.available_disk_space() {
            Some(available) if available < required => self
                .request(|reply| Command::RefreshDiskSpace { reply })
                .await
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Reports a job failure.
    ///
    /// Returns `Ok(None)` when the error cannot change the status: every upload
    /// error, and every download error other than an out-of-space write. Those
    /// return without a hop. The status may still change concurrently for
    /// unrelated reasons.
    pub async fn job_did_experience_error(
        &self,
        kind: QueueKind,
        error: &(dyn StdError + Send + Sync + 'static),
    ) -> Result<Option<QueueStatus>, GateError> {
        if kind == QueueKind::Upload || !is_out_of_space(error) {
            return Ok(None);
        }
        self.request(|reply| Command::OutOfSpaceError { reply })
            .await
            .map(Some)
    }

    /// Call when the worker emptied the `kind` queue.
    pub async fn did_empty_queue(&self, kind: QueueKind) -> Result<(), GateError> {
        self.request(|reply| Command::DidEmptyQueue { kind, reply })
            .await
    }

    /// Copy of the current snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, GateError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// `true` while signal subscriptions are active.
    pub async fn is_observing(&self) -> Result<bool, GateError> {
        self.request(|reply| Command::IsObserving { reply }).await
    }

    /// Receiver for every bus event, including `QueueStatusChanged`.
    ///
    /// Filter with [`Event::is_status_change_for`] to follow one queue kind.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Publishes a host signal. Non-signal kinds are ignored.
    pub fn publish_signal(&self, kind: EventKind) {
        if kind.is_signal() {
            self.bus.publish(Event::new(kind));
        }
    }

    /// Stops the actor; observation handles are released before it exits.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// `true` once the actor is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
