//! # StatusActor: the confined execution context.
//!
//! One tokio task owns the [`StatusMachine`]. Every mutation, whether it comes
//! from a caller, a lifecycle event or an observed signal, runs on this task,
//! so the machine needs no locks.
//!
//! ## Loop
//! ```text
//! loop {
//!   select! (biased) {
//!     token cancelled           ─► break
//!     command from StatusHandle ─► apply, reply on oneshot
//!     lifecycle receiver        ─► AppReady ─► app_readiness_did_change()
//!     observation receiver      ─► table handler (only while observing)
//!   }
//! }
//! on exit: machine.shutdown() (ends battery session, drops receivers),
//!          then cancel the gate token so the subscriber listener stops too
//! ```

use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc, oneshot,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::machine::StatusMachine;
use super::observation::Observed;
use crate::events::{Event, EventKind};
use crate::state::{QueueKind, QueueStatus, Snapshot};

/// Requests marshalled onto the actor by [`StatusHandle`](crate::StatusHandle).
pub(crate) enum Command {
    Status {
        kind: QueueKind,
        reply: oneshot::Sender<QueueStatus>,
    },
    BeginObservingIfNeeded {
        kind: QueueKind,
        reply: oneshot::Sender<QueueStatus>,
    },
    ReattemptDiskSpaceChecks {
        reply: oneshot::Sender<()>,
    },
    DidEmptyQueue {
        kind: QueueKind,
        reply: oneshot::Sender<()>,
    },
    /// Re-read free space; reply with the download status.
    RefreshDiskSpace {
        reply: oneshot::Sender<QueueStatus>,
    },
    /// Set the sticky flag; reply with the download status.
    OutOfSpaceError {
        reply: oneshot::Sender<QueueStatus>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    IsObserving {
        reply: oneshot::Sender<bool>,
    },
}

enum Step {
    Command(Command),
    Lifecycle(Result<Event, RecvError>),
    Observed(Observed),
}

/// Task owning the state machine.
pub(crate) struct StatusActor {
    machine: StatusMachine,
    commands: mpsc::Receiver<Command>,
    lifecycle: broadcast::Receiver<Event>,
}

impl StatusActor {
    /// `lifecycle` must be subscribed before any signal could be published,
    /// so an early `AppReady` is not missed.
    pub(crate) fn new(
        machine: StatusMachine,
        commands: mpsc::Receiver<Command>,
        lifecycle: broadcast::Receiver<Event>,
    ) -> Self {
        Self {
            machine,
            commands,
            lifecycle,
        }
    }

    /// Runs until `token` is cancelled or every handle is dropped.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        self.machine.app_readiness_did_change();

        loop {
            let step = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    None => break,
                },
                ev = self.lifecycle.recv() => Step::Lifecycle(ev),
                observed = self.machine.next_observed() => Step::Observed(observed),
            };

            match step {
                Step::Command(cmd) => self.apply(cmd),
                Step::Lifecycle(Ok(ev)) => {
                    if ev.kind == EventKind::AppReady {
                        self.machine.app_readiness_did_change();
                    }
                }
                Step::Lifecycle(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "lifecycle receiver lagged; re-reading readiness");
                    self.machine.app_readiness_did_change();
                }
                Step::Lifecycle(Err(RecvError::Closed)) => break,
                Step::Observed(Observed::Signal(ev)) => self.machine.dispatch_observed(&ev),
                Step::Observed(Observed::Lagged(skipped)) => {
                    self.machine.recover_from_lag(skipped)
                }
            }
        }

        self.machine.shutdown();
        // Stops the subscriber listener too, even if no handle called shutdown().
        token.cancel();
        debug!("status actor stopped");
    }

    /// Applies one command. A dropped reply receiver is not an error.
    fn apply(&mut self, cmd: Command) {
        let m = &mut self.machine;
        match cmd {
            Command::Status { kind, reply } => {
                let _ = reply.send(m.current_status(kind));
            }
            Command::BeginObservingIfNeeded { kind, reply } => {
                let _ = reply.send(m.begin_observing_if_needed(kind));
            }
            Command::ReattemptDiskSpaceChecks { reply } => {
                m.reattempt_disk_space_checks();
                let _ = reply.send(());
            }
            Command::DidEmptyQueue { kind, reply } => {
                m.did_empty_queue(kind);
                let _ = reply.send(());
            }
            Command::RefreshDiskSpace { reply } => {
                m.available_disk_space_maybe_did_change();
                let _ = reply.send(m.current_status(QueueKind::Download));
            }
            Command::OutOfSpaceError { reply } => {
                let _ = reply.send(m.download_did_experience_out_of_space_error());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(m.snapshot().clone());
            }
            Command::IsObserving { reply } => {
                let _ = reply.send(m.is_observing());
            }
        }
    }
}
