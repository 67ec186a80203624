//! # Observation lifecycle controller.
//!
//! Battery and reachability polling cost energy and are pointless while both
//! queues are empty, so signal subscriptions exist only while at least one
//! queue has work.
//!
//! ## Policy
//! ```text
//! probe queues (unknown emptiness counts as empty)
//!   ├─ empty ─► non-empty : subscribe bus + begin battery session + eager refresh
//!   ├─ non-empty ─► empty : drop receiver + end battery session
//!   └─ otherwise          : nothing
//! ```
//! All handles start and stop as one unit; there is no partially active state.
//!
//! ## Signal table
//! While active, incoming signal events are dispatched through [`OBSERVED_SIGNALS`],
//! an explicit `{EventKind → handler}` table. `AppReady` is not in the table: it is
//! observed for the whole lifetime of the machine.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::machine::StatusMachine;
use crate::events::{Event, EventKind};
use crate::signals::BatterySession;
use crate::state::Snapshot;

/// Callback invoked on the confined machine when a signal arrives.
pub(crate) type SignalHandler = fn(&mut StatusMachine);

/// Signals observed while at least one queue is non-empty.
pub(crate) const OBSERVED_SIGNALS: &[(EventKind, SignalHandler)] = &[
    (EventKind::RegistrationChanged, StatusMachine::registration_state_did_change),
    (EventKind::CellularPreferenceChanged, StatusMachine::cellular_preference_did_change),
    (EventKind::ReachabilityChanged, StatusMachine::reachability_did_change),
    (EventKind::BatteryLevelChanged, StatusMachine::battery_level_did_change),
    (EventKind::LowPowerModeChanged, StatusMachine::low_power_mode_did_change),
    (EventKind::WillEnterForeground, StatusMachine::will_enter_foreground),
    (EventKind::DownloadSuspensionChanged, StatusMachine::suspension_status_did_change),
];

fn handler_for(kind: EventKind) -> Option<SignalHandler> {
    OBSERVED_SIGNALS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, h)| *h)
}

/// Handles held while observation is active.
pub(crate) struct Observation {
    rx: broadcast::Receiver<Event>,
    battery: Option<BatterySession>,
}

impl Observation {
    pub(crate) fn battery_level(&self) -> Option<f32> {
        self.battery.as_ref().and_then(BatterySession::battery_level)
    }

    fn end(self) {
        if let Some(session) = self.battery {
            session.end();
        }
    }
}

/// Next item delivered by the observation receiver.
pub(crate) enum Observed {
    Signal(Event),
    /// The receiver fell behind by `n` events; state must be re-read.
    Lagged(u64),
}

impl StatusMachine {
    /// Probes the queues and starts or stops observation on an emptiness transition.
    pub(super) fn observe_if_needed(&mut self) {
        let probe = self.signals.probe_queues();
        self.store
            .update(|s| s.downloads_suspended = probe.downloads_suspended);

        let were_empty = self.store.snapshot().all_queues_empty();
        let now_empty = probe.all_empty();

        if now_empty && !were_empty {
            self.stop_observing();
        } else if !now_empty && were_empty {
            self.start_observing();
        }

        self.store.update(|s| {
            s.upload_queue_empty = Some(probe.upload_empty);
            s.download_queue_empty = Some(probe.download_empty);
        });
    }

    fn start_observing(&mut self) {
        if self.observation.is_none() {
            let rx = self.bus.subscribe();
            let battery = self.signals.begin_battery_monitoring();
            self.observation = Some(Observation { rx, battery });
            debug!("signal observation started");
            self.bus.publish(Event::new(EventKind::ObservationStarted));
        }
        self.refresh_all();
    }

    pub(super) fn stop_observing(&mut self) {
        if let Some(observation) = self.observation.take() {
            observation.end();
            debug!("signal observation stopped");
            self.bus.publish(Event::new(EventKind::ObservationStopped));
        }
    }

    /// Replaces every observed field with a fresh read.
    ///
    /// Emptiness flags and the sticky out-of-space flag are carried over; only
    /// an explicit reattempt clears the latter.
    pub(crate) fn refresh_all(&mut self) {
        let signals = &self.signals;
        let current = self.store.snapshot();
        let fresh = Snapshot {
            upload_queue_empty: current.upload_queue_empty,
            download_queue_empty: current.download_queue_empty,
            is_host_process_primary: signals.is_main_app(),
            is_ready: signals.is_app_ready(),
            is_registered: Some(signals.is_registered()),
            downloads_suspended: signals.downloads_suspended(),
            backup_on_cellular_allowed: signals.cellular_backup_allowed(),
            wifi_reachable: Some(signals.wifi_reachable()),
            battery_level: self.observation.as_ref().and_then(Observation::battery_level),
            low_power_mode: signals.low_power_mode(),
            available_disk_bytes: signals.available_disk_space(),
            required_disk_bytes: Some(signals.required_disk_space()),
            download_hit_out_of_space_error: current.download_hit_out_of_space_error,
        };
        self.store.update(|s| *s = fresh);
    }

    /// Runs the table handler for `event`, if any.
    pub(crate) fn dispatch_observed(&mut self, event: &Event) {
        if let Some(handler) = handler_for(event.kind) {
            handler(self);
        }
    }

    /// Waits for the next observed signal. Pending forever while inactive.
    ///
    /// Cancel safe: dropping the future loses no signal event.
    pub(crate) async fn next_observed(&mut self) -> Observed {
        let Some(observation) = self.observation.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            match observation.rx.recv().await {
                Ok(ev) if handler_for(ev.kind).is_some() => return Observed::Signal(ev),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => return Observed::Lagged(n),
                // The machine holds a sender clone, so this cannot happen while it lives.
                Err(RecvError::Closed) => return std::future::pending().await,
            }
        }
    }

    /// Recovers from a lagged observation receiver.
    pub(crate) fn recover_from_lag(&mut self, skipped: u64) {
        warn!(skipped, "observation receiver lagged; refreshing all signals");
        if self.is_observing() {
            self.refresh_all();
        }
    }
}
