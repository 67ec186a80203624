//! # Events exchanged over the gate bus.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Signals**: host-side changes the gate reacts to (inbound)
//! - **Notifications**: status changes and observation transitions (outbound)
//! - **Subscriber events**: overflow/panic reports from the fan-out workers
//!
//! Signals carry no payload: the gate re-reads the corresponding source when one
//! arrives, so a burst of identical signals collapses into one fresh value.
//!
//! ## Example
//! ```rust
//! use backupgate::{Event, EventKind, QueueKind, QueueStatus};
//!
//! let ev = Event::status_changed(QueueKind::Download, QueueStatus::LowDiskSpace);
//!
//! assert_eq!(ev.kind, EventKind::QueueStatusChanged);
//! assert_eq!(ev.queue, Some(QueueKind::Download));
//! assert_eq!(ev.status, Some(QueueStatus::LowDiskSpace));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::state::{QueueKind, QueueStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of gate events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Signals (inbound) ===
    /// Application startup completed. Observed for the whole gate lifetime.
    AppReady,

    /// Account registration state changed.
    RegistrationChanged,

    /// The "back up on cellular" preference changed.
    CellularPreferenceChanged,

    /// Network reachability changed.
    ReachabilityChanged,

    /// Battery level changed.
    BatteryLevelChanged,

    /// Low-power mode toggled.
    LowPowerModeChanged,

    /// Application is about to enter the foreground.
    WillEnterForeground,

    /// The download queue was suspended or resumed.
    DownloadSuspensionChanged,

    // === Notifications (outbound) ===
    /// Computed status of one queue changed.
    ///
    /// Sets:
    /// - `queue`: the affected queue kind
    /// - `status`: the new status
    QueueStatusChanged,

    /// Signal observation began (at least one queue became non-empty).
    ObservationStarted,

    /// Signal observation ended (both queues are empty).
    ObservationStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,
}

impl EventKind {
    /// Returns `true` for host-published signal kinds.
    #[inline]
    pub fn is_signal(&self) -> bool {
        matches!(
            self,
            EventKind::AppReady
                | EventKind::RegistrationChanged
                | EventKind::CellularPreferenceChanged
                | EventKind::ReachabilityChanged
                | EventKind::BatteryLevelChanged
                | EventKind::LowPowerModeChanged
                | EventKind::WillEnterForeground
                | EventKind::DownloadSuspensionChanged
        )
    }
}

/// Gate event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Queue the event refers to, if any.
    pub queue: Option<QueueKind>,
    /// New status (only for `QueueStatusChanged`).
    pub status: Option<QueueStatus>,
    /// Human-readable reason (overflow details, panic message, etc.).
    pub reason: Option<Arc<str>>,
    /// Name of the emitting component (subscriber name for subscriber events).
    pub source: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            queue: None,
            status: None,
            reason: None,
            source: None,
        }
    }

    /// Attaches a queue kind.
    #[inline]
    pub fn with_queue(mut self, queue: QueueKind) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Attaches a status.
    #[inline]
    pub fn with_status(mut self, status: QueueStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the emitting component name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a status-change notification for `queue`.
    #[inline]
    pub fn status_changed(queue: QueueKind, status: QueueStatus) -> Self {
        Event::new(EventKind::QueueStatusChanged)
            .with_queue(queue)
            .with_status(status)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    /// Returns `true` if this is a status change for `queue`.
    #[inline]
    pub fn is_status_change_for(&self, queue: QueueKind) -> bool {
        self.kind == EventKind::QueueStatusChanged && self.queue == Some(queue)
    }
}
