use std::fmt;

/// The two independent background work queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Outbound transfer of backed-up attachments.
    Upload,
    /// Inbound transfer of backed-up attachments.
    Download,
}

impl QueueKind {
    /// Every kind, in notification order.
    pub const ALL: [QueueKind; 2] = [QueueKind::Upload, QueueKind::Download];

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueKind::Upload => "upload",
            QueueKind::Download => "download",
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Admission decision for one queue.
///
/// Exactly one status applies at a time; see [`Snapshot::status`](super::Snapshot::status)
/// for the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// Work may proceed.
    Running,

    /// The user has not yet opted to begin downloads. Download only.
    Suspended,

    /// There is nothing to transfer.
    Empty,

    /// Not registered, app not ready, or not the primary process.
    NotReady,

    /// Wifi is required and not reachable.
    NoWifi,

    /// Battery below 10% or low-power mode enabled.
    LowBattery,

    /// Not enough disk space to keep downloading. Download only.
    ///
    /// A minimum amount of free space is required; downloads continue
    /// greedily until that floor is reached.
    LowDiskSpace,
}

impl QueueStatus {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueStatus::Running => "running",
            QueueStatus::Suspended => "suspended",
            QueueStatus::Empty => "empty",
            QueueStatus::NotReady => "not_ready",
            QueueStatus::NoWifi => "no_wifi",
            QueueStatus::LowBattery => "low_battery",
            QueueStatus::LowDiskSpace => "low_disk_space",
        }
    }

    /// Returns `true` if work may proceed.
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, QueueStatus::Running)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
