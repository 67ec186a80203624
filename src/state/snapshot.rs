//! # Signal snapshot and status computation.
//!
//! [`Snapshot`] holds the latest observed value of every signal. Optional fields
//! mean "not yet observed" and are never defaulted eagerly: several rules must
//! tell "known false" apart from "unknown".
//!
//! ## Precedence (first matching rule wins)
//! ```text
//! 1. queue empty                                   → Empty
//! 2. !primary || !ready || registered != Some(true) → NotReady
//! 3. download && suspended == Some(true)           → Suspended
//! 4. download && sticky out-of-space flag          → LowDiskSpace
//! 5. download && available < required (both known) → LowDiskSpace
//! 6. wifi needed && wifi != Some(true)             → NoWifi
//!       upload:   needed unless cellular == Some(true)
//!       download: always needed
//! 7. battery < 10% (known) || low power == Some(true) → LowBattery
//! 8. otherwise                                     → Running
//! ```

use super::status::{QueueKind, QueueStatus};

/// Battery fraction below which transfers stop.
pub const LOW_BATTERY_THRESHOLD: f32 = 0.1;

/// Latest observed value of every signal that gates the queues.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// `None` until the upload queue is first measured.
    pub upload_queue_empty: Option<bool>,
    /// `None` until the download queue is first measured.
    pub download_queue_empty: Option<bool>,
    /// `true` only in the process allowed to perform transfers.
    pub is_host_process_primary: bool,
    /// `true` once application startup completed.
    pub is_ready: bool,
    pub is_registered: Option<bool>,
    /// User pause flag. Download only.
    pub downloads_suspended: Option<bool>,
    /// User preference. Upload only.
    pub backup_on_cellular_allowed: Option<bool>,
    pub wifi_reachable: Option<bool>,
    /// 0.0 ..= 1.0
    pub battery_level: Option<f32>,
    pub low_power_mode: Option<bool>,
    pub available_disk_bytes: Option<u64>,
    /// Filled from the process-wide immutable accessor on first activation.
    pub required_disk_bytes: Option<u64>,
    /// Sticky; cleared only by an explicit reattempt.
    pub download_hit_out_of_space_error: bool,
}

impl Snapshot {
    /// Creates a snapshot where only the primary-process flag is known.
    pub fn new(is_host_process_primary: bool) -> Self {
        Self {
            is_host_process_primary,
            ..Self::default()
        }
    }

    /// Emptiness flag for `kind`.
    #[inline]
    pub fn queue_empty(&self, kind: QueueKind) -> Option<bool> {
        match kind {
            QueueKind::Upload => self.upload_queue_empty,
            QueueKind::Download => self.download_queue_empty,
        }
    }

    /// Sets the emptiness flag for `kind`.
    #[inline]
    pub fn set_queue_empty(&mut self, kind: QueueKind, empty: bool) {
        match kind {
            QueueKind::Upload => self.upload_queue_empty = Some(empty),
            QueueKind::Download => self.download_queue_empty = Some(empty),
        }
    }

    /// `true` if both queues are empty, treating unknown as empty.
    #[inline]
    pub fn all_queues_empty(&self) -> bool {
        QueueKind::ALL
            .iter()
            .all(|k| self.queue_empty(*k).unwrap_or(true))
    }

    /// Computes the status of `kind`. Pure and total.
    pub fn status(&self, kind: QueueKind) -> QueueStatus {
        if self.queue_empty(kind) == Some(true) {
            return QueueStatus::Empty;
        }

        if !self.is_host_process_primary || !self.is_ready || self.is_registered != Some(true) {
            return QueueStatus::NotReady;
        }

        if kind == QueueKind::Download {
            if self.downloads_suspended == Some(true) {
                return QueueStatus::Suspended;
            }
            if self.download_hit_out_of_space_error {
                return QueueStatus::LowDiskSpace;
            }
            if let (Some(available), Some(required)) =
                (self.available_disk_bytes, self.required_disk_bytes)
            {
                if available < required {
                    return QueueStatus::LowDiskSpace;
                }
            }
        }

        let needs_wifi = match kind {
            QueueKind::Upload => self.backup_on_cellular_allowed != Some(true),
            QueueKind::Download => true,
        };
        if needs_wifi && self.wifi_reachable != Some(true) {
            return QueueStatus::NoWifi;
        }

        if self
            .battery_level
            .is_some_and(|level| level < LOW_BATTERY_THRESHOLD)
        {
            return QueueStatus::LowBattery;
        }
        if self.low_power_mode == Some(true) {
            return QueueStatus::LowBattery;
        }

        QueueStatus::Running
    }
}
