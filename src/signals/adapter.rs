//! # Read-once adapters over the signal sources.
//!
//! [`Signals`] is shared between the status actor and the off-actor fast
//! paths of [`StatusHandle`](crate::StatusHandle). Every read is synchronous,
//! and failures are absorbed (logged, then reported as unknown or as the
//! non-blocking default).

use std::sync::Arc;

use tracing::warn;

use super::{BatterySession, RequiredDiskSpace, SignalSources};
use crate::config::GateConfig;
use crate::state::QueueKind;

/// Result of one transactional look at the queue store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueProbe {
    pub upload_empty: bool,
    pub download_empty: bool,
    /// `None` if the suspension flag could not be read.
    pub downloads_suspended: Option<bool>,
}

impl QueueProbe {
    #[inline]
    pub fn all_empty(&self) -> bool {
        self.upload_empty && self.download_empty
    }
}

/// Read-once wrappers around every [`SignalSources`] member.
pub struct Signals {
    sources: SignalSources,
    required: RequiredDiskSpace,
    battery_reason: String,
}

impl Signals {
    pub fn new(sources: SignalSources, cfg: &GateConfig) -> Arc<Self> {
        let required = RequiredDiskSpace::new(
            Arc::clone(&sources.remote_config),
            cfg.required_space_multiplier_clamped(),
        );
        Arc::new(Self {
            sources,
            required,
            battery_reason: cfg.battery_monitor_reason.to_string(),
        })
    }

    pub fn is_main_app(&self) -> bool {
        self.sources.app.is_main_app()
    }

    pub fn is_app_ready(&self) -> bool {
        self.sources.app.is_app_ready()
    }

    pub fn is_registered(&self) -> bool {
        self.sources.registration.is_registered()
    }

    pub fn wifi_reachable(&self) -> bool {
        self.sources.reachability.is_reachable_via_wifi()
    }

    pub fn cellular_backup_allowed(&self) -> Option<bool> {
        match self.sources.preferences.cellular_backup_allowed() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, label = e.as_label(), "unable to read cellular backup preference");
                None
            }
        }
    }

    /// `None` when no battery manager is available.
    pub fn low_power_mode(&self) -> Option<bool> {
        self.sources
            .battery
            .as_ref()
            .map(|b| b.is_low_power_mode_enabled())
    }

    /// Free bytes in the attachments directory; `None` if the query failed.
    pub fn available_disk_space(&self) -> Option<u64> {
        match self.sources.disk.free_space_bytes() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, label = e.as_label(), "unable to determine disk space");
                None
            }
        }
    }

    /// Process-lifetime constant; see [`RequiredDiskSpace`].
    #[inline]
    pub fn required_disk_space(&self) -> u64 {
        self.required.get()
    }

    /// Begins a battery session, or `None` without a battery manager.
    pub fn begin_battery_monitoring(&self) -> Option<BatterySession> {
        self.sources
            .battery
            .as_ref()
            .map(|b| BatterySession::begin(Arc::clone(b), &self.battery_reason))
    }

    /// Reads the download suspension flag in its own transaction.
    pub fn downloads_suspended(&self) -> Option<bool> {
        let tx = match self.sources.queues.read() {
            Ok(tx) => tx,
            Err(e) => {
                warn!(error = %e, "unable to open queue read transaction");
                return None;
            }
        };
        match tx.is_suspended(QueueKind::Download) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "unable to read download suspension");
                None
            }
        }
    }

    /// Measures both queues and the suspension flag under one read transaction.
    ///
    /// Failed emptiness reads count as empty; a failed suspension read is unknown.
    pub fn probe_queues(&self) -> QueueProbe {
        let tx = match self.sources.queues.read() {
            Ok(tx) => tx,
            Err(e) => {
                warn!(error = %e, "unable to open queue read transaction");
                return QueueProbe {
                    upload_empty: true,
                    download_empty: true,
                    downloads_suspended: None,
                };
            }
        };

        let upload_empty = match tx.next_pending_count(QueueKind::Upload, 1) {
            Ok(n) => n == 0,
            Err(e) => {
                warn!(error = %e, "unable to read pending uploads");
                true
            }
        };
        let download_empty = match tx.has_ready_work(QueueKind::Download) {
            Ok(ready) => !ready,
            Err(e) => {
                warn!(error = %e, "unable to read ready downloads");
                true
            }
        };
        let downloads_suspended = match tx.is_suspended(QueueKind::Download) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "unable to read download suspension");
                None
            }
        };

        QueueProbe {
            upload_empty,
            download_empty,
            downloads_suspended,
        }
    }
}
