//! # External signal sources and their read-once adapters.
//!
//! The gate never talks to the platform directly. Every input arrives through
//! one of the narrow collaborator traits below, bundled in [`SignalSources`]
//! and wrapped by [`Signals`], which turns each source into a read-once
//! operation that absorbs failures into `None`.
//!
//! Change notifications for these sources are not part of the traits: hosts
//! publish signal [`Event`](crate::Event)s on the gate [`Bus`](crate::Bus), and
//! the observation controller re-reads the matching source when one arrives.
//!
//! ## Sources
//! | Trait               | Read                                   | Change signal                 |
//! |---------------------|----------------------------------------|-------------------------------|
//! | [`AppContext`]      | primary process, app ready             | `AppReady`                    |
//! | [`QueueStore`]      | emptiness, download suspension         | `DownloadSuspensionChanged`   |
//! | [`PreferenceStore`] | back up on cellular                    | `CellularPreferenceChanged`   |
//! | [`RegistrationState`] | registered                           | `RegistrationChanged`         |
//! | [`Reachability`]    | wifi reachable                         | `ReachabilityChanged`         |
//! | [`BatteryManager`]  | battery level (session), low power     | `BatteryLevelChanged`, `LowPowerModeChanged` |
//! | [`DiskSpace`]       | free bytes                             | none (`WillEnterForeground` refresh) |
//! | [`RemoteConfig`]    | max attachment download size           | none (read once)              |

mod adapter;
mod battery;
mod required;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;

use crate::error::SignalError;
use crate::state::QueueKind;

pub use adapter::{QueueProbe, Signals};
pub use battery::BatterySession;
pub use required::RequiredDiskSpace;

/// Process-level facts about the host application.
pub trait AppContext: Send + Sync + 'static {
    /// `true` only in the single process allowed to perform transfers.
    fn is_main_app(&self) -> bool;

    /// `true` once application startup completed.
    fn is_app_ready(&self) -> bool;
}

/// Transactional read handle over the persisted transfer queues.
///
/// All reads issued through one handle observe the same database state.
pub trait QueueRead {
    /// Number of pending records for `kind`, capped at `limit`.
    fn next_pending_count(&self, kind: QueueKind, limit: usize) -> Result<usize, SignalError>;

    /// `true` if `kind` has at least one record ready to run now.
    fn has_ready_work(&self, kind: QueueKind) -> Result<bool, SignalError>;

    /// `true` if the user paused `kind`.
    fn is_suspended(&self, kind: QueueKind) -> Result<bool, SignalError>;
}

/// Durable store holding pending transfer records.
pub trait QueueStore: Send + Sync + 'static {
    /// Opens a read transaction; it ends when the handle is dropped.
    fn read(&self) -> Result<Box<dyn QueueRead + '_>, SignalError>;
}

/// User preferences relevant to backups.
pub trait PreferenceStore: Send + Sync + 'static {
    /// Whether uploads may use cellular data.
    fn cellular_backup_allowed(&self) -> Result<bool, SignalError>;
}

/// Remotely controlled limits.
pub trait RemoteConfig: Send + Sync + 'static {
    /// Largest attachment the client may download, in bytes.
    fn max_attachment_download_size_bytes(&self) -> u64;
}

/// Account registration state.
pub trait RegistrationState: Send + Sync + 'static {
    fn is_registered(&self) -> bool;
}

/// Network reachability.
pub trait Reachability: Send + Sync + 'static {
    fn is_reachable_via_wifi(&self) -> bool;
}

/// An active battery-level monitoring session.
pub trait BatteryMonitor: Send + Sync + 'static {
    /// Level in `0.0 ..= 1.0`, `None` if unknown.
    fn battery_level(&self) -> Option<f32>;
}

/// Battery and power state.
///
/// Battery polling costs energy, so the level is only available through a
/// monitoring session that must be ended explicitly.
pub trait BatteryManager: Send + Sync + 'static {
    /// Starts OS-level battery polling.
    fn begin_monitoring(&self, reason: &str) -> Box<dyn BatteryMonitor>;

    /// Stops polling for a session returned by [`begin_monitoring`](Self::begin_monitoring).
    fn end_monitoring(&self, monitor: Box<dyn BatteryMonitor>);

    fn is_low_power_mode_enabled(&self) -> bool;
}

/// Filesystem free-space query for the attachments directory.
pub trait DiskSpace: Send + Sync + 'static {
    fn free_space_bytes(&self) -> Result<u64, SignalError>;
}

/// Every collaborator the gate reads from.
#[derive(Clone)]
pub struct SignalSources {
    pub app: Arc<dyn AppContext>,
    pub queues: Arc<dyn QueueStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub remote_config: Arc<dyn RemoteConfig>,
    pub registration: Arc<dyn RegistrationState>,
    pub reachability: Arc<dyn Reachability>,
    /// `None` on platforms without battery information.
    pub battery: Option<Arc<dyn BatteryManager>>,
    pub disk: Arc<dyn DiskSpace>,
}
