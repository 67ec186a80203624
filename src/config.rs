//! # Gate configuration.
//!
//! Provides [`GateConfig`], the centralized settings for the status actor and its bus.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `command_capacity = 0` → clamped to 1
//! - `required_space_multiplier = 0` → clamped to 1

use std::borrow::Cow;

/// Global configuration for the status gate.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `command_capacity`: Pending commands queued for the actor (min 1)
/// - `battery_monitor_reason`: Label handed to the battery manager when monitoring begins
/// - `required_space_multiplier`: Free space needed, in units of the largest allowed download
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind by more than `bus_capacity` events observe
    /// `Lagged`; the observation controller recovers with a full refresh.
    pub bus_capacity: usize,

    /// Capacity of the actor command queue.
    ///
    /// Callers of [`StatusHandle`](crate::StatusHandle) wait when it is full.
    pub command_capacity: usize,

    /// Reason passed to [`BatteryManager::begin_monitoring`](crate::signals::BatteryManager::begin_monitoring).
    pub battery_monitor_reason: Cow<'static, str>,

    /// Minimum free space expressed as a multiple of the remote
    /// `max_attachment_download_size_bytes` value.
    pub required_space_multiplier: u64,
}

impl GateConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Returns the space multiplier clamped to a minimum of 1.
    #[inline]
    pub fn required_space_multiplier_clamped(&self) -> u64 {
        self.required_space_multiplier.max(1)
    }
}

impl Default for GateConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 64`
    /// - `battery_monitor_reason = "BackupDownloadQueue"`
    /// - `required_space_multiplier = 5`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            command_capacity: 64,
            battery_monitor_reason: Cow::Borrowed("BackupDownloadQueue"),
            required_space_multiplier: 5,
        }
    }
}
