use std::sync::{Arc, OnceLock};

use super::RemoteConfig;

/// Minimum free space needed to keep downloading.
///
/// Computed once from remote configuration and cached for the lifetime of
/// the value; later config changes are not picked up. Safe to call from any
/// thread.
pub struct RequiredDiskSpace {
    remote: Arc<dyn RemoteConfig>,
    multiplier: u64,
    value: OnceLock<u64>,
}

impl RequiredDiskSpace {
    pub fn new(remote: Arc<dyn RemoteConfig>, multiplier: u64) -> Self {
        Self {
            remote,
            multiplier,
            value: OnceLock::new(),
        }
    }

    /// `multiplier × max_attachment_download_size_bytes`, saturating.
    pub fn get(&self) -> u64 {
        *self.value.get_or_init(|| {
            self.remote
                .max_attachment_download_size_bytes()
                .saturating_mul(self.multiplier)
        })
    }
}
