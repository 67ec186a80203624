use std::sync::Arc;

use super::{BatteryManager, BatteryMonitor};

/// RAII handle for a battery monitoring session.
///
/// The session ends exactly once: on [`end`](Self::end) or on drop,
/// whichever comes first.
pub struct BatterySession {
    manager: Arc<dyn BatteryManager>,
    monitor: Option<Box<dyn BatteryMonitor>>,
}

impl BatterySession {
    /// Begins monitoring through `manager`.
    pub fn begin(manager: Arc<dyn BatteryManager>, reason: &str) -> Self {
        let monitor = manager.begin_monitoring(reason);
        Self {
            manager,
            monitor: Some(monitor),
        }
    }

    /// Current level reported by the session.
    pub fn battery_level(&self) -> Option<f32> {
        self.monitor.as_ref().and_then(|m| m.battery_level())
    }

    /// Ends the session, releasing OS-level polling.
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            self.manager.end_monitoring(monitor);
        }
    }
}

impl Drop for BatterySession {
    fn drop(&mut self) {
        self.release();
    }
}
