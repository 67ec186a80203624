//! In-memory collaborators for tests.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    AppContext, BatteryManager, BatteryMonitor, DiskSpace, PreferenceStore, QueueRead, QueueStore,
    Reachability, RegistrationState, RemoteConfig, SignalSources, Signals,
};
use crate::config::GateConfig;
use crate::error::SignalError;
use crate::state::QueueKind;

/// One object standing in for every platform collaborator.
///
/// Defaults describe a healthy device: main app, ready, registered, on wifi,
/// 80% battery, 10 000 free bytes, 100-byte max download (500 required),
/// both queues empty.
pub(crate) struct FakeEnv {
    main_app: AtomicBool,
    app_ready: AtomicBool,
    registered: AtomicBool,
    wifi: AtomicBool,
    cellular: AtomicBool,
    low_power: AtomicBool,
    battery_level: Arc<Mutex<Option<f32>>>,
    free_space: Mutex<Option<u64>>,
    max_download: AtomicU64,
    pending_uploads: AtomicUsize,
    ready_downloads: AtomicBool,
    suspended: AtomicBool,
    fail_queue_reads: AtomicBool,
    fail_preference_reads: AtomicBool,

    battery_begun: AtomicUsize,
    battery_ended: AtomicUsize,
    disk_reads: AtomicUsize,
}

struct FakeMonitor {
    level: Arc<Mutex<Option<f32>>>,
}

impl BatteryMonitor for FakeMonitor {
    fn battery_level(&self) -> Option<f32> {
        *self.level.lock().unwrap()
    }
}

struct FakeRead<'a> {
    env: &'a FakeEnv,
}

impl QueueRead for FakeRead<'_> {
    fn next_pending_count(&self, kind: QueueKind, limit: usize) -> Result<usize, SignalError> {
        self.env.check_queue_read()?;
        match kind {
            QueueKind::Upload => Ok(self.env.pending_uploads.load(Ordering::SeqCst).min(limit)),
            QueueKind::Download => Ok(usize::from(self.env.ready_downloads.load(Ordering::SeqCst))),
        }
    }

    fn has_ready_work(&self, kind: QueueKind) -> Result<bool, SignalError> {
        self.env.check_queue_read()?;
        match kind {
            QueueKind::Upload => Ok(self.env.pending_uploads.load(Ordering::SeqCst) > 0),
            QueueKind::Download => Ok(self.env.ready_downloads.load(Ordering::SeqCst)),
        }
    }

    fn is_suspended(&self, kind: QueueKind) -> Result<bool, SignalError> {
        self.env.check_queue_read()?;
        match kind {
            QueueKind::Upload => Ok(false),
            QueueKind::Download => Ok(self.env.suspended.load(Ordering::SeqCst)),
        }
    }
}

impl FakeEnv {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            main_app: AtomicBool::new(true),
            app_ready: AtomicBool::new(true),
            registered: AtomicBool::new(true),
            wifi: AtomicBool::new(true),
            cellular: AtomicBool::new(false),
            low_power: AtomicBool::new(false),
            battery_level: Arc::new(Mutex::new(Some(0.8))),
            free_space: Mutex::new(Some(10_000)),
            max_download: AtomicU64::new(100),
            pending_uploads: AtomicUsize::new(0),
            ready_downloads: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            fail_queue_reads: AtomicBool::new(false),
            fail_preference_reads: AtomicBool::new(false),
            battery_begun: AtomicUsize::new(0),
            battery_ended: AtomicUsize::new(0),
            disk_reads: AtomicUsize::new(0),
        })
    }

    pub(crate) fn sources(self: &Arc<Self>) -> SignalSources {
        SignalSources {
            app: self.clone(),
            queues: self.clone(),
            preferences: self.clone(),
            remote_config: self.clone(),
            registration: self.clone(),
            reachability: self.clone(),
            battery: Some(self.clone()),
            disk: self.clone(),
        }
    }

    pub(crate) fn signals(self: &Arc<Self>) -> Arc<Signals> {
        Signals::new(self.sources(), &GateConfig::default())
    }

    fn check_queue_read(&self) -> Result<(), SignalError> {
        if self.fail_queue_reads.load(Ordering::SeqCst) {
            return Err(SignalError::store("database locked"));
        }
        Ok(())
    }

    pub(crate) fn set_main_app(&self, v: bool) {
        self.main_app.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_app_ready(&self, v: bool) {
        self.app_ready.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_registered(&self, v: bool) {
        self.registered.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_wifi(&self, v: bool) {
        self.wifi.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_cellular(&self, v: bool) {
        self.cellular.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_low_power(&self, v: bool) {
        self.low_power.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_battery_level(&self, v: Option<f32>) {
        *self.battery_level.lock().unwrap() = v;
    }
    /// `None` makes the free-space query fail.
    pub(crate) fn set_free_space(&self, v: Option<u64>) {
        *self.free_space.lock().unwrap() = v;
    }
    pub(crate) fn set_max_download_size(&self, v: u64) {
        self.max_download.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_pending_uploads(&self, n: usize) {
        self.pending_uploads.store(n, Ordering::SeqCst);
    }
    pub(crate) fn set_ready_downloads(&self, v: bool) {
        self.ready_downloads.store(v, Ordering::SeqCst);
    }
    pub(crate) fn set_suspended(&self, v: bool) {
        self.suspended.store(v, Ordering::SeqCst);
    }
    pub(crate) fn fail_queue_reads(&self, v: bool) {
        self.fail_queue_reads.store(v, Ordering::SeqCst);
    }
    pub(crate) fn fail_preference_reads(&self, v: bool) {
        self.fail_preference_reads.store(v, Ordering::SeqCst);
    }

    pub(crate) fn active_battery_sessions(&self) -> usize {
        self.battery_begun.load(Ordering::SeqCst) - self.battery_ended.load(Ordering::SeqCst)
    }
    pub(crate) fn battery_sessions_begun(&self) -> usize {
        self.battery_begun.load(Ordering::SeqCst)
    }
    pub(crate) fn battery_sessions_ended(&self) -> usize {
        self.battery_ended.load(Ordering::SeqCst)
    }
    pub(crate) fn disk_reads(&self) -> usize {
        self.disk_reads.load(Ordering::SeqCst)
    }
}

impl AppContext for FakeEnv {
    fn is_main_app(&self) -> bool {
        self.main_app.load(Ordering::SeqCst)
    }
    fn is_app_ready(&self) -> bool {
        self.app_ready.load(Ordering::SeqCst)
    }
}

impl QueueStore for FakeEnv {
    fn read(&self) -> Result<Box<dyn QueueRead + '_>, SignalError> {
        self.check_queue_read()?;
        Ok(Box::new(FakeRead { env: self }))
    }
}

impl PreferenceStore for FakeEnv {
    fn cellular_backup_allowed(&self) -> Result<bool, SignalError> {
        if self.fail_preference_reads.load(Ordering::SeqCst) {
            return Err(SignalError::store("preferences unavailable"));
        }
        Ok(self.cellular.load(Ordering::SeqCst))
    }
}

impl RemoteConfig for FakeEnv {
    fn max_attachment_download_size_bytes(&self) -> u64 {
        self.max_download.load(Ordering::SeqCst)
    }
}

impl RegistrationState for FakeEnv {
    fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}

impl Reachability for FakeEnv {
    fn is_reachable_via_wifi(&self) -> bool {
        self.wifi.load(Ordering::SeqCst)
    }
}

impl BatteryManager for FakeEnv {
    fn begin_monitoring(&self, _reason: &str) -> Box<dyn BatteryMonitor> {
        self.battery_begun.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeMonitor {
            level: Arc::clone(&self.battery_level),
        })
    }

    fn end_monitoring(&self, _monitor: Box<dyn BatteryMonitor>) {
        self.battery_ended.fetch_add(1, Ordering::SeqCst);
    }

    fn is_low_power_mode_enabled(&self) -> bool {
        self.low_power.load(Ordering::SeqCst)
    }
}

impl DiskSpace for FakeEnv {
    fn free_space_bytes(&self) -> Result<u64, SignalError> {
        self.disk_reads.fetch_add(1, Ordering::SeqCst);
        match *self.free_space.lock().unwrap() {
            Some(bytes) => Ok(bytes),
            None => Err(SignalError::Io(io::Error::other("statfs failed"))),
        }
    }
}
