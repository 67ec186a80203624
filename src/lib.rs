//! # backupgate
//!
//! **backupgate** decides, at any moment, whether the backup attachment upload
//! queue and the backup attachment download queue may run, and if not, why.
//!
//! It watches device and account signals (registration, network, battery,
//! power mode, free disk space, user preferences, the download suspension
//! flag) and turns them into one [`QueueStatus`] per [`QueueKind`]. Every
//! status change is broadcast so transfer workers and UI can react.
//!
//! ## Architecture
//! ```text
//!  host signals                         transfer workers / UI
//!  (AppReady, Reachability, ...)        (begin_observing_if_needed, job errors, ...)
//!        │                                          │
//!        │ publish_signal                           │ StatusHandle (async, any thread)
//!        ▼                                          ▼
//! ┌──────────────────────┐   observed    ┌───────────────────────────────────────┐
//! │ Bus (broadcast)      │──────────────►│ StatusActor (single confined task)    │
//! │ capacity: GateConfig │               │  └─ StatusMachine                     │
//! └──────────┬───────────┘◄──────────────│       ├─ observation (start/stop)     │
//!            │   QueueStatusChanged      │       ├─ Signals (host adapters)      │
//!            │   ObservationStarted/...  │       └─ StateStore (diff + publish)  │
//!            ▼                           └───────────────────────────────────────┘
//!   subscriber listener ──► SubscriberSet ──► worker per subscriber
//! ```
//!
//! ### Status precedence
//! ```text
//! Empty ► NotReady ► Suspended* ► LowDiskSpace* ► NoWifi ► LowBattery ► Running
//!                    (* download queue only)
//! ```
//!
//! ### Observation
//! Signal subscriptions (and the battery monitoring session) exist only while
//! at least one queue has work. They start together when the first queue turns
//! non-empty, after which every signal is re-read at once, and stop together
//! when both queues are empty.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                  |
//! |-------------------|----------------------------------------------------------|-------------------------------------|
//! | **Status**        | Per-queue admission decision.                            | [`QueueStatus`], [`Snapshot`]       |
//! | **Runtime**       | Confined state machine behind an async handle.           | [`StatusHandle`], [`GateBuilder`]   |
//! | **Host adapters** | Traits the embedding application implements.             | [`signals::SignalSources`]          |
//! | **Subscriber API**| Hook into status changes (logging, UI, custom).          | [`Subscribe`]                       |
//! | **Errors**        | Typed errors and out-of-space detection.                 | [`GateError`], [`is_out_of_space`]  |
//! | **Configuration** | Bus and queue capacities, battery monitor reason.        | [`GateConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber writing to `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use backupgate::{GateBuilder, GateConfig, QueueKind, QueueStatus};
//! # fn host_sources() -> backupgate::signals::SignalSources { unimplemented!() }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = GateBuilder::new(GateConfig::default(), host_sources()).build();
//!
//!     let status = gate.begin_observing_if_needed(QueueKind::Download).await?;
//!     if status == QueueStatus::Running {
//!         if let Some(status) = gate.quick_check_disk_space().await? {
//!             println!("downloads paused: {status}");
//!         }
//!     }
//!
//!     gate.shutdown();
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
pub mod signals;
mod state;
mod subscribers;

// ---- Public re-exports ----

pub use config::GateConfig;
pub use core::{GateBuilder, StatusHandle, StatusMachine};
pub use error::{GateError, SignalError, is_out_of_space};
pub use events::{Bus, Event, EventKind};
pub use state::{LOW_BATTERY_THRESHOLD, QueueKind, QueueStatus, Snapshot};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
