//! # Event subscribers for the status gate.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver bus events to host-side observers.
//!
//! ## Architecture
//! ```text
//! StateStore / observation ── publish(Event) ──► Bus ──► listener task
//!                                                             │
//!                                                     SubscriberSet::emit
//!                                                             │
//!                                          ┌──────────────────┼──────────────┐
//!                                          ▼                  ▼              ▼
//!                                       LogWriter          UI badge       Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use backupgate::{Event, EventKind, QueueKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct DownloadBanner;
//!
//! #[async_trait]
//! impl Subscribe for DownloadBanner {
//!     async fn on_event(&self, event: &Event) {
//!         if event.is_status_change_for(QueueKind::Download) {
//!             // refresh the banner
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "download-banner"
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
