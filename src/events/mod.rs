//! Gate events: types and broadcast bus.
//!
//! One bus carries both directions of traffic:
//! - **Inbound signals** published by the host (registration, reachability,
//!   battery, foreground, suspension, app readiness) and consumed by the
//!   observation controller.
//! - **Outbound notifications** published by the state store
//!   (`QueueStatusChanged`) and the observation controller.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
