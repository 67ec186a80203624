//! Signal snapshot, status computation and the diffing state store.
//!
//! - [`QueueKind`], [`QueueStatus`] the public vocabulary
//! - [`Snapshot`] the latest observed value of every signal, with the pure
//!   [`Snapshot::status`] decision function
//! - [`StateStore`] owns one snapshot and publishes a notification for every
//!   queue kind whose status a mutation changed

mod snapshot;
mod status;
mod store;

pub use snapshot::{LOW_BATTERY_THRESHOLD, Snapshot};
pub use status::{QueueKind, QueueStatus};
pub use store::StateStore;
