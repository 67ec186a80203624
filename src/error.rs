//! Error types used by the status gate and its collaborators.
//!
//! - [`GateError`] errors raised by the [`StatusHandle`](crate::StatusHandle) itself.
//! - [`SignalError`] errors raised by collaborator reads (queue store, preferences, disk).
//!
//! Neither type ever turns into a status-query failure: signal errors are absorbed
//! into "unknown" snapshot fields, and gate errors only appear once the actor stopped.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// # Errors produced by the status handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// The status actor has stopped (shutdown requested or runtime dropped).
    #[error("status actor closed")]
    Closed,
}

impl GateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use backupgate::GateError;
    ///
    /// assert_eq!(GateError::Closed.as_label(), "gate_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GateError::Closed => "gate_closed",
        }
    }
}

/// # Errors produced by collaborator reads.
///
/// Returned by [`QueueStore`](crate::signals::QueueStore),
/// [`PreferenceStore`](crate::signals::PreferenceStore) and
/// [`DiskSpace`](crate::signals::DiskSpace) implementations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SignalError {
    /// Filesystem query failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Persistent store read failed.
    #[error("store read failed: {0}")]
    Store(String),
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::Io(_) => "signal_io",
            SignalError::Store(_) => "signal_store",
        }
    }

    /// Convenience constructor for store failures.
    pub fn store(msg: impl Into<String>) -> Self {
        SignalError::Store(msg.into())
    }
}

/// Returns `true` if `err` (or any error in its `source()` chain) is an
/// out-of-space write failure.
///
/// Only [`io::ErrorKind::StorageFull`] is recognized; every other failure is
/// invisible to the status computation.
///
/// # Example
/// ```
/// use std::io;
/// use backupgate::is_out_of_space;
///
/// let full = io::Error::from(io::ErrorKind::StorageFull);
/// assert!(is_out_of_space(&full));
///
/// let other = io::Error::from(io::ErrorKind::PermissionDenied);
/// assert!(!is_out_of_space(&other));
/// ```
pub fn is_out_of_space(err: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        if let Some(io) = e.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::StorageFull {
                return true;
            }
        }
        cur = e.source();
    }
    false
}
