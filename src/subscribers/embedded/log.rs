//! # LogWriter: gate events to `tracing`
//!
//! ## Example output
//! ```text
//! [status] queue=upload status=no_wifi
//! [observation-started]
//! [signal] kind=ReachabilityChanged
//! [status] queue=upload status=running
//! [observation-stopped]
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::QueueStatusChanged => {
                info!(
                    queue = e.queue.map(|q| q.as_label()),
                    status = e.status.map(|s| s.as_label()),
                    "[status]"
                );
            }
            EventKind::ObservationStarted => info!("[observation-started]"),
            EventKind::ObservationStopped => info!("[observation-stopped]"),
            EventKind::SubscriberOverflow => {
                warn!(
                    subscriber = e.source.as_deref().unwrap_or("unknown"),
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "[subscriber-overflow]"
                );
            }
            EventKind::SubscriberPanicked => {
                warn!(
                    subscriber = e.source.as_deref().unwrap_or("unknown"),
                    info = e.reason.as_deref().unwrap_or("unknown"),
                    "[subscriber-panicked]"
                );
            }
            kind => debug!(?kind, "[signal]"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
