use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use super::{actor::StatusActor, handle::StatusHandle, machine::StatusMachine};
use crate::{
    config::GateConfig,
    events::Bus,
    signals::{SignalSources, Signals},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for wiring the status gate.
pub struct GateBuilder {
    cfg: GateConfig,
    sources: SignalSources,
    subscribers: Vec<Arc<dyn Subscribe>>,
    token: Option<CancellationToken>,
}

impl GateBuilder {
    /// Creates a new builder with the given configuration and signal sources.
    pub fn new(cfg: GateConfig, sources: SignalSources) -> Self {
        Self {
            cfg,
            sources,
            subscribers: Vec::new(),
            token: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive every bus event (signals, status changes,
    /// observation transitions) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Ties the gate lifetime to an external token (e.g. process shutdown).
    ///
    /// The gate runs on a child of `token`: cancelling it stops the gate, but
    /// the gate stopping never cancels `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Spawns the status actor (and the subscriber listener, if any) and
    /// returns a handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> StatusHandle {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let signals = Signals::new(self.sources, &self.cfg);
        let token = self
            .token
            .map(|parent| parent.child_token())
            .unwrap_or_default();

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_subscriber_listener(&bus, subs, token.clone());
        }

        let machine = StatusMachine::new(Arc::clone(&signals), bus.clone());
        let lifecycle = bus.subscribe();
        let (tx, rx) = mpsc::channel(self.cfg.command_capacity_clamped());

        let actor = StatusActor::new(machine, rx, lifecycle);
        tokio::spawn(actor.run(token.clone()));

        StatusHandle::new(tx, signals, bus, token)
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled,
/// then drains the subscriber workers.
fn spawn_subscriber_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        subs.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use tokio::time::timeout;

    use super::*;
    use crate::events::{Event, EventKind};
    use crate::error::GateError;
    use crate::signals::fake::FakeEnv;
    use crate::state::{QueueKind, QueueStatus};

    fn gate(env: &Arc<FakeEnv>) -> StatusHandle {
        GateBuilder::new(GateConfig::default(), env.sources()).build()
    }

    /// Waits for the next status change of `kind`, skipping everything else.
    async fn next_change(rx: &mut broadcast::Receiver<Event>, kind: QueueKind) -> QueueStatus {
        timeout(Duration::from_secs(2), async {
            loop {
                let ev = rx.recv().await.unwrap();
                if ev.is_status_change_for(kind) {
                    return ev.status.unwrap();
                }
            }
        })
        .await
        .expect("no status change")
    }

    #[tokio::test]
    async fn test_begin_observing_and_query() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        let h = gate(&env);

        assert_eq!(
            h.begin_observing_if_needed(QueueKind::Upload).await.unwrap(),
            QueueStatus::Running
        );
        assert_eq!(
            h.current_status(QueueKind::Download).await.unwrap(),
            QueueStatus::Empty
        );
        assert!(h.is_observing().await.unwrap());
    }

    #[tokio::test]
    async fn test_published_signal_reaches_machine() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        env.set_wifi(false);
        let h = gate(&env);

        assert_eq!(
            h.begin_observing_if_needed(QueueKind::Upload).await.unwrap(),
            QueueStatus::NoWifi
        );
        let mut rx = h.subscribe();

        env.set_cellular(true);
        h.publish_signal(EventKind::CellularPreferenceChanged);

        assert_eq!(next_change(&mut rx, QueueKind::Upload).await, QueueStatus::Running);
        assert_eq!(
            h.current_status(QueueKind::Upload).await.unwrap(),
            QueueStatus::Running
        );
    }

    #[tokio::test]
    async fn test_app_ready_observed_before_any_work() {
        let env = FakeEnv::new();
        env.set_app_ready(false);
        let h = gate(&env);
        assert!(!h.snapshot().await.unwrap().is_ready);

        env.set_app_ready(true);
        h.publish_signal(EventKind::AppReady);

        timeout(Duration::from_secs(2), async {
            while !h.snapshot().await.unwrap().is_ready {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("readiness never applied");
    }

    #[tokio::test]
    async fn test_quick_check_skips_hop_when_space_is_fine() {
        let env = FakeEnv::new();
        env.set_ready_downloads(true);
        let h = gate(&env);
        h.begin_observing_if_needed(QueueKind::Download).await.unwrap();
        let before = h.snapshot().await.unwrap();

        assert_eq!(h.quick_check_disk_space().await.unwrap(), None);
        assert_eq!(h.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_quick_check_refreshes_when_short() {
        let env = FakeEnv::new();
        env.set_ready_downloads(true);
        let h = gate(&env);
        h.begin_observing_if_needed(QueueKind::Download).await.unwrap();

        env.set_free_space(Some(10));
        assert_eq!(
            h.quick_check_disk_space().await.unwrap(),
            Some(QueueStatus::LowDiskSpace)
        );
        assert_eq!(h.snapshot().await.unwrap().available_disk_bytes, Some(10));
    }

    #[tokio::test]
    async fn test_quick_check_unknown_space_is_none() {
        let env = FakeEnv::new();
        env.set_free_space(None);
        let h = gate(&env);
        assert_eq!(h.quick_check_disk_space().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_job_errors_through_handle() {
        let env = FakeEnv::new();
        env.set_ready_downloads(true);
        let h = gate(&env);
        h.begin_observing_if_needed(QueueKind::Download).await.unwrap();

        let full = io::Error::from(io::ErrorKind::StorageFull);
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);

        assert_eq!(h.job_did_experience_error(QueueKind::Upload, &full).await.unwrap(), None);
        assert_eq!(
            h.job_did_experience_error(QueueKind::Download, &refused).await.unwrap(),
            None
        );
        assert!(!h.snapshot().await.unwrap().download_hit_out_of_space_error);

        assert_eq!(
            h.job_did_experience_error(QueueKind::Download, &full).await.unwrap(),
            Some(QueueStatus::LowDiskSpace)
        );
        assert!(h.snapshot().await.unwrap().download_hit_out_of_space_error);

        h.reattempt_disk_space_checks().await.unwrap();
        assert_eq!(
            h.current_status(QueueKind::Download).await.unwrap(),
            QueueStatus::Running
        );
    }

    #[tokio::test]
    async fn test_anyhow_wrapped_out_of_space() {
        let env = FakeEnv::new();
        env.set_ready_downloads(true);
        let h = gate(&env);
        h.begin_observing_if_needed(QueueKind::Download).await.unwrap();

        let err = anyhow::Error::new(io::Error::from(io::ErrorKind::StorageFull))
            .context("writing attachment file");
        assert_eq!(
            h.job_did_experience_error(QueueKind::Download, err.as_ref())
                .await
                .unwrap(),
            Some(QueueStatus::LowDiskSpace)
        );
    }

    #[tokio::test]
    async fn test_low_disk_scenario_recovers_after_reattempt() {
        let env = FakeEnv::new();
        env.set_ready_downloads(true);
        env.set_free_space(Some(100));
        let h = gate(&env);

        assert_eq!(
            h.begin_observing_if_needed(QueueKind::Download).await.unwrap(),
            QueueStatus::LowDiskSpace
        );

        env.set_free_space(Some(1_000));
        h.reattempt_disk_space_checks().await.unwrap();
        assert_eq!(
            h.current_status(QueueKind::Download).await.unwrap(),
            QueueStatus::Running
        );
    }

    #[tokio::test]
    async fn test_observation_scenario() {
        let env = FakeEnv::new();
        let h = gate(&env);

        h.begin_observing_if_needed(QueueKind::Upload).await.unwrap();
        assert!(!h.is_observing().await.unwrap());
        assert_eq!(env.active_battery_sessions(), 0);

        env.set_pending_uploads(1);
        h.begin_observing_if_needed(QueueKind::Upload).await.unwrap();
        assert!(h.is_observing().await.unwrap());
        assert_eq!(env.active_battery_sessions(), 1);
        assert_eq!(h.snapshot().await.unwrap().wifi_reachable, Some(true));

        env.set_pending_uploads(0);
        h.did_empty_queue(QueueKind::Upload).await.unwrap();
        assert!(!h.is_observing().await.unwrap());
        assert_eq!(env.active_battery_sessions(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_releases_and_closes() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        let h = gate(&env);
        h.begin_observing_if_needed(QueueKind::Upload).await.unwrap();
        assert_eq!(env.active_battery_sessions(), 1);

        h.shutdown();
        timeout(Duration::from_secs(2), async {
            while !h.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("actor did not stop");

        assert_eq!(env.active_battery_sessions(), 0);
        assert_eq!(
            h.current_status(QueueKind::Upload).await,
            Err(GateError::Closed)
        );
        // disk minimum needs no actor
        assert_eq!(h.minimum_required_disk_space(), 500);
    }

    #[tokio::test]
    async fn test_fast_paths_answer_without_the_actor() {
        let env = FakeEnv::new();
        let h = gate(&env);
        h.shutdown();
        timeout(Duration::from_secs(2), async {
            while !h.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("actor did not stop");

        let reads = env.disk_reads();
        assert_eq!(h.quick_check_disk_space().await, Ok(None));
        assert_eq!(env.disk_reads(), reads + 1);

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        let full = io::Error::from(io::ErrorKind::StorageFull);
        assert_eq!(
            h.job_did_experience_error(QueueKind::Download, &refused).await,
            Ok(None)
        );
        assert_eq!(
            h.job_did_experience_error(QueueKind::Upload, &full).await,
            Ok(None)
        );

        // these need the actor
        assert_eq!(
            h.job_did_experience_error(QueueKind::Download, &full).await,
            Err(GateError::Closed)
        );
        env.set_free_space(Some(10));
        assert_eq!(h.quick_check_disk_space().await, Err(GateError::Closed));
    }

    #[tokio::test]
    async fn test_lagged_observation_refreshes_every_signal() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        let cfg = GateConfig {
            bus_capacity: 2,
            ..GateConfig::default()
        };
        let h = GateBuilder::new(cfg, env.sources()).build();
        assert_eq!(
            h.begin_observing_if_needed(QueueKind::Upload).await.unwrap(),
            QueueStatus::Running
        );

        // The reachability signal is overwritten by the burst before the
        // actor runs; only the lag refresh can pick up the new value.
        env.set_wifi(false);
        h.publish_signal(EventKind::ReachabilityChanged);
        for _ in 0..8 {
            h.publish_signal(EventKind::BatteryLevelChanged);
        }

        timeout(Duration::from_secs(2), async {
            while h.current_status(QueueKind::Upload).await.unwrap() != QueueStatus::NoWifi {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("lag did not trigger a refresh");
    }

    #[tokio::test]
    async fn test_lagged_lifecycle_rereads_readiness() {
        let env = FakeEnv::new();
        env.set_app_ready(false);
        let cfg = GateConfig {
            bus_capacity: 2,
            ..GateConfig::default()
        };
        let h = GateBuilder::new(cfg, env.sources()).build();
        assert!(!h.snapshot().await.unwrap().is_ready);

        // No AppReady in the burst: readiness is picked up through the lag.
        env.set_app_ready(true);
        for _ in 0..8 {
            h.publish_signal(EventKind::BatteryLevelChanged);
        }

        timeout(Duration::from_secs(2), async {
            while !h.snapshot().await.unwrap().is_ready {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("readiness never re-read");
    }

    #[tokio::test]
    async fn test_external_token_stops_gate_but_is_not_cancelled_by_it() {
        let env = FakeEnv::new();
        let parent = CancellationToken::new();

        let h = GateBuilder::new(GateConfig::default(), env.sources())
            .with_cancellation(parent.clone())
            .build();
        h.shutdown();
        timeout(Duration::from_secs(2), async {
            while !h.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("actor did not stop");
        assert!(!parent.is_cancelled());

        let h = GateBuilder::new(GateConfig::default(), env.sources())
            .with_cancellation(parent.clone())
            .build();
        parent.cancel();
        timeout(Duration::from_secs(2), async {
            while !h.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("parent cancellation did not stop the actor");
    }

    struct Recorder {
        seen: Mutex<Vec<(QueueKind, QueueStatus)>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::QueueStatusChanged {
                if let (Some(q), Some(s)) = (ev.queue, ev.status) {
                    self.seen.lock().unwrap().push((q, s));
                }
            }
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_status_changes() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let h = GateBuilder::new(GateConfig::default(), env.sources())
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .build();

        h.begin_observing_if_needed(QueueKind::Upload).await.unwrap();

        timeout(Duration::from_secs(2), async {
            loop {
                if recorder
                    .seen
                    .lock()
                    .unwrap()
                    .contains(&(QueueKind::Upload, QueueStatus::Running))
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscriber never saw the change");
    }

    #[tokio::test]
    async fn test_dropping_every_handle_releases_subscribers() {
        let env = FakeEnv::new();
        env.set_pending_uploads(1);
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let h = GateBuilder::new(GateConfig::default(), env.sources())
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .build();
        h.begin_observing_if_needed(QueueKind::Upload).await.unwrap();
        let other = h.clone();

        drop(h);
        drop(other);

        timeout(Duration::from_secs(2), async {
            while Arc::strong_count(&recorder) > 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscriber still held after every handle was dropped");
        assert_eq!(env.active_battery_sessions(), 0);
    }
}
