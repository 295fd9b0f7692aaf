//! Single-Flight Refresh Scheduler
//!
//! Owns the recurring fetch→extract→normalize→publish cycle. Scheduling is
//! re-arm-after-completion: the next tick is armed only once the current
//! cycle has fully finished, success or failure, so a slow fetch can never
//! pile up overlapping requests. Ownership and the in-flight guard live in
//! the [`RefreshCoordinator`]; results go out over a `watch` channel that
//! passive (non-owner) instances render from.

mod coordinator;

pub use coordinator::RefreshCoordinator;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex, Notify};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{DataServiceClient, FetchMode};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::signal::{locate_signal, normalize_series};

/// Where the displayed series came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalSource {
    pub location: String,
    pub channel: String,
}

/// Display-ready refresh state, rebuilt on every successful cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub state: Option<String>,
    pub trend: Option<String>,
    pub score: Option<f64>,
    /// Normalized trend points, each in [0, 100], bounded by the history cap.
    pub history: Vec<u8>,
    pub source: Option<SignalSource>,
    /// Error recorded by the most recent cycle, if it failed.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct RefreshScheduler {
    coordinator: Arc<RefreshCoordinator>,
    client: Arc<DataServiceClient>,
    config: MonitorConfig,
    snapshot_tx: watch::Sender<Snapshot>,
    stop_signal: Notify,
    /// Large full payload fetched once and reused when summaries carry no
    /// usable signals. Only the active cycle writes it.
    full_payload: Mutex<Option<Arc<Value>>>,
}

impl RefreshScheduler {
    pub fn new(
        client: Arc<DataServiceClient>,
        coordinator: Arc<RefreshCoordinator>,
        config: MonitorConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        Self {
            coordinator,
            client,
            config,
            snapshot_tx,
            stop_signal: Notify::new(),
            full_payload: Mutex::new(None),
        }
    }

    /// Receiver for published snapshots; passive instances render from this
    /// without running any timer of their own.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn latest(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Begin the recurring refresh cycle for `instance`.
    ///
    /// Returns `false` without starting anything when a different instance
    /// already owns the schedule; the caller then renders passively from
    /// [`subscribe`](Self::subscribe).
    pub fn start(self: &Arc<Self>, instance: Uuid) -> bool {
        let mounted = self.coordinator.register_instance();
        debug!(%instance, instances = mounted, "dashboard instance mounted");

        if !self.coordinator.try_become_owner(instance) {
            return false;
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.run_loop(instance).await;
        });
        true
    }

    /// Tear down `instance`. The owner relinquishes ownership and cancels
    /// the pending tick; a non-owner only decrements its own bookkeeping.
    pub fn stop(&self, instance: Uuid) {
        if self.coordinator.release_ownership(instance) {
            self.stop_signal.notify_waiters();
            info!(%instance, "refresh schedule stopped");
        }
        let remaining = self.coordinator.unregister_instance();
        debug!(%instance, instances = remaining, "dashboard instance unmounted");
    }

    async fn run_loop(&self, instance: Uuid) {
        info!(
            %instance,
            interval_secs = self.config.poll_interval.as_secs_f64(),
            subject = %self.config.subject,
            "refresh schedule started"
        );

        loop {
            if !self.coordinator.is_owner(instance) {
                break;
            }

            if self.coordinator.try_acquire_cycle() {
                self.run_cycle().await;
                self.coordinator.release_cycle();
            } else {
                warn!(%instance, "previous refresh cycle still in flight, skipping this tick");
            }

            if !self.coordinator.is_owner(instance) {
                break;
            }

            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                _ = self.stop_signal.notified() => break,
            }
        }

        debug!(%instance, "refresh loop exited");
    }

    /// One full cycle: fetch, extract, normalize, publish. Failures are
    /// recorded in the snapshot and never stop the schedule.
    async fn run_cycle(&self) {
        match self.refresh_once().await {
            Ok(next) => {
                self.snapshot_tx.send_replace(next);
            }
            Err(err) => {
                warn!(error = %err, "refresh cycle failed");
                let clear_history = err.is_soft();
                self.snapshot_tx.send_modify(|snapshot| {
                    if clear_history {
                        snapshot.history.clear();
                        snapshot.source = None;
                    }
                    snapshot.error = Some(err.to_string());
                    snapshot.updated_at = Some(Utc::now());
                });
            }
        }
    }

    async fn refresh_once(&self) -> Result<Snapshot, MonitorError> {
        let mut cached = self.full_payload.lock().await;
        let mode = if cached.is_some() {
            FetchMode::Summary
        } else {
            FetchMode::Full
        };

        let payload = self
            .client
            .fetch_participant(&self.config.subject, None, mode)
            .await?;
        let payload = Arc::new(payload);

        if mode == FetchMode::Full {
            if payload.get("available_signals").is_none() {
                return Err(MonitorError::Payload(
                    "participant payload is missing 'available_signals'".to_string(),
                ));
            }
            *cached = Some(Arc::clone(&payload));
            debug!("cached full participant payload");
        }

        let state = field_str(&payload, "state");
        let trend = field_str(&payload, "trend");
        let score = payload.get("score").and_then(Value::as_f64);

        // fresh signals first, cached full payload as the fallback source
        let located = payload
            .get("available_signals")
            .and_then(|signals| locate_signal(signals, &self.config.preferences).ok())
            .or_else(|| {
                cached
                    .as_ref()
                    .and_then(|full| full.get("available_signals"))
                    .and_then(|signals| locate_signal(signals, &self.config.preferences).ok())
            })
            .ok_or(MonitorError::NoUsableSignal)?;

        let history = normalize_series(&located.samples, self.config.history_cap);

        Ok(Snapshot {
            state,
            trend,
            score,
            history,
            source: Some(SignalSource {
                location: located.location,
                channel: located.channel,
            }),
            error: None,
            updated_at: Some(Utc::now()),
        })
    }
}

fn field_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}
