//! Polling loop keeping the dashboard slots in step with the backend

use crate::config::Config;
use crate::errors::{PollerError, Result};
use crate::forwarding::rewrite_services;
use crate::models::{CycleOutcome, CyclePhase, DashboardSnapshot};
use crate::store::StatusStore;
use crate::transport::{HttpStatusClient, StatusSource};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Periodically fetches health, metrics and services and stores the latest
/// value of each
pub struct StatusPoller {
    config: Config,
    source: Arc<dyn StatusSource>,
    store: Arc<StatusStore>,
    poller_id: String,
    forward_host: Option<String>,
    /// A cycle is currently running
    in_flight: AtomicBool,
    /// A polling task is attached to this poller
    running: AtomicBool,
    /// Commits are accepted; cleared on teardown
    active: AtomicBool,
    stats: PollerStats,
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("poller_id", &self.poller_id)
            .field("config", &self.config)
            .field("forward_host", &self.forward_host)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

impl StatusPoller {
    /// Create a poller reading from the configured backend over HTTP
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(PollerError::Config)?;

        let client = HttpStatusClient::new(config.api_base_url(), config.http_timeout)?;
        Self::with_source(config, Arc::new(client))
    }

    /// Create a poller reading from an arbitrary status source
    pub fn with_source(config: Config, source: Arc<dyn StatusSource>) -> Result<Self> {
        config.validate().map_err(PollerError::Config)?;

        let forward_host = config.forward_host();

        Ok(Self {
            config,
            source,
            store: Arc::new(StatusStore::new()),
            poller_id: Uuid::new_v4().to_string(),
            forward_host,
            in_flight: AtomicBool::new(false),
            running: AtomicBool::new(false),
            active: AtomicBool::new(true),
            stats: PollerStats::default(),
        })
    }

    pub fn poller_id(&self) -> &str {
        &self.poller_id
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.store.subscribe()
    }

    /// Spawn the repeating fetch task. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> Result<PollerHandle> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PollerError::Other(format!(
                "poller {} is already running",
                self.poller_id
            )));
        }
        self.active.store(true, Ordering::Release);

        info!(
            "Starting status poller {} against {} every {}ms",
            self.poller_id,
            self.config.api_base_url(),
            self.config.poll_interval.as_millis()
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Arc::clone(&self);
        let task = tokio::spawn(async move {
            poller.poll_loop(shutdown_rx).await;
        });

        Ok(PollerHandle {
            poller: self,
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }

    async fn poll_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!("Abandoning in-flight cycle on shutdown");
                    break;
                }
                result = self.run_cycle() => {
                    match result {
                        Err(e) if e.is_cycle_failure() => warn!("Fetch cycle failed: {}", e),
                        Err(e) => error!("Fetch cycle error: {}", e),
                        Ok(_) => {}
                    }
                }
            }

            if self.is_active() {
                self.store.set_phase(CyclePhase::Idle);
            }
        }

        self.running.store(false, Ordering::Release);
        debug!("Polling task for {} exited", self.poller_id);
    }

    /// Fetch health, metrics and services in order. The first failure ends
    /// the cycle; values committed before it stay committed.
    #[instrument(skip(self), fields(poller_id = %self.poller_id))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.stats.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Previous cycle still in flight, skipping");
            return Ok(CycleOutcome::Skipped);
        }
        let _in_flight = InFlightGuard(&self.in_flight);

        self.stats.cycles_started.fetch_add(1, Ordering::Relaxed);

        match self.fetch_all().await {
            Ok(()) => {
                if self.is_active() {
                    self.store.finish_cycle(None);
                }
                self.stats.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
                debug!("Fetch cycle completed");
                Ok(CycleOutcome::Completed)
            }
            Err(e) => {
                if self.is_active() {
                    self.store.finish_cycle(Some(e.to_string()));
                }
                self.stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    async fn fetch_all(&self) -> Result<()> {
        self.enter(CyclePhase::FetchingHealth);
        let health = self.source.fetch_health().await?;
        if self.is_active() {
            self.store.commit_health(health);
        }

        self.enter(CyclePhase::FetchingMetrics);
        let metrics = self.source.fetch_metrics().await?;
        if self.is_active() {
            self.store.commit_metrics(metrics);
        }

        self.enter(CyclePhase::FetchingServices);
        let mut services = self.source.fetch_services().await?;
        if let Some(host) = &self.forward_host {
            services.services = rewrite_services(&services.services, host);
        }
        if self.is_active() {
            self.store.commit_services(services);
        }

        Ok(())
    }

    fn enter(&self, phase: CyclePhase) {
        debug!("Entering {}", phase);
        if self.is_active() {
            self.store.set_phase(phase);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get poller statistics
    pub fn stats(&self) -> PollerStatsSnapshot {
        PollerStatsSnapshot {
            poller_id: self.poller_id.clone(),
            cycles_started: self.stats.cycles_started.load(Ordering::Relaxed),
            cycles_succeeded: self.stats.cycles_succeeded.load(Ordering::Relaxed),
            cycles_failed: self.stats.cycles_failed.load(Ordering::Relaxed),
            cycles_skipped: self.stats.cycles_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Clears the in-flight flag when a cycle ends or is dropped mid-way
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owned handle to a running poller. Disposing (or dropping) it stops the
/// repeating task.
#[derive(Debug)]
pub struct PollerHandle {
    poller: Arc<StatusPoller>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn poller(&self) -> &Arc<StatusPoller> {
        &self.poller
    }

    /// Stop polling and wait for the task to exit. A cycle still in flight is
    /// abandoned without touching the slots.
    pub async fn dispose(mut self) {
        info!("Disposing status poller {}", self.poller.poller_id);

        self.poller.active.store(false, Ordering::Release);
        let _ = self.shutdown.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Polling task for {} ended abnormally: {}", self.poller.poller_id, e);
            }
        }

        let stats = self.poller.stats();
        info!(
            "Final poller stats - Cycles: {} started, {} succeeded, {} failed, {} skipped",
            stats.cycles_started, stats.cycles_succeeded, stats.cycles_failed, stats.cycles_skipped
        );
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.poller.active.store(false, Ordering::Release);
            let _ = self.shutdown.send(true);
        }
    }
}

#[derive(Debug, Default)]
struct PollerStats {
    cycles_started: AtomicU64,
    cycles_succeeded: AtomicU64,
    cycles_failed: AtomicU64,
    cycles_skipped: AtomicU64,
}

/// Poller statistics
#[derive(Debug, Clone)]
pub struct PollerStatsSnapshot {
    pub poller_id: String,
    pub cycles_started: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
}
