//! Latest-value store for the dashboard slots

use crate::models::{
    current_timestamp, CyclePhase, DashboardSnapshot, HealthState, MetricsState, ServicesState,
};
use tokio::sync::watch;
use tracing::debug;

/// Owns the health, metrics, services and error slots. Every change is
/// published to subscribers as a full snapshot.
#[derive(Debug)]
pub struct StatusStore {
    state: watch::Sender<DashboardSnapshot>,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DashboardSnapshot::default());
        Self { state }
    }

    /// Copy of the current slots
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.state.subscribe()
    }

    pub fn set_phase(&self, phase: CyclePhase) {
        self.state.send_modify(|s| s.phase = phase);
    }

    pub fn commit_health(&self, health: HealthState) {
        debug!("Committing health status: {}", health.status);
        self.state.send_modify(|s| s.health = health);
    }

    pub fn commit_metrics(&self, metrics: MetricsState) {
        debug!(
            "Committing metrics - redis: {}, mongodb: {}",
            metrics.redis_connected, metrics.mongodb_connected
        );
        self.state.send_modify(|s| s.metrics = metrics);
    }

    pub fn commit_services(&self, services: ServicesState) {
        debug!("Committing {} services", services.services.len());
        self.state.send_modify(|s| s.services = Some(services));
    }

    /// Close a cycle. `error` replaces the error slot: `None` clears it.
    pub fn finish_cycle(&self, error: Option<String>) {
        let phase = if error.is_some() {
            CyclePhase::Failed
        } else {
            CyclePhase::Success
        };
        self.state.send_modify(|s| {
            s.error = error;
            s.phase = phase;
            s.last_cycle_at = Some(current_timestamp());
            s.completed_cycles += 1;
        });
    }
}
