//! Status data structures and utilities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Body of `GET /health`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthState {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            status: "loading...".to_string(),
            timestamp: None,
        }
    }
}

/// Body of `GET /metrics`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsState {
    pub redis_connected: bool,
    pub mongodb_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Body of `GET /services`, service name to link
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ServicesState {
    pub services: BTreeMap<String, String>,
}

/// Step of a fetch cycle
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CyclePhase {
    #[default]
    Idle,
    FetchingHealth,
    FetchingMetrics,
    FetchingServices,
    Success,
    Failed,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "IDLE"),
            CyclePhase::FetchingHealth => write!(f, "FETCHING_HEALTH"),
            CyclePhase::FetchingMetrics => write!(f, "FETCHING_METRICS"),
            CyclePhase::FetchingServices => write!(f, "FETCHING_SERVICES"),
            CyclePhase::Success => write!(f, "SUCCESS"),
            CyclePhase::Failed => write!(f, "FAILED"),
        }
    }
}

/// Latest known value of every slot, as handed to readers
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub health: HealthState,
    pub metrics: MetricsState,
    pub services: Option<ServicesState>,
    pub error: Option<String>,
    pub phase: CyclePhase,
    /// Unix seconds at which the last cycle finished, successfully or not
    pub last_cycle_at: Option<u64>,
    /// Cycles finished so far
    pub completed_cycles: u64,
}

/// Outcome of a single `run_cycle` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// Another cycle was still in flight
    Skipped,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
