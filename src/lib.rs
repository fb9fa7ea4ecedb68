//! Status Dashboard Poller Library
//!
//! Polls a backend's health, metrics and services endpoints on a fixed
//! interval and keeps the latest value of each for display.

pub mod config;
pub mod errors;
pub mod forwarding;
pub mod models;
pub mod poller;
pub mod render;
pub mod store;
pub mod transport;

pub use config::Config;
pub use errors::{PollerError, Result};
pub use forwarding::{resolve_base_url, rewrite_services, ForwardingRule};
pub use models::{CycleOutcome, CyclePhase, DashboardSnapshot, HealthState, MetricsState, ServicesState};
pub use poller::{PollerHandle, StatusPoller};
pub use render::render_dashboard;
pub use transport::{HttpStatusClient, StatusSource};
