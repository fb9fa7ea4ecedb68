//! Plain-text rendering of the dashboard

use crate::models::DashboardSnapshot;
use chrono::{DateTime, Local};
use std::fmt::Write;

const HEALTHY: &str = "[+]";
const UNHEALTHY: &str = "[-]";

/// Render a snapshot as the dashboard cards: error banner, health, metrics
/// and the services list.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Multi-Container Application Dashboard");
    let _ = writeln!(out);

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "== Error ==");
        let _ = writeln!(out, "  {}", error);
        let _ = writeln!(out);
    }

    let health = &snapshot.health;
    let _ = writeln!(out, "== System Health ==");
    let _ = writeln!(
        out,
        "  System Status: {} {}",
        indicator(health.is_healthy()),
        health.status
    );
    if let Some(updated) = health.timestamp.and_then(format_time) {
        let _ = writeln!(out, "  Last Updated: {}", updated);
    }
    let _ = writeln!(out);

    let metrics = &snapshot.metrics;
    let _ = writeln!(out, "== System Metrics ==");
    let _ = writeln!(out, "  Redis Connection {}", connection(metrics.redis_connected));
    let _ = writeln!(out, "  MongoDB Connection {}", connection(metrics.mongodb_connected));
    if let Some(updated) = metrics.timestamp.and_then(format_time) {
        let _ = writeln!(out, "  Last Updated: {}", updated);
    }

    if let Some(services) = &snapshot.services {
        let _ = writeln!(out);
        let _ = writeln!(out, "== Available Services ==");
        for (name, url) in &services.services {
            let _ = writeln!(out, "  {}: {}", capitalize(name), url);
        }
    }

    out
}

fn indicator(ok: bool) -> &'static str {
    if ok { HEALTHY } else { UNHEALTHY }
}

fn connection(connected: bool) -> String {
    if connected {
        format!("{} Connected", HEALTHY)
    } else {
        format!("{} Disconnected", UNHEALTHY)
    }
}

/// Local wall-clock time for a Unix seconds value. Zero means unset.
fn format_time(unix_seconds: f64) -> Option<String> {
    if !unix_seconds.is_finite() || unix_seconds <= 0.0 {
        return None;
    }
    let secs = unix_seconds.trunc() as i64;
    let nanos = (unix_seconds.fract() * 1e9) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
