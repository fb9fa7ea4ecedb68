//! Error types for the status poller

use std::fmt;

pub type Result<T> = std::result::Result<T, PollerError>;

#[derive(Debug)]
pub enum PollerError {
    /// `/health` answered with a non-success status or an unreadable body
    HealthCheckFailed,

    /// `/metrics` answered with a non-success status or an unreadable body
    MetricsCheckFailed,

    /// `/services` answered with a non-success status or an unreadable body
    ServicesCheckFailed,

    /// Transport failed before any response arrived
    NetworkFailure(String),

    /// HTTP client could not be built
    Http(reqwest::Error),

    /// Configuration error
    Config(String),

    /// Generic error with message
    Other(String),
}

impl PollerError {
    /// True for the errors a fetch cycle can end with. These are reported
    /// through the error slot and never stop the polling loop.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(
            self,
            PollerError::HealthCheckFailed
                | PollerError::MetricsCheckFailed
                | PollerError::ServicesCheckFailed
                | PollerError::NetworkFailure(_)
        )
    }
}

impl fmt::Display for PollerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollerError::HealthCheckFailed => write!(f, "Health check failed"),
            PollerError::MetricsCheckFailed => write!(f, "Metrics check failed"),
            PollerError::ServicesCheckFailed => write!(f, "Services check failed"),
            PollerError::NetworkFailure(msg) => write!(f, "Network failure: {}", msg),
            PollerError::Http(err) => write!(f, "HTTP error: {}", err),
            PollerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PollerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PollerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollerError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PollerError {
    fn from(err: reqwest::Error) -> Self {
        PollerError::Http(err)
    }
}
