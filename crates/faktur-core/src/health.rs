//! Service health reporting types.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Coarse health status of an external capability (OCR engine, database).
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Service responds within expected bounds.
    #[default]
    Healthy,
    /// Service responds but with degraded latency or partial capability.
    Degraded,
    /// Service is unreachable or failing.
    Unhealthy,
}

/// Health check result for an external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Current status classification.
    pub status: ServiceStatus,
    /// When the check was performed.
    pub checked_at: Timestamp,
    /// Round-trip latency of the check, if measured.
    pub latency: Option<Duration>,
    /// Optional human-readable detail.
    pub message: Option<String>,
}

impl ServiceHealth {
    /// Creates a healthy report stamped with the current time.
    pub fn healthy() -> Self {
        Self {
            status: ServiceStatus::Healthy,
            checked_at: Timestamp::now(),
            latency: None,
            message: None,
        }
    }

    /// Creates an unhealthy report with a detail message.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            checked_at: Timestamp::now(),
            latency: None,
            message: Some(message.into()),
        }
    }

    /// Sets the measured round-trip latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns whether the service is usable (healthy or degraded).
    #[inline]
    pub fn is_usable(&self) -> bool {
        !matches!(self.status, ServiceStatus::Unhealthy)
    }
}
