use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quarry_core::models::{BackendKind, CircuitSnapshot, CircuitStatus};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsReading;

/// Error rate above which a backend is reported degraded.
const DEGRADED_ERROR_RATE: f64 = 0.25;

/// Health of one backend, or of the whole orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Metrics could not be read. Not the same as zero traffic.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub backend: BackendKind,
    pub status: HealthStatus,
    pub message: String,
    pub error_rate: Option<f64>,
    pub circuit: Option<CircuitSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub backends: Vec<BackendHealth>,
    pub generated_at: DateTime<Utc>,
}

/// Builds a [`HealthReport`] from metric readings and breaker snapshots.
pub struct HealthReporter;

impl HealthReporter {
    pub fn build(
        readings: &BTreeMap<BackendKind, MetricsReading>,
        circuits: &BTreeMap<BackendKind, CircuitSnapshot>,
    ) -> HealthReport {
        let backends: Vec<BackendHealth> = readings
            .keys()
            .chain(circuits.keys())
            .copied()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .map(|backend| Self::check(backend, readings.get(&backend), circuits.get(&backend)))
            .collect();

        HealthReport {
            overall_status: Self::derive_overall(&backends),
            backends,
            generated_at: Utc::now(),
        }
    }

    fn check(
        backend: BackendKind,
        reading: Option<&MetricsReading>,
        circuit: Option<&CircuitSnapshot>,
    ) -> BackendHealth {
        let error_rate = reading.and_then(|r| r.metrics()).map(|m| m.error_rate);
        let (status, message) = match (circuit.map(|c| c.status), reading) {
            (Some(CircuitStatus::Open), _) => {
                (HealthStatus::Unhealthy, "circuit open".to_string())
            }
            (_, Some(MetricsReading::Unavailable { reason })) => {
                (HealthStatus::Unavailable, format!("metrics unavailable: {reason}"))
            }
            (Some(CircuitStatus::HalfOpen), _) => {
                (HealthStatus::Degraded, "circuit probing recovery".to_string())
            }
            _ => match error_rate {
                Some(rate) if rate > DEGRADED_ERROR_RATE => (
                    HealthStatus::Degraded,
                    format!("error rate {:.0}% above {:.0}%", rate * 100.0, DEGRADED_ERROR_RATE * 100.0),
                ),
                _ => (HealthStatus::Healthy, "ok".to_string()),
            },
        };

        BackendHealth {
            backend,
            status,
            message,
            error_rate,
            circuit: circuit.cloned(),
        }
    }

    /// Unhealthy if any backend is unhealthy, degraded if any is degraded or
    /// unreadable, otherwise healthy.
    fn derive_overall(backends: &[BackendHealth]) -> HealthStatus {
        let mut worst = HealthStatus::Healthy;
        for b in backends {
            match b.status {
                HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
                HealthStatus::Degraded | HealthStatus::Unavailable => {
                    worst = HealthStatus::Degraded
                }
                HealthStatus::Healthy => {}
            }
        }
        worst
    }
}
