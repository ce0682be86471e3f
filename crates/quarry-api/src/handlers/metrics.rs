//! Metrics read and reset handlers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use quarry_core::models::BackendKind;
use quarry_observability::{MetricsReading, TimeRange};
use tracing::info;

use crate::errors::{ApiError, ApiResult};
use crate::runtime::QuarryRuntime;
use crate::types::{
    MetricsRequest, MetricsResponse, MetricsSummary, ResetOutcome, ResetRequest, ResetResponse,
    ResetTarget,
};

impl QuarryRuntime {
    /// Read metrics for the requested backends over one time range.
    ///
    /// Names that do not resolve to a registered backend read as
    /// `Unavailable` and are left out of the summary.
    pub fn read_metrics(&self, request: &MetricsRequest) -> MetricsResponse {
        let registered = self.orchestrator().registered_backends();
        let names: Vec<String> = if request.backends.is_empty() {
            registered.iter().map(|k| k.as_str().to_string()).collect()
        } else {
            request.backends.clone()
        };

        let readings: BTreeMap<String, MetricsReading> = names
            .into_iter()
            .map(|name| {
                let reading = self.read_backend(&name, request.time_range, &registered);
                (name, reading)
            })
            .collect();

        MetricsResponse {
            time_range: request.time_range,
            generated_at: Utc::now(),
            summary: MetricsSummary::from_readings(readings.values()),
            backends: request.include_details.then_some(readings),
        }
    }

    /// Clear recorded metrics for the selected backends.
    pub fn reset_metrics(&self, request: &ResetRequest) -> ApiResult<ResetResponse> {
        let registered = self.orchestrator().registered_backends();
        let names: Vec<String> = match &request.backends {
            ResetTarget::Keyword(k) if k.eq_ignore_ascii_case("all") => {
                registered.iter().map(|k| k.as_str().to_string()).collect()
            }
            ResetTarget::Keyword(other) => {
                return Err(ApiError::InvalidRequest(format!(
                    "reset target must be \"all\" or a list of backends, got {other:?}"
                )))
            }
            ResetTarget::Named(list) if list.is_empty() => {
                return Err(ApiError::InvalidRequest("no backends to reset".into()))
            }
            ResetTarget::Named(list) => list.clone(),
        };

        let outcomes = names
            .into_iter()
            .map(|name| {
                let outcome = self.reset_backend(&name, request.reset_circuits, &registered);
                (name, outcome)
            })
            .collect();
        if request.reset_circuits {
            // Cached responses may reflect the degraded backends.
            self.orchestrator().cache().invalidate_all();
        }
        Ok(ResetResponse { outcomes })
    }

    fn read_backend(
        &self,
        name: &str,
        range: TimeRange,
        registered: &BTreeSet<BackendKind>,
    ) -> MetricsReading {
        match Self::resolve(name, registered) {
            Ok(kind) => {
                MetricsReading::Available(self.orchestrator().metrics().snapshot(Some(kind), range))
            }
            Err(reason) => MetricsReading::Unavailable { reason },
        }
    }

    fn reset_backend(
        &self,
        name: &str,
        reset_circuits: bool,
        registered: &BTreeSet<BackendKind>,
    ) -> ResetOutcome {
        let kind = match Self::resolve(name, registered) {
            Ok(kind) => kind,
            Err(reason) => {
                return ResetOutcome {
                    error: Some(reason),
                    ..ResetOutcome::default()
                }
            }
        };

        let events_cleared = self.orchestrator().metrics().reset(Some(kind));
        let circuit_reset =
            reset_circuits && !self.orchestrator().circuits().reset(Some(kind)).is_empty();
        info!(backend = %kind, events_cleared, circuit_reset, "metrics reset");
        ResetOutcome {
            reset: true,
            events_cleared,
            circuit_reset,
            error: None,
        }
    }

    fn resolve(name: &str, registered: &BTreeSet<BackendKind>) -> Result<BackendKind, String> {
        let kind = name.parse::<BackendKind>()?;
        if registered.contains(&kind) {
            Ok(kind)
        } else {
            Err(format!("backend {kind} is not registered"))
        }
    }
}
