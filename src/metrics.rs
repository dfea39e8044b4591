use std::time::Duration;

use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::warn;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Only one recorder can exist per
    /// process, so a second call (tests, embedding) returns `None`.
    pub fn init() -> Option<Self> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(Self { handle }),
            Err(e) => {
                warn!(error = %e, "prometheus recorder not installed; /metrics disabled");
                None
            }
        }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn insights_request() {
    counter!("insights_requests_total").increment(1);
}

pub fn collaborator_used() {
    counter!("insights_collaborator_used_total").increment(1);
}

pub fn collaborator_failed() {
    counter!("insights_collaborator_failures_total").increment(1);
}

pub fn collaborator_latency(elapsed: Duration) {
    histogram!("insights_collaborator_latency_ms").record(elapsed.as_secs_f64() * 1000.0);
}
