//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use wizard::SessionRegistry;

/// State of the metrics router.
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub registry: SessionRegistry,
}

/// GET /metrics: returns Prometheus-formatted metrics.
pub async fn get(State(state): State<MetricsState>) -> impl IntoResponse {
    let sessions = state.registry.len().await;
    metrics::gauge!("wizard_sessions_active").set(sessions as f64);

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.handle.render(),
    )
}
