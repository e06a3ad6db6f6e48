//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use booking::{BookingApi, Wallet};
use serde::Serialize;

use super::wizards::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

/// GET /health: returns system health and the number of live wizard sessions.
pub async fn check<B, W>(State(state): State<Arc<AppState<B, W>>>) -> Json<HealthResponse>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    Json(HealthResponse {
        status: "ok",
        sessions: state.registry.len().await,
    })
}
