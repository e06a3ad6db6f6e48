//! Booking configuration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use booking::{BookingApi, Wallet};

use super::wizards::AppState;
use crate::config::BookingConfig;

/// GET /config/booking: settings the booking pages render with.
pub async fn booking<B, W>(State(state): State<Arc<AppState<B, W>>>) -> Json<BookingConfig>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    Json(state.config.booking.clone())
}
