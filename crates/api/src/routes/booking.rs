//! Booking page endpoints.
//!
//! Each handler takes the session's turn, runs one page action against its
//! snapshot and applies the returned commands in a single dispatch before
//! the next action on that session may start.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use booking::{
    AccommodationInput, BookingApi, BookingConfirmation, CheckoutInput, DatesInput, Guests,
    StepOutcome, Wallet,
};
use serde::Serialize;
use wizard::{FlowKind, Navigation, SessionTurn, StepData};

use super::wizards::{AppState, WizardResponse, parse_session_id};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub navigation: Navigation,
    pub wizard: WizardResponse,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub navigation: Navigation,
    pub confirmation: Option<BookingConfirmation>,
    /// Rental formatted with the configured currency symbol.
    pub rental: Option<String>,
    /// Token cost formatted with the configured token symbol.
    pub tokens: Option<String>,
    pub wizard: WizardResponse,
}

async fn booking_turn<B, W>(state: &AppState<B, W>, id: &str) -> Result<SessionTurn, ApiError>
where
    B: BookingApi,
    W: Wallet,
{
    if !state.config.booking.enabled {
        return Err(ApiError::Forbidden("Booking is disabled".to_string()));
    }
    let turn = state.registry.begin(parse_session_id(id)?).await?;
    let flow = turn.session().flow();
    if flow != FlowKind::Booking {
        return Err(ApiError::BadRequest(format!("Session {id} runs the {flow} flow")));
    }
    Ok(turn)
}

async fn apply(turn: SessionTurn, outcome: StepOutcome) -> Result<Json<ActionResponse>, ApiError> {
    let session = turn.dispatch_all(outcome.commands).await?;
    Ok(Json(ActionResponse {
        navigation: outcome.navigation,
        wizard: WizardResponse::from(&session),
    }))
}

/// POST /wizards/:id/booking/guests
#[tracing::instrument(skip(state))]
pub async fn guests<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(input): Json<Guests>,
) -> Result<Json<ActionResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let outcome = state
        .coordinator
        .submit_guests(turn.session().store(), input)
        .await?;
    apply(turn, outcome).await
}

/// POST /wizards/:id/booking/dates
#[tracing::instrument(skip(state))]
pub async fn dates<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(input): Json<DatesInput>,
) -> Result<Json<ActionResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let outcome = state
        .coordinator
        .submit_dates(turn.session().store(), input)
        .await?;
    apply(turn, outcome).await
}

/// POST /wizards/:id/booking/accommodation
#[tracing::instrument(skip(state))]
pub async fn accommodation<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(input): Json<AccommodationInput>,
) -> Result<Json<ActionResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let outcome = state
        .coordinator
        .select_accommodation(turn.session().store(), input)
        .await?;
    apply(turn, outcome).await
}

/// POST /wizards/:id/booking/questionnaire
#[tracing::instrument(skip(state, answers))]
pub async fn questionnaire<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(answers): Json<StepData>,
) -> Result<Json<ActionResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let outcome = state
        .coordinator
        .submit_questionnaire(turn.session().store(), answers)
        .await?;
    apply(turn, outcome).await
}

/// POST /wizards/:id/booking/checkout
#[tracing::instrument(skip(state))]
pub async fn checkout<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(input): Json<CheckoutInput>,
) -> Result<Json<ActionResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let outcome = state
        .coordinator
        .checkout(turn.session().store(), input)
        .await?;
    apply(turn, outcome).await
}

/// GET /wizards/:id/booking/confirmation
#[tracing::instrument(skip(state))]
pub async fn confirmation<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmationResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let turn = booking_turn(&state, &id).await?;
    let view = state.coordinator.confirmation(turn.session().store()).await?;
    let session = turn.dispatch_all(view.outcome.commands).await?;

    let symbols = &state.config.booking;
    let rental = view
        .confirmation
        .as_ref()
        .map(|c| c.rental.format_with(&symbols.currency_symbol));
    let tokens = view
        .confirmation
        .as_ref()
        .and_then(|c| c.token_cost)
        .map(|t| format!("{t} {}", symbols.token_symbol));

    Ok(Json(ConfirmationResponse {
        navigation: view.outcome.navigation,
        confirmation: view.confirmation,
        rental,
        tokens,
        wizard: WizardResponse::from(&session),
    }))
}
