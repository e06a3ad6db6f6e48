//! Wizard session endpoints: lifecycle, raw step commands, guards and drafts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use booking::{BookingApi, BookingCoordinator, Wallet};
use common::SessionId;
use serde::{Deserialize, Serialize};
use wizard::{
    FlowKind, Guard, Prerequisite, Progress, SessionRegistry, StepCommand, StepData, StepPath,
    WizardSession, check_prerequisites,
};

use crate::config::Config;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<B: BookingApi, W: Wallet> {
    pub registry: SessionRegistry,
    pub coordinator: BookingCoordinator<B, W>,
    pub config: Config,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateWizardRequest {
    pub flow: FlowKind,
}

#[derive(Deserialize)]
pub struct SetCurrentRequest {
    pub path: StepPath,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub path: String,
    pub next: Option<String>,
    pub data: StepData,
}

#[derive(Debug, Serialize)]
pub struct WizardResponse {
    pub id: String,
    pub flow: FlowKind,
    pub current: String,
    pub progress: Option<Progress>,
    pub total: usize,
    pub steps: Vec<StepResponse>,
}

impl From<&WizardSession> for WizardResponse {
    fn from(session: &WizardSession) -> Self {
        let store = session.store();
        let current = store.current_step().path.to_string();
        Self {
            id: session.id().to_string(),
            flow: session.flow(),
            progress: store.progress(&current),
            current,
            total: store.len(),
            steps: store
                .steps()
                .map(|step| StepResponse {
                    path: step.path.to_string(),
                    next: step.next.as_ref().map(ToString::to_string),
                    data: step.data.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct GuardResponse {
    pub step: String,
    pub proceed: bool,
    pub missing: Option<Prerequisite>,
}

// -- Handlers --

/// POST /wizards: start a session for a flow.
#[tracing::instrument(skip(state, req))]
pub async fn create<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Json(req): Json<CreateWizardRequest>,
) -> Result<(StatusCode, Json<WizardResponse>), ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    if req.flow == FlowKind::Booking && !state.config.booking.enabled {
        return Err(ApiError::Forbidden("Booking is disabled".to_string()));
    }

    let session = state.registry.create(req.flow).await;
    Ok((StatusCode::CREATED, Json(WizardResponse::from(&session))))
}

/// GET /wizards/:id: snapshot of a session.
#[tracing::instrument(skip(state))]
pub async fn get<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
) -> Result<Json<WizardResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state.registry.get(parse_session_id(&id)?).await?;
    Ok(Json(WizardResponse::from(&session)))
}

/// DELETE /wizards/:id: dispose of a session.
#[tracing::instrument(skip(state))]
pub async fn dispose<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    state.registry.dispose(parse_session_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /wizards/:id/steps/:path: replace the data of one step.
#[tracing::instrument(skip(state, data))]
pub async fn save_step<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path((id, path)): Path<(String, String)>,
    Json(data): Json<serde_json::Value>,
) -> Result<Json<WizardResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state
        .registry
        .dispatch(parse_session_id(&id)?, StepCommand::save(path, data))
        .await?;
    Ok(Json(WizardResponse::from(&session)))
}

/// POST /wizards/:id/current: mark a step as current.
#[tracing::instrument(skip(state, req))]
pub async fn set_current<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
    Json(req): Json<SetCurrentRequest>,
) -> Result<Json<WizardResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state
        .registry
        .dispatch(parse_session_id(&id)?, StepCommand::set_current(req.path))
        .await?;
    Ok(Json(WizardResponse::from(&session)))
}

/// POST /wizards/:id/reset: clear every step.
#[tracing::instrument(skip(state))]
pub async fn reset<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
) -> Result<Json<WizardResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state
        .registry
        .dispatch(parse_session_id(&id)?, StepCommand::Reset)
        .await?;
    Ok(Json(WizardResponse::from(&session)))
}

/// GET /wizards/:id/steps/:path/guard: whether a step may be entered.
#[tracing::instrument(skip(state))]
pub async fn guard<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Json<GuardResponse>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state.registry.get(parse_session_id(&id)?).await?;
    let missing = match check_prerequisites(session.store(), session.flow(), &path)? {
        Guard::Proceed => None,
        Guard::Missing(prerequisite) => Some(prerequisite),
    };

    Ok(Json(GuardResponse {
        step: path,
        proceed: missing.is_none(),
        missing,
    }))
}

/// GET /wizards/:id/draft: all collected data keyed by step.
#[tracing::instrument(skip(state))]
pub async fn draft<B, W>(
    State(state): State<Arc<AppState<B, W>>>,
    Path(id): Path<String>,
) -> Result<Json<StepData>, ApiError>
where
    B: BookingApi + 'static,
    W: Wallet + 'static,
{
    let session = state.registry.get(parse_session_id(&id)?).await?;
    Ok(Json(session.store().draft()))
}

pub(crate) fn parse_session_id(id: &str) -> Result<SessionId, ApiError> {
    SessionId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
