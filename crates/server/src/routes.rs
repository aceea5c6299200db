//! JSON API over the dashboard service.
//!
//! Every failure leaves as `ApiError`, which carries a fresh correlation id
//! and only a user-safe message for store and internal failures.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pulseops_core::alerts::AlertFeed;
use pulseops_core::assistant::{FaqAssistant, MatchKind};
use pulseops_core::dashboard::{AtRiskView, ClientDetail, ClientLookup, DashboardService, LicenseView};
use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::domain::client::{ClientId, ClientRecord};
use pulseops_core::domain::session::DashboardRole;
use pulseops_core::errors::{ApplicationError, InterfaceError};
use pulseops_core::portfolio::PortfolioSummary;
use pulseops_core::store::PortfolioStats;
use pulseops_core::validation::{ClientDraft, ClientUpdate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    dashboard: Arc<DashboardService>,
}

pub fn router(dashboard: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/v1/dashboard/msp", get(msp_overview))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/clients", get(list_clients).post(create_client))
        .route("/api/v1/clients/at-risk", get(at_risk_clients))
        .route("/api/v1/clients/inactive", get(inactive_clients))
        .route("/api/v1/clients/{id}", get(client_detail).put(update_client))
        .route("/api/v1/licenses", get(licenses))
        .route("/api/v1/alerts", get(alerts))
        .route("/api/v1/assistant", post(ask_assistant))
        .with_state(ApiState { dashboard })
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    correlation_id: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest { message: message.into(), correlation_id: new_id() })
    }

    fn not_found(id: &ClientId) -> Self {
        ApplicationError::NotFound(id.to_string()).into()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(new_id()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => {
                (StatusCode::BAD_REQUEST, Some(message.clone()))
            }
            InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, Some(message.clone())),
            InterfaceError::ServiceUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, None),
            InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        warn!(
            event_name = "api.request.failed",
            correlation_id = %self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "request failed"
        );

        let body = ErrorBody {
            error: self.0.user_message(),
            message,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn msp_overview(State(state): State<ApiState>) -> ApiResult<PortfolioSummary> {
    Ok(Json(state.dashboard.msp_overview().await?))
}

async fn stats(State(state): State<ApiState>) -> ApiResult<PortfolioStats> {
    Ok(Json(state.dashboard.stats().await?))
}

async fn list_clients(State(state): State<ApiState>) -> ApiResult<Vec<ClientRecord>> {
    Ok(Json(state.dashboard.clients().await?))
}

async fn at_risk_clients(State(state): State<ApiState>) -> ApiResult<AtRiskView> {
    Ok(Json(state.dashboard.at_risk().await?))
}

async fn inactive_clients(State(state): State<ApiState>) -> ApiResult<Vec<ClientRecord>> {
    Ok(Json(state.dashboard.inactive().await?))
}

async fn licenses(State(state): State<ApiState>) -> ApiResult<LicenseView> {
    Ok(Json(state.dashboard.licenses().await?))
}

async fn client_detail(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<ClientDetail> {
    let id = ClientId(id);
    found(state.dashboard.client_detail(&id).await?, &id)
}

async fn create_client(
    State(state): State<ApiState>,
    Json(draft): Json<ClientDraft>,
) -> Result<(StatusCode, Json<ClientRecord>), ApiError> {
    let created = state.dashboard.create_client(draft).await?;
    info!(
        event_name = "api.client.created",
        client_id = %created.id,
        client_code = %created.client_code,
        "client created through api"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_client(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(update): Json<ClientUpdate>,
) -> ApiResult<ClientDetail> {
    let id = ClientId(id);
    found(state.dashboard.update_client(&id, update).await?, &id)
}

fn found(lookup: ClientLookup, id: &ClientId) -> ApiResult<ClientDetail> {
    lookup.into_detail().map(Json).ok_or_else(|| ApiError::not_found(id))
}

#[derive(Debug, Default, Deserialize)]
struct AlertQuery {
    status: Option<String>,
}

async fn alerts(
    State(state): State<ApiState>,
    Query(query): Query<AlertQuery>,
) -> ApiResult<AlertFeed> {
    let status = match query.status.as_deref() {
        Some(raw) => raw.parse::<AlertStatus>().map_err(ApiError::bad_request)?,
        None => AlertStatus::Active,
    };
    Ok(Json(state.dashboard.alerts(status).await))
}

#[derive(Debug, Deserialize)]
struct AssistantRequest {
    #[serde(default)]
    role: Option<String>,
    question: String,
}

#[derive(Debug, Serialize)]
struct AssistantReply {
    role: DashboardRole,
    kind: MatchKind,
    answer: String,
    suggestions: Vec<&'static str>,
    featured: Vec<&'static str>,
}

async fn ask_assistant(Json(request): Json<AssistantRequest>) -> ApiResult<AssistantReply> {
    let role = match request.role.as_deref() {
        Some(raw) => raw.parse::<DashboardRole>().map_err(ApiError::bad_request)?,
        None => DashboardRole::Msp,
    };
    let assistant = FaqAssistant::for_role(role);
    let answer = assistant.answer(&request.question);

    Ok(Json(AssistantReply {
        role,
        kind: answer.kind,
        answer: answer.text,
        suggestions: assistant.suggest(&request.question),
        featured: assistant.featured_questions(),
    }))
}
