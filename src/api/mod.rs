pub mod cli;
pub mod payload;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, Path, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{debug, info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::core::{
    PlanSummary, Suggestion, YearlySnapshot, apply_suggestion, find_suggestion, summarize,
    suggestions_for,
};
use payload::{
    PlanPayload, PlanRequest, SettingsPayload, UserDetailsPayload, ValidationError, validate_plan,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Payload(#[from] JsonRejection),
    #[error("Failed to parse the request body as JSON: {0}")]
    Body(#[from] serde_json::Error),
    #[error("Unknown suggestion: {0}")]
    UnknownSuggestion(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Payload(rejection) => rejection.status(),
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownSuggestion(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("request rejected with {status}: {self}");
        error_response(status, &self.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct SuggestionsResponse {
    data: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppliedSuggestionResponse {
    user_details: UserDetailsPayload,
    settings: SettingsPayload,
    data: Vec<YearlySnapshot>,
    summary: PlanSummary,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/financial/cashflow-projections", post(projection_handler))
        .route("/financial/suggestions", post(suggestions_handler))
        .route(
            "/financial/apply-suggestion/:id",
            post(apply_suggestion_handler),
        )
        .fallback(not_found_handler)
        .layer(CorsLayer::permissive())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("cash-flow planner API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/health");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(
    payload: Result<Json<PlanPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let request = payload.plan_request()?;
    let projection = request.project();
    debug!(
        "projected ages {}..={} ({} rows), plan failing: {}",
        request.profile.current_age,
        request.settings.life_expectancy,
        projection.data.len(),
        projection.summary.is_plan_failing
    );
    Ok(json_response(StatusCode::OK, projection))
}

async fn suggestions_handler(
    payload: Result<Json<PlanPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let is_plan_failing = plan_status(&payload)?;
    debug!("serving suggestions for plan failing: {is_plan_failing}");
    Ok(json_response(
        StatusCode::OK,
        SuggestionsResponse {
            data: suggestions_for(is_plan_failing),
        },
    ))
}

/// The dashboard posts here without a body; that applies to the default plan.
async fn apply_suggestion_handler(
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload: PlanPayload = if body.iter().all(u8::is_ascii_whitespace) {
        PlanPayload::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let is_plan_failing = plan_status(&payload)?;
    let suggestion =
        find_suggestion(is_plan_failing, &id).ok_or(ApiError::UnknownSuggestion(id))?;

    let PlanRequest {
        mut profile,
        mut settings,
        policy,
    } = payload.plan_request()?;
    apply_suggestion(&suggestion, &mut profile, &mut settings);
    validate_plan(&profile, &settings)?;
    info!("applied suggestion {} ({})", suggestion.id, suggestion.title);

    let adjusted = PlanRequest {
        profile,
        settings,
        policy,
    };
    let projection = adjusted.project();
    Ok(json_response(
        StatusCode::OK,
        AppliedSuggestionResponse {
            user_details: UserDetailsPayload::from(&adjusted.profile),
            settings: SettingsPayload::from_plan(&adjusted.settings, adjusted.policy),
            data: projection.data,
            summary: projection.summary,
        },
    ))
}

/// Whether the plan runs short: the caller's flag if given, else the rows it
/// sent back, else a fresh projection.
fn plan_status(payload: &PlanPayload) -> Result<bool, ApiError> {
    if let Some(flag) = payload.is_plan_failing {
        return Ok(flag);
    }
    if let Some(data) = &payload.cash_flow_data {
        return Ok(data
            .rows()
            .iter()
            .any(|snap| !snap.decumulation_achieved_successfully));
    }
    let request = payload.plan_request()?;
    let projection = request.project();
    Ok(summarize(&projection.data, request.profile.desired_retirement_age).is_plan_failing)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
