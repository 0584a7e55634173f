use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    clients::{health::HealthChecker, template::TemplateResolver},
    config::Config,
    error::DispatchError,
    models::{
        campaign::CampaignId,
        health::HealthStatus,
        response::ApiResponse,
        schedule::{BatchReport, PendingSend, ScheduleOutcome, ScheduleRequest},
    },
    scheduler::Scheduler,
};

pub struct AppState {
    scheduler: Arc<Scheduler>,
    templates: Arc<TemplateResolver>,
    health_checker: HealthChecker,
}

impl AppState {
    pub fn new(
        scheduler: Arc<Scheduler>,
        templates: Arc<TemplateResolver>,
        health_checker: HealthChecker,
    ) -> Self {
        Self {
            scheduler,
            templates,
            health_checker,
        }
    }
}

#[derive(Debug, Serialize)]
struct DispatchSummary {
    #[serde(flatten)]
    report: BatchReport,

    #[serde(skip_serializing_if = "Option::is_none")]
    persistence_error: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/schedules", get(list_schedules).post(create_schedule))
        .route("/api/v1/schedules/{campaign_id}", delete(cancel_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: &Config, state: Arc<AppState>) -> Result<(), Error> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "API server started");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pending = state.scheduler.list_pending().len();
    let health = state.health_checker.check_all(pending).await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> Response {
    if !state.templates.contains(&request.template_id) {
        let error = DispatchError::UnknownTemplate(request.template_id.clone());
        return error_response(StatusCode::BAD_REQUEST, error, "Template is not registered");
    }

    match state.scheduler.schedule_send(request).await {
        Ok(ScheduleOutcome::Dispatched(outcome)) => {
            let summary = DispatchSummary {
                report: outcome.report,
                persistence_error: outcome.persistence_error.map(|e| e.to_string()),
            };
            let message = format!(
                "Batch dispatched: {} succeeded, {} failed",
                summary.report.succeeded(),
                summary.report.failed()
            );
            (StatusCode::OK, Json(ApiResponse::success(summary, message))).into_response()
        }
        Ok(ScheduleOutcome::Deferred(pending)) => {
            let message = format!("Send scheduled for {}", pending.fire_at);
            (StatusCode::ACCEPTED, Json(ApiResponse::success(pending, message))).into_response()
        }
        Err(e @ DispatchError::InvalidRequest(_)) => {
            error_response(StatusCode::BAD_REQUEST, e, "Schedule request rejected")
        }
        Err(e @ DispatchError::CredentialUnavailable(_)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e, "Batch aborted")
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e, "Batch failed"),
    }
}

async fn list_schedules(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<PendingSend>>> {
    let pending = state.scheduler.list_pending();
    let message = format!("{} pending send(s)", pending.len());

    Json(ApiResponse::success(pending, message))
}

async fn cancel_schedule(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Response {
    let campaign_id = CampaignId::new(campaign_id);

    match state.scheduler.cancel(&campaign_id) {
        Some(pending) => (
            StatusCode::OK,
            Json(ApiResponse::success(pending, "Pending send cancelled".to_string())),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(
                format!("No pending send for campaign {}", campaign_id),
                "Nothing to cancel".to_string(),
            )),
        )
            .into_response(),
    }
}

fn error_response(status: StatusCode, error: DispatchError, message: &str) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(error.to_string(), message.to_string())),
    )
        .into_response()
}
