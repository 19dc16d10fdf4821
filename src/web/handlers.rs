use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};

use super::responses::{ApiResponse, WebError};
use super::AppState;
use crate::models::CheckRequest;
use crate::scheduler::{JobInfo, SchedulerState, SchedulerStatus};

/// The start/stop form with the current job, if any.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub request: CheckRequest,
    pub error: Option<String>,
    pub job: Option<JobInfo>,
    pub last_run: String,
}

impl IndexPage {
    pub fn new(request: CheckRequest, status: SchedulerStatus, error: Option<String>) -> Self {
        let job = match status.state {
            SchedulerState::Running => status.job,
            SchedulerState::Idle => None,
        };
        let last_run = job
            .as_ref()
            .and_then(|job| job.last_run)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "not yet".to_string());

        Self {
            request,
            error,
            job,
            last_run,
        }
    }
}

/// GET / - the form, prefilled from the running job or the configured defaults
pub async fn index_page(State(state): State<AppState>) -> IndexPage {
    let status = state.scheduler.status().await;
    let request = match &status.job {
        Some(job) => request_from_job(job),
        None => CheckRequest::from(&state.config.check),
    };
    IndexPage::new(request, status, None)
}

/// POST /start - validate and (re)schedule; a rejected form is shown again
pub async fn start_watch(
    State(state): State<AppState>,
    Form(request): Form<CheckRequest>,
) -> Response {
    match state.scheduler.start(&request).await {
        Ok(job) => {
            tracing::info!("Watch started from form: job {}", job.id);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Rejected form input: {}", e);
            let status = state.scheduler.status().await;
            let page = IndexPage::new(request, status, Some(e.to_string()));
            (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
        }
    }
}

/// POST /stop
pub async fn stop_watch(State(state): State<AppState>) -> Redirect {
    state.scheduler.stop().await;
    Redirect::to("/")
}

/// GET /api/status
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<SchedulerStatus>> {
    Json(ApiResponse::success(state.scheduler.status().await))
}

/// POST /api/start
pub async fn api_start(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<ApiResponse<JobInfo>>, WebError> {
    let job = state.scheduler.start(&request).await?;
    Ok(Json(ApiResponse::success(job)))
}

/// POST /api/stop
pub async fn api_stop(State(state): State<AppState>) -> Json<ApiResponse<SchedulerStatus>> {
    state.scheduler.stop().await;
    Json(ApiResponse::success(state.scheduler.status().await))
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "scout-watcher"
    }))
}

fn request_from_job(job: &JobInfo) -> CheckRequest {
    CheckRequest::new(
        job.search_term.clone(),
        job.distance_threshold.to_string(),
        job.interval_minutes.to_string(),
    )
}
