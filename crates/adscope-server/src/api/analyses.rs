use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::jobs::{CancelOutcome, JobRequest};
use crate::middleware::RequestId;

const MAX_ITEMS_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateAnalysisRequest {
    pub brand: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub max_items: Option<usize>,
}

fn parse_job_id(request_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::new(request_id, "not_found", format!("analysis {raw} not found")))
}

pub(super) async fn create_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = body.brand.trim();
    if brand.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "brand must not be empty",
        ));
    }

    let max_items = body.max_items.unwrap_or(state.defaults.max_items);
    if max_items == 0 || max_items > MAX_ITEMS_LIMIT {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("maxItems must be between 1 and {MAX_ITEMS_LIMIT}"),
        ));
    }

    let region = body
        .region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("ALL")
        .to_uppercase();

    let job = state
        .jobs
        .spawn(
            state.pipeline.clone(),
            JobRequest {
                brand: brand.to_string(),
                region,
                max_items,
                timeout: state.defaults.run_timeout,
            },
        )
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: job,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = parse_job_id(&req_id.0, &id)?;
    let job = state.jobs.get(job_id).await.ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("analysis {id} not found"),
        )
    })?;

    Ok(Json(ApiResponse {
        data: job,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn cancel_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = parse_job_id(&req_id.0, &id)?;
    match state.jobs.cancel(job_id).await {
        CancelOutcome::Requested(job) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse {
                data: job,
                meta: ResponseMeta::new(req_id.0),
            }),
        )),
        CancelOutcome::AlreadyFinished(job) => Err(ApiError::new(
            req_id.0,
            "conflict",
            format!("analysis {} already {:?}", job.id, job.status).to_lowercase(),
        )),
        CancelOutcome::NotFound => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("analysis {id} not found"),
        )),
    }
}
