//! Job API Handlers
//!
//! HTTP endpoints over the aggregated job records.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use jobacct_core::domain::job::JobRecord;
use jobacct_core::domain::queue::QueueEntry;
use jobacct_core::dto::{JobInfo, JobsQuery};

use crate::api::error::{ApiError, ApiResult};
use crate::service::jobs_service;
use crate::state::AppState;

// =============================================================================
// Job Listings
// =============================================================================

/// GET /myjobs/json?use_cache=bool
/// Jobs charged to the user's allocations over the recent window
pub async fn my_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> ApiResult<Json<Vec<JobRecord>>> {
    tracing::debug!("Listing jobs (use_cache={})", query.use_cache);

    let jobs = jobs_service::my_jobs(state, query.use_cache).await?;
    Ok(Json(jobs))
}

/// GET /api/userdata
pub async fn user_history(State(state): State<AppState>) -> ApiResult<Json<Vec<JobRecord>>> {
    tracing::debug!("Listing job history");

    let jobs = jobs_service::user_history(state).await?;
    Ok(Json(jobs))
}

// =============================================================================
// Single Job
// =============================================================================

/// GET /job/{jobid}/json
/// Records for one job id
pub async fn job_history(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<JobRecord>>> {
    tracing::debug!("Getting job: {}", job_id);

    let jobs = jobs_service::job_history(state, &job_id).await?;
    if jobs.is_empty() {
        return Err(ApiError::NotFound(format!("Job {} not found", job_id)));
    }

    Ok(Json(jobs))
}

/// GET /job/{jobid}/info
pub async fn job_info(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobInfo>> {
    tracing::debug!("Getting job info: {}", job_id);

    let info = jobs_service::job_info(state, &job_id).await?;
    Ok(Json(info))
}

// =============================================================================
// Queue
// =============================================================================

/// GET /api/job_queue
/// The user's five most recent queue entries
pub async fn job_queue(State(state): State<AppState>) -> ApiResult<Json<Vec<QueueEntry>>> {
    let queue = jobs_service::job_queue(state).await?;
    Ok(Json(queue))
}
