use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::search::{JobQuery, JobSearchParams};
use crate::models::job::{Job, JobDetail, JobPage, JobType, JobUpdate, JobWithStats, NewJob};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    /// Either the wire form (`part_time`) or the display form (`Part-time`).
    pub job_type: Option<String>,
    pub salary: i64,
}

#[derive(Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<i64>,
}

fn non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Blank locations are stored as absent.
fn location(raw: &str) -> Option<String> {
    Some(raw.trim().to_string()).filter(|l| !l.is_empty())
}

fn valid_salary(salary: i64) -> Result<i64, AppError> {
    if salary < 0 {
        return Err(AppError::Validation("salary cannot be negative".into()));
    }
    Ok(salary)
}

fn parse_job_type(raw: &str) -> Result<JobType, AppError> {
    raw.parse().map_err(AppError::Validation)
}

impl TryFrom<UpdateJobRequest> for JobUpdate {
    type Error = AppError;

    fn try_from(req: UpdateJobRequest) -> Result<Self, Self::Error> {
        Ok(JobUpdate {
            title: req.title.map(|t| non_empty("title", &t)).transpose()?,
            description: req
                .description
                .map(|d| non_empty("description", &d))
                .transpose()?,
            location: req.location.as_deref().map(location),
            job_type: req.job_type.as_deref().map(parse_job_type).transpose()?,
            salary: req.salary.map(valid_salary).transpose()?,
        })
    }
}

/// Loads a job and checks that the caller posted it.
async fn owned_job(state: &AppState, auth: &AuthUser, id: Uuid) -> Result<Job, AppError> {
    auth.require(Role::Recruiter)?;
    let job = state
        .repo
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden("You can only manage your own jobs".into()));
    }
    Ok(job)
}

/// GET /api/jobs
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<JobSearchParams>,
) -> Result<Json<JobPage>, AppError> {
    let query = JobQuery::try_from(params)?;
    Ok(Json(state.repo.search_jobs(&query).await?))
}

/// GET /api/jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDetail>, AppError> {
    let job = state
        .repo
        .find_job_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// POST /api/jobs
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    auth.require(Role::Recruiter)?;
    let title = non_empty("title", &req.title)?;
    let description = non_empty("description", &req.description)?;
    let salary = valid_salary(req.salary)?;
    let job_type = req
        .job_type
        .as_deref()
        .map(parse_job_type)
        .transpose()?
        .unwrap_or_default();

    let company = state
        .repo
        .find_company_by_owner(auth.id)
        .await?
        .ok_or_else(|| {
            AppError::Validation("Please register a company first before posting jobs".into())
        })?;

    let job = state
        .repo
        .insert_job(NewJob {
            company_id: company.id,
            company_name: company.name,
            posted_by: auth.id,
            title,
            description,
            location: req.location.as_deref().and_then(location),
            job_type,
            salary,
        })
        .await?;

    info!(job_id = %job.id, company_id = %job.company_id, "Job posted");
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/myjobs
pub async fn handle_my_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobWithStats>>, AppError> {
    auth.require(Role::Recruiter)?;
    Ok(Json(state.repo.jobs_posted_by(auth.id).await?))
}

/// PUT /api/jobs/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    owned_job(&state, &auth, id).await?;
    let update = JobUpdate::try_from(req)?;
    let job = state.repo.update_job(id, update).await?;
    info!(job_id = %id, "Job updated");
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_job(&state, &auth, id).await?;
    state.repo.delete_job(id).await?;
    info!(job_id = %id, "Job deleted");
    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

/// POST /api/jobs/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    auth.require(Role::Applicant)?;
    if state.repo.find_job(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    state.repo.save_job(auth.id, id).await?;
    Ok(Json(json!({ "message": "Job saved" })))
}

/// DELETE /api/jobs/:id/unsave
pub async fn handle_unsave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    auth.require(Role::Applicant)?;
    state.repo.unsave_job(auth.id, id).await?;
    Ok(Json(json!({ "message": "Job removed from saved jobs" })))
}

/// GET /api/jobs/saved
pub async fn handle_saved(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Job>>, AppError> {
    auth.require(Role::Applicant)?;
    Ok(Json(state.repo.saved_jobs(auth.id).await?))
}
