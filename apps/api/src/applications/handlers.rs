use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::applications::status::{check_transition, status_message, Transition};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::mailer::Email;
use crate::models::application::{
    ApplicantEntry, Application, ApplicationStatus, ApplicationWithJob, NewApplication,
};
use crate::models::job::Job;
use crate::models::notification::NotificationKind;
use crate::models::user::Role;
use crate::notifications::{notify, Notice};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

async fn find_job(state: &AppState, id: Uuid) -> Result<Job, AppError> {
    state
        .repo
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// Loads an application together with its job, which the caller must have posted.
async fn owned_application(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<(Application, Job), AppError> {
    auth.require(Role::Recruiter)?;
    let application = state
        .repo
        .find_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    let job = find_job(state, application.job_id).await?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "Not authorized to manage applications for this job".into(),
        ));
    }
    Ok((application, job))
}

/// POST /api/applications/:job_id
pub async fn handle_apply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
    body: Option<Json<ApplyRequest>>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    auth.require(Role::Applicant)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let job = find_job(&state, job_id).await?;

    if state
        .repo
        .find_application_for(job_id, auth.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You have already applied for this job".into(),
        ));
    }

    let applicant = state
        .repo
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let application = state
        .repo
        .insert_application(NewApplication {
            job_id,
            applicant_id: auth.id,
            cover_letter: req
                .cover_letter
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
        .await?;

    notify(
        &state,
        Notice::new(
            job.posted_by,
            NotificationKind::Application,
            format!("{} applied for {}", applicant.name, job.title),
        )
        .job(job.id),
    )
    .await?;

    info!(application_id = %application.id, job_id = %job_id, "Application submitted");
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/my-applications
pub async fn handle_my_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ApplicationWithJob>>, AppError> {
    auth.require(Role::Applicant)?;
    Ok(Json(state.repo.applications_by_applicant(auth.id).await?))
}

/// GET /api/applications/job/:job_id
pub async fn handle_job_applications(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicantEntry>>, AppError> {
    auth.require(Role::Recruiter)?;
    let job = find_job(&state, job_id).await?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "Not authorized to view applications for this job".into(),
        ));
    }
    Ok(Json(state.repo.applications_for_job(job_id).await?))
}

/// PUT /api/applications/:app_id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(app_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Application>, AppError> {
    let (application, job) = owned_application(&state, &auth, app_id).await?;
    let next: ApplicationStatus = req.status.parse().map_err(AppError::Validation)?;

    if check_transition(application.status, next)? == Transition::Unchanged {
        return Ok(Json(application));
    }

    let updated = state
        .repo
        .update_application_status(app_id, application.status, next)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Application status was changed by another request".into())
        })?;
    notify(
        &state,
        Notice::new(
            updated.applicant_id,
            NotificationKind::StatusUpdate,
            status_message(next, &job.title),
        )
        .job(job.id),
    )
    .await?;

    info!(
        application_id = %app_id,
        from = %application.status,
        to = %next,
        "Application status changed"
    );
    Ok(Json(updated))
}

/// POST /api/applications/:app_id/message
pub async fn handle_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(app_id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Value>, AppError> {
    let (application, job) = owned_application(&state, &auth, app_id).await?;
    let text = req.message.trim();
    if text.is_empty() {
        return Err(AppError::Validation("message cannot be empty".into()));
    }

    let recruiter = state
        .repo
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let applicant = state
        .repo
        .find_user(application.applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Applicant not found".into()))?;

    let email = Email {
        to: applicant.email.clone(),
        subject: format!("Message regarding your application for {}", job.title),
        body: format!(
            "Hi {},\n\n{} from {} sent you a message about your application for {}:\n\n{text}\n",
            applicant.name, recruiter.name, job.company_name, job.title
        ),
    };
    notify(
        &state,
        Notice::new(
            applicant.id,
            NotificationKind::Message,
            format!("Message from {} regarding {}: {text}", recruiter.name, job.title),
        )
        .job(job.id)
        .email(email),
    )
    .await?;

    info!(application_id = %app_id, "Recruiter message sent");
    Ok(Json(json!({ "message": "Message sent to applicant" })))
}
