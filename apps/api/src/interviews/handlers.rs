use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interviews::formatting::{format_date, format_time, normalize_time, parse_date};
use crate::models::application::ApplicationStatus;
use crate::models::interview::{
    Interview, InterviewDetail, InterviewMode, InterviewStatus, NewInterview, RecruiterApplicant,
};
use crate::models::notification::NotificationKind;
use crate::models::user::Role;
use crate::notifications::{notify, Notice};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub date: String,
    pub time: String,
    pub mode: InterviewMode,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateInterviewRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: Option<InterviewMode>,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<InterviewStatus>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub message: &'static str,
    pub interview: InterviewDetail,
}

/// Interviews are never booked for a day that has already passed.
fn upcoming_date(raw: &str) -> Result<NaiveDate, AppError> {
    let date = parse_date(raw)?;
    if date < Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Interview date cannot be in the past".into(),
        ));
    }
    Ok(date)
}

async fn detail(state: &AppState, id: Uuid) -> Result<InterviewDetail, AppError> {
    state
        .repo
        .interview_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// Loads an interview the calling recruiter scheduled.
async fn owned_interview(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<Interview, AppError> {
    auth.require(Role::Recruiter)?;
    let interview = state
        .repo
        .find_interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
    if interview.recruiter_id != auth.id {
        return Err(AppError::Forbidden(
            "Not authorized to manage this interview".into(),
        ));
    }
    Ok(interview)
}

/// POST /api/interviews
pub async fn handle_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<InterviewDetail>), AppError> {
    auth.require(Role::Recruiter)?;
    let time = normalize_time(&req.time)?;
    let date = upcoming_date(&req.date)?;

    let job = state
        .repo
        .find_job(req.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", req.job_id)))?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "Not authorized to schedule interviews for this job".into(),
        ));
    }

    let application = state
        .repo
        .find_application_for(job.id, req.candidate_id)
        .await?
        .ok_or_else(|| AppError::Validation("Candidate has not applied to this job".into()))?;
    if application.status == ApplicationStatus::Rejected {
        return Err(AppError::Validation(
            "Cannot schedule an interview for a rejected application".into(),
        ));
    }

    let candidate = state
        .repo
        .find_user(req.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {} not found", req.candidate_id)))?;

    let interview = state
        .repo
        .insert_interview(NewInterview {
            job_id: job.id,
            recruiter_id: auth.id,
            candidate_id: candidate.id,
            date,
            time,
            mode: req.mode,
            meeting_link: req.meeting_link.unwrap_or_default(),
            location: req.location.unwrap_or_default(),
            notes: req.notes.unwrap_or_default(),
        })
        .await?;

    let when = format!(
        "on {} at {}",
        format_date(interview.date),
        format_time(&interview.time)
    );
    notify(
        &state,
        Notice::new(
            candidate.id,
            NotificationKind::Interview,
            format!(
                "Interview scheduled! You have an interview for {} {when}. Mode: {}",
                job.title,
                interview.mode.label()
            ),
        )
        .job(job.id)
        .interview(interview.id),
    )
    .await?;
    notify(
        &state,
        Notice::new(
            auth.id,
            NotificationKind::Interview,
            format!(
                "Interview scheduled with {} for {} {when}",
                candidate.name, job.title
            ),
        )
        .job(job.id)
        .interview(interview.id),
    )
    .await?;

    info!(
        interview_id = %interview.id,
        job_id = %job.id,
        candidate_id = %candidate.id,
        "Interview scheduled"
    );
    Ok((StatusCode::CREATED, Json(detail(&state, interview.id).await?)))
}

/// GET /api/interviews/recruiter
pub async fn handle_recruiter_interviews(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InterviewDetail>>, AppError> {
    auth.require(Role::Recruiter)?;
    Ok(Json(state.repo.interviews_for_recruiter(auth.id).await?))
}

/// GET /api/interviews/candidate
pub async fn handle_candidate_interviews(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InterviewDetail>>, AppError> {
    auth.require(Role::Applicant)?;
    Ok(Json(state.repo.interviews_for_candidate(auth.id).await?))
}

/// GET /api/interviews/recruiter-applicants
pub async fn handle_recruiter_applicants(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RecruiterApplicant>>, AppError> {
    auth.require(Role::Recruiter)?;
    Ok(Json(state.repo.recruiter_applicants(auth.id).await?))
}

/// PUT /api/interviews/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInterviewRequest>,
) -> Result<Json<InterviewDetail>, AppError> {
    let mut interview = owned_interview(&state, &auth, id).await?;
    if interview.status == InterviewStatus::Cancelled {
        return Err(AppError::Conflict(
            "A cancelled interview cannot be updated".into(),
        ));
    }
    if req.status == Some(InterviewStatus::Cancelled) {
        return Err(AppError::Validation(
            "Use DELETE /api/interviews/:id to cancel an interview".into(),
        ));
    }

    let new_time = req.time.as_deref().map(normalize_time).transpose()?;
    let new_date = req.date.as_deref().map(upcoming_date).transpose()?;
    let rescheduled = new_date.is_some_and(|d| d != interview.date)
        || new_time.as_ref().is_some_and(|t| *t != interview.time);

    if let Some(date) = new_date {
        interview.date = date;
    }
    if let Some(time) = new_time {
        interview.time = time;
    }
    if let Some(mode) = req.mode {
        interview.mode = mode;
    }
    if let Some(link) = req.meeting_link {
        interview.meeting_link = link;
    }
    if let Some(location) = req.location {
        interview.location = location;
    }
    if let Some(notes) = req.notes {
        interview.notes = notes;
    }
    if let Some(status) = req.status {
        interview.status = status;
    }

    let saved = state.repo.save_interview(&interview).await?;
    let updated = detail(&state, saved.id).await?;

    if rescheduled {
        notify(
            &state,
            Notice::new(
                saved.candidate_id,
                NotificationKind::Interview,
                format!(
                    "Your interview for {} has been rescheduled to {} at {}",
                    updated.job_title,
                    format_date(saved.date),
                    format_time(&saved.time)
                ),
            )
            .job(saved.job_id)
            .interview(saved.id),
        )
        .await?;
        info!(interview_id = %id, "Interview rescheduled");
    }

    Ok(Json(updated))
}

/// DELETE /api/interviews/:id
pub async fn handle_cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    let mut interview = owned_interview(&state, &auth, id).await?;
    if interview.status == InterviewStatus::Cancelled {
        return Err(AppError::Conflict("Interview is already cancelled".into()));
    }

    interview.status = InterviewStatus::Cancelled;
    let saved = state.repo.save_interview(&interview).await?;
    let cancelled = detail(&state, saved.id).await?;

    notify(
        &state,
        Notice::new(
            saved.candidate_id,
            NotificationKind::Interview,
            format!(
                "Your interview for {} on {} has been cancelled by the recruiter.",
                cancelled.job_title,
                format_date(saved.date)
            ),
        )
        .job(saved.job_id)
        .interview(saved.id),
    )
    .await?;

    info!(interview_id = %id, "Interview cancelled");
    Ok(Json(CancelResponse {
        message: "Interview cancelled",
        interview: cancelled,
    }))
}

/// GET /api/interviews/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewDetail>, AppError> {
    let interview = detail(&state, id).await?;
    let participant =
        interview.interview.recruiter_id == auth.id || interview.interview.candidate_id == auth.id;
    if !participant {
        return Err(AppError::Forbidden(
            "Not authorized to view this interview".into(),
        ));
    }
    Ok(Json(interview))
}
