use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_mode", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewMode {
    Online,
    Offline,
}

impl InterviewMode {
    pub fn label(&self) -> &'static str {
        match self {
            InterviewMode::Online => "Online (Zoom/Meet)",
            InterviewMode::Offline => "Offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub job_id: Uuid,
    pub recruiter_id: Uuid,
    pub candidate_id: Uuid,
    pub date: NaiveDate,
    /// Normalized to `HH:MM`, so (date, time) sorts chronologically.
    pub time: String,
    pub mode: InterviewMode,
    pub meeting_link: String,
    pub location: String,
    pub notes: String,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub job_id: Uuid,
    pub recruiter_id: Uuid,
    pub candidate_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub mode: InterviewMode,
    pub meeting_link: String,
    pub location: String,
    pub notes: String,
}

/// An interview joined with the names both participants see.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub interview: Interview,
    pub job_title: String,
    pub company_name: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub recruiter_name: String,
    pub recruiter_email: String,
}

/// A (candidate, job) pair a recruiter may schedule an interview for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RecruiterApplicant {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_id: Uuid,
    pub job_title: String,
}
