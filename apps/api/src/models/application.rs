use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::JobType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Viewed,
    Shortlisted,
    Rejected,
    Selected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Selected => "selected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "viewed" => Ok(ApplicationStatus::Viewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "selected" => Ok(ApplicationStatus::Selected),
            other => Err(format!("Invalid status value '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cover_letter: Option<String>,
}

/// An applicant's view of their application.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: Application,
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub job_type: JobType,
    pub salary: i64,
}

/// A recruiter's view of one applicant to their job.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: Application,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub resume: Option<String>,
}
