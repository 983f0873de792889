use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Internship,
    Contract,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Internship => "internship",
            JobType::Contract => "contract",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    /// Accepts both the wire form (`full_time`) and the display form (`Full-time`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "full_time" | "fulltime" => Ok(JobType::FullTime),
            "part_time" | "parttime" => Ok(JobType::PartTime),
            "internship" => Ok(JobType::Internship),
            "contract" => Ok(JobType::Contract),
            _ => Err(format!("Unknown job type '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub job_type: JobType,
    pub salary: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A job together with the name of the recruiter who posted it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub job: Job,
    pub poster_name: String,
}

/// A recruiter's own job with its application count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithStats {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub job: Job,
    pub application_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_id: Uuid,
    pub company_name: String,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub job_type: JobType,
    pub salary: i64,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the location.
    pub location: Option<Option<String>>,
    pub job_type: Option<JobType>,
    pub salary: Option<i64>,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}
