//! Persistence layer.
//!
//! One repository trait per entity, combined into [`Repository`] so handlers
//! can hold a single `Arc<dyn Repository>`. [`PgRepository`] is the
//! production implementation; `MemoryRepository` backs the test suite.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::jobs::search::JobQuery;
use crate::models::application::{
    ApplicantEntry, Application, ApplicationStatus, ApplicationWithJob, NewApplication,
};
use crate::models::company::{Company, CompanyUpdate, NewCompany};
use crate::models::interview::{Interview, InterviewDetail, NewInterview, RecruiterApplicant};
use crate::models::job::{Job, JobDetail, JobPage, JobUpdate, JobWithStats, NewJob};
use crate::models::notification::{NewNotification, Notification, NotificationView};
use crate::models::user::{NewUser, User, UserUpdate};

#[cfg(test)]
pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Creates the PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email or phone number is taken.
    async fn insert_user(&self, user: NewUser) -> RepositoryResult<User>;
    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_user_by_phone(&self, phone_number: &str) -> RepositoryResult<Option<User>>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepositoryResult<User>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()>;

    /// Idempotent.
    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()>;
    /// Idempotent.
    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()>;
    /// Most recently saved first.
    async fn saved_jobs(&self, user_id: Uuid) -> RepositoryResult<Vec<Job>>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Fails with `Conflict` when the owner already has a company or the name is taken.
    async fn insert_company(&self, company: NewCompany) -> RepositoryResult<Company>;
    async fn find_company(&self, id: Uuid) -> RepositoryResult<Option<Company>>;
    async fn find_company_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<Company>>;
    async fn list_companies(&self) -> RepositoryResult<Vec<Company>>;
    /// A rename is propagated to the company's jobs.
    async fn update_company(&self, id: Uuid, update: CompanyUpdate) -> RepositoryResult<Company>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert_job(&self, job: NewJob) -> RepositoryResult<Job>;
    async fn find_job(&self, id: Uuid) -> RepositoryResult<Option<Job>>;
    async fn find_job_detail(&self, id: Uuid) -> RepositoryResult<Option<JobDetail>>;
    async fn search_jobs(&self, query: &JobQuery) -> RepositoryResult<JobPage>;
    /// Newest first.
    async fn jobs_posted_by(&self, recruiter_id: Uuid) -> RepositoryResult<Vec<JobWithStats>>;
    async fn update_job(&self, id: Uuid, update: JobUpdate) -> RepositoryResult<Job>;
    /// Removes the job's applications, saved entries and interviews with it.
    async fn delete_job(&self, id: Uuid) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the applicant already applied to the job.
    async fn insert_application(&self, application: NewApplication)
        -> RepositoryResult<Application>;
    async fn find_application(&self, id: Uuid) -> RepositoryResult<Option<Application>>;
    async fn find_application_for(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> RepositoryResult<Option<Application>>;
    /// Newest first.
    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepositoryResult<Vec<ApplicationWithJob>>;
    /// Oldest first.
    async fn applications_for_job(&self, job_id: Uuid) -> RepositoryResult<Vec<ApplicantEntry>>;
    /// Compare-and-set: writes `status` only while the row still holds
    /// `expected`. `None` when the row has moved on or does not exist.
    async fn update_application_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
    ) -> RepositoryResult<Option<Application>>;
    /// Distinct (candidate, job) pairs across the recruiter's jobs, rejected applications excluded.
    async fn recruiter_applicants(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<RecruiterApplicant>>;
}

#[async_trait]
pub trait InterviewRepository: Send + Sync {
    async fn insert_interview(&self, interview: NewInterview) -> RepositoryResult<Interview>;
    async fn find_interview(&self, id: Uuid) -> RepositoryResult<Option<Interview>>;
    async fn interview_detail(&self, id: Uuid) -> RepositoryResult<Option<InterviewDetail>>;
    /// Ordered by (date, time).
    async fn interviews_for_recruiter(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>>;
    /// Ordered by (date, time).
    async fn interviews_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>>;
    /// Persists every mutable field of `interview` and bumps `updated_at`.
    async fn save_interview(&self, interview: &Interview) -> RepositoryResult<Interview>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> RepositoryResult<Notification>;
    /// Newest first.
    async fn notifications_for(&self, recipient_id: Uuid)
        -> RepositoryResult<Vec<NotificationView>>;
    async fn unread_count(&self, recipient_id: Uuid) -> RepositoryResult<i64>;
    /// `None` when the notification does not exist or belongs to someone else.
    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> RepositoryResult<Option<Notification>>;
    async fn mark_all_read(&self, recipient_id: Uuid) -> RepositoryResult<u64>;
    /// `false` when the notification does not exist or belongs to someone else.
    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> RepositoryResult<bool>;
}

/// Every repository capability behind one object.
pub trait Repository:
    UserRepository
    + CompanyRepository
    + JobRepository
    + ApplicationRepository
    + InterviewRepository
    + NotificationRepository
{
}

impl<T> Repository for T where
    T: UserRepository
        + CompanyRepository
        + JobRepository
        + ApplicationRepository
        + InterviewRepository
        + NotificationRepository
{
}
