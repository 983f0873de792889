use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{
    ApplicationRepository, CompanyRepository, InterviewRepository, JobRepository,
    NotificationRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::jobs::search::{like_pattern, JobQuery};
use crate::models::application::{
    ApplicantEntry, Application, ApplicationStatus, ApplicationWithJob, NewApplication,
};
use crate::models::company::{Company, CompanyUpdate, NewCompany};
use crate::models::interview::{Interview, InterviewDetail, NewInterview, RecruiterApplicant};
use crate::models::job::{Job, JobDetail, JobPage, JobUpdate, JobWithStats, NewJob};
use crate::models::notification::{NewNotification, Notification, NotificationView};
use crate::models::user::{NewUser, User, UserUpdate};

const INTERVIEW_DETAIL_SELECT: &str = r#"
    SELECT i.*,
           j.title AS job_title,
           j.company_name,
           c.name AS candidate_name,
           c.email AS candidate_email,
           r.name AS recruiter_name,
           r.email AS recruiter_email
    FROM interviews i
    JOIN jobs j ON j.id = i.job_id
    JOIN users c ON c.id = i.candidate_id
    JOIN users r ON r.id = i.recruiter_id
"#;

/// sqlx-backed repository over the schema in `migrations/`.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns a unique-constraint violation into `Conflict`, naming the clash via `describe`.
fn unique_violation(err: sqlx::Error, describe: fn(&str) -> &'static str) -> RepositoryError {
    let constraint = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    };
    match constraint {
        Some(name) => {
            debug!("Unique violation on constraint '{name}'");
            RepositoryError::Conflict(describe(&name).to_string())
        }
        None => RepositoryError::Database(err),
    }
}

fn push_job_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &JobQuery) {
    qb.push(" WHERE TRUE");

    if let Some(keyword) = &query.keyword {
        let pattern = like_pattern(keyword);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(location) = &query.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }

    if !query.job_types.is_empty() {
        qb.push(" AND job_type IN (");
        let mut types = qb.separated(", ");
        for job_type in &query.job_types {
            types.push_bind(*job_type);
        }
        types.push_unseparated(")");
    }

    if let Some(min) = query.min_salary {
        qb.push(" AND salary >= ").push_bind(min);
    }
    if let Some(max) = query.max_salary {
        qb.push(" AND salary <= ").push_bind(max);
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn insert_user(&self, user: NewUser) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, phone_number, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(e, |constraint| {
                if constraint.contains("phone") {
                    "Phone number already in use"
                } else {
                    "Email already in use"
                }
            })
        })
    }

    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_phone(&self, phone_number: &str) -> RepositoryResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
                .bind(phone_number)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                profile = COALESCE($4, profile),
                profile_picture = COALESCE($5, profile_picture),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.phone_number)
        .bind(update.profile.map(Json))
        .bind(update.profile_picture)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, |_| "Phone number already in use"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("User {id}")))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO saved_jobs (user_id, job_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn saved_jobs(&self, user_id: Uuid) -> RepositoryResult<Vec<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            r#"
            SELECT j.*
            FROM saved_jobs s
            JOIN jobs j ON j.id = s.job_id
            WHERE s.user_id = $1
            ORDER BY s.saved_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl CompanyRepository for PgRepository {
    async fn insert_company(&self, company: NewCompany) -> RepositoryResult<Company> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, owner_id, name, logo, description, website)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company.owner_id)
        .bind(&company.name)
        .bind(&company.logo)
        .bind(&company.description)
        .bind(&company.website)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(e, |constraint| {
                if constraint.contains("owner") {
                    "You have already registered a company"
                } else {
                    "Company already exists"
                }
            })
        })
    }

    async fn find_company(&self, id: Uuid) -> RepositoryResult<Option<Company>> {
        Ok(
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_company_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<Company>> {
        Ok(
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        Ok(
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_company(&self, id: Uuid, update: CompanyUpdate) -> RepositoryResult<Company> {
        let mut tx = self.pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                logo = COALESCE($3, logo),
                description = COALESCE($4, description),
                website = COALESCE($5, website),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.logo)
        .bind(&update.description)
        .bind(&update.website)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, |_| "Company already exists"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Company {id}")))?;

        if update.name.is_some() {
            sqlx::query("UPDATE jobs SET company_name = $2 WHERE company_id = $1")
                .bind(id)
                .bind(&company.name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(company)
    }
}

#[async_trait]
impl JobRepository for PgRepository {
    async fn insert_job(&self, job: NewJob) -> RepositoryResult<Job> {
        Ok(sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs
                (id, company_id, company_name, posted_by, title, description,
                 location, job_type, salary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.company_id)
        .bind(&job.company_name)
        .bind(job.posted_by)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.job_type)
        .bind(job.salary)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_job(&self, id: Uuid) -> RepositoryResult<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_job_detail(&self, id: Uuid) -> RepositoryResult<Option<JobDetail>> {
        Ok(sqlx::query_as::<_, JobDetail>(
            r#"
            SELECT j.*, u.name AS poster_name
            FROM jobs j
            JOIN users u ON u.id = j.posted_by
            WHERE j.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn search_jobs(&self, query: &JobQuery) -> RepositoryResult<JobPage> {
        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM jobs");
        push_job_filters(&mut select, query);
        select
            .push(" ORDER BY ")
            .push(query.order_by_sql())
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset());
        let jobs = select.build_query_as::<Job>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_job_filters(&mut count, query);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        Ok(JobPage {
            jobs,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn jobs_posted_by(&self, recruiter_id: Uuid) -> RepositoryResult<Vec<JobWithStats>> {
        Ok(sqlx::query_as::<_, JobWithStats>(
            r#"
            SELECT j.*, COUNT(a.id) AS application_count
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            WHERE j.posted_by = $1
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> RepositoryResult<Job> {
        let set_location = update.location.is_some();
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = CASE WHEN $7 THEN $4 ELSE location END,
                job_type = COALESCE($5, job_type),
                salary = COALESCE($6, salary),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.location.flatten())
        .bind(update.job_type)
        .bind(update.salary)
        .bind(set_location)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Job {id}")))
    }

    async fn delete_job(&self, id: Uuid) -> RepositoryResult<()> {
        // applications, saved_jobs and interviews cascade; notifications keep a NULL job
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Job {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for PgRepository {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> RepositoryResult<Application> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, job_id, applicant_id, cover_letter)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application.job_id)
        .bind(application.applicant_id)
        .bind(&application.cover_letter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, |_| "You have already applied for this job"))
    }

    async fn find_application(&self, id: Uuid) -> RepositoryResult<Option<Application>> {
        Ok(
            sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_application_for(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> RepositoryResult<Option<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = $1 AND applicant_id = $2",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepositoryResult<Vec<ApplicationWithJob>> {
        Ok(sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.*,
                   j.title AS job_title,
                   j.company_name,
                   j.location,
                   j.job_type,
                   j.salary
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn applications_for_job(&self, job_id: Uuid) -> RepositoryResult<Vec<ApplicantEntry>> {
        Ok(sqlx::query_as::<_, ApplicantEntry>(
            r#"
            SELECT a.*,
                   u.name AS applicant_name,
                   u.email AS applicant_email,
                   u.phone_number AS applicant_phone,
                   u.profile->>'resume' AS resume
            FROM applications a
            JOIN users u ON u.id = a.applicant_id
            WHERE a.job_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
    ) -> RepositoryResult<Option<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $2, updated_at = now()
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn recruiter_applicants(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<RecruiterApplicant>> {
        // (job_id, applicant_id) is unique, so every row is already a distinct pair
        Ok(sqlx::query_as::<_, RecruiterApplicant>(
            r#"
            SELECT u.id AS candidate_id,
                   u.name AS candidate_name,
                   u.email AS candidate_email,
                   j.id AS job_id,
                   j.title AS job_title
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.applicant_id
            WHERE j.posted_by = $1 AND a.status <> 'rejected'
            ORDER BY u.name ASC, j.title ASC
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl InterviewRepository for PgRepository {
    async fn insert_interview(&self, interview: NewInterview) -> RepositoryResult<Interview> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews
                (id, job_id, recruiter_id, candidate_id, date, time, mode,
                 meeting_link, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(interview.job_id)
        .bind(interview.recruiter_id)
        .bind(interview.candidate_id)
        .bind(interview.date)
        .bind(&interview.time)
        .bind(interview.mode)
        .bind(&interview.meeting_link)
        .bind(&interview.location)
        .bind(&interview.notes)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_interview(&self, id: Uuid) -> RepositoryResult<Option<Interview>> {
        Ok(
            sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn interview_detail(&self, id: Uuid) -> RepositoryResult<Option<InterviewDetail>> {
        let sql = format!("{INTERVIEW_DETAIL_SELECT} WHERE i.id = $1");
        Ok(sqlx::query_as::<_, InterviewDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn interviews_for_recruiter(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>> {
        let sql =
            format!("{INTERVIEW_DETAIL_SELECT} WHERE i.recruiter_id = $1 ORDER BY i.date, i.time");
        Ok(sqlx::query_as::<_, InterviewDetail>(&sql)
            .bind(recruiter_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn interviews_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>> {
        let sql =
            format!("{INTERVIEW_DETAIL_SELECT} WHERE i.candidate_id = $1 ORDER BY i.date, i.time");
        Ok(sqlx::query_as::<_, InterviewDetail>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn save_interview(&self, interview: &Interview) -> RepositoryResult<Interview> {
        sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET date = $2,
                time = $3,
                mode = $4,
                meeting_link = $5,
                location = $6,
                notes = $7,
                status = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(interview.id)
        .bind(interview.date)
        .bind(&interview.time)
        .bind(interview.mode)
        .bind(&interview.meeting_link)
        .bind(&interview.location)
        .bind(&interview.notes)
        .bind(interview.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Interview {}", interview.id)))
    }
}

#[async_trait]
impl NotificationRepository for PgRepository {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> RepositoryResult<Notification> {
        Ok(sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (id, recipient_id, message, kind, related_job_id, interview_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.related_job_id)
        .bind(notification.interview_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn notifications_for(
        &self,
        recipient_id: Uuid,
    ) -> RepositoryResult<Vec<NotificationView>> {
        Ok(sqlx::query_as::<_, NotificationView>(
            r#"
            SELECT n.*, j.title AS job_title, j.company_name
            FROM notifications n
            LEFT JOIN jobs j ON j.id = n.related_job_id
            WHERE n.recipient_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn unread_count(&self, recipient_id: Uuid) -> RepositoryResult<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> RepositoryResult<Option<Notification>> {
        Ok(sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
