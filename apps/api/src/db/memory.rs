//! In-memory repository backing the test suite.
//!
//! Mirrors the constraints the Postgres schema enforces: unique emails, phone
//! numbers, company names and owners, one application per (job, applicant), and
//! the cascades on job deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApplicationRepository, CompanyRepository, InterviewRepository, JobRepository,
    NotificationRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::jobs::search::JobQuery;
use crate::models::application::{
    ApplicantEntry, Application, ApplicationStatus, ApplicationWithJob, NewApplication,
};
use crate::models::company::{Company, CompanyUpdate, NewCompany};
use crate::models::interview::{
    Interview, InterviewDetail, InterviewStatus, NewInterview, RecruiterApplicant,
};
use crate::models::job::{Job, JobDetail, JobPage, JobUpdate, JobWithStats, NewJob};
use crate::models::notification::{NewNotification, Notification, NotificationView};
use crate::models::user::{NewUser, Profile, User, UserUpdate};

#[derive(Clone, Default)]
pub struct MemoryRepository {
    data: Arc<RwLock<MemoryData>>,
}

#[derive(Default)]
struct MemoryData {
    users: Vec<User>,
    companies: Vec<Company>,
    jobs: Vec<Job>,
    saved_jobs: Vec<SavedJob>,
    applications: Vec<Application>,
    interviews: Vec<Interview>,
    notifications: Vec<Notification>,
    last_tick: Option<DateTime<Utc>>,
}

struct SavedJob {
    user_id: Uuid,
    job_id: Uuid,
    saved_at: DateTime<Utc>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryData {
    /// Strictly increasing timestamps keep "newest first" orderings deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn job(&self, id: Uuid) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    fn interview_detail(&self, interview: &Interview) -> Option<InterviewDetail> {
        let job = self.job(interview.job_id)?;
        let candidate = self.user(interview.candidate_id)?;
        let recruiter = self.user(interview.recruiter_id)?;
        Some(InterviewDetail {
            interview: interview.clone(),
            job_title: job.title.clone(),
            company_name: job.company_name.clone(),
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.clone(),
            recruiter_name: recruiter.name.clone(),
            recruiter_email: recruiter.email.clone(),
        })
    }

    fn sorted_interviews(&self, keep: impl Fn(&Interview) -> bool) -> Vec<InterviewDetail> {
        let mut details: Vec<_> = self
            .interviews
            .iter()
            .filter(|i| keep(i))
            .filter_map(|i| self.interview_detail(i))
            .collect();
        details.sort_by(|a, b| {
            (a.interview.date, &a.interview.time).cmp(&(b.interview.date, &b.interview.time))
        });
        details
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn insert_user(&self, user: NewUser) -> RepositoryResult<User> {
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("Email already in use".into()));
        }
        if data.users.iter().any(|u| u.phone_number == user.phone_number) {
            return Err(RepositoryError::Conflict(
                "Phone number already in use".into(),
            ));
        }

        let now = data.tick();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            password_hash: user.password_hash,
            role: user.role,
            profile_picture: None,
            profile: Json(Profile::default()),
            created_at: now,
            updated_at: now,
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.data.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_phone(&self, phone_number: &str) -> RepositoryResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.phone_number == phone_number)
            .cloned())
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepositoryResult<User> {
        let mut data = self.data.write().await;
        if let Some(phone) = &update.phone_number {
            if data
                .users
                .iter()
                .any(|u| u.id != id && &u.phone_number == phone)
            {
                return Err(RepositoryError::Conflict(
                    "Phone number already in use".into(),
                ));
            }
        }

        let now = data.tick();
        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("User {id}")))?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(phone) = update.phone_number {
            user.phone_number = phone;
        }
        if let Some(profile) = update.profile {
            user.profile = Json(profile);
        }
        if let Some(picture) = update.profile_picture {
            user.profile_picture = Some(picture);
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("User {id}")))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = now;
        Ok(())
    }

    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        if data
            .saved_jobs
            .iter()
            .any(|s| s.user_id == user_id && s.job_id == job_id)
        {
            return Ok(());
        }
        let saved_at = data.tick();
        data.saved_jobs.push(SavedJob {
            user_id,
            job_id,
            saved_at,
        });
        Ok(())
    }

    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        data.saved_jobs
            .retain(|s| !(s.user_id == user_id && s.job_id == job_id));
        Ok(())
    }

    async fn saved_jobs(&self, user_id: Uuid) -> RepositoryResult<Vec<Job>> {
        let data = self.data.read().await;
        let mut saved: Vec<_> = data
            .saved_jobs
            .iter()
            .filter(|s| s.user_id == user_id)
            .collect();
        saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(saved
            .into_iter()
            .filter_map(|s| data.job(s.job_id).cloned())
            .collect())
    }
}

#[async_trait]
impl CompanyRepository for MemoryRepository {
    async fn insert_company(&self, company: NewCompany) -> RepositoryResult<Company> {
        let mut data = self.data.write().await;
        if data.companies.iter().any(|c| c.owner_id == company.owner_id) {
            return Err(RepositoryError::Conflict(
                "You have already registered a company".into(),
            ));
        }
        if data
            .companies
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&company.name))
        {
            return Err(RepositoryError::Conflict("Company already exists".into()));
        }

        let now = data.tick();
        let company = Company {
            id: Uuid::new_v4(),
            owner_id: company.owner_id,
            name: company.name,
            logo: company.logo,
            description: company.description,
            website: company.website,
            created_at: now,
            updated_at: now,
        };
        data.companies.push(company.clone());
        Ok(company)
    }

    async fn find_company(&self, id: Uuid) -> RepositoryResult<Option<Company>> {
        let data = self.data.read().await;
        Ok(data.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_company_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<Company>> {
        let data = self.data.read().await;
        Ok(data
            .companies
            .iter()
            .find(|c| c.owner_id == owner_id)
            .cloned())
    }

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        let data = self.data.read().await;
        let mut companies = data.companies.clone();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn update_company(&self, id: Uuid, update: CompanyUpdate) -> RepositoryResult<Company> {
        let mut data = self.data.write().await;
        if let Some(name) = &update.name {
            if data
                .companies
                .iter()
                .any(|c| c.id != id && c.name.eq_ignore_ascii_case(name))
            {
                return Err(RepositoryError::Conflict("Company already exists".into()));
            }
        }

        let now = data.tick();
        let company = data
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Company {id}")))?;
        if let Some(name) = update.name.clone() {
            company.name = name;
        }
        if let Some(logo) = update.logo {
            company.logo = Some(logo);
        }
        if let Some(description) = update.description {
            company.description = Some(description);
        }
        if let Some(website) = update.website {
            company.website = Some(website);
        }
        company.updated_at = now;
        let company = company.clone();

        if update.name.is_some() {
            for job in data.jobs.iter_mut().filter(|j| j.company_id == id) {
                job.company_name = company.name.clone();
            }
        }
        Ok(company)
    }
}

#[async_trait]
impl JobRepository for MemoryRepository {
    async fn insert_job(&self, job: NewJob) -> RepositoryResult<Job> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let job = Job {
            id: Uuid::new_v4(),
            company_id: job.company_id,
            company_name: job.company_name,
            posted_by: job.posted_by,
            title: job.title,
            description: job.description,
            location: job.location,
            job_type: job.job_type,
            salary: job.salary,
            created_at: now,
            updated_at: now,
        };
        data.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> RepositoryResult<Option<Job>> {
        Ok(self.data.read().await.job(id).cloned())
    }

    async fn find_job_detail(&self, id: Uuid) -> RepositoryResult<Option<JobDetail>> {
        let data = self.data.read().await;
        Ok(data.job(id).and_then(|job| {
            data.user(job.posted_by).map(|poster| JobDetail {
                job: job.clone(),
                poster_name: poster.name.clone(),
            })
        }))
    }

    async fn search_jobs(&self, query: &JobQuery) -> RepositoryResult<JobPage> {
        let data = self.data.read().await;
        let mut matching: Vec<_> = data.jobs.iter().filter(|j| query.matches(j)).collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as i64;
        let jobs = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(JobPage {
            jobs,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn jobs_posted_by(&self, recruiter_id: Uuid) -> RepositoryResult<Vec<JobWithStats>> {
        let data = self.data.read().await;
        let mut jobs: Vec<_> = data
            .jobs
            .iter()
            .filter(|j| j.posted_by == recruiter_id)
            .map(|job| JobWithStats {
                job: job.clone(),
                application_count: data
                    .applications
                    .iter()
                    .filter(|a| a.job_id == job.id)
                    .count() as i64,
            })
            .collect();
        jobs.sort_by(|a, b| b.job.created_at.cmp(&a.job.created_at));
        Ok(jobs)
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> RepositoryResult<Job> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let job = data
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Job {id}")))?;
        if let Some(title) = update.title {
            job.title = title;
        }
        if let Some(description) = update.description {
            job.description = description;
        }
        if let Some(location) = update.location {
            job.location = location;
        }
        if let Some(job_type) = update.job_type {
            job.job_type = job_type;
        }
        if let Some(salary) = update.salary {
            job.salary = salary;
        }
        job.updated_at = now;
        Ok(job.clone())
    }

    async fn delete_job(&self, id: Uuid) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        let before = data.jobs.len();
        data.jobs.retain(|j| j.id != id);
        if data.jobs.len() == before {
            return Err(RepositoryError::NotFound(format!("Job {id}")));
        }

        data.applications.retain(|a| a.job_id != id);
        data.saved_jobs.retain(|s| s.job_id != id);
        let dropped: Vec<Uuid> = data
            .interviews
            .iter()
            .filter(|i| i.job_id == id)
            .map(|i| i.id)
            .collect();
        data.interviews.retain(|i| i.job_id != id);
        for notification in data.notifications.iter_mut() {
            if notification.related_job_id == Some(id) {
                notification.related_job_id = None;
            }
            if notification
                .interview_id
                .is_some_and(|iid| dropped.contains(&iid))
            {
                notification.interview_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryRepository {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> RepositoryResult<Application> {
        let mut data = self.data.write().await;
        if data
            .applications
            .iter()
            .any(|a| a.job_id == application.job_id && a.applicant_id == application.applicant_id)
        {
            return Err(RepositoryError::Conflict(
                "You have already applied for this job".into(),
            ));
        }

        let now = data.tick();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            cover_letter: application.cover_letter,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        data.applications.push(application.clone());
        Ok(application)
    }

    async fn find_application(&self, id: Uuid) -> RepositoryResult<Option<Application>> {
        let data = self.data.read().await;
        Ok(data.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn find_application_for(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> RepositoryResult<Option<Application>> {
        let data = self.data.read().await;
        Ok(data
            .applications
            .iter()
            .find(|a| a.job_id == job_id && a.applicant_id == applicant_id)
            .cloned())
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> RepositoryResult<Vec<ApplicationWithJob>> {
        let data = self.data.read().await;
        let mut entries: Vec<_> = data
            .applications
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .filter_map(|a| {
                data.job(a.job_id).map(|job| ApplicationWithJob {
                    application: a.clone(),
                    job_title: job.title.clone(),
                    company_name: job.company_name.clone(),
                    location: job.location.clone(),
                    job_type: job.job_type,
                    salary: job.salary,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(entries)
    }

    async fn applications_for_job(&self, job_id: Uuid) -> RepositoryResult<Vec<ApplicantEntry>> {
        let data = self.data.read().await;
        let mut entries: Vec<_> = data
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .filter_map(|a| {
                data.user(a.applicant_id).map(|user| ApplicantEntry {
                    application: a.clone(),
                    applicant_name: user.name.clone(),
                    applicant_email: user.email.clone(),
                    applicant_phone: user.phone_number.clone(),
                    resume: user.profile.resume.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.application.created_at.cmp(&b.application.created_at));
        Ok(entries)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
    ) -> RepositoryResult<Option<Application>> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let Some(application) = data
            .applications
            .iter_mut()
            .find(|a| a.id == id && a.status == expected)
        else {
            return Ok(None);
        };
        application.status = status;
        application.updated_at = now;
        Ok(Some(application.clone()))
    }

    async fn recruiter_applicants(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<RecruiterApplicant>> {
        let data = self.data.read().await;
        let mut pairs: Vec<_> = data
            .applications
            .iter()
            .filter(|a| a.status != ApplicationStatus::Rejected)
            .filter_map(|a| {
                let job = data.job(a.job_id).filter(|j| j.posted_by == recruiter_id)?;
                let candidate = data.user(a.applicant_id)?;
                Some(RecruiterApplicant {
                    candidate_id: candidate.id,
                    candidate_name: candidate.name.clone(),
                    candidate_email: candidate.email.clone(),
                    job_id: job.id,
                    job_title: job.title.clone(),
                })
            })
            .collect();
        pairs.sort_by(|a, b| {
            (&a.candidate_name, &a.job_title).cmp(&(&b.candidate_name, &b.job_title))
        });
        Ok(pairs)
    }
}

#[async_trait]
impl InterviewRepository for MemoryRepository {
    async fn insert_interview(&self, interview: NewInterview) -> RepositoryResult<Interview> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let interview = Interview {
            id: Uuid::new_v4(),
            job_id: interview.job_id,
            recruiter_id: interview.recruiter_id,
            candidate_id: interview.candidate_id,
            date: interview.date,
            time: interview.time,
            mode: interview.mode,
            meeting_link: interview.meeting_link,
            location: interview.location,
            notes: interview.notes,
            status: InterviewStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        data.interviews.push(interview.clone());
        Ok(interview)
    }

    async fn find_interview(&self, id: Uuid) -> RepositoryResult<Option<Interview>> {
        let data = self.data.read().await;
        Ok(data.interviews.iter().find(|i| i.id == id).cloned())
    }

    async fn interview_detail(&self, id: Uuid) -> RepositoryResult<Option<InterviewDetail>> {
        let data = self.data.read().await;
        Ok(data
            .interviews
            .iter()
            .find(|i| i.id == id)
            .and_then(|i| data.interview_detail(i)))
    }

    async fn interviews_for_recruiter(
        &self,
        recruiter_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>> {
        let data = self.data.read().await;
        Ok(data.sorted_interviews(|i| i.recruiter_id == recruiter_id))
    }

    async fn interviews_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> RepositoryResult<Vec<InterviewDetail>> {
        let data = self.data.read().await;
        Ok(data.sorted_interviews(|i| i.candidate_id == candidate_id))
    }

    async fn save_interview(&self, interview: &Interview) -> RepositoryResult<Interview> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let stored = data
            .interviews
            .iter_mut()
            .find(|i| i.id == interview.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Interview {}", interview.id)))?;
        stored.date = interview.date;
        stored.time = interview.time.clone();
        stored.mode = interview.mode;
        stored.meeting_link = interview.meeting_link.clone();
        stored.location = interview.location.clone();
        stored.notes = interview.notes.clone();
        stored.status = interview.status;
        stored.updated_at = now;
        Ok(stored.clone())
    }
}

#[async_trait]
impl NotificationRepository for MemoryRepository {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> RepositoryResult<Notification> {
        let mut data = self.data.write().await;
        let now = data.tick();
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: notification.recipient_id,
            message: notification.message,
            kind: notification.kind,
            related_job_id: notification.related_job_id,
            interview_id: notification.interview_id,
            is_read: false,
            created_at: now,
        };
        data.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for(
        &self,
        recipient_id: Uuid,
    ) -> RepositoryResult<Vec<NotificationView>> {
        let data = self.data.read().await;
        let mut views: Vec<_> = data
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| {
                let job = n.related_job_id.and_then(|id| data.job(id));
                NotificationView {
                    notification: n.clone(),
                    job_title: job.map(|j| j.title.clone()),
                    company_name: job.map(|j| j.company_name.clone()),
                }
            })
            .collect();
        views.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        Ok(views)
    }

    async fn unread_count(&self, recipient_id: Uuid) -> RepositoryResult<i64> {
        let data = self.data.read().await;
        Ok(data
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> RepositoryResult<Option<Notification>> {
        let mut data = self.data.write().await;
        Ok(data
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> RepositoryResult<u64> {
        let mut data = self.data.write().await;
        let mut updated = 0;
        for n in data
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> RepositoryResult<bool> {
        let mut data = self.data.write().await;
        let before = data.notifications.len();
        data.notifications
            .retain(|n| !(n.id == id && n.recipient_id == recipient_id));
        Ok(data.notifications.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobType;
    use crate::models::notification::NotificationKind;
    use crate::models::user::Role;

    async fn seed_user(repo: &MemoryRepository, email: &str, phone: &str, role: Role) -> User {
        repo.insert_user(NewUser {
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            password_hash: "hash".to_string(),
            role,
        })
        .await
        .expect("insert user")
    }

    async fn seed_job(repo: &MemoryRepository, recruiter: &User) -> Job {
        let company = match repo.find_company_by_owner(recruiter.id).await.unwrap() {
            Some(c) => c,
            None => repo
                .insert_company(NewCompany {
                    owner_id: recruiter.id,
                    name: format!("{} Inc", recruiter.name),
                    logo: None,
                    description: None,
                    website: None,
                })
                .await
                .unwrap(),
        };
        repo.insert_job(NewJob {
            company_id: company.id,
            company_name: company.name,
            posted_by: recruiter.id,
            title: "Backend Engineer".into(),
            description: "Rust services".into(),
            location: Some("Remote".into()),
            job_type: JobType::FullTime,
            salary: 100_000,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_and_phone_conflict() {
        let repo = MemoryRepository::new();
        seed_user(&repo, "a@x.io", "1", Role::Applicant).await;

        let dup_email = repo
            .insert_user(NewUser {
                name: "b".into(),
                email: "a@x.io".into(),
                phone_number: "2".into(),
                password_hash: "h".into(),
                role: Role::Applicant,
            })
            .await;
        assert!(
            matches!(dup_email, Err(RepositoryError::Conflict(msg)) if msg.contains("Email"))
        );

        let dup_phone = repo
            .insert_user(NewUser {
                name: "b".into(),
                email: "b@x.io".into(),
                phone_number: "1".into(),
                password_hash: "h".into(),
                role: Role::Applicant,
            })
            .await;
        assert!(
            matches!(dup_phone, Err(RepositoryError::Conflict(msg)) if msg.contains("Phone"))
        );
    }

    #[tokio::test]
    async fn company_names_are_unique_case_insensitively() {
        let repo = MemoryRepository::new();
        let r1 = seed_user(&repo, "r1@x.io", "1", Role::Recruiter).await;
        let r2 = seed_user(&repo, "r2@x.io", "2", Role::Recruiter).await;
        let new = |owner_id, name: &str| NewCompany {
            owner_id,
            name: name.to_string(),
            logo: None,
            description: None,
            website: None,
        };

        repo.insert_company(new(r1.id, "Acme")).await.unwrap();
        assert!(matches!(
            repo.insert_company(new(r2.id, "ACME")).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            repo.insert_company(new(r1.id, "Other")).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_job_cascades_and_detaches_notifications() {
        let repo = MemoryRepository::new();
        let recruiter = seed_user(&repo, "r@x.io", "1", Role::Recruiter).await;
        let applicant = seed_user(&repo, "a@x.io", "2", Role::Applicant).await;
        let job = seed_job(&repo, &recruiter).await;

        repo.insert_application(NewApplication {
            job_id: job.id,
            applicant_id: applicant.id,
            cover_letter: None,
        })
        .await
        .unwrap();
        repo.save_job(applicant.id, job.id).await.unwrap();
        let notification = repo
            .insert_notification(NewNotification {
                recipient_id: recruiter.id,
                message: "New application".into(),
                kind: NotificationKind::Application,
                related_job_id: Some(job.id),
                interview_id: None,
            })
            .await
            .unwrap();

        repo.delete_job(job.id).await.unwrap();

        assert!(repo.find_job(job.id).await.unwrap().is_none());
        assert!(repo
            .applications_by_applicant(applicant.id)
            .await
            .unwrap()
            .is_empty());
        assert!(repo.saved_jobs(applicant.id).await.unwrap().is_empty());
        let views = repo.notifications_for(recruiter.id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].notification.id, notification.id);
        assert!(views[0].notification.related_job_id.is_none());
        assert!(views[0].job_title.is_none());
        assert!(matches!(
            repo.delete_job(job.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn status_updates_only_apply_to_the_expected_status() {
        let repo = MemoryRepository::new();
        let recruiter = seed_user(&repo, "r@x.io", "1", Role::Recruiter).await;
        let applicant = seed_user(&repo, "a@x.io", "2", Role::Applicant).await;
        let job = seed_job(&repo, &recruiter).await;
        let application = repo
            .insert_application(NewApplication {
                job_id: job.id,
                applicant_id: applicant.id,
                cover_letter: None,
            })
            .await
            .unwrap();

        let selected = repo
            .update_application_status(
                application.id,
                ApplicationStatus::Pending,
                ApplicationStatus::Selected,
            )
            .await
            .unwrap();
        assert_eq!(selected.unwrap().status, ApplicationStatus::Selected);

        // a second writer that read `pending` earlier loses
        let stale = repo
            .update_application_status(
                application.id,
                ApplicationStatus::Pending,
                ApplicationStatus::Rejected,
            )
            .await
            .unwrap();
        assert!(stale.is_none());
        assert_eq!(
            repo.find_application(application.id)
                .await
                .unwrap()
                .unwrap()
                .status,
            ApplicationStatus::Selected
        );
    }

    #[tokio::test]
    async fn renaming_a_company_updates_its_jobs() {
        let repo = MemoryRepository::new();
        let recruiter = seed_user(&repo, "r@x.io", "1", Role::Recruiter).await;
        let job = seed_job(&repo, &recruiter).await;

        repo.update_company(
            job.company_id,
            CompanyUpdate {
                name: Some("Renamed Co".into()),
                ..CompanyUpdate::default()
            },
        )
        .await
        .unwrap();

        let job = repo.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.company_name, "Renamed Co");
    }

    #[tokio::test]
    async fn saved_jobs_are_idempotent_and_newest_first() {
        let repo = MemoryRepository::new();
        let recruiter = seed_user(&repo, "r@x.io", "1", Role::Recruiter).await;
        let applicant = seed_user(&repo, "a@x.io", "2", Role::Applicant).await;
        let first = seed_job(&repo, &recruiter).await;
        let second = seed_job(&repo, &recruiter).await;

        repo.save_job(applicant.id, first.id).await.unwrap();
        repo.save_job(applicant.id, second.id).await.unwrap();
        repo.save_job(applicant.id, first.id).await.unwrap();

        let saved = repo.saved_jobs(applicant.id).await.unwrap();
        let ids: Vec<_> = saved.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        repo.unsave_job(applicant.id, second.id).await.unwrap();
        repo.unsave_job(applicant.id, second.id).await.unwrap();
        assert_eq!(repo.saved_jobs(applicant.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_their_recipient() {
        let repo = MemoryRepository::new();
        let owner = seed_user(&repo, "o@x.io", "1", Role::Applicant).await;
        let other = seed_user(&repo, "p@x.io", "2", Role::Applicant).await;
        let n = repo
            .insert_notification(NewNotification {
                recipient_id: owner.id,
                message: "hello".into(),
                kind: NotificationKind::Info,
                related_job_id: None,
                interview_id: None,
            })
            .await
            .unwrap();

        assert!(repo.mark_read(n.id, other.id).await.unwrap().is_none());
        assert!(!repo.delete_notification(n.id, other.id).await.unwrap());
        assert_eq!(repo.unread_count(owner.id).await.unwrap(), 1);

        assert!(repo.mark_read(n.id, owner.id).await.unwrap().unwrap().is_read);
        assert_eq!(repo.unread_count(owner.id).await.unwrap(), 0);
        assert!(repo.delete_notification(n.id, owner.id).await.unwrap());
    }
}
