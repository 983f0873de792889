#[cfg(test)]
use std::cmp::Ordering;

use serde::Deserialize;

use crate::errors::AppError;
#[cfg(test)]
use crate::models::job::Job;
use crate::models::job::JobType;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Latest,
    Oldest,
    SalaryHigh,
    SalaryLow,
}

/// Raw query string of `GET /api/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobSearchParams {
    pub keyword: Option<String>,
    pub location: Option<String>,
    /// Comma-separated, e.g. `full_time,contract`.
    pub job_type: Option<String>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub sort: Option<JobSort>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated, normalized search request understood by every repository.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    /// Lower-cased; matched against title, company name and description.
    pub keyword: Option<String>,
    /// Lower-cased substring of the job location.
    pub location: Option<String>,
    pub job_types: Vec<JobType>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub sort: JobSort,
    pub page: u32,
    pub limit: u32,
}

impl Default for JobQuery {
    fn default() -> Self {
        JobQuery {
            keyword: None,
            location: None,
            job_types: Vec::new(),
            min_salary: None,
            max_salary: None,
            sort: JobSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TryFrom<JobSearchParams> for JobQuery {
    type Error = AppError;

    fn try_from(params: JobSearchParams) -> Result<Self, Self::Error> {
        let job_types = match params.job_type.as_deref() {
            Some(raw) => raw
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(|part| part.parse::<JobType>().map_err(AppError::Validation))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        if let (Some(min), Some(max)) = (params.min_salary, params.max_salary) {
            if min > max {
                return Err(AppError::Validation(
                    "min_salary cannot exceed max_salary".to_string(),
                ));
            }
        }

        Ok(JobQuery {
            keyword: normalize(params.keyword),
            location: normalize(params.location),
            job_types,
            min_salary: params.min_salary,
            max_salary: params.max_salary,
            sort: params.sort.unwrap_or_default(),
            page: params.page.unwrap_or(1).max(1),
            limit: params
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        })
    }
}

impl JobQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// In-process equivalent of the SQL filter.
    #[cfg(test)]
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(keyword) = &self.keyword {
            let hit = [&job.title, &job.company_name, &job.description]
                .iter()
                .any(|field| field.to_lowercase().contains(keyword.as_str()));
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            let hit = job
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(location.as_str()))
                .unwrap_or(false);
            if !hit {
                return false;
            }
        }

        if !self.job_types.is_empty() && !self.job_types.contains(&job.job_type) {
            return false;
        }

        if self.min_salary.is_some_and(|min| job.salary < min) {
            return false;
        }
        if self.max_salary.is_some_and(|max| job.salary > max) {
            return false;
        }

        true
    }

    /// Result ordering; ties fall back to newest first, then id.
    #[cfg(test)]
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        let newest_first = b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id));
        match self.sort {
            JobSort::Latest => newest_first,
            JobSort::Oldest => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
            JobSort::SalaryHigh => b.salary.cmp(&a.salary).then(newest_first),
            JobSort::SalaryLow => a.salary.cmp(&b.salary).then(newest_first),
        }
    }

    pub fn order_by_sql(&self) -> &'static str {
        match self.sort {
            JobSort::Latest => "created_at DESC, id ASC",
            JobSort::Oldest => "created_at ASC, id ASC",
            JobSort::SalaryHigh => "salary DESC, created_at DESC, id ASC",
            JobSort::SalaryLow => "salary ASC, created_at DESC, id ASC",
        }
    }
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}
