use crate::errors::AppError;
use crate::models::application::ApplicationStatus;

/// Result of asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    /// Requested status equals the current one.
    Unchanged,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Selected)
    }

    pub fn can_become(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Viewed | Shortlisted | Rejected | Selected)
                | (Viewed, Shortlisted | Rejected | Selected)
                | (Shortlisted, Rejected | Selected)
        )
    }
}

/// Checks `current -> next` against the application lifecycle.
pub fn check_transition(
    current: ApplicationStatus,
    next: ApplicationStatus,
) -> Result<Transition, AppError> {
    if current == next {
        return Ok(Transition::Unchanged);
    }
    if !current.can_become(next) {
        return Err(AppError::Conflict(format!(
            "Cannot change application status from {current} to {next}"
        )));
    }
    Ok(Transition::Changed)
}

/// Notification text sent to the applicant.
pub fn status_message(status: ApplicationStatus, job_title: &str) -> String {
    match status {
        ApplicationStatus::Pending => {
            format!("Your application for {job_title} is pending review.")
        }
        ApplicationStatus::Viewed => {
            format!("Your application for {job_title} has been viewed by the recruiter.")
        }
        ApplicationStatus::Shortlisted => {
            format!("Congratulations! You have been shortlisted for {job_title}.")
        }
        ApplicationStatus::Rejected => {
            format!("Your application for {job_title} was not selected this time.")
        }
        ApplicationStatus::Selected => {
            format!("Congratulations! You have been selected for {job_title}.")
        }
    }
}
