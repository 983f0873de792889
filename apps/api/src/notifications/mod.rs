pub mod handlers;

use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::mailer::Email;
use crate::models::notification::{NewNotification, Notification, NotificationKind};
use crate::state::AppState;

/// An in-app notification, optionally mirrored to the recipient by email.
pub struct Notice {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub related_job_id: Option<Uuid>,
    pub interview_id: Option<Uuid>,
    pub email: Option<Email>,
}

impl Notice {
    pub fn new(recipient_id: Uuid, kind: NotificationKind, message: impl Into<String>) -> Self {
        Notice {
            recipient_id,
            kind,
            message: message.into(),
            related_job_id: None,
            interview_id: None,
            email: None,
        }
    }

    pub fn job(mut self, job_id: Uuid) -> Self {
        self.related_job_id = Some(job_id);
        self
    }

    pub fn interview(mut self, interview_id: Uuid) -> Self {
        self.interview_id = Some(interview_id);
        self
    }

    pub fn email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }
}

/// Persists the notification, then sends its email if any.
/// Email failures are logged and never fail the calling request.
pub async fn notify(state: &AppState, notice: Notice) -> Result<Notification, AppError> {
    let notification = state
        .repo
        .insert_notification(NewNotification {
            recipient_id: notice.recipient_id,
            message: notice.message,
            kind: notice.kind,
            related_job_id: notice.related_job_id,
            interview_id: notice.interview_id,
        })
        .await?;

    if let Some(email) = notice.email {
        let to = email.to.clone();
        if let Err(e) = state.mailer.send(email).await {
            warn!(recipient = %to, "Notification email failed: {e}");
        }
    }

    Ok(notification)
}
