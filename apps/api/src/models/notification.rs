use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Application,
    StatusUpdate,
    #[default]
    Info,
    Interview,
    Message,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub related_job_id: Option<Uuid>,
    pub interview_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub related_job_id: Option<Uuid>,
    pub interview_id: Option<Uuid>,
}

/// A notification with the title of its related job, if it still exists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub notification: Notification,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
}
