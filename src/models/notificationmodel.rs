use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::usermodel::UserRole;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RequestSubmitted,
    RequestAccepted,
    RequestRejected,
    RequestInProgress,
    RequestCompleted,
    DocumentRequired,
    ReportUploaded,
    AccountVerified,
    SystemAlert,
}

impl NotificationType {
    pub fn to_str(&self) -> &str {
        match self {
            NotificationType::RequestSubmitted => "request_submitted",
            NotificationType::RequestAccepted => "request_accepted",
            NotificationType::RequestRejected => "request_rejected",
            NotificationType::RequestInProgress => "request_in_progress",
            NotificationType::RequestCompleted => "request_completed",
            NotificationType::DocumentRequired => "document_required",
            NotificationType::ReportUploaded => "report_uploaded",
            NotificationType::AccountVerified => "account_verified",
            NotificationType::SystemAlert => "system_alert",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_role: UserRole,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub request_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub is_read: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub user_role: UserRole,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub request_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}
