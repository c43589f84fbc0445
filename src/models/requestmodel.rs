use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::companymodel::AppraisalType;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    UnderReview,
    IncompleteDocs,
    InProgress,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::UnderReview => "under_review",
            RequestStatus::IncompleteDocs => "incomplete_docs",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    /// Statuses a company may move a request to from `self`. Admins are not
    /// bound by this table.
    pub fn allowed_transitions(&self) -> &'static [RequestStatus] {
        use RequestStatus::*;

        match self {
            Pending => &[UnderReview, InProgress, Rejected],
            UnderReview => &[InProgress, Rejected, IncompleteDocs],
            IncompleteDocs => &[UnderReview, InProgress, Rejected],
            InProgress => &[Completed, IncompleteDocs],
            Completed | Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct AppraisalRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub company_id: Uuid,

    /// Company name captured when the request was submitted. It is not
    /// rewritten when the company renames itself.
    pub company_name: String,

    #[serde(rename = "type")]
    pub request_type: AppraisalType,
    pub status: RequestStatus,
    pub property_type: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub documents: Vec<String>,
    pub report_url: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppraisalRequest {
    pub customer_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub request_type: AppraisalType,
    pub property_type: Option<String>,
    pub location: String,
    pub description: Option<String>,
}
