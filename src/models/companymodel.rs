use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use uuid::Uuid;

/// What a company can appraise, and what a request asks to have appraised.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "appraisal_type", rename_all = "snake_case", no_pg_array)]
#[serde(rename_all = "snake_case")]
pub enum AppraisalType {
    Property,
    Vehicle,
}

impl AppraisalType {
    pub fn to_str(&self) -> &str {
        match self {
            AppraisalType::Property => "property",
            AppraisalType::Vehicle => "vehicle",
        }
    }

    /// Wording used in notification bodies.
    pub fn label(&self) -> &str {
        match self {
            AppraisalType::Vehicle => "car",
            AppraisalType::Property => "property",
        }
    }
}

impl PgHasArrayType for AppraisalType {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_appraisal_type")
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub services: Vec<AppraisalType>,
    pub license_number: String,
    pub rating: f64,
    pub total_ratings: i32,
    pub is_approved: bool,
    pub is_suspended: bool,
    pub is_archived: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,

    pub description: Option<String>,

    /// Identity that signs in on behalf of the company. Seeded companies may
    /// have none, in which case nobody receives company-side notifications.
    pub user_id: Option<Uuid>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn offers(&self, service: AppraisalType) -> bool {
        self.services.contains(&service)
    }
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub services: Vec<AppraisalType>,
    pub license_number: String,
    pub description: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl CompanyProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}
