use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    db::{
        StoreError, COMPANIES_EMAIL_KEY, COMPANIES_LICENSE_KEY, IDENTITIES_EMAIL_KEY,
        REVIEWS_REQUEST_CUSTOMER_KEY, USERS_EMAIL_KEY,
    },
    error::HttpError,
    models::requestmodel::RequestStatus,
    service::auth_service::AuthError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot move request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Store failure that is not a missing record or a duplicate. The
    /// message is the operation-level fallback; the cause is logged.
    #[error("{context}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub fn store(context: &str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound => ServiceError::NotFound("Record not found".to_string()),
            StoreError::UniqueViolation(key) => ServiceError::Conflict(conflict_message(&key)),
            source => {
                tracing::error!("{}: {}", context, source);
                ServiceError::Store {
                    context: context.to_string(),
                    source,
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidArgument(_) | ServiceError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Auth(err) => err.status_code(),
            ServiceError::Store {
                source: StoreError::Unavailable(_),
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn conflict_message(key: &str) -> String {
    match key {
        REVIEWS_REQUEST_CUSTOMER_KEY => "You have already rated this request".to_string(),
        COMPANIES_EMAIL_KEY => "Company with this email already exists".to_string(),
        COMPANIES_LICENSE_KEY => "Company with this license number already exists".to_string(),
        USERS_EMAIL_KEY | IDENTITIES_EMAIL_KEY => {
            "An account with this email already exists".to_string()
        }
        other => format!("Duplicate value violates {}", other),
    }
}

/// Lifts a store result into the service taxonomy with an operation-level
/// fallback message.
pub trait StoreResultExt<T> {
    fn context(self, context: &str) -> Result<T, ServiceError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn context(self, context: &str) -> Result<T, ServiceError> {
        self.map_err(|err| ServiceError::store(context, err))
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        let message = error.to_string();

        HttpError::new(message, status)
    }
}
