pub mod companydb;
pub mod identitydb;
pub mod memory;
pub mod notificationdb;
pub mod requestdb;
pub mod reviewdb;
pub mod userdb;

use sqlx::{Pool, Postgres};
use thiserror::Error;

pub use companydb::CompanyExt;
pub use identitydb::IdentityExt;
pub use memory::MemoryStore;
pub use notificationdb::NotificationExt;
pub use requestdb::RequestExt;
pub use reviewdb::ReviewExt;
pub use userdb::UserExt;

pub const USERS_EMAIL_KEY: &str = "users_email_key";
pub const IDENTITIES_EMAIL_KEY: &str = "identities_email_key";
pub const COMPANIES_EMAIL_KEY: &str = "companies_email_key";
pub const COMPANIES_LICENSE_KEY: &str = "companies_license_number_key";
pub const REVIEWS_REQUEST_CUSTOMER_KEY: &str = "reviews_request_id_customer_id_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate value violates {0}")]
    UniqueViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(
                    db_err.constraint().unwrap_or("unique_constraint").to_string(),
                );
            }
            // A dangling company or request id reads the same as a missing row.
            if db_err.is_foreign_key_violation() {
                return StoreError::NotFound;
            }
        }

        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Every collection the workflow reads or writes. Implemented by the
/// Postgres client and by the in-memory store.
pub trait Store:
    UserExt + IdentityExt + CompanyExt + RequestExt + ReviewExt + NotificationExt + Send + Sync
{
}

impl<T> Store for T where
    T: UserExt + IdentityExt + CompanyExt + RequestExt + ReviewExt + NotificationExt + Send + Sync
{
}

#[derive(Debug, Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}
