use async_trait::async_trait;

use super::{DBClient, StoreError};
use crate::models::usermodel::Identity;

/// Credential storage backing the local identity provider.
#[async_trait]
pub trait IdentityExt {
    async fn get_identity(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn save_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError>;
}

#[async_trait]
impl IdentityExt for DBClient {
    async fn get_identity(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn save_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(identity)
    }
}
