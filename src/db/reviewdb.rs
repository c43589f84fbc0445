use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::reviewmodel::{NewReview, RatingSummary, Review};

#[async_trait]
pub trait ReviewExt {
    async fn get_review(
        &self,
        request_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Review>, StoreError>;

    async fn get_company_reviews(&self, company_id: Uuid) -> Result<Vec<Review>, StoreError>;

    /// Inserts the review and recomputes the owning company's aggregate as
    /// one atomic step. A second review for the same (request, customer)
    /// pair fails with `UniqueViolation`.
    async fn save_review(&self, review: NewReview) -> Result<(Review, RatingSummary), StoreError>;
}

const REVIEW_COLUMNS: &str = r#"
    id, company_id, company_name, customer_id, customer_name, request_id,
    rating, review_text, created_at
"#;

#[async_trait]
impl ReviewExt for DBClient {
    async fn get_review(
        &self,
        request_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Review>, StoreError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE request_id = $1 AND customer_id = $2",
            REVIEW_COLUMNS
        ))
        .bind(request_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn get_company_reviews(&self, company_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE company_id = $1",
            REVIEW_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn save_review(&self, review: NewReview) -> Result<(Review, RatingSummary), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serialises concurrent reviews for one company.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM companies WHERE id = $1 FOR UPDATE")
                .bind(review.company_id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Err(StoreError::NotFound);
        }

        let saved = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews
            (company_id, company_name, customer_id, customer_name, request_id, rating, review_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(review.company_id)
        .bind(review.company_name)
        .bind(review.customer_id)
        .bind(review.customer_name)
        .bind(review.request_id)
        .bind(review.rating)
        .bind(review.review_text)
        .fetch_one(&mut *tx)
        .await?;

        let (rating, total_ratings): (f64, i32) = sqlx::query_as(
            r#"
            UPDATE companies
            SET rating = agg.average, total_ratings = agg.total, updated_at = NOW()
            FROM (
                SELECT COALESCE(ROUND(AVG(rating)::numeric, 1), 0)::float8 AS average,
                       COUNT(*)::int4 AS total
                FROM reviews
                WHERE company_id = $1
            ) AS agg
            WHERE companies.id = $1
            RETURNING companies.rating, companies.total_ratings
            "#,
        )
        .bind(saved.company_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((
            saved,
            RatingSummary {
                rating,
                total_ratings,
            },
        ))
    }
}
