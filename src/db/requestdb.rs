use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::requestmodel::{AppraisalRequest, NewAppraisalRequest, RequestStatus};

#[async_trait]
pub trait RequestExt {
    /// Inserts with `status = pending` and `created_at == updated_at`.
    async fn save_request(
        &self,
        request: NewAppraisalRequest,
    ) -> Result<AppraisalRequest, StoreError>;

    async fn get_request(&self, request_id: Uuid) -> Result<Option<AppraisalRequest>, StoreError>;

    /// Equality filters only; both `None` returns every request. Callers sort.
    async fn get_requests(
        &self,
        customer_id: Option<Uuid>,
        company_id: Option<Uuid>,
    ) -> Result<Vec<AppraisalRequest>, StoreError>;

    /// Writes the new status and bumps `updated_at` strictly past its
    /// previous value.
    async fn update_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<AppraisalRequest, StoreError>;
}

const REQUEST_COLUMNS: &str = r#"
    id, customer_id, company_id, company_name, request_type, status,
    property_type, location, description, documents, report_url,
    created_at, updated_at
"#;

#[async_trait]
impl RequestExt for DBClient {
    async fn save_request(
        &self,
        request: NewAppraisalRequest,
    ) -> Result<AppraisalRequest, StoreError> {
        let now = Utc::now();

        let request = sqlx::query_as::<_, AppraisalRequest>(&format!(
            r#"
            INSERT INTO requests
            (customer_id, company_id, company_name, request_type, status,
             property_type, location, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(request.customer_id)
        .bind(request.company_id)
        .bind(request.company_name)
        .bind(request.request_type)
        .bind(RequestStatus::Pending)
        .bind(request.property_type)
        .bind(request.location)
        .bind(request.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn get_request(&self, request_id: Uuid) -> Result<Option<AppraisalRequest>, StoreError> {
        let request = sqlx::query_as::<_, AppraisalRequest>(&format!(
            "SELECT {} FROM requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn get_requests(
        &self,
        customer_id: Option<Uuid>,
        company_id: Option<Uuid>,
    ) -> Result<Vec<AppraisalRequest>, StoreError> {
        let requests = sqlx::query_as::<_, AppraisalRequest>(&format!(
            r#"
            SELECT {} FROM requests
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
            "#,
            REQUEST_COLUMNS
        ))
        .bind(customer_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn update_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<AppraisalRequest, StoreError> {
        sqlx::query_as::<_, AppraisalRequest>(&format!(
            r#"
            UPDATE requests
            SET status = $1,
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $2
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(status)
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
