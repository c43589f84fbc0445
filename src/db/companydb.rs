use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::companymodel::{Company, CompanyProfileUpdate, NewCompany};

#[async_trait]
pub trait CompanyExt {
    async fn get_company(
        &self,
        company_id: Option<Uuid>,
        user_id: Option<Uuid>,
        email: Option<&str>,
        license_number: Option<&str>,
    ) -> Result<Option<Company>, StoreError>;

    async fn get_companies(&self, approved_only: bool) -> Result<Vec<Company>, StoreError>;

    async fn save_company(&self, company: NewCompany) -> Result<Company, StoreError>;

    async fn update_company_profile(
        &self,
        company_id: Uuid,
        update: CompanyProfileUpdate,
    ) -> Result<Company, StoreError>;

    async fn set_company_approval(
        &self,
        company_id: Uuid,
        is_approved: bool,
    ) -> Result<Company, StoreError>;

    async fn suspend_company(&self, company_id: Uuid) -> Result<Company, StoreError>;

    async fn archive_company(&self, company_id: Uuid) -> Result<Company, StoreError>;
}

pub(crate) const COMPANY_COLUMNS: &str = r#"
    id, name, email, phone, location, services, license_number,
    rating, total_ratings, is_approved, is_suspended, is_archived,
    suspended_at, archived_at, description, user_id, created_at, updated_at
"#;

#[async_trait]
impl CompanyExt for DBClient {
    async fn get_company(
        &self,
        company_id: Option<Uuid>,
        user_id: Option<Uuid>,
        email: Option<&str>,
        license_number: Option<&str>,
    ) -> Result<Option<Company>, StoreError> {
        let mut company: Option<Company> = None;

        if let Some(company_id) = company_id {
            company = sqlx::query_as::<_, Company>(&format!(
                "SELECT {} FROM companies WHERE id = $1",
                COMPANY_COLUMNS
            ))
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(user_id) = user_id {
            company = sqlx::query_as::<_, Company>(&format!(
                "SELECT {} FROM companies WHERE user_id = $1 LIMIT 1",
                COMPANY_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            company = sqlx::query_as::<_, Company>(&format!(
                "SELECT {} FROM companies WHERE email = $1",
                COMPANY_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(license_number) = license_number {
            company = sqlx::query_as::<_, Company>(&format!(
                "SELECT {} FROM companies WHERE license_number = $1",
                COMPANY_COLUMNS
            ))
            .bind(license_number)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(company)
    }

    async fn get_companies(&self, approved_only: bool) -> Result<Vec<Company>, StoreError> {
        let companies = if approved_only {
            sqlx::query_as::<_, Company>(&format!(
                "SELECT {} FROM companies WHERE is_approved = true",
                COMPANY_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Company>(&format!("SELECT {} FROM companies", COMPANY_COLUMNS))
                .fetch_all(&self.pool)
                .await?
        };

        Ok(companies)
    }

    async fn save_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies
            (name, email, phone, location, services, license_number, description, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company.name)
        .bind(company.email)
        .bind(company.phone)
        .bind(company.location)
        .bind(company.services)
        .bind(company.license_number)
        .bind(company.description)
        .bind(company.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    async fn update_company_profile(
        &self,
        company_id: Uuid,
        update: CompanyProfileUpdate,
    ) -> Result<Company, StoreError> {
        sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET name = COALESCE($1, name),
                phone = COALESCE($2, phone),
                email = COALESCE($3, email),
                location = COALESCE($4, location),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(update.name)
        .bind(update.phone)
        .bind(update.email)
        .bind(update.location)
        .bind(update.description)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn set_company_approval(
        &self,
        company_id: Uuid,
        is_approved: bool,
    ) -> Result<Company, StoreError> {
        sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET is_approved = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(is_approved)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn suspend_company(&self, company_id: Uuid) -> Result<Company, StoreError> {
        sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET is_approved = false, is_suspended = true,
                suspended_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn archive_company(&self, company_id: Uuid) -> Result<Company, StoreError> {
        sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET is_approved = false, is_archived = true,
                archived_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
