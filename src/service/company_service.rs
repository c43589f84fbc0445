use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    models::companymodel::{AppraisalType, Company, CompanyProfileUpdate},
    service::error::{ServiceError, StoreResultExt},
};

pub(crate) fn sort_by_name(companies: &mut [Company]) {
    companies.sort_by_key(|c| c.name.to_lowercase());
}

#[derive(Clone)]
pub struct CompanyService {
    db_client: Arc<dyn Store>,
}

impl CompanyService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn get_approved_companies(&self) -> Result<Vec<Company>, ServiceError> {
        let mut companies = self
            .db_client
            .get_companies(true)
            .await
            .context("Failed to fetch companies")?;

        sort_by_name(&mut companies);
        Ok(companies)
    }

    pub async fn get_company_by_id(&self, company_id: Uuid) -> Result<Option<Company>, ServiceError> {
        self.db_client
            .get_company(Some(company_id), None, None, None)
            .await
            .context("Failed to fetch company")
    }

    pub async fn get_company_by_user_id(&self, user_id: Uuid) -> Result<Option<Company>, ServiceError> {
        self.db_client
            .get_company(None, Some(user_id), None, None)
            .await
            .context("Failed to fetch company")
    }

    pub async fn get_companies_by_service(
        &self,
        service: AppraisalType,
    ) -> Result<Vec<Company>, ServiceError> {
        let mut companies = self.get_approved_companies().await?;
        companies.retain(|c| c.offers(service));
        Ok(companies)
    }

    /// Partial profile update. Request snapshots keep the old name.
    pub async fn update_company(
        &self,
        company_id: Uuid,
        update: CompanyProfileUpdate,
    ) -> Result<Company, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Nothing to update".to_string(),
            ));
        }

        let company = self
            .db_client
            .update_company_profile(company_id, update)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::NotFound("Company not found".to_string()),
                e => ServiceError::store("Failed to update company", e),
            })?;

        tracing::info!("Company {} profile updated", company.id);
        Ok(company)
    }
}
