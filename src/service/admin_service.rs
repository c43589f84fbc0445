use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    models::{
        companymodel::{AppraisalType, Company, NewCompany},
        requestmodel::RequestStatus,
        usermodel::{NewUser, User, UserRole},
    },
    service::{
        auth_service::IdentityProvider,
        company_service::sort_by_name,
        error::{ServiceError, StoreResultExt},
    },
};

#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub services: Vec<AppraisalType>,
    pub license_number: String,
    pub description: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_companies: usize,
    pub approved_companies: usize,
    pub total_users: usize,
    pub total_requests: usize,
    /// `pending` plus `under_review`.
    pub pending_requests: usize,
    pub completed_requests: usize,
}

fn not_found(entity: &'static str, context: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |e| match e {
        StoreError::NotFound => ServiceError::NotFound(format!("{} not found", entity)),
        e => ServiceError::store(context, e),
    }
}

#[derive(Clone)]
pub struct AdminService {
    db_client: Arc<dyn Store>,
    identity: Arc<dyn IdentityProvider>,
}

impl AdminService {
    pub fn new(db_client: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            db_client,
            identity,
        }
    }

    pub async fn get_all_companies(&self) -> Result<Vec<Company>, ServiceError> {
        let mut companies = self
            .db_client
            .get_companies(false)
            .await
            .context("Failed to fetch companies")?;

        sort_by_name(&mut companies);
        Ok(companies)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, ServiceError> {
        let mut users = self
            .db_client
            .get_users()
            .await
            .context("Failed to fetch users")?;

        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    pub async fn update_company_status(
        &self,
        company_id: Uuid,
        is_approved: bool,
    ) -> Result<Company, ServiceError> {
        let company = self
            .db_client
            .set_company_approval(company_id, is_approved)
            .await
            .map_err(not_found("Company", "Failed to update company status"))?;

        tracing::info!("Company {} approval set to {}", company.id, is_approved);
        Ok(company)
    }

    pub async fn suspend_company(&self, company_id: Uuid) -> Result<Company, ServiceError> {
        let company = self
            .db_client
            .suspend_company(company_id)
            .await
            .map_err(not_found("Company", "Failed to suspend company"))?;

        tracing::info!("Company {} suspended", company.id);
        Ok(company)
    }

    pub async fn archive_company(&self, company_id: Uuid) -> Result<Company, ServiceError> {
        let company = self
            .db_client
            .archive_company(company_id)
            .await
            .map_err(not_found("Company", "Failed to archive company"))?;

        tracing::info!("Company {} archived", company.id);
        Ok(company)
    }

    pub async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> Result<User, ServiceError> {
        let user = self
            .db_client
            .update_user_role(user_id, role)
            .await
            .map_err(not_found("User", "Failed to update user role"))?;

        tracing::info!("User {} role set to {}", user.id, role.to_str());
        Ok(user)
    }

    pub async fn disable_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = self
            .db_client
            .disable_user(user_id)
            .await
            .map_err(not_found("User", "Failed to disable user"))?;

        tracing::info!("User {} disabled", user.id);
        Ok(user)
    }

    /// Registers the company's sign-in identity, its `users` record, and the
    /// company itself (unapproved, no ratings).
    pub async fn create_company(&self, input: CreateCompanyInput) -> Result<Company, ServiceError> {
        let mut services = input.services;
        services.sort_by_key(|s| s.to_str().to_string());
        services.dedup();
        if services.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "At least one service is required".to_string(),
            ));
        }

        let email = input.email.trim().to_lowercase();
        let license_number = input.license_number.trim().to_string();

        let by_email = self
            .db_client
            .get_company(None, None, Some(&email), None)
            .await
            .context("Failed to create company")?;
        if by_email.is_some() {
            return Err(ServiceError::Conflict(
                "Company with this email already exists".to_string(),
            ));
        }

        let by_license = self
            .db_client
            .get_company(None, None, None, Some(&license_number))
            .await
            .context("Failed to create company")?;
        if by_license.is_some() {
            return Err(ServiceError::Conflict(
                "Company with this license number already exists".to_string(),
            ));
        }

        let identity = self.identity.register(&email, &input.password).await?;

        self.db_client
            .save_user(NewUser {
                id: identity.user_id,
                email: identity.email.clone(),
                full_name: input.name.trim().to_string(),
                role: UserRole::Company,
                phone: Some(input.phone.clone()),
            })
            .await
            .context("Failed to create company")?;

        let company = self
            .db_client
            .save_company(NewCompany {
                name: input.name.trim().to_string(),
                email: identity.email,
                phone: input.phone,
                location: input.location,
                services,
                license_number,
                description: input.description.filter(|d| !d.trim().is_empty()),
                user_id: Some(identity.user_id),
            })
            .await
            .context("Failed to create company")?;

        tracing::info!(
            "Company {} created with identity {}",
            company.id,
            identity.user_id
        );

        Ok(company)
    }

    pub async fn get_admin_stats(&self) -> Result<AdminStats, ServiceError> {
        let (companies, users, requests) = futures::try_join!(
            self.db_client.get_companies(false),
            self.db_client.get_users(),
            self.db_client.get_requests(None, None),
        )
        .context("Failed to fetch admin stats")?;

        Ok(AdminStats {
            total_companies: companies.len(),
            approved_companies: companies.iter().filter(|c| c.is_approved).count(),
            total_users: users.len(),
            total_requests: requests.len(),
            pending_requests: requests
                .iter()
                .filter(|r| {
                    matches!(r.status, RequestStatus::Pending | RequestStatus::UnderReview)
                })
                .count(),
            completed_requests: requests
                .iter()
                .filter(|r| r.status == RequestStatus::Completed)
                .count(),
        })
    }
}
