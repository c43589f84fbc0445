use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CompanyExt, IdentityExt, NotificationExt, RequestExt, ReviewExt, StoreError, UserExt,
    COMPANIES_EMAIL_KEY, COMPANIES_LICENSE_KEY, IDENTITIES_EMAIL_KEY,
    REVIEWS_REQUEST_CUSTOMER_KEY, USERS_EMAIL_KEY,
};
use crate::models::{
    companymodel::{Company, CompanyProfileUpdate, NewCompany},
    notificationmodel::{NewNotification, Notification},
    requestmodel::{AppraisalRequest, NewAppraisalRequest, RequestStatus},
    reviewmodel::{NewReview, RatingSummary, Review},
    usermodel::{Identity, NewUser, User, UserRole},
};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    identities: HashMap<Uuid, Identity>,
    companies: HashMap<Uuid, Company>,
    requests: HashMap<Uuid, AppraisalRequest>,
    reviews: HashMap<Uuid, Review>,
    notifications: HashMap<Uuid, Notification>,
}

/// Process-local store with the same contract as the Postgres client. Used
/// when no `DATABASE_URL` is configured and by the test suites.
///
/// Every operation runs under one lock, so multi-step writes such as
/// review insert plus aggregate recompute are atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    notifications_unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Makes every notification read/write fail with `Unavailable`, to
    /// simulate an outage of that collection.
    pub fn set_notifications_unavailable(&self, unavailable: bool) {
        self.notifications_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    #[cfg(test)]
    /// Inserts a company row as-is, e.g. one seeded without a linked identity.
    pub async fn insert_company(&self, company: Company) {
        self.inner
            .write()
            .await
            .companies
            .insert(company.id, company);
    }

    fn check_notifications(&self) -> Result<(), StoreError> {
        if self.notifications_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "notifications collection is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

fn bump(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let data = self.inner.read().await;

        if let Some(user_id) = user_id {
            return Ok(data.users.get(&user_id).cloned());
        }
        if let Some(email) = email {
            return Ok(data.users.values().find(|u| u.email == email).cloned());
        }
        Ok(None)
    }

    async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut data = self.inner.write().await;

        if data.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(USERS_EMAIL_KEY.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            phone: user.phone,
            is_disabled: false,
            disabled_at: None,
            created_at: now,
            updated_at: now,
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> Result<User, StoreError> {
        let mut data = self.inner.write().await;
        let user = data.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        user.role = role;
        user.updated_at = bump(user.updated_at);
        Ok(user.clone())
    }

    async fn disable_user(&self, user_id: Uuid) -> Result<User, StoreError> {
        let mut data = self.inner.write().await;
        let user = data.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        let now = bump(user.updated_at);
        user.is_disabled = true;
        user.disabled_at = Some(now);
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[async_trait]
impl IdentityExt for MemoryStore {
    async fn get_identity(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let data = self.inner.read().await;
        Ok(data.identities.values().find(|i| i.email == email).cloned())
    }

    async fn save_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError> {
        let mut data = self.inner.write().await;

        if data.identities.values().any(|i| i.email == email) {
            return Err(StoreError::UniqueViolation(IDENTITIES_EMAIL_KEY.to_string()));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        data.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }
}

#[async_trait]
impl CompanyExt for MemoryStore {
    async fn get_company(
        &self,
        company_id: Option<Uuid>,
        user_id: Option<Uuid>,
        email: Option<&str>,
        license_number: Option<&str>,
    ) -> Result<Option<Company>, StoreError> {
        let data = self.inner.read().await;

        let company = if let Some(company_id) = company_id {
            data.companies.get(&company_id)
        } else if let Some(user_id) = user_id {
            data.companies
                .values()
                .find(|c| c.user_id == Some(user_id))
        } else if let Some(email) = email {
            data.companies.values().find(|c| c.email == email)
        } else if let Some(license_number) = license_number {
            data.companies
                .values()
                .find(|c| c.license_number == license_number)
        } else {
            None
        };

        Ok(company.cloned())
    }

    async fn get_companies(&self, approved_only: bool) -> Result<Vec<Company>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .companies
            .values()
            .filter(|c| !approved_only || c.is_approved)
            .cloned()
            .collect())
    }

    async fn save_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        let mut data = self.inner.write().await;

        if data.companies.values().any(|c| c.email == company.email) {
            return Err(StoreError::UniqueViolation(COMPANIES_EMAIL_KEY.to_string()));
        }
        if data
            .companies
            .values()
            .any(|c| c.license_number == company.license_number)
        {
            return Err(StoreError::UniqueViolation(COMPANIES_LICENSE_KEY.to_string()));
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: company.name,
            email: company.email,
            phone: company.phone,
            location: company.location,
            services: company.services,
            license_number: company.license_number,
            rating: 0.0,
            total_ratings: 0,
            is_approved: false,
            is_suspended: false,
            is_archived: false,
            suspended_at: None,
            archived_at: None,
            description: company.description,
            user_id: company.user_id,
            created_at: now,
            updated_at: now,
        };
        data.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn update_company_profile(
        &self,
        company_id: Uuid,
        update: CompanyProfileUpdate,
    ) -> Result<Company, StoreError> {
        let mut data = self.inner.write().await;

        if let Some(email) = &update.email {
            if data
                .companies
                .values()
                .any(|c| c.id != company_id && &c.email == email)
            {
                return Err(StoreError::UniqueViolation(COMPANIES_EMAIL_KEY.to_string()));
            }
        }

        let company = data
            .companies
            .get_mut(&company_id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = update.name {
            company.name = name;
        }
        if let Some(phone) = update.phone {
            company.phone = phone;
        }
        if let Some(email) = update.email {
            company.email = email;
        }
        if let Some(location) = update.location {
            company.location = location;
        }
        if let Some(description) = update.description {
            company.description = Some(description);
        }
        company.updated_at = bump(company.updated_at);

        Ok(company.clone())
    }

    async fn set_company_approval(
        &self,
        company_id: Uuid,
        is_approved: bool,
    ) -> Result<Company, StoreError> {
        let mut data = self.inner.write().await;
        let company = data
            .companies
            .get_mut(&company_id)
            .ok_or(StoreError::NotFound)?;

        company.is_approved = is_approved;
        company.updated_at = bump(company.updated_at);
        Ok(company.clone())
    }

    async fn suspend_company(&self, company_id: Uuid) -> Result<Company, StoreError> {
        let mut data = self.inner.write().await;
        let company = data
            .companies
            .get_mut(&company_id)
            .ok_or(StoreError::NotFound)?;

        let now = bump(company.updated_at);
        company.is_approved = false;
        company.is_suspended = true;
        company.suspended_at = Some(now);
        company.updated_at = now;
        Ok(company.clone())
    }

    async fn archive_company(&self, company_id: Uuid) -> Result<Company, StoreError> {
        let mut data = self.inner.write().await;
        let company = data
            .companies
            .get_mut(&company_id)
            .ok_or(StoreError::NotFound)?;

        let now = bump(company.updated_at);
        company.is_approved = false;
        company.is_archived = true;
        company.archived_at = Some(now);
        company.updated_at = now;
        Ok(company.clone())
    }
}

#[async_trait]
impl RequestExt for MemoryStore {
    async fn save_request(
        &self,
        request: NewAppraisalRequest,
    ) -> Result<AppraisalRequest, StoreError> {
        let now = Utc::now();
        let request = AppraisalRequest {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            company_id: request.company_id,
            company_name: request.company_name,
            request_type: request.request_type,
            status: RequestStatus::Pending,
            property_type: request.property_type,
            location: request.location,
            description: request.description,
            documents: Vec::new(),
            report_url: None,
            created_at: now,
            updated_at: now,
        };

        let mut data = self.inner.write().await;
        if !data.companies.contains_key(&request.company_id) {
            return Err(StoreError::NotFound);
        }
        data.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, request_id: Uuid) -> Result<Option<AppraisalRequest>, StoreError> {
        Ok(self.inner.read().await.requests.get(&request_id).cloned())
    }

    async fn get_requests(
        &self,
        customer_id: Option<Uuid>,
        company_id: Option<Uuid>,
    ) -> Result<Vec<AppraisalRequest>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .requests
            .values()
            .filter(|r| customer_id.map_or(true, |id| r.customer_id == id))
            .filter(|r| company_id.map_or(true, |id| r.company_id == id))
            .cloned()
            .collect())
    }

    async fn update_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<AppraisalRequest, StoreError> {
        let mut data = self.inner.write().await;
        let request = data
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::NotFound)?;

        request.status = status;
        request.updated_at = bump(request.updated_at);
        Ok(request.clone())
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn get_review(
        &self,
        request_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Review>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .reviews
            .values()
            .find(|r| r.request_id == request_id && r.customer_id == customer_id)
            .cloned())
    }

    async fn get_company_reviews(&self, company_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let data = self.inner.read().await;
        Ok(data
            .reviews
            .values()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn save_review(&self, review: NewReview) -> Result<(Review, RatingSummary), StoreError> {
        let mut data = self.inner.write().await;

        if !data.companies.contains_key(&review.company_id)
            || !data.requests.contains_key(&review.request_id)
        {
            return Err(StoreError::NotFound);
        }
        if data
            .reviews
            .values()
            .any(|r| r.request_id == review.request_id && r.customer_id == review.customer_id)
        {
            return Err(StoreError::UniqueViolation(
                REVIEWS_REQUEST_CUSTOMER_KEY.to_string(),
            ));
        }

        let saved = Review {
            id: Uuid::new_v4(),
            company_id: review.company_id,
            company_name: review.company_name,
            customer_id: review.customer_id,
            customer_name: review.customer_name,
            request_id: review.request_id,
            rating: review.rating,
            review_text: review.review_text,
            created_at: Utc::now(),
        };
        data.reviews.insert(saved.id, saved.clone());

        let ratings: Vec<i32> = data
            .reviews
            .values()
            .filter(|r| r.company_id == saved.company_id)
            .map(|r| r.rating)
            .collect();
        let summary = RatingSummary::from_ratings(&ratings);

        if let Some(company) = data.companies.get_mut(&saved.company_id) {
            company.rating = summary.rating;
            company.total_ratings = summary.total_ratings;
            company.updated_at = bump(company.updated_at);
        }

        Ok((saved, summary))
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn save_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        self.check_notifications()?;

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            user_role: notification.user_role,
            notification_type: notification.notification_type,
            title: notification.title,
            body: notification.body,
            request_id: notification.request_id,
            company_id: notification.company_id,
            is_read: false,
            created_at: Utc::now(),
        };

        self.inner
            .write()
            .await
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        self.check_notifications()?;
        Ok(self
            .inner
            .read()
            .await
            .notifications
            .get(&notification_id)
            .cloned())
    }

    async fn get_notifications(
        &self,
        user_id: Uuid,
        user_role: UserRole,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        self.check_notifications()?;

        let data = self.inner.read().await;
        Ok(data
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && n.user_role == user_role)
            .filter(|n| !unread_only || !n.is_read)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, StoreError> {
        self.check_notifications()?;

        let mut data = self.inner.write().await;
        let notification = data
            .notifications
            .get_mut(&notification_id)
            .ok_or(StoreError::NotFound)?;

        notification.is_read = true;
        Ok(notification.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::companymodel::AppraisalType;

    fn company(email: &str, license: &str) -> NewCompany {
        NewCompany {
            name: "Summit Valuers".to_string(),
            email: email.to_string(),
            phone: "0123456789".to_string(),
            location: "Riyadh".to_string(),
            services: vec![AppraisalType::Property],
            license_number: license.to_string(),
            description: None,
            user_id: None,
        }
    }

    async fn request_for(store: &MemoryStore, company_id: Uuid) -> AppraisalRequest {
        store
            .save_request(NewAppraisalRequest {
                customer_id: Uuid::new_v4(),
                company_id,
                company_name: "Summit Valuers".to_string(),
                request_type: AppraisalType::Property,
                property_type: None,
                location: "Jeddah".to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn company_uniqueness_reports_the_constraint() {
        let store = MemoryStore::new();
        store.save_company(company("a@v.test", "L1")).await.unwrap();

        match store.save_company(company("a@v.test", "L2")).await {
            Err(StoreError::UniqueViolation(key)) => assert_eq!(key, COMPANIES_EMAIL_KEY),
            other => panic!("unexpected {:?}", other),
        }
        match store.save_company(company("b@v.test", "L1")).await {
            Err(StoreError::UniqueViolation(key)) => assert_eq!(key, COMPANIES_LICENSE_KEY),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn review_without_company_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .save_review(NewReview {
                company_id: Uuid::new_v4(),
                company_name: "Ghost".to_string(),
                customer_id: Uuid::new_v4(),
                customer_name: "Reem".to_string(),
                request_id: Uuid::new_v4(),
                rating: 4,
                review_text: None,
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn duplicate_review_is_a_unique_violation() {
        let store = MemoryStore::new();
        let saved = store.save_company(company("a@v.test", "L1")).await.unwrap();
        let request = request_for(&store, saved.id).await;
        let review = NewReview {
            company_id: saved.id,
            company_name: saved.name.clone(),
            customer_id: request.customer_id,
            customer_name: "Reem".to_string(),
            request_id: request.id,
            rating: 4,
            review_text: None,
        };

        let (_, summary) = store.save_review(review.clone()).await.unwrap();
        assert_eq!(summary, RatingSummary { rating: 4.0, total_ratings: 1 });

        match store.save_review(review).await {
            Err(StoreError::UniqueViolation(key)) => {
                assert_eq!(key, REVIEWS_REQUEST_CUSTOMER_KEY)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn dangling_references_are_not_found() {
        let store = MemoryStore::new();
        let saved = store.save_company(company("a@v.test", "L1")).await.unwrap();

        let orphan = store
            .save_request(NewAppraisalRequest {
                customer_id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                company_name: "Ghost".to_string(),
                request_type: AppraisalType::Property,
                property_type: None,
                location: "Jeddah".to_string(),
                description: None,
            })
            .await;
        assert!(matches!(orphan, Err(StoreError::NotFound)));

        let review = store
            .save_review(NewReview {
                company_id: saved.id,
                company_name: saved.name.clone(),
                customer_id: Uuid::new_v4(),
                customer_name: "Reem".to_string(),
                request_id: Uuid::new_v4(),
                rating: 4,
                review_text: None,
            })
            .await;
        assert!(matches!(review, Err(StoreError::NotFound)));

        let company = store
            .get_company(Some(saved.id), None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(company.total_ratings, 0);
    }

    #[tokio::test]
    async fn back_to_back_status_writes_still_advance() {
        let store = MemoryStore::new();
        let saved = store.save_company(company("a@v.test", "L1")).await.unwrap();
        let request = request_for(&store, saved.id).await;
        assert_eq!(request.created_at, request.updated_at);

        let mut previous = request.updated_at;
        for status in [
            RequestStatus::UnderReview,
            RequestStatus::InProgress,
            RequestStatus::Completed,
        ] {
            let updated = store.update_request_status(request.id, status).await.unwrap();
            assert!(updated.updated_at > previous);
            previous = updated.updated_at;
        }
    }

    #[tokio::test]
    async fn notification_outage_is_unavailable() {
        let store = MemoryStore::new();
        store.set_notifications_unavailable(true);

        let result = store
            .get_notifications(Uuid::new_v4(), UserRole::Customer, false)
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
