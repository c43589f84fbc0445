use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    models::reviewmodel::{NewReview, RatingSummary, Review, MAX_RATING, MIN_RATING},
    service::error::{ServiceError, StoreResultExt},
};

const ANONYMOUS_CUSTOMER: &str = "Anonymous";

/// Reviews plus the rating/total_ratings aggregate kept on each company.
#[derive(Clone)]
pub struct RatingService {
    db_client: Arc<dyn Store>,
}

impl RatingService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn submit_rating(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        request_id: Uuid,
        rating: i32,
        review_text: Option<String>,
    ) -> Result<(Review, RatingSummary), ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ServiceError::InvalidArgument(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        // The unique (request_id, customer_id) constraint is what actually
        // guards duplicates; this lookup only gives the early answer.
        let existing = self
            .db_client
            .get_review(request_id, customer_id)
            .await
            .context("Failed to submit rating")?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "You have already rated this request".to_string(),
            ));
        }

        let company = self
            .db_client
            .get_company(Some(company_id), None, None, None)
            .await
            .context("Failed to submit rating")?
            .ok_or_else(|| ServiceError::NotFound("Company not found".to_string()))?;

        let customer = self
            .db_client
            .get_user(Some(customer_id), None)
            .await
            .context("Failed to submit rating")?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let customer_name = match customer.full_name.trim() {
            "" => ANONYMOUS_CUSTOMER.to_string(),
            name => name.to_string(),
        };

        let review_text = review_text
            .map(|text| ammonia::clean(text.trim()))
            .filter(|text| !text.is_empty());

        let (review, summary) = self
            .db_client
            .save_review(NewReview {
                company_id: company.id,
                company_name: company.name,
                customer_id,
                customer_name,
                request_id,
                rating,
                review_text,
            })
            .await
            .map_err(|e| match e {
                // Company and customer were found above, so the request is missing.
                StoreError::NotFound => ServiceError::NotFound("Request not found".to_string()),
                e => ServiceError::store("Failed to submit rating", e),
            })?;

        tracing::info!(
            "Company {} rated {} by customer {}: now {:.1} over {} review(s)",
            company_id,
            rating,
            customer_id,
            summary.rating,
            summary.total_ratings
        );

        Ok((review, summary))
    }

    /// Lookup failures read as "not rated"; a repeat submit is still refused
    /// by the store.
    pub async fn has_rated_request(&self, request_id: Uuid, customer_id: Uuid) -> bool {
        match self.db_client.get_review(request_id, customer_id).await {
            Ok(review) => review.is_some(),
            Err(e) => {
                tracing::error!(
                    "Failed to check rating for request {}: {}",
                    request_id,
                    e
                );
                false
            }
        }
    }

    pub async fn get_company_reviews(&self, company_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        let mut reviews = self
            .db_client
            .get_company_reviews(company_id)
            .await
            .context("Failed to fetch reviews")?;

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::{CompanyExt, MemoryStore, RequestExt, UserExt};
    use crate::models::{
        companymodel::{AppraisalType, Company},
        requestmodel::NewAppraisalRequest,
        usermodel::{NewUser, UserRole},
    };

    async fn seeded() -> (MemoryStore, RatingService, Company) {
        let store = MemoryStore::new();
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Summit Valuers".to_string(),
            email: "ops@summit.test".to_string(),
            phone: "0123456789".to_string(),
            location: "Riyadh".to_string(),
            services: vec![AppraisalType::Property],
            license_number: "LIC-1".to_string(),
            rating: 0.0,
            total_ratings: 0,
            is_approved: true,
            is_suspended: false,
            is_archived: false,
            suspended_at: None,
            archived_at: None,
            description: None,
            user_id: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_company(company.clone()).await;

        let service = RatingService::new(Arc::new(store.clone()));
        (store, service, company)
    }

    async fn customer(store: &MemoryStore, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        store
            .save_user(NewUser {
                id,
                email: format!("{}@customers.test", id),
                full_name: full_name.to_string(),
                role: UserRole::Customer,
                phone: None,
            })
            .await
            .unwrap();
        id
    }

    async fn request(store: &MemoryStore, company: &Company, customer_id: Uuid) -> Uuid {
        store
            .save_request(NewAppraisalRequest {
                customer_id,
                company_id: company.id,
                company_name: company.name.clone(),
                request_type: AppraisalType::Property,
                property_type: None,
                location: "Jeddah".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn rating_is_the_rounded_mean() {
        let (store, service, company) = seeded().await;

        for rating in [5, 4, 4] {
            let customer_id = customer(&store, "Reem").await;
            let request_id = request(&store, &company, customer_id).await;
            service
                .submit_rating(company.id, customer_id, request_id, rating, None)
                .await
                .unwrap();
        }

        let company = store
            .get_company(Some(company.id), None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(company.rating, 4.3);
        assert_eq!(company.total_ratings, 3);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_invalid() {
        let (store, service, company) = seeded().await;
        let customer_id = customer(&store, "Reem").await;

        for rating in [0, 6, -1] {
            let err = service
                .submit_rating(company.id, customer_id, Uuid::new_v4(), rating, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidArgument(_)));
        }
    }

    #[tokio::test]
    async fn second_rating_for_the_same_request_conflicts() {
        let (store, service, company) = seeded().await;
        let customer_id = customer(&store, "Reem").await;
        let request_id = request(&store, &company, customer_id).await;

        assert!(!service.has_rated_request(request_id, customer_id).await);

        let (review, summary) = service
            .submit_rating(
                company.id,
                customer_id,
                request_id,
                5,
                Some("  Great service ".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(review.review_text.as_deref(), Some("Great service"));
        assert_eq!(review.company_name, "Summit Valuers");
        assert_eq!(summary.rating, 5.0);
        assert_eq!(summary.total_ratings, 1);

        assert!(service.has_rated_request(request_id, customer_id).await);

        let err = service
            .submit_rating(company.id, customer_id, request_id, 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_company_customer_or_request_is_not_found() {
        let (store, service, company) = seeded().await;
        let customer_id = customer(&store, "Reem").await;

        let err = service
            .submit_rating(Uuid::new_v4(), customer_id, Uuid::new_v4(), 4, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Company not found");

        let err = service
            .submit_rating(company.id, Uuid::new_v4(), Uuid::new_v4(), 4, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Customer not found");

        let err = service
            .submit_rating(company.id, customer_id, Uuid::new_v4(), 4, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request not found");
        assert!(!service.has_rated_request(Uuid::new_v4(), customer_id).await);
    }

    #[tokio::test]
    async fn nameless_customer_is_anonymous_and_blank_text_is_dropped() {
        let (store, service, company) = seeded().await;
        let customer_id = customer(&store, "  ").await;
        let request_id = request(&store, &company, customer_id).await;

        let (review, _) = service
            .submit_rating(
                company.id,
                customer_id,
                request_id,
                3,
                Some("   ".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(review.customer_name, "Anonymous");
        assert!(review.review_text.is_none());
    }

    #[tokio::test]
    async fn concurrent_reviews_keep_the_aggregate_consistent() {
        let (store, service, company) = seeded().await;

        let mut handles = Vec::new();
        for rating in [1, 2, 3, 4, 5, 5] {
            let customer_id = customer(&store, "Reem").await;
            let request_id = request(&store, &company, customer_id).await;
            let service = service.clone();
            let company_id = company.id;
            handles.push(tokio::spawn(async move {
                service
                    .submit_rating(company_id, customer_id, request_id, rating, None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let company = store
            .get_company(Some(company.id), None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(company.total_ratings, 6);
        assert_eq!(company.rating, 3.3);

        let reviews = service.get_company_reviews(company.id).await.unwrap();
        assert_eq!(reviews.len(), 6);
        assert!(reviews
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }
}
