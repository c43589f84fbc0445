use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    models::requestmodel::{AppraisalRequest, NewAppraisalRequest, RequestStatus},
    service::{
        error::{ServiceError, StoreResultExt},
        notification_dispatcher::{NotificationDispatcher, NotificationEvent},
        notification_service::RequestContext,
    },
};

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(Uuid),
    /// Carries the company id the caller acts for.
    Company(Uuid),
    Admin,
}

/// Owns the request status field. Every persisted change is followed by a
/// best-effort notification through the dispatcher.
#[derive(Clone)]
pub struct RequestService {
    db_client: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
}

impl RequestService {
    pub fn new(db_client: Arc<dyn Store>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            db_client,
            dispatcher,
        }
    }

    pub async fn create_request(&self, request: NewAppraisalRequest) -> Result<Uuid, ServiceError> {
        if request.location.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Location is required".to_string(),
            ));
        }
        if request.company_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Company name is required".to_string(),
            ));
        }

        let saved = self
            .db_client
            .save_request(request)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::NotFound("Company not found".to_string()),
                e => ServiceError::store("Failed to create request", e),
            })?;

        tracing::info!(
            "Request {} created by customer {} for company {}",
            saved.id,
            saved.customer_id,
            saved.company_id
        );

        self.dispatcher.enqueue(NotificationEvent::Created {
            context: RequestContext::from(&saved),
        });

        Ok(saved.id)
    }

    /// Unguarded write: any status to any status. Used for the admin
    /// override path and by [`Self::transition`] once checks pass.
    pub async fn update_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<AppraisalRequest, ServiceError> {
        let updated = self
            .db_client
            .update_request_status(request_id, status)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::NotFound("Request not found".to_string()),
                e => ServiceError::store("Failed to update request status", e),
            })?;

        tracing::info!("Request {} moved to {}", updated.id, updated.status);

        self.dispatcher.enqueue(NotificationEvent::StatusChanged {
            context: RequestContext::from(&updated),
            status,
        });

        Ok(updated)
    }

    /// Status change on behalf of `actor`. Admins bypass the transition
    /// table; companies may only move their own requests along it.
    pub async fn transition(
        &self,
        actor: Actor,
        request_id: Uuid,
        target: RequestStatus,
    ) -> Result<AppraisalRequest, ServiceError> {
        let company_id = match actor {
            Actor::Admin => return self.update_request_status(request_id, target).await,
            Actor::Customer(_) => {
                return Err(ServiceError::Forbidden(
                    "Customers cannot change request status".to_string(),
                ))
            }
            Actor::Company(company_id) => company_id,
        };

        let current = self
            .get_request_by_id(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Request not found".to_string()))?;

        if current.company_id != company_id {
            return Err(ServiceError::Forbidden(
                "This request belongs to another company".to_string(),
            ));
        }

        if !current.status.can_transition_to(target) {
            tracing::warn!(
                "Rejected transition {} -> {} on request {}",
                current.status,
                target,
                request_id
            );
            return Err(ServiceError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }

        self.update_request_status(request_id, target).await
    }

    pub async fn accept_request(
        &self,
        actor: Actor,
        request_id: Uuid,
    ) -> Result<AppraisalRequest, ServiceError> {
        self.transition(actor, request_id, RequestStatus::InProgress)
            .await
    }

    pub async fn reject_request(
        &self,
        actor: Actor,
        request_id: Uuid,
    ) -> Result<AppraisalRequest, ServiceError> {
        self.transition(actor, request_id, RequestStatus::Rejected)
            .await
    }

    pub async fn complete_request(
        &self,
        actor: Actor,
        request_id: Uuid,
    ) -> Result<AppraisalRequest, ServiceError> {
        self.transition(actor, request_id, RequestStatus::Completed)
            .await
    }

    pub async fn get_request_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AppraisalRequest>, ServiceError> {
        self.db_client
            .get_request(request_id)
            .await
            .context("Failed to fetch request")
    }

    pub async fn get_customer_requests(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<AppraisalRequest>, ServiceError> {
        self.fetch_sorted(Some(customer_id), None, "Failed to fetch requests")
            .await
    }

    pub async fn get_company_requests(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<AppraisalRequest>, ServiceError> {
        self.fetch_sorted(None, Some(company_id), "Failed to fetch company requests")
            .await
    }

    pub async fn get_all_requests(&self) -> Result<Vec<AppraisalRequest>, ServiceError> {
        self.fetch_sorted(None, None, "Failed to fetch all requests")
            .await
    }

    async fn fetch_sorted(
        &self,
        customer_id: Option<Uuid>,
        company_id: Option<Uuid>,
        context: &str,
    ) -> Result<Vec<AppraisalRequest>, ServiceError> {
        let mut requests = self
            .db_client
            .get_requests(customer_id, company_id)
            .await
            .context(context)?;

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::{MemoryStore, NotificationExt};
    use crate::models::{
        companymodel::{AppraisalType, Company},
        notificationmodel::NotificationType,
        usermodel::UserRole,
    };
    use crate::service::notification_service::NotificationService;

    struct Fixture {
        store: MemoryStore,
        dispatcher: NotificationDispatcher,
        service: RequestService,
        company: Company,
        company_user: Option<Uuid>,
    }

    async fn fixture(company_user: Option<Uuid>) -> Fixture {
        let store = MemoryStore::new();
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Summit Valuers".to_string(),
            email: "ops@summit.test".to_string(),
            phone: "0123456789".to_string(),
            location: "Riyadh".to_string(),
            services: vec![AppraisalType::Property, AppraisalType::Vehicle],
            license_number: "LIC-1".to_string(),
            rating: 0.0,
            total_ratings: 0,
            is_approved: true,
            is_suspended: false,
            is_archived: false,
            suspended_at: None,
            archived_at: None,
            description: None,
            user_id: company_user,
            created_at: now,
            updated_at: now,
        };
        store.insert_company(company.clone()).await;

        let db: Arc<dyn Store> = Arc::new(store.clone());
        let dispatcher = NotificationDispatcher::spawn(NotificationService::new(db.clone()), 16);
        let service = RequestService::new(db, dispatcher.clone());

        Fixture {
            store,
            dispatcher,
            service,
            company,
            company_user,
        }
    }

    fn new_request(company: &Company, customer_id: Uuid) -> NewAppraisalRequest {
        NewAppraisalRequest {
            customer_id,
            company_id: company.id,
            company_name: company.name.clone(),
            request_type: AppraisalType::Property,
            property_type: Some("villa".to_string()),
            location: "Jeddah".to_string(),
            description: None,
        }
    }

    async fn inbox(store: &MemoryStore, user_id: Uuid, role: UserRole) -> usize {
        store
            .get_notifications(user_id, role, false)
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn create_starts_pending_and_notifies_company() {
        let f = fixture(Some(Uuid::new_v4())).await;
        let customer = Uuid::new_v4();

        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();
        f.dispatcher.flush().await;

        let request = f.service.get_request_by_id(id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.request_type, AppraisalType::Property);
        assert_eq!(request.created_at, request.updated_at);

        let company_inbox = f
            .store
            .get_notifications(f.company_user.unwrap(), UserRole::Company, false)
            .await
            .unwrap();
        assert_eq!(company_inbox.len(), 1);
        assert_eq!(
            company_inbox[0].notification_type,
            NotificationType::RequestSubmitted
        );
        assert_eq!(inbox(&f.store, customer, UserRole::Customer).await, 0);
    }

    #[tokio::test]
    async fn admin_reopen_to_pending_is_not_a_new_submission() {
        let f = fixture(Some(Uuid::new_v4())).await;
        let customer = Uuid::new_v4();
        let owner = f.company_user.unwrap();

        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();
        f.service
            .transition(Actor::Admin, id, RequestStatus::Rejected)
            .await
            .unwrap();
        let reopened = f
            .service
            .transition(Actor::Admin, id, RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(reopened.status, RequestStatus::Pending);
        f.dispatcher.flush().await;

        assert_eq!(inbox(&f.store, owner, UserRole::Company).await, 1);
        // Only the rejection reached the customer.
        assert_eq!(inbox(&f.store, customer, UserRole::Customer).await, 1);
    }

    #[tokio::test]
    async fn company_without_identity_still_gets_the_request() {
        let f = fixture(None).await;
        let customer = Uuid::new_v4();

        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();
        f.dispatcher.flush().await;

        assert!(f.service.get_request_by_id(id).await.unwrap().is_some());
        assert_eq!(inbox(&f.store, customer, UserRole::Customer).await, 0);
        let all = f.store.get_notifications(f.company.id, UserRole::Company, false).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn unknown_company_is_not_found() {
        let f = fixture(None).await;
        let mut request = new_request(&f.company, Uuid::new_v4());
        request.company_id = Uuid::new_v4();

        let err = f.service.create_request(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Company not found");
        assert!(f.service.get_all_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let f = fixture(None).await;
        let mut request = new_request(&f.company, Uuid::new_v4());
        request.location = "   ".to_string();

        let err = f.service.create_request(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn each_mapped_status_notifies_the_customer_once() {
        let cases = [
            (RequestStatus::InProgress, NotificationType::RequestInProgress),
            (RequestStatus::Completed, NotificationType::RequestCompleted),
            (RequestStatus::Rejected, NotificationType::RequestRejected),
            (RequestStatus::IncompleteDocs, NotificationType::DocumentRequired),
        ];

        for (status, expected) in cases {
            let f = fixture(None).await;
            let customer = Uuid::new_v4();
            let id = f
                .service
                .create_request(new_request(&f.company, customer))
                .await
                .unwrap();

            f.service.update_request_status(id, status).await.unwrap();
            f.dispatcher.flush().await;

            let notes = f
                .store
                .get_notifications(customer, UserRole::Customer, false)
                .await
                .unwrap();
            assert_eq!(notes.len(), 1, "status {}", status);
            assert_eq!(notes[0].notification_type, expected);
            assert_eq!(notes[0].request_id, Some(id));
        }
    }

    #[tokio::test]
    async fn under_review_is_silent() {
        let f = fixture(None).await;
        let customer = Uuid::new_v4();
        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();

        f.service
            .update_request_status(id, RequestStatus::UnderReview)
            .await
            .unwrap();
        f.dispatcher.flush().await;

        assert_eq!(inbox(&f.store, customer, UserRole::Customer).await, 0);
    }

    #[tokio::test]
    async fn updated_at_moves_strictly_forward() {
        let f = fixture(None).await;
        let id = f
            .service
            .create_request(new_request(&f.company, Uuid::new_v4()))
            .await
            .unwrap();
        let before = f.service.get_request_by_id(id).await.unwrap().unwrap();

        f.service
            .update_request_status(id, RequestStatus::Completed)
            .await
            .unwrap();

        let after = f.service.get_request_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.status, RequestStatus::Completed);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let f = fixture(None).await;
        let err = f
            .service
            .update_request_status(Uuid::new_v4(), RequestStatus::Completed)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn notification_outage_does_not_fail_the_update() {
        let f = fixture(None).await;
        let customer = Uuid::new_v4();
        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();

        f.store.set_notifications_unavailable(true);
        let updated = f
            .service
            .update_request_status(id, RequestStatus::Rejected)
            .await
            .unwrap();
        f.dispatcher.flush().await;
        f.store.set_notifications_unavailable(false);

        assert_eq!(updated.status, RequestStatus::Rejected);
        assert_eq!(inbox(&f.store, customer, UserRole::Customer).await, 0);
    }

    #[tokio::test]
    async fn company_follows_the_transition_table() {
        let f = fixture(None).await;
        let actor = Actor::Company(f.company.id);
        let id = f
            .service
            .create_request(new_request(&f.company, Uuid::new_v4()))
            .await
            .unwrap();

        let err = f.service.complete_request(actor, id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidTransition {
                from: RequestStatus::Pending,
                to: RequestStatus::Completed
            }
        ));

        f.service.accept_request(actor, id).await.unwrap();
        let done = f.service.complete_request(actor, id).await.unwrap();
        assert_eq!(done.status, RequestStatus::Completed);

        // Terminal.
        let err = f.service.reject_request(actor, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        // Admin override still works.
        let reopened = f
            .service
            .transition(Actor::Admin, id, RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(reopened.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn other_actors_cannot_move_the_request() {
        let f = fixture(None).await;
        let customer = Uuid::new_v4();
        let id = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();

        let err = f
            .service
            .accept_request(Actor::Company(Uuid::new_v4()), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = f
            .service
            .accept_request(Actor::Customer(customer), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let f = fixture(None).await;
        let customer = Uuid::new_v4();

        let first = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = f
            .service
            .create_request(new_request(&f.company, customer))
            .await
            .unwrap();
        f.service
            .create_request(new_request(&f.company, Uuid::new_v4()))
            .await
            .unwrap();

        let mine = f.service.get_customer_requests(customer).await.unwrap();
        assert_eq!(mine.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);

        let company = f.service.get_company_requests(f.company.id).await.unwrap();
        assert_eq!(company.len(), 3);
        assert_eq!(f.service.get_all_requests().await.unwrap().len(), 3);
    }
}
