// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        companymodel::AppraisalType,
        notificationmodel::{NewNotification, Notification, NotificationType},
        requestmodel::{AppraisalRequest, RequestStatus},
        usermodel::UserRole,
    },
    service::error::{ServiceError, StoreResultExt},
};

/// The slice of a request that notification text is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub customer_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub request_type: AppraisalType,
}

impl From<&AppraisalRequest> for RequestContext {
    fn from(request: &AppraisalRequest) -> Self {
        RequestContext {
            request_id: request.id,
            customer_id: request.customer_id,
            company_id: request.company_id,
            company_name: request.company_name.clone(),
            request_type: request.request_type,
        }
    }
}

/// Customer-facing notification for a status, if that status has one.
/// `pending` and `under_review` have none.
pub fn customer_notification(
    context: &RequestContext,
    status: RequestStatus,
) -> Option<NewNotification> {
    let label = context.request_type.label();
    let company = &context.company_name;

    let (notification_type, title, body) = match status {
        RequestStatus::InProgress => (
            NotificationType::RequestInProgress,
            "Appraisal In Progress",
            format!(
                "{} has started working on your {} appraisal request.",
                company, label
            ),
        ),
        RequestStatus::Completed => (
            NotificationType::RequestCompleted,
            "Appraisal Completed",
            format!(
                "Your {} appraisal from {} has been completed. You can now download the report.",
                label, company
            ),
        ),
        RequestStatus::Rejected => (
            NotificationType::RequestRejected,
            "Request Rejected",
            format!("{} has rejected your appraisal request.", company),
        ),
        RequestStatus::IncompleteDocs => (
            NotificationType::DocumentRequired,
            "Documents Required",
            format!(
                "{} requires additional documents for your appraisal request.",
                company
            ),
        ),
        RequestStatus::Pending | RequestStatus::UnderReview => return None,
    };

    Some(NewNotification {
        user_id: context.customer_id,
        user_role: UserRole::Customer,
        notification_type,
        title: title.to_string(),
        body,
        request_id: Some(context.request_id),
        company_id: Some(context.company_id),
    })
}

/// Notification for the company identity when a customer submits a request.
pub fn submission_notification(context: &RequestContext, company_user_id: Uuid) -> NewNotification {
    NewNotification {
        user_id: company_user_id,
        user_role: UserRole::Company,
        notification_type: NotificationType::RequestSubmitted,
        title: "New Appraisal Request".to_string(),
        body: format!(
            "You have received a new {} appraisal request.",
            context.request_type.label()
        ),
        request_id: Some(context.request_id),
        company_id: Some(context.company_id),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    db_client: Arc<dyn Store>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService").finish()
    }
}

impl NotificationService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    /// Tells the company identity about a newly submitted request.
    /// Returns how many notifications were written.
    pub async fn notify_request_created(
        &self,
        context: &RequestContext,
    ) -> Result<usize, ServiceError> {
        let company = self
            .db_client
            .get_company(Some(context.company_id), None, None, None)
            .await
            .context("Failed to fetch company")?;

        match company.and_then(|c| c.user_id) {
            Some(company_user_id) => {
                self.create_notification(submission_notification(context, company_user_id))
                    .await?;
                Ok(1)
            }
            None => {
                tracing::warn!(
                    "Company {} has no linked identity; skipping new request notification for {}",
                    context.company_id,
                    context.request_id
                );
                Ok(0)
            }
        }
    }

    /// Stores the customer notification `status` calls for, if any, and
    /// returns how many were written. Moving back to `pending` is silent.
    pub async fn notify_request_status_change(
        &self,
        context: &RequestContext,
        status: RequestStatus,
    ) -> Result<usize, ServiceError> {
        let created = match customer_notification(context, status) {
            Some(notification) => {
                self.create_notification(notification).await?;
                1
            }
            None => 0,
        };

        tracing::debug!(
            "Request {} moved to {}: {} notification(s) stored",
            context.request_id,
            status,
            created
        );

        Ok(created)
    }

    pub async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, ServiceError> {
        self.db_client
            .save_notification(notification)
            .await
            .context("Failed to create notification")
    }

    pub async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, ServiceError> {
        self.db_client
            .get_notification(notification_id)
            .await
            .context("Failed to fetch notification")
    }

    /// Newest first.
    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        user_role: UserRole,
    ) -> Result<Vec<Notification>, ServiceError> {
        let mut notifications = self
            .db_client
            .get_notifications(user_id, user_role, false)
            .await
            .context("Failed to fetch notifications")?;

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub async fn mark_as_read(&self, notification_id: Uuid) -> Result<(), ServiceError> {
        self.db_client
            .mark_notification_read(notification_id)
            .await
            .map_err(|e| match e {
                crate::db::StoreError::NotFound => {
                    ServiceError::NotFound("Notification not found".to_string())
                }
                e => ServiceError::store("Failed to mark notification as read", e),
            })?;

        Ok(())
    }

    /// Marks each unread notification independently; one failed update does
    /// not stop the others. Returns the number actually marked.
    pub async fn mark_all_as_read(
        &self,
        user_id: Uuid,
        user_role: UserRole,
    ) -> Result<usize, ServiceError> {
        let unread = self
            .db_client
            .get_notifications(user_id, user_role, true)
            .await
            .context("Failed to mark all as read")?;

        let results = futures::future::join_all(
            unread
                .iter()
                .map(|n| self.db_client.mark_notification_read(n.id)),
        )
        .await;

        let mut marked = 0;
        for (notification, result) in unread.iter().zip(results) {
            match result {
                Ok(_) => marked += 1,
                Err(e) => tracing::warn!(
                    "Failed to mark notification {} as read: {}",
                    notification.id,
                    e
                ),
            }
        }

        Ok(marked)
    }

    pub async fn get_unread_count(
        &self,
        user_id: Uuid,
        user_role: UserRole,
    ) -> Result<usize, ServiceError> {
        let unread = self
            .db_client
            .get_notifications(user_id, user_role, true)
            .await
            .context("Failed to get unread count")?;

        Ok(unread.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CompanyExt, MemoryStore};
    use crate::models::companymodel::NewCompany;

    fn context(request_type: AppraisalType) -> RequestContext {
        RequestContext {
            request_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: "Summit Valuers".to_string(),
            request_type,
        }
    }

    #[test]
    fn mapped_statuses_address_the_customer() {
        let ctx = context(AppraisalType::Vehicle);

        let cases = [
            (RequestStatus::InProgress, NotificationType::RequestInProgress),
            (RequestStatus::Completed, NotificationType::RequestCompleted),
            (RequestStatus::Rejected, NotificationType::RequestRejected),
            (RequestStatus::IncompleteDocs, NotificationType::DocumentRequired),
        ];

        for (status, expected) in cases {
            let n = customer_notification(&ctx, status).expect("mapped status notifies");
            assert_eq!(n.notification_type, expected);
            assert_eq!(n.user_id, ctx.customer_id);
            assert_eq!(n.user_role, UserRole::Customer);
            assert_eq!(n.request_id, Some(ctx.request_id));
        }
    }

    #[test]
    fn unmapped_statuses_are_silent() {
        let ctx = context(AppraisalType::Property);
        assert!(customer_notification(&ctx, RequestStatus::UnderReview).is_none());
        assert!(customer_notification(&ctx, RequestStatus::Pending).is_none());
    }

    #[test]
    fn body_uses_company_name_and_type_label() {
        let ctx = context(AppraisalType::Vehicle);
        let n = customer_notification(&ctx, RequestStatus::InProgress).unwrap();
        assert_eq!(
            n.body,
            "Summit Valuers has started working on your car appraisal request."
        );

        let ctx = context(AppraisalType::Property);
        let n = customer_notification(&ctx, RequestStatus::Completed).unwrap();
        assert_eq!(
            n.body,
            "Your property appraisal from Summit Valuers has been completed. You can now download the report."
        );
    }

    #[tokio::test]
    async fn creation_notifies_the_company_identity() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let company = store
            .save_company(NewCompany {
                name: "Summit Valuers".to_string(),
                email: "ops@summit.test".to_string(),
                phone: "0123456789".to_string(),
                location: "Riyadh".to_string(),
                services: vec![AppraisalType::Property],
                license_number: "LIC-1".to_string(),
                description: None,
                user_id: Some(owner),
            })
            .await
            .unwrap();

        let service = NotificationService::new(Arc::new(store));
        let mut ctx = context(AppraisalType::Property);
        ctx.company_id = company.id;

        let created = service.notify_request_created(&ctx).await.unwrap();
        assert_eq!(created, 1);

        // A later move back to pending is not a new submission.
        let created = service
            .notify_request_status_change(&ctx, RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(created, 0);

        let inbox = service
            .get_user_notifications(owner, UserRole::Company)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::RequestSubmitted);
        assert_eq!(inbox[0].body, "You have received a new property appraisal request.");
    }

    #[tokio::test]
    async fn mark_all_as_read_only_touches_the_recipient() {
        let store = MemoryStore::new();
        let service = NotificationService::new(Arc::new(store));
        let ctx = context(AppraisalType::Property);

        for status in [RequestStatus::InProgress, RequestStatus::Completed] {
            service
                .notify_request_status_change(&ctx, status)
                .await
                .unwrap();
        }
        let other = context(AppraisalType::Vehicle);
        service
            .notify_request_status_change(&other, RequestStatus::Rejected)
            .await
            .unwrap();

        assert_eq!(
            service
                .get_unread_count(ctx.customer_id, UserRole::Customer)
                .await
                .unwrap(),
            2
        );

        let marked = service
            .mark_all_as_read(ctx.customer_id, UserRole::Customer)
            .await
            .unwrap();
        assert_eq!(marked, 2);
        assert_eq!(
            service
                .get_unread_count(ctx.customer_id, UserRole::Customer)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            service
                .get_unread_count(other.customer_id, UserRole::Customer)
                .await
                .unwrap(),
            1
        );

        // Same user id under another role is a separate inbox.
        assert_eq!(
            service
                .get_unread_count(ctx.customer_id, UserRole::Company)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn mark_as_read_is_idempotent() {
        let service = NotificationService::new(Arc::new(MemoryStore::new()));
        let ctx = context(AppraisalType::Property);
        service
            .notify_request_status_change(&ctx, RequestStatus::Rejected)
            .await
            .unwrap();

        let inbox = service
            .get_user_notifications(ctx.customer_id, UserRole::Customer)
            .await
            .unwrap();
        let id = inbox[0].id;

        service.mark_as_read(id).await.unwrap();
        service.mark_as_read(id).await.unwrap();

        let n = service.get_notification(id).await.unwrap().unwrap();
        assert!(n.is_read);

        let missing = service.mark_as_read(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}
