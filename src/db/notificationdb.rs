use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::{
    notificationmodel::{NewNotification, Notification},
    usermodel::UserRole,
};

#[async_trait]
pub trait NotificationExt {
    async fn save_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;

    async fn get_notifications(
        &self,
        user_id: Uuid,
        user_role: UserRole,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, StoreError>;
}

const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, user_role, notification_type, title, body,
    request_id, company_id, is_read, created_at
"#;

#[async_trait]
impl NotificationExt for DBClient {
    async fn save_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
            (user_id, user_role, notification_type, title, body, request_id, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification.user_id)
        .bind(notification.user_role)
        .bind(notification.notification_type)
        .bind(notification.title)
        .bind(notification.body)
        .bind(notification.request_id)
        .bind(notification.company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_notifications(
        &self,
        user_id: Uuid,
        user_role: UserRole,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {} FROM notifications
            WHERE user_id = $1 AND user_role = $2
              AND ($3 = false OR is_read = false)
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(user_role)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, StoreError> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
