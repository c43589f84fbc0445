use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{MarkedReadDto, NotificationListResponseDto, Response, UnreadCountDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread-count", get(get_unread_count))
        .route("/read-all", put(mark_all_as_read))
        .route("/:id/read", put(mark_as_read))
}

pub async fn get_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .get_user_notifications(user.user.id, user.user.role)
        .await?;

    Ok(Json(NotificationListResponseDto {
        status: "success".to_string(),
        results: notifications.len(),
        notifications,
    }))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state
        .notification_service
        .get_unread_count(user.user.id, user.user.role)
        .await?;

    Ok(Json(UnreadCountDto {
        status: "success".to_string(),
        count,
    }))
}

pub async fn mark_as_read(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .notification_service
        .get_notification(notification_id)
        .await?
        .filter(|n| n.user_id == user.user.id && n.user_role == user.user.role)
        .ok_or_else(|| HttpError::not_found("Notification not found"))?;

    app_state
        .notification_service
        .mark_as_read(notification.id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Notification marked as read".to_string(),
    }))
}

pub async fn mark_all_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let marked = app_state
        .notification_service
        .mark_all_as_read(user.user.id, user.user.role)
        .await?;

    Ok(Json(MarkedReadDto {
        status: "success".to_string(),
        marked,
    }))
}
