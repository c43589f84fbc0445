use serde::Serialize;

use crate::models::notificationmodel::Notification;

#[derive(Debug, Serialize)]
pub struct NotificationListResponseDto {
    pub status: String,
    pub notifications: Vec<Notification>,
    pub results: usize,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountDto {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkedReadDto {
    pub status: String,
    pub marked: usize,
}
