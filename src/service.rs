pub mod admin_service;
pub mod auth_service;
pub mod company_service;
pub mod error;
pub mod notification_dispatcher;
pub mod notification_service;
pub mod rating_service;
pub mod request_service;
