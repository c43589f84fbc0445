pub mod admin;
pub mod auth;
pub mod companies;
pub mod notifications;
pub mod requests;
pub mod reviews;
