pub mod companymodel;
pub mod notificationmodel;
pub mod requestmodel;
pub mod reviewmodel;
pub mod usermodel;
