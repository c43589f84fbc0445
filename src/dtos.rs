pub mod admindtos;
pub mod companydtos;
pub mod notificationdtos;
pub mod requestdtos;
pub mod reviewdtos;
pub mod userdtos;

pub use admindtos::*;
pub use companydtos::*;
pub use notificationdtos::*;
pub use requestdtos::*;
pub use reviewdtos::*;
pub use userdtos::*;
