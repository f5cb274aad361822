//! HTTP handlers.

pub mod archive_handler;
pub mod grade_handler;
pub mod health_handler;
pub mod login_record_handler;
pub mod me_handler;
pub mod student_handler;

pub use archive_handler::archive_routes;
pub use grade_handler::grade_routes;
pub use health_handler::health_routes;
pub use login_record_handler::login_record_routes;
pub use me_handler::me_routes;
pub use student_handler::student_routes;
