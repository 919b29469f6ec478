pub mod admin_service;
pub mod auth_service;
pub mod contact_service;
pub mod course_service;
pub mod enrollment_service;
pub mod invoice_service;
pub mod payment_service;
pub mod student_service;
