pub mod audit_logs;
pub mod contacts;
pub mod courses;
pub mod enrollments;
pub mod otp_verifications;
pub mod reset_tokens;
pub mod students;

pub use audit_logs::Entity as AuditLogs;
pub use contacts::Entity as Contacts;
pub use courses::Entity as Courses;
pub use enrollments::Entity as Enrollments;
pub use otp_verifications::Entity as OtpVerifications;
pub use reset_tokens::Entity as ResetTokens;
pub use students::Entity as Students;
