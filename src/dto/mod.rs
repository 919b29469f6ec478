pub mod auth;
pub mod contacts;
pub mod courses;
pub mod enrollments;
pub mod payments;
pub mod students;
