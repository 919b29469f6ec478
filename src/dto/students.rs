use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{PaymentStatus, Student};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentSummary {
    pub enrollment_id: Uuid,
    pub course_title: String,
    #[schema(value_type = String)]
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub enrollment_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentWithEnrollments {
    pub student: Student,
    pub enrollments: Vec<EnrollmentSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentList {
    pub items: Vec<StudentWithEnrollments>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedStudent {
    pub student: Student,
    pub removed_enrollments: u64,
}
