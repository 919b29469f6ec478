use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Course, Enrollment, PaymentStatus};

/// An enrollment together with the catalog entry it refers to.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: Course,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrolledCourseList {
    pub items: Vec<EnrolledCourse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEnrollmentStatusRequest {
    pub payment_status: PaymentStatus,
}

/// Back-office view of an enrollment with student and course columns joined in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminEnrollmentRow {
    pub enrollment_id: Uuid,
    pub enrollment_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    #[schema(value_type = String)]
    pub amount_paid: Decimal,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub course_id: Uuid,
    pub course_title: String,
    #[schema(value_type = String)]
    pub course_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminEnrollmentList {
    pub items: Vec<AdminEnrollmentRow>,
}
