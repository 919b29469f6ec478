use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::enrollments::PaymentStatus;
use crate::{
    entity::{
        contacts::Model as ContactModel, courses::Model as CourseModel,
        enrollments::Model as EnrollmentModel, students::Model as StudentModel,
    },
    money::from_minor_units,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub faculty: String,
    #[schema(value_type = String, example = "4999.00")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student's purchase of a course. Processor identifiers are present once
/// the payment has been verified; the signature itself stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    #[schema(value_type = String, example = "4999.00")]
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub enrollment_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message left through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactModel> for Contact {
    fn from(model: ContactModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            message: model.message,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<StudentModel> for Student {
    fn from(model: StudentModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<CourseModel> for Course {
    fn from(model: CourseModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            duration: model.duration,
            faculty: model.faculty,
            price: from_minor_units(model.price_minor),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<EnrollmentModel> for Enrollment {
    fn from(model: EnrollmentModel) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            course_id: model.course_id,
            amount_paid: from_minor_units(model.amount_paid_minor),
            payment_status: model.payment_status,
            payment_id: model.payment_id,
            order_id: model.payment_order_id,
            enrollment_date: model.enrollment_date.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
