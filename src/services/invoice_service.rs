use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::{
    entity::{
        courses::Column as CourseCol,
        enrollments::{Column as EnrollCol, Entity as Enrollments, Relation as EnrollRel},
        students::Column as StudentCol,
    },
    error::{AppError, AppResult},
    invoice::InvoiceData,
    middleware::auth::AuthUser,
    models::PaymentStatus,
    money::from_minor_units,
    state::AppState,
};

#[derive(Debug, FromQueryResult)]
struct InvoiceRow {
    enrollment_id: Uuid,
    amount_paid_minor: i64,
    payment_status: PaymentStatus,
    payment_id: Option<String>,
    payment_order_id: Option<String>,
    enrollment_date: DateTimeWithTimeZone,
    student_name: String,
    course_title: String,
}

/// Loads the invoice projection of one settled enrollment owned by `student_id`.
///
/// Enrollments of other students and unsettled ones are indistinguishable
/// from missing ones.
pub async fn load_invoice(
    db: &DatabaseConnection,
    institute_name: &str,
    currency: &str,
    enrollment_id: Uuid,
    student_id: Uuid,
) -> AppResult<InvoiceData> {
    let row = Enrollments::find()
        .select_only()
        .column_as(EnrollCol::Id, "enrollment_id")
        .column(EnrollCol::AmountPaidMinor)
        .column(EnrollCol::PaymentStatus)
        .column(EnrollCol::PaymentId)
        .column(EnrollCol::PaymentOrderId)
        .column(EnrollCol::EnrollmentDate)
        .join(JoinType::InnerJoin, EnrollRel::Students.def())
        .join(JoinType::InnerJoin, EnrollRel::Courses.def())
        .column_as(StudentCol::Name, "student_name")
        .column_as(CourseCol::Title, "course_title")
        .filter(EnrollCol::Id.eq(enrollment_id))
        .filter(EnrollCol::StudentId.eq(student_id))
        .into_model::<InvoiceRow>()
        .one(db)
        .await?;

    let row = match row {
        Some(r) if r.payment_status == PaymentStatus::Paid => r,
        _ => return Err(AppError::NotFound("Invoice not found")),
    };

    Ok(InvoiceData {
        institute_name: institute_name.to_string(),
        enrollment_id: row.enrollment_id,
        student_name: row.student_name,
        course_title: row.course_title,
        amount_paid: from_minor_units(row.amount_paid_minor),
        currency: currency.to_string(),
        payment_id: row.payment_id,
        order_id: row.payment_order_id,
        enrollment_date: row.enrollment_date.with_timezone(&Utc),
    })
}

pub async fn get_invoice(
    state: &AppState,
    user: &AuthUser,
    enrollment_id: Uuid,
) -> AppResult<InvoiceData> {
    let student_id = user.student_id()?;
    load_invoice(
        &state.orm,
        &state.config.institute_name,
        &state.config.payment.currency,
        enrollment_id,
        student_id,
    )
    .await
}
