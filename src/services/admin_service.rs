use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        enrollments::{
            AdminEnrollmentList, AdminEnrollmentRow, EnrolledCourseList,
            UpdateEnrollmentStatusRequest,
        },
        students::{DeletedStudent, EnrollmentSummary, StudentList, StudentWithEnrollments},
    },
    entity::{
        courses::{Column as CourseCol, Entity as Courses},
        enrollments::{Column as EnrollCol, Entity as Enrollments, Relation as EnrollRel},
        students::{Column as StudentCol, Entity as Students},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Enrollment, PaymentStatus, Student},
    money::from_minor_units,
    response::{ApiResponse, Meta},
    routes::params::{EnrollmentListQuery, Pagination},
    services::{enrollment_service, student_service::find_student},
    state::AppState,
};

#[derive(Debug, FromQueryResult)]
struct EnrollmentJoinRow {
    enrollment_id: Uuid,
    enrollment_date: DateTimeWithTimeZone,
    payment_status: PaymentStatus,
    payment_id: Option<String>,
    amount_paid_minor: i64,
    student_id: Uuid,
    student_name: String,
    student_email: String,
    course_id: Uuid,
    course_title: String,
    course_price_minor: i64,
}

impl From<EnrollmentJoinRow> for AdminEnrollmentRow {
    fn from(row: EnrollmentJoinRow) -> Self {
        Self {
            enrollment_id: row.enrollment_id,
            enrollment_date: row.enrollment_date.with_timezone(&Utc),
            payment_status: row.payment_status,
            payment_id: row.payment_id,
            amount_paid: from_minor_units(row.amount_paid_minor),
            student_id: row.student_id,
            student_name: row.student_name,
            student_email: row.student_email,
            course_id: row.course_id,
            course_title: row.course_title,
            course_price: from_minor_units(row.course_price_minor),
        }
    }
}

pub async fn list_students(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<StudentList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Students::find().order_by_desc(StudentCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let students = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();
    let mut by_student: HashMap<Uuid, Vec<EnrollmentSummary>> = HashMap::new();
    if !ids.is_empty() {
        let rows = Enrollments::find()
            .filter(EnrollCol::StudentId.is_in(ids))
            .order_by_desc(EnrollCol::EnrollmentDate)
            .find_also_related(Courses)
            .all(&state.orm)
            .await?;
        for (enrollment, course) in rows {
            by_student
                .entry(enrollment.student_id)
                .or_default()
                .push(EnrollmentSummary {
                    enrollment_id: enrollment.id,
                    course_title: course.map(|c| c.title).unwrap_or_default(),
                    amount_paid: from_minor_units(enrollment.amount_paid_minor),
                    payment_status: enrollment.payment_status,
                    enrollment_date: enrollment.enrollment_date.with_timezone(&Utc),
                });
        }
    }

    let items = students
        .into_iter()
        .map(|student| {
            let enrollments = by_student.remove(&student.id).unwrap_or_default();
            StudentWithEnrollments {
                student: Student::from(student),
                enrollments,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Students", StudentList { items }, Some(meta)))
}

/// Removes a student together with every enrollment they hold.
pub async fn delete_student(
    state: &AppState,
    user: &AuthUser,
    student_id: Uuid,
) -> AppResult<ApiResponse<DeletedStudent>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let student = find_student(&txn, student_id).await?;
    let removed_enrollments = enrollment_service::delete_for_student(&txn, student_id).await?;
    let deleted = Student::from(student.clone());
    student.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        student_id = %student_id,
        removed_enrollments,
        "student deleted"
    );
    audit::record(
        &state.orm,
        &user.subject,
        "student_delete",
        "students",
        serde_json::json!({ "student_id": student_id, "removed_enrollments": removed_enrollments }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Student '{}' deleted", deleted.name),
        DeletedStudent {
            student: deleted,
            removed_enrollments,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_enrollments(
    state: &AppState,
    user: &AuthUser,
    query: EnrollmentListQuery,
) -> AppResult<ApiResponse<AdminEnrollmentList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((Students, StudentCol::Name))))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((Students, StudentCol::Email))))
                        .like(pattern.clone()),
                )
                .add(Expr::expr(Func::lower(Expr::col((Courses, CourseCol::Title)))).like(pattern)),
        );
    }
    if let Some(status) = query.status {
        condition = condition.add(EnrollCol::PaymentStatus.eq(status));
    }

    let finder = Enrollments::find()
        .join(JoinType::InnerJoin, EnrollRel::Students.def())
        .join(JoinType::InnerJoin, EnrollRel::Courses.def())
        .filter(condition)
        .order_by_desc(EnrollCol::EnrollmentDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .select_only()
        .column_as(EnrollCol::Id, "enrollment_id")
        .column(EnrollCol::EnrollmentDate)
        .column(EnrollCol::PaymentStatus)
        .column(EnrollCol::PaymentId)
        .column(EnrollCol::AmountPaidMinor)
        .column(EnrollCol::StudentId)
        .column_as(StudentCol::Name, "student_name")
        .column_as(StudentCol::Email, "student_email")
        .column(EnrollCol::CourseId)
        .column_as(CourseCol::Title, "course_title")
        .column_as(CourseCol::PriceMinor, "course_price_minor")
        .limit(limit as u64)
        .offset(offset as u64)
        .into_model::<EnrollmentJoinRow>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AdminEnrollmentRow::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Enrollments",
        AdminEnrollmentList { items },
        Some(meta),
    ))
}

pub async fn student_enrollments(
    state: &AppState,
    user: &AuthUser,
    student_id: Uuid,
) -> AppResult<ApiResponse<EnrolledCourseList>> {
    ensure_admin(user)?;
    find_student(&state.orm, student_id).await?;
    let items = enrollment_service::list_by_student(&state.orm, student_id).await?;
    Ok(ApiResponse::success(
        "Student enrollments",
        EnrolledCourseList { items },
        Some(Meta::empty()),
    ))
}

pub async fn set_enrollment_status(
    state: &AppState,
    user: &AuthUser,
    enrollment_id: Uuid,
    payload: UpdateEnrollmentStatusRequest,
) -> AppResult<ApiResponse<Enrollment>> {
    ensure_admin(user)?;

    let updated =
        enrollment_service::update_status(&state.orm, enrollment_id, payload.payment_status)
            .await?;

    tracing::info!(
        enrollment_id = %updated.id,
        status = %updated.payment_status,
        admin = %user.subject,
        "enrollment status overridden"
    );
    audit::record(
        &state.orm,
        &user.subject,
        "enrollment_status_update",
        "enrollments",
        serde_json::json!({
            "enrollment_id": updated.id,
            "payment_status": updated.payment_status.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Enrollment status updated",
        Enrollment::from(updated),
        Some(Meta::empty()),
    ))
}
