//! Enrollment ledger: the only writer of `enrollments` rows.
//!
//! At most one row exists per `(student_id, course_id)`. The unique index on
//! that pair is the conflict target of [`insert_paid`], so concurrent
//! verifications of the same purchase settle on a single row. Payment and
//! order ids are unique across the table, so one captured payment can only
//! ever pay for one enrollment.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::{
        enrollments::{EnrolledCourse, EnrolledCourseList},
        payments::EnrollmentOutcome,
    },
    entity::{
        courses::Entity as Courses,
        enrollments::{
            ActiveModel as EnrollmentActive, Column as EnrollCol, Entity as Enrollments,
            Model as EnrollmentModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Course, Enrollment, PaymentStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Verified payment about to be recorded.
#[derive(Debug, Clone)]
pub struct PaidEnrollment {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount_paid_minor: i64,
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

pub async fn find_by_student_and_course<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    course_id: Uuid,
) -> AppResult<Option<EnrollmentModel>> {
    let enrollment = Enrollments::find()
        .filter(EnrollCol::StudentId.eq(student_id))
        .filter(EnrollCol::CourseId.eq(course_id))
        .one(conn)
        .await?;
    Ok(enrollment)
}

/// Compare-and-insert of a paid enrollment.
///
/// Runs `INSERT .. ON CONFLICT (student_id, course_id) DO NOTHING` and reads the
/// pair back in the same transaction. Exactly one caller per pair observes
/// [`EnrollmentOutcome::Enrolled`]; every other caller, concurrent or later,
/// gets the stored row with [`EnrollmentOutcome::AlreadyEnrolled`].
///
/// A payment or order id already recorded against a different pair is
/// rejected and leaves no row behind.
pub async fn insert_paid(
    db: &DatabaseConnection,
    paid: PaidEnrollment,
) -> AppResult<(EnrollmentOutcome, EnrollmentModel)> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let row = EnrollmentActive {
        id: Set(Uuid::new_v4()),
        student_id: Set(paid.student_id),
        course_id: Set(paid.course_id),
        amount_paid_minor: Set(paid.amount_paid_minor),
        payment_status: Set(PaymentStatus::Paid),
        payment_id: Set(Some(paid.payment_id.clone())),
        payment_order_id: Set(Some(paid.order_id.clone())),
        payment_signature: Set(Some(paid.signature)),
        enrollment_date: Set(now.into()),
        updated_at: Set(now.into()),
    };

    // The insert stays the first statement so SQLite takes the write lock
    // before any snapshot is held.
    let inserted = Enrollments::insert(row)
        .on_conflict(
            OnConflict::columns([EnrollCol::StudentId, EnrollCol::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await;

    let inserted = match inserted {
        Ok(count) => count,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            txn.rollback().await?;
            return resolve_payment_reuse(db, &paid.payment_id, paid.student_id, paid.course_id)
                .await;
        }
        // Student or course removed after the caller looked them up.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
            txn.rollback().await?;
            return Err(AppError::NotFound("Student or course no longer exists"));
        }
        Err(err) => return Err(err.into()),
    };

    let enrollment = find_by_student_and_course(&txn, paid.student_id, paid.course_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("enrollment missing after insert")))?;

    txn.commit().await?;

    let outcome = if inserted == 1 {
        EnrollmentOutcome::Enrolled
    } else {
        EnrollmentOutcome::AlreadyEnrolled
    };
    Ok((outcome, enrollment))
}

/// A unique payment reference was hit. Replaying the payment that created the
/// pair's own row is an idempotent retry; anything else is reuse.
async fn resolve_payment_reuse(
    db: &DatabaseConnection,
    payment_id: &str,
    student_id: Uuid,
    course_id: Uuid,
) -> AppResult<(EnrollmentOutcome, EnrollmentModel)> {
    match find_by_student_and_course(db, student_id, course_id).await? {
        Some(existing) if existing.payment_id.as_deref() == Some(payment_id) => {
            Ok((EnrollmentOutcome::AlreadyEnrolled, existing))
        }
        _ => {
            tracing::warn!(
                payment_id = %payment_id,
                student_id = %student_id,
                course_id = %course_id,
                "payment reference already used for another enrollment"
            );
            Err(AppError::Validation(
                "payment already used for another enrollment".into(),
            ))
        }
    }
}

/// Enrollments of one student joined with their course, newest first.
pub async fn list_by_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
) -> AppResult<Vec<EnrolledCourse>> {
    let rows = Enrollments::find()
        .filter(EnrollCol::StudentId.eq(student_id))
        .order_by_desc(EnrollCol::EnrollmentDate)
        .find_also_related(Courses)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(enrollment, course)| {
            course.map(|course| EnrolledCourse {
                enrollment: Enrollment::from(enrollment),
                course: Course::from(course),
            })
        })
        .collect())
}

pub async fn list_my_enrollments(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<EnrolledCourseList>> {
    let student_id = user.student_id()?;
    let items = list_by_student(&state.orm, student_id).await?;
    Ok(ApiResponse::success(
        "Enrolled courses",
        EnrolledCourseList { items },
        Some(Meta::empty()),
    ))
}

/// Status override. Any listed status may follow any other, except that `paid`
/// is only reachable for a row that carries a verified payment signature.
pub async fn update_status<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: Uuid,
    status: PaymentStatus,
) -> AppResult<EnrollmentModel> {
    let existing = Enrollments::find_by_id(enrollment_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Enrollment not found"))?;

    if status == PaymentStatus::Paid && existing.payment_signature.is_none() {
        return Err(AppError::Validation(
            "an enrollment without a verified payment cannot be marked paid".into(),
        ));
    }

    let mut active: EnrollmentActive = existing.into();
    active.payment_status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;
    Ok(updated)
}

pub async fn delete_for_student<C: ConnectionTrait>(conn: &C, student_id: Uuid) -> AppResult<u64> {
    let result = Enrollments::delete_many()
        .filter(EnrollCol::StudentId.eq(student_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
