use chrono::Utc;

use crate::{
    audit,
    dto::payments::{
        CreateOrderRequest, EnrollmentOutcome, OrderHandle, VerifyPaymentRequest,
        VerifyPaymentResponse,
    },
    entity::students::Model as StudentModel,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Enrollment,
    money::{from_minor_units, to_minor_units},
    notifier::notify_in_background,
    payments::NewOrder,
    response::{ApiResponse, Meta},
    services::{
        course_service::find_course,
        enrollment_service::{self, PaidEnrollment},
        student_service::find_student,
    },
    state::AppState,
    validation::require,
};

/// Opens a processor order for a course purchase.
///
/// The charge is the catalog price; a client-supplied amount is only checked
/// against it.
pub async fn create_payment_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderHandle>> {
    let student_id = user.student_id()?;
    let course = find_course(&state.orm, payload.course_id).await?;

    if let Some(amount) = payload.amount {
        let claimed = to_minor_units(amount)?;
        if claimed < course.price_minor {
            return Err(AppError::Validation(format!(
                "amount is less than course price ({})",
                from_minor_units(course.price_minor)
            )));
        }
    }

    let order = state
        .gateway
        .create_order(NewOrder {
            amount_minor: course.price_minor,
            currency: state.config.payment.currency.clone(),
            receipt: format!("receipt_{}", Utc::now().timestamp_millis()),
            course_id: course.id,
            student_id,
        })
        .await
        .map_err(|e| AppError::OrderCreation(e.to_string()))?;

    tracing::info!(
        order_id = %order.order_id,
        course_id = %course.id,
        student_id = %student_id,
        amount_minor = order.amount_minor,
        "payment order created"
    );

    audit::record(
        &state.orm,
        &user.subject,
        "payment_order_created",
        "payments",
        serde_json::json!({ "order_id": order.order_id, "course_id": course.id }),
    )
    .await;

    let handle = OrderHandle {
        amount: from_minor_units(order.amount_minor),
        amount_minor: order.amount_minor,
        order_id: order.order_id,
        currency: order.currency,
        key_id: state.gateway.public_key().to_string(),
        course_id: course.id,
    };
    Ok(ApiResponse::success("Order created", handle, Some(Meta::empty())))
}

/// Verifies a completed-payment claim and records the enrollment once.
///
/// Validation, signature, price and account checks all happen before the
/// ledger is touched; a failed check leaves no row behind.
pub async fn verify_and_enroll(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<VerifyPaymentResponse>> {
    let student_id = user.student_id()?;
    let payment_id = require(&payload.payment_id, "payment_id")?;
    let order_id = require(&payload.order_id, "order_id")?;
    // Checked verbatim: the verifier only accepts the canonical spelling.
    if payload.signature.is_empty() {
        return Err(AppError::Validation("signature is required".into()));
    }
    let signature = payload.signature;
    if payload.amount_paid <= rust_decimal::Decimal::ZERO {
        return Err(AppError::Validation("amount_paid must be positive".into()));
    }
    let amount_paid_minor = to_minor_units(payload.amount_paid)?;

    if let Err(err) = state.verifier.verify(&order_id, &payment_id, &signature) {
        tracing::warn!(
            reason = %err,
            order_id = %order_id,
            payment_id = %payment_id,
            student_id = %student_id,
            "payment signature rejected"
        );
        return Err(AppError::InvalidSignature);
    }

    let course = find_course(&state.orm, payload.course_id).await?;
    if amount_paid_minor < course.price_minor {
        return Err(AppError::Validation(format!(
            "amount paid is less than course price ({})",
            from_minor_units(course.price_minor)
        )));
    }

    // The token can outlive the account it was issued for.
    let student = find_student(&state.orm, student_id).await?;

    let (outcome, enrollment) = enrollment_service::insert_paid(
        &state.orm,
        PaidEnrollment {
            student_id,
            course_id: course.id,
            amount_paid_minor,
            payment_id,
            order_id,
            signature,
        },
    )
    .await?;

    let enrollment = Enrollment::from(enrollment);
    let message = match outcome {
        EnrollmentOutcome::Enrolled => {
            tracing::info!(
                enrollment_id = %enrollment.id,
                course_id = %course.id,
                student_id = %student_id,
                "enrollment recorded"
            );
            audit::record(
                &state.orm,
                &user.subject,
                "enrollment_paid",
                "enrollments",
                serde_json::json!({ "enrollment_id": enrollment.id, "course_id": course.id }),
            )
            .await;
            send_confirmation(state, student, &course.title, &enrollment);
            "Enrolled successfully"
        }
        EnrollmentOutcome::AlreadyEnrolled => {
            tracing::info!(
                enrollment_id = %enrollment.id,
                student_id = %student_id,
                "already enrolled, verification is a no-op"
            );
            "Already enrolled"
        }
    };

    Ok(ApiResponse::success(
        message,
        VerifyPaymentResponse {
            outcome,
            enrollment,
        },
        Some(Meta::empty()),
    ))
}

fn send_confirmation(
    state: &AppState,
    student: StudentModel,
    course_title: &str,
    enrollment: &Enrollment,
) {
    let subject = format!("Enrollment confirmed: {course_title}");
    let body = format!(
        "Hello {},\n\nYour payment of {} {:.2} for \"{}\" was received.\nPayment ID: {}\n\n{}",
        student.name,
        state.config.payment.currency,
        enrollment.amount_paid,
        course_title,
        enrollment.payment_id.as_deref().unwrap_or("-"),
        state.config.institute_name,
    );
    notify_in_background(state.notifier.clone(), student.email, subject, body);
}
