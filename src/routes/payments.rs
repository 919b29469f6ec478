use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{CreateOrderRequest, OrderHandle, VerifyPaymentRequest, VerifyPaymentResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{invoice_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/invoice/{enrollment_id}", get(download_invoice))
}

#[utoipa::path(
    post,
    path = "/api/payments/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Processor order opened", body = ApiResponse<OrderHandle>),
        (status = 400, description = "Amount below course price"),
        (status = 404, description = "Course not found"),
        (status = 502, description = "Failed to create payment order")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderHandle>>> {
    let resp = payment_service::create_payment_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Enrolled, or already enrolled", body = ApiResponse<VerifyPaymentResponse>),
        (status = 400, description = "Invalid input or payment signature"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<VerifyPaymentResponse>>> {
    let resp = payment_service::verify_and_enroll(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/invoice/{enrollment_id}",
    params(
        ("enrollment_id" = Uuid, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Invoice document", content_type = "text/plain", body = String),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn download_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(enrollment_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let invoice = invoice_service::get_invoice(&state, &user, enrollment_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", invoice.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        invoice.render(),
    ))
}
