mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use coaching_api::{
    dto::auth::{
        AdminLoginRequest, Claims, ForgotPasswordRequest, RegisterResponse, ResetPasswordRequest,
        SendOtpRequest, StudentLoginRequest, StudentRegisterRequest,
    },
    dto::payments::VerifyPaymentRequest,
    entity::{
        otp_verifications::{ActiveModel as OtpActive, Entity as OtpVerifications},
        reset_tokens::{ActiveModel as ResetActive, Entity as ResetTokens},
    },
    error::AppError,
    middleware::auth::{Role, verify_token},
    routes::create_api_router,
    services::{auth_service, payment_service},
    state::AppState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tower::ServiceExt;

use common::{
    ADMIN_PASSWORD, ADMIN_USERNAME, FailingNotifier, TestApp, latest_otp, latest_reset_token,
    seed_course, setup, sign,
};

fn register_request(email: &str) -> StudentRegisterRequest {
    StudentRegisterRequest {
        name: "Asha Verma".into(),
        email: email.into(),
        phone: "+91 98765 43210".into(),
        password: "correct horse".into(),
        otp: "000000".into(),
    }
}

/// Both registration steps, reading the code back out of the sent mail.
async fn register(app: &TestApp, email: &str) -> anyhow::Result<RegisterResponse> {
    auth_service::send_registration_otp(
        &app.state,
        SendOtpRequest {
            email: email.into(),
        },
    )
    .await?;
    let mut req = register_request(email);
    req.otp = latest_otp(&app.notifier);
    Ok(auth_service::register_student(&app.state, req)
        .await?
        .data
        .unwrap())
}

async fn login(app: &TestApp, email: &str, password: &str) -> Result<(), AppError> {
    auth_service::login_student(
        &app.state,
        StudentLoginRequest {
            email: email.into(),
            password: password.into(),
        },
    )
    .await
    .map(|_| ())
}

fn api(state: &AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .with_state(state.clone())
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn register_then_login_issues_student_tokens() -> anyhow::Result<()> {
    let app = setup().await;

    let registered = register(&app, "Asha@Example.com").await?;
    assert_eq!(registered.student.email, "asha@example.com");
    let claims = verify_token(&app.state.config.jwt_secret, &registered.token)?;
    assert_eq!(claims.role, Role::Student);
    assert_eq!(claims.subject, registered.student.id.to_string());

    let err = auth_service::register_student(&app.state, register_request("ASHA@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = auth_service::send_registration_otp(
        &app.state,
        SendOtpRequest {
            email: "asha@example.com".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let logged_in = auth_service::login_student(
        &app.state,
        StudentLoginRequest {
            email: "asha@example.com".into(),
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(logged_in.user.student_id()?, registered.student.id);

    let err = auth_service::login_student(
        &app.state,
        StudentLoginRequest {
            email: "asha@example.com".into(),
            password: "wrong password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn registration_rejects_bad_input() {
    let app = setup().await;

    let mut req = register_request("not-an-email");
    let err = auth_service::register_student(&app.state, req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    req = register_request("short@example.com");
    req.password = "short".into();
    let err = auth_service::register_student(&app.state, req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    req = register_request("phone@example.com");
    req.phone = "12345abc".into();
    let err = auth_service::register_student(&app.state, req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn admin_login_checks_configured_credentials() -> anyhow::Result<()> {
    let app = setup().await;

    let ok = auth_service::login_admin(
        &app.state,
        AdminLoginRequest {
            username: ADMIN_USERNAME.into(),
            password: ADMIN_PASSWORD.into(),
        },
    )
    .await?
    .data
    .unwrap();
    let claims = verify_token(&app.state.config.jwt_secret, &ok.token)?;
    assert_eq!(claims.role, Role::Admin);

    let err = auth_service::login_admin(
        &app.state,
        AdminLoginRequest {
            username: ADMIN_USERNAME.into(),
            password: "guess".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[test]
fn tokens_signed_with_another_secret_are_rejected() {
    let config = common::test_config();
    let token = auth_service::issue_token(&config, "someone", Role::Admin, None).unwrap();
    let err = verify_token("a-different-secret", &token).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn routes_enforce_authentication_and_roles() -> anyhow::Result<()> {
    let app = setup().await;
    let student = register(&app, "kabir@example.com").await?;
    let admin_token =
        auth_service::issue_token(&app.state.config, ADMIN_USERNAME, Role::Admin, None)?;

    let resp = send(api(&app.state), "GET", "/api/courses", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(api(&app.state), "GET", "/api/student/profile", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(api(&app.state), "GET", "/api/student/profile", Some("garbage")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
        api(&app.state),
        "GET",
        "/api/student/profile",
        Some(&student.token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(api(&app.state), "GET", "/api/student/profile", Some(&admin_token)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
        api(&app.state),
        "GET",
        "/api/admin/enrollments",
        Some(&student.token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(api(&app.state), "GET", "/api/admin/enrollments", Some(&admin_token)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(api(&app.state), "GET", "/api/auth/me", Some(&admin_token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn invoice_route_serves_text_attachment() -> anyhow::Result<()> {
    let app = setup().await;
    let course_id = seed_course(&app.state, "JEE Main Crash Course", 499_900).await;
    let registered = register(&app, "ira@example.com").await?;
    let user = verify_token(&app.state.config.jwt_secret, &registered.token)?;

    let enrollment = payment_service::verify_and_enroll(
        &app.state,
        &user,
        VerifyPaymentRequest {
            course_id,
            amount_paid: Decimal::new(499_900, 2),
            payment_id: "pay_P1".into(),
            order_id: "order_O1".into(),
            signature: sign("order_O1", "pay_P1"),
        },
    )
    .await?
    .data
    .unwrap()
    .enrollment;

    let uri = format!("/api/payments/invoice/{}", enrollment.id);
    let resp = send(api(&app.state), "GET", &uri, Some(&registered.token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str()?;
    assert!(content_type.starts_with("text/plain"));
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str()?.to_string();
    assert!(disposition.starts_with("attachment; filename=\"INV-"));

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let text = String::from_utf8(body.to_vec())?;
    assert!(text.contains("INR 4999.00"));

    let resp = send(api(&app.state), "GET", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn registration_requires_a_matching_live_code() -> anyhow::Result<()> {
    let app = setup().await;
    let email = "meera@example.com";

    // No code was ever sent.
    let err = auth_service::register_student(&app.state, register_request(email))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    auth_service::send_registration_otp(
        &app.state,
        SendOtpRequest {
            email: email.into(),
        },
    )
    .await?;
    let code = latest_otp(&app.notifier);
    assert_eq!(app.notifier.sent()[0].0, email);

    let mut wrong = register_request(email);
    wrong.otp = if code == "999999" { "999998" } else { "999999" }.into();
    let err = auth_service::register_student(&app.state, wrong)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut pending: OtpActive = OtpVerifications::find_by_id(email.to_string())
        .one(&app.state.orm)
        .await?
        .unwrap()
        .into();
    pending.expires_at = Set((Utc::now() - Duration::minutes(1)).into());
    pending.update(&app.state.orm).await?;

    let mut expired = register_request(email);
    expired.otp = code;
    let err = auth_service::register_student(&app.state, expired)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A fresh code replaces the expired one and is consumed on success.
    let registered = register(&app, email).await?;
    assert_eq!(registered.student.email, email);
    let used = latest_otp(&app.notifier);
    assert!(
        OtpVerifications::find_by_id(email.to_string())
            .one(&app.state.orm)
            .await?
            .is_none()
    );
    let mut replay = register_request(email);
    replay.otp = used;
    let err = auth_service::register_student(&app.state, replay)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn undelivered_code_is_reported() {
    let mut app = setup().await;
    app.state.notifier = Arc::new(FailingNotifier);
    let err = auth_service::send_registration_otp(
        &app.state,
        SendOtpRequest {
            email: "nobody@example.com".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn password_reset_tokens_are_single_use_and_expire() -> anyhow::Result<()> {
    let app = setup().await;
    let email = "ravi@example.com";
    register(&app, email).await?;

    let err = auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "stranger@example.com".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "Ravi@Example.com".into(),
        },
    )
    .await?;
    let token = latest_reset_token(&app.notifier);
    assert!(app.notifier.sent().last().unwrap().2.contains("/reset-password?token="));

    let err = auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token: token.clone(),
            new_password: "short".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token: token.clone(),
            new_password: "battery staple".into(),
        },
    )
    .await?;
    login(&app, email, "battery staple").await?;
    assert!(matches!(
        login(&app, email, "correct horse").await,
        Err(AppError::Unauthorized(_))
    ));

    // Second use of the same link.
    let err = auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token,
            new_password: "another password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: email.into(),
        },
    )
    .await?;
    let stale = latest_reset_token(&app.notifier);
    let mut row: ResetActive = ResetTokens::find_by_id(email.to_string())
        .one(&app.state.orm)
        .await?
        .unwrap()
        .into();
    row.expires_at = Set((Utc::now() - Duration::seconds(1)).into());
    row.update(&app.state.orm).await?;

    let err = auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token: stale,
            new_password: "another password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    login(&app, email, "battery staple").await?;
    Ok(())
}

#[tokio::test]
async fn expired_and_malformed_tokens_are_unauthorized() -> anyhow::Result<()> {
    let app = setup().await;
    let secret = app.state.config.jwt_secret.clone();

    let expired = encode(
        &Header::default(),
        &Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            role: "student".into(),
            name: None,
            exp: (Utc::now() - Duration::hours(1)).timestamp() as usize,
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    assert!(matches!(
        verify_token(&secret, &expired),
        Err(AppError::Unauthorized(_))
    ));
    for garbage in ["garbage", "a.b.c", ""] {
        assert!(matches!(
            verify_token(&secret, garbage),
            Err(AppError::Unauthorized(_))
        ));
    }

    for token in [expired.as_str(), "a.b.c"] {
        let resp = send(api(&app.state), "GET", "/api/auth/me", Some(token)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["data"]["code"], "unauthorized");
    }
    Ok(())
}

#[tokio::test]
async fn error_bodies_carry_a_stable_code() -> anyhow::Result<()> {
    let app = setup().await;
    let course_id = seed_course(&app.state, "Spoken English", 99_900).await;
    let registered = register(&app, "tara@example.com").await?;

    let payload = serde_json::json!({
        "course_id": course_id,
        "amount_paid": "999.00",
        "payment_id": "pay_P1",
        "order_id": "order_O1",
        "signature": sign("order_O1", "pay_OTHER"),
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/payments/verify")
        .header(header::AUTHORIZATION, format!("Bearer {}", registered.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))?;
    let resp = api(&app.state).oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["data"]["code"], "invalid_signature");

    assert_eq!(AppError::Validation("x".into()).code(), "validation_error");
    assert_eq!(AppError::NotFound("x").code(), "not_found");
    assert_eq!(AppError::Conflict("x".into()).code(), "conflict");
    assert_eq!(AppError::Forbidden.code(), "forbidden");
    assert_eq!(AppError::OrderCreation("x".into()).code(), "order_creation_failed");
    assert_eq!(
        AppError::Internal(anyhow::anyhow!("boom")).code(),
        "internal_error"
    );
    Ok(())
}
