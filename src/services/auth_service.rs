use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{
        AdminLoginRequest, Claims, ForgotPasswordRequest, LoginResponse, OtpSent, PasswordReset,
        RegisterResponse, ResetLinkSent, ResetPasswordRequest, SendOtpRequest,
        StudentLoginRequest, StudentRegisterRequest,
    },
    entity::{
        otp_verifications::{
            ActiveModel as OtpActive, Column as OtpCol, Entity as OtpVerifications,
        },
        reset_tokens::{ActiveModel as ResetActive, Column as ResetCol, Entity as ResetTokens},
        students::{ActiveModel as StudentActive, Column as StudentCol, Entity as Students},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role},
    models::Student,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{is_valid_email, is_valid_phone, require},
};

const OTP_TTL_MINUTES: i64 = 10;
const RESET_TTL_MINUTES: i64 = 10;
const MIN_PASSWORD_LEN: usize = 8;

/// First registration step: mails a six digit code to an unregistered email.
/// Asking again replaces the previous code.
pub async fn send_registration_otp(
    state: &AppState,
    payload: SendOtpRequest,
) -> AppResult<ApiResponse<OtpSent>> {
    let email = require(&payload.email, "email")?.to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    ensure_email_free(state, &email).await?;

    let otp = generate_otp();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    OtpVerifications::insert(OtpActive {
        email: Set(email.clone()),
        otp: Set(otp.clone()),
        expires_at: Set(expires_at.into()),
    })
    .on_conflict(
        OnConflict::column(OtpCol::Email)
            .update_columns([OtpCol::Otp, OtpCol::ExpiresAt])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let body = format!(
        "Your verification code is {otp}. It is valid for {OTP_TTL_MINUTES} minutes.\n\n{}",
        state.config.institute_name
    );
    state
        .notifier
        .send(&email, "Verify your email", &body)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, to = %email, "verification code not delivered");
            AppError::Internal(err)
        })?;

    Ok(ApiResponse::success(
        "Verification code sent",
        OtpSent { email, expires_at },
        Some(Meta::empty()),
    ))
}

/// Second registration step. The code is consumed together with the insert.
pub async fn register_student(
    state: &AppState,
    payload: StudentRegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let name = require(&payload.name, "name")?;
    let email = require(&payload.email, "email")?.to_lowercase();
    let phone = require(&payload.phone, "phone")?;
    let otp = require(&payload.otp, "otp")?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    if !is_valid_phone(&phone) {
        return Err(AppError::Validation("Invalid phone number format".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    ensure_email_free(state, &email).await?;

    let pending = OtpVerifications::find_by_id(email.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Validation("No verification code for this email".into()))?;
    if pending.otp != otp {
        return Err(AppError::Validation("Invalid verification code".into()));
    }
    if pending.expires_at.with_timezone(&Utc) <= Utc::now() {
        return Err(AppError::Validation("Verification code has expired".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let inserted = StudentActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email.clone()),
        phone: Set(Some(phone)),
        password_hash: Set(password_hash),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await;

    // A concurrent registration can still win the unique index on email.
    let student = match inserted {
        Ok(model) => Student::from(model),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            txn.rollback().await?;
            return Err(AppError::Conflict("Email is already registered".into()));
        }
        Err(err) => return Err(err.into()),
    };
    OtpVerifications::delete_by_id(email).exec(&txn).await?;
    txn.commit().await?;

    let token = issue_token(
        &state.config,
        &student.id.to_string(),
        Role::Student,
        Some(student.name.clone()),
    )?;

    audit::record(
        &state.orm,
        &student.id.to_string(),
        "student_register",
        "students",
        serde_json::json!({ "student_id": student.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Registration completed",
        RegisterResponse { token, student },
        Some(Meta::empty()),
    ))
}

async fn ensure_email_free(state: &AppState, email: &str) -> AppResult<()> {
    let exist = Students::find()
        .filter(StudentCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }
    Ok(())
}

/// Mails a single-use reset link to a registered student.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<ResetLinkSent>> {
    let email = require(&payload.email, "email")?.to_lowercase();
    let student = Students::find()
        .filter(StudentCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("No account found for this email"))?;

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TTL_MINUTES);

    ResetTokens::insert(ResetActive {
        email: Set(email.clone()),
        token: Set(token.clone()),
        expires_at: Set(expires_at.into()),
    })
    .on_conflict(
        OnConflict::column(ResetCol::Email)
            .update_columns([ResetCol::Token, ResetCol::ExpiresAt])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let base = state.config.frontend_url.as_deref().unwrap_or("");
    let body = format!(
        "Hello {},\n\nReset your password here: {}/reset-password?token={}\nThe link is valid for {} minutes.\n\n{}",
        student.name,
        base.trim_end_matches('/'),
        token,
        RESET_TTL_MINUTES,
        state.config.institute_name,
    );
    state
        .notifier
        .send(&email, "Password reset", &body)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, to = %email, "reset link not delivered");
            AppError::Internal(err)
        })?;

    audit::record(
        &state.orm,
        &student.id.to_string(),
        "password_reset_requested",
        "students",
        serde_json::json!({ "student_id": student.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password reset link sent",
        ResetLinkSent { email },
        Some(Meta::empty()),
    ))
}

/// Sets a new password from a live reset token and burns the token.
pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<PasswordReset>> {
    let token = require(&payload.token, "token")?;
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let invalid = || AppError::Validation("Invalid or expired token".into());
    let reset = ResetTokens::find()
        .filter(ResetCol::Token.eq(token.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;
    if reset.expires_at.with_timezone(&Utc) <= Utc::now() {
        return Err(invalid());
    }

    let password_hash = hash_password(&payload.new_password)?;

    let txn = state.orm.begin().await?;
    // Burning the token first makes a concurrent second use find nothing.
    let burned = ResetTokens::delete_many()
        .filter(ResetCol::Token.eq(token.as_str()))
        .exec(&txn)
        .await?;
    if burned.rows_affected == 0 {
        txn.rollback().await?;
        return Err(invalid());
    }
    let student = Students::find()
        .filter(StudentCol::Email.eq(reset.email.as_str()))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Student not found"))?;
    let student_id = student.id;
    let mut active: StudentActive = student.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        &student_id.to_string(),
        "password_reset",
        "students",
        serde_json::json!({ "student_id": student_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password has been reset",
        PasswordReset { email: reset.email },
        Some(Meta::empty()),
    ))
}

fn generate_otp() -> String {
    format!("{:06}", 100_000 + OsRng.next_u32() % 900_000)
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn login_student(
    state: &AppState,
    payload: StudentLoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim().to_lowercase();
    let student = Students::find()
        .filter(StudentCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let student = match student {
        Some(s) => s,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !password_matches(&payload.password, &student.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(
        &state.config,
        &student.id.to_string(),
        Role::Student,
        Some(student.name.clone()),
    )?;

    audit::record(
        &state.orm,
        &student.id.to_string(),
        "student_login",
        "students",
        serde_json::json!({ "student_id": student.id }),
    )
    .await;

    let user = AuthUser {
        subject: student.id.to_string(),
        role: Role::Student,
        name: Some(student.name),
    };
    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn login_admin(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let admin = state
        .config
        .admin
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Admin login is not configured".into()))?;

    let username_ok = payload.username == admin.username;
    // Always hash-check, whatever the username.
    let password_ok = password_matches(&payload.password, &admin.password_hash)?;
    if !(username_ok && password_ok) {
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let token = issue_token(&state.config, &admin.username, Role::Admin, None)?;

    audit::record(
        &state.orm,
        &admin.username,
        "admin_login",
        "admin",
        serde_json::json!({ "username": admin.username }),
    )
    .await;

    Ok(ApiResponse::success(
        "Admin login successful",
        LoginResponse {
            token,
            user: AuthUser::admin(admin.username.clone()),
        },
        Some(Meta::empty()),
    ))
}

pub fn issue_token(
    config: &AppConfig,
    subject: &str,
    role: Role,
    name: Option<String>,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.as_str().to_string(),
        name,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn password_matches(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits_without_leading_zero() {
        for _ in 0..200 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(otp.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn reset_tokens_are_64_hex_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
