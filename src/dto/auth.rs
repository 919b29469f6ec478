use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{middleware::auth::AuthUser, models::Student};

#[derive(Deserialize, Debug, ToSchema)]
pub struct StudentRegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Code mailed by `/api/auth/student/send-otp`.
    pub otp: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpSent {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetLinkSent {
    pub email: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PasswordReset {
    pub email: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct StudentLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub token: String,
    pub student: Student,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
}
