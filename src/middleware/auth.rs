use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Verified caller identity, rebuilt from the bearer token on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthUser {
    pub subject: String,
    pub role: Role,
    pub name: Option<String>,
}

impl AuthUser {
    pub fn student(id: Uuid) -> Self {
        Self {
            subject: id.to_string(),
            role: Role::Student,
            name: None,
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            subject: username.into(),
            role: Role::Admin,
            name: None,
        }
    }

    /// Student id of the caller, or `Forbidden` for any other role.
    pub fn student_id(&self) -> Result<Uuid, AppError> {
        if self.role != Role::Student {
            return Err(AppError::Forbidden);
        }
        Uuid::parse_str(&self.subject)
            .map_err(|_| AppError::Unauthorized("Invalid student id in token".into()))
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Checks signature and expiry of a bearer token and maps its claims to an identity.
pub fn verify_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let role = Role::parse(&decoded.claims.role)
        .ok_or_else(|| AppError::Unauthorized("Unknown role in token".into()))?;

    Ok(AuthUser {
        subject: decoded.claims.sub,
        role,
        name: decoded.claims.name,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        verify_token(&state.config.jwt_secret, token)
    }
}
