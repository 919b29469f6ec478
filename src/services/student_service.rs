use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    dto::students::UpdateProfileRequest,
    entity::students::{ActiveModel as StudentActive, Entity as Students, Model as StudentModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Student,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{is_valid_phone, require},
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Student>> {
    let student_id = user.student_id()?;
    let student = find_student(&state.orm, student_id).await?;
    Ok(ApiResponse::success(
        "Profile",
        Student::from(student),
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Student>> {
    let student_id = user.student_id()?;
    let name = require(&payload.name, "name")?;
    let phone = payload
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
        return Err(AppError::Validation("Invalid phone number format".into()));
    }

    let existing = find_student(&state.orm, student_id).await?;
    let mut active: StudentActive = existing.into();
    active.name = Set(name);
    active.phone = Set(phone);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        Student::from(updated),
        Some(Meta::empty()),
    ))
}

/// Student Directory lookup.
pub async fn find_student<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<StudentModel> {
    Students::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Student not found"))
}
