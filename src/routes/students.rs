use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::{enrollments::EnrolledCourseList, students::UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Student,
    response::ApiResponse,
    services::{enrollment_service, student_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/enrollments", get(my_enrollments))
}

#[utoipa::path(
    get,
    path = "/api/student/profile",
    responses(
        (status = 200, description = "Current student profile", body = ApiResponse<Student>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Student"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/student/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Update profile", body = ApiResponse<Student>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Student"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/student/enrollments",
    responses(
        (status = 200, description = "Courses the student is enrolled in", body = ApiResponse<EnrolledCourseList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Student"
)]
pub async fn my_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EnrolledCourseList>>> {
    let resp = enrollment_service::list_my_enrollments(&state, &user).await?;
    Ok(Json(resp))
}
