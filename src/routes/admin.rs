use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        contacts::ContactList,
        enrollments::{AdminEnrollmentList, EnrolledCourseList, UpdateEnrollmentStatusRequest},
        students::{DeletedStudent, StudentList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Contact, Enrollment},
    response::ApiResponse,
    routes::params::{EnrollmentListQuery, Pagination},
    services::{admin_service, contact_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students))
        .route("/students/{id}", delete(delete_student))
        .route("/students/{id}/enrollments", get(student_enrollments))
        .route("/enrollments", get(list_enrollments))
        .route("/enrollments/{id}/status", put(update_enrollment_status))
        .route("/contacts", get(list_contacts))
        .route("/contacts/{id}", delete(delete_contact))
}

#[utoipa::path(
    get,
    path = "/api/admin/students",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Students with their enrollments (admin only)", body = ApiResponse<StudentList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_students(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<StudentList>>> {
    let resp = admin_service::list_students(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student and their enrollments deleted", body = ApiResponse<DeletedStudent>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedStudent>>> {
    let resp = admin_service::delete_student(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/students/{id}/enrollments",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Enrollments of one student", body = ApiResponse<EnrolledCourseList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn student_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EnrolledCourseList>>> {
    let resp = admin_service::student_enrollments(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/enrollments",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("search" = Option<String>, Query, description = "Match student name, email or course title"),
        ("status" = Option<String>, Query, description = "Filter by payment status")
    ),
    responses(
        (status = 200, description = "All enrollments (admin only)", body = ApiResponse<AdminEnrollmentList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EnrollmentListQuery>,
) -> AppResult<Json<ApiResponse<AdminEnrollmentList>>> {
    let resp = admin_service::list_enrollments(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/enrollments/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    request_body = UpdateEnrollmentStatusRequest,
    responses(
        (status = 200, description = "Override payment status", body = ApiResponse<Enrollment>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEnrollmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    let resp = admin_service::set_enrollment_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/contacts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Contact messages, newest first (admin only)", body = ApiResponse<ContactList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/contacts/{id}",
    params(
        ("id" = Uuid, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact message deleted", body = ApiResponse<Contact>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::delete_contact(&state, &user, id).await?;
    Ok(Json(resp))
}
