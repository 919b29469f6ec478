use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    dto::contacts::CreateContactRequest,
    error::AppResult,
    models::Contact,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_contact))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact message stored", body = ApiResponse<Contact>),
        (status = 400, description = "Invalid input")
    ),
    tag = "Contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contact>>)> {
    let resp = contact_service::create_contact(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
