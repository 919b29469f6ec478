use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod contacts;
pub mod courses;
pub mod doc;
pub mod health;
pub mod params;
pub mod payments;
pub mod students;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/courses", courses::router())
        .nest("/student", students::router())
        .nest("/payments", payments::router())
        .nest("/contacts", contacts::router())
        .nest("/admin", admin::router())
}
