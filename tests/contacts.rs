mod common;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use coaching_api::{
    dto::contacts::CreateContactRequest,
    error::AppError,
    middleware::auth::AuthUser,
    routes::{create_api_router, params::Pagination},
    services::contact_service,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

use common::{admin, setup};

fn contact(name: &str, email: &str) -> CreateContactRequest {
    CreateContactRequest {
        name: name.into(),
        email: email.into(),
        phone: "+91 91234 56789".into(),
        message: "Is there a weekend batch?".into(),
    }
}

fn api(state: &AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .with_state(state.clone())
}

#[tokio::test]
async fn contact_form_validates_and_normalises() -> anyhow::Result<()> {
    let app = setup().await;

    let saved = contact_service::create_contact(&app.state, contact(" Asha ", "Asha@Example.com"))
        .await?
        .data
        .unwrap();
    assert_eq!(saved.name, "Asha");
    assert_eq!(saved.email, "asha@example.com");

    let err = contact_service::create_contact(&app.state, contact("Asha", "asha.example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut bad_phone = contact("Asha", "asha@example.com");
    bad_phone.phone = "phone".into();
    let err = contact_service::create_contact(&app.state, bad_phone)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut empty = contact("Asha", "asha@example.com");
    empty.message = "  ".into();
    let err = contact_service::create_contact(&app.state, empty)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn admin_pages_and_deletes_contacts() -> anyhow::Result<()> {
    let app = setup().await;
    let mut ids = Vec::new();
    for (name, email) in [
        ("Asha", "asha@example.com"),
        ("Ravi", "ravi@example.com"),
        ("Meera", "meera@example.com"),
    ] {
        let saved = contact_service::create_contact(&app.state, contact(name, email))
            .await?
            .data
            .unwrap();
        ids.push(saved.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let page = Pagination {
        page: Some(1),
        per_page: Some(2),
    };
    let first = contact_service::list_contacts(&app.state, &admin(), page).await?;
    let meta = first.meta.unwrap();
    assert_eq!(meta.total, Some(3));
    assert_eq!(meta.total_pages, Some(2));
    let items = first.data.unwrap().items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Meera");

    let err = contact_service::list_contacts(
        &app.state,
        &AuthUser::student(Uuid::new_v4()),
        Pagination::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let deleted = contact_service::delete_contact(&app.state, &admin(), ids[0])
        .await?
        .data
        .unwrap();
    assert_eq!(deleted.email, "asha@example.com");
    let err = contact_service::delete_contact(&app.state, &admin(), ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let rest = contact_service::list_contacts(&app.state, &admin(), Pagination::default())
        .await?;
    assert_eq!(rest.meta.unwrap().total, Some(2));
    Ok(())
}

#[tokio::test]
async fn contact_routes_are_public_to_post_and_admin_to_read() -> anyhow::Result<()> {
    let app = setup().await;

    let payload = serde_json::json!({
        "name": "Kabir",
        "email": "kabir@example.com",
        "phone": "9876543210",
        "message": "Please call me back",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/contacts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))?;
    let resp = api(&app.state).oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
        .uri("/api/admin/contacts")
        .body(Body::empty())?;
    let resp = api(&app.state).oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
