use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::contacts::{ContactList, CreateContactRequest},
    entity::contacts::{ActiveModel as ContactActive, Column as ContactCol, Entity as Contacts},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Contact,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{is_valid_email, is_valid_phone, require},
};

/// Stores a contact-form message. Open to anonymous visitors.
pub async fn create_contact(
    state: &AppState,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let name = require(&payload.name, "name")?;
    let email = require(&payload.email, "email")?.to_lowercase();
    let phone = require(&payload.phone, "phone")?;
    let message = require(&payload.message, "message")?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    if !is_valid_phone(&phone) {
        return Err(AppError::Validation("Invalid phone number format".into()));
    }

    let contact = ContactActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(phone),
        message: Set(message),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(contact_id = %contact.id, "contact message received");

    Ok(ApiResponse::success(
        "Message received",
        Contact::from(contact),
        Some(Meta::empty()),
    ))
}

pub async fn list_contacts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ContactList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Contacts::find().order_by_desc(ContactCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Contact::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Contacts", ContactList { items }, Some(meta)))
}

pub async fn delete_contact(
    state: &AppState,
    user: &AuthUser,
    contact_id: Uuid,
) -> AppResult<ApiResponse<Contact>> {
    ensure_admin(user)?;

    let contact = Contacts::find_by_id(contact_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Contact not found"))?;
    let deleted = Contact::from(contact.clone());
    contact.delete(&state.orm).await?;

    audit::record(
        &state.orm,
        &user.subject,
        "contact_deleted",
        "contacts",
        serde_json::json!({ "contact_id": contact_id }),
    )
    .await;

    Ok(ApiResponse::success("Contact deleted", deleted, Some(Meta::empty())))
}
