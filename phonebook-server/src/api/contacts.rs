//! JSON contact endpoints
//!
//! Single-record CRUD, search, id-list bulk delete and delimited export.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use phonebook_common::{export, Contact, ContactPatch, Error};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, MessageResponse};
use crate::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(rename = "selectedIds", alias = "selectedids")]
    pub selected_ids: Vec<String>,
}

/// Ids that are not UUIDs cannot name a stored contact
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError(Error::contact_not_found()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_input(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.contacts.list().await?))
}

/// GET /api/search?search=term
///
/// Word-boundary name search; no term returns every contact.
pub async fn search_contacts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.contacts.search(query.search.as_deref()).await?))
}

/// GET /api/:id
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    let id = parse_id(&id)?;

    Ok(Json(state.contacts.get(id).await?))
}

/// POST /api
///
/// 201 with the new contact, 400 when the name or phone is taken.
pub async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let request = json_body(body)?;

    let contact = state.contacts.create(&request.name, &request.phone).await?;
    info!(id = %contact.id, "Created contact");

    Ok((StatusCode::CREATED, Json(contact)))
}

/// PATCH /api/:id
///
/// A missing contact is reported before the body is looked at.
pub async fn patch_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ContactPatch>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let id = parse_id(&id)?;
    state.contacts.get(id).await?;

    let patch = json_body(body)?;

    Ok(Json(state.contacts.patch(id, &patch).await?))
}

/// DELETE /api/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.contacts.delete(id).await?;

    info!(%id, "Deleted contact");
    Ok(Json(MessageResponse::new("Deleted Contact")))
}

/// POST /api/bulkdelete
///
/// Unknown or malformed ids are skipped.
pub async fn bulk_delete_contacts(
    State(state): State<AppState>,
    body: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = json_body(body)?;

    let ids = request
        .selected_ids
        .iter()
        .filter_map(|id| Uuid::parse_str(id).ok())
        .collect();
    state.contacts.bulk_delete_by_ids(ids).await?;

    Ok(Json(MessageResponse::new("Deleted Contacts")))
}

/// GET /api/export
///
/// One `name,phone` line per contact, accepted back by the bulk upload.
pub async fn export_contacts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let contacts = state.contacts.list().await?;

    Ok((
        [(header::CONTENT_TYPE, export::CONTENT_TYPE)],
        export::to_delimited(&contacts),
    ))
}
