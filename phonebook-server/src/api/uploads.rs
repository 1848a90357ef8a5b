//! File-driven bulk endpoints
//!
//! Each endpoint takes a multipart form with a `file` field, stores the file
//! verbatim in the files directory (served at `/files`), parses it into
//! candidate rows and hands them to the repository. Row problems never fail
//! the request; only a missing file or an unreadable upload does.

use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use phonebook_common::import::{parse_rows, ImportFormat};
use phonebook_common::{Contact, ContactRow, Error};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ApiError, MessageResponse};
use crate::AppState;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub message: String,
    pub data: Vec<Contact>,
}

/// A file received from a multipart form
#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Pull the `file` field out of the form
    pub async fn from_multipart(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, ApiError> {
        let mut multipart =
            multipart.map_err(|_| ApiError::bad_input("No file provided"))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_input(e.body_text()))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_input(e.body_text()))?;

            return Ok(Self {
                file_name,
                content_type,
                bytes,
            });
        }

        Err(ApiError::bad_input("file field missing"))
    }

    /// Store the file under `dir`, returning where it went
    ///
    /// Only the last component of the client's file name is used.
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf, Error> {
        let name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("upload-{}", Uuid::new_v4())));

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, &self.bytes).await?;

        debug!("Stored upload at {}", path.display());
        Ok(path)
    }

    /// Candidate rows, parsed according to the detected format
    pub fn rows(&self) -> Result<Vec<ContactRow>, Error> {
        let format = ImportFormat::detect(self.file_name.as_deref(), self.content_type.as_deref());

        Ok(parse_rows(&self.bytes, format)?.collect())
    }
}

/// Receive, store and parse an upload
async fn receive(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<ContactRow>, ApiError> {
    let upload = Upload::from_multipart(multipart).await?;
    upload.persist(&state.files_dir).await?;

    let rows = upload.rows()?;
    info!(
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        rows = rows.len(),
        "Parsed upload"
    );

    Ok(rows)
}

/// POST /api/uploadBulkContacts
///
/// 201 with the contacts actually created.
pub async fn upload_bulk_contacts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<BulkCreateResponse>), ApiError> {
    let rows = receive(&state, multipart).await?;
    let created = state.contacts.bulk_create(rows).await?;

    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            message: "Contacts created".to_string(),
            data: created,
        }),
    ))
}

/// POST /api/updateBulkContacts
///
/// Renames the contact holding each row's phone.
pub async fn update_bulk_contacts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let rows = receive(&state, multipart).await?;
    state.contacts.bulk_update(rows).await?;

    Ok(Json(MessageResponse::new("Contacts updated")))
}

/// POST /api/deleteBulkContacts
///
/// Removes every contact whose phone is listed in the file.
pub async fn delete_bulk_contacts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let rows = receive(&state, multipart).await?;
    state.contacts.bulk_delete_by_phone(rows).await?;

    Ok(Json(MessageResponse::new("Contacts deleted")))
}
