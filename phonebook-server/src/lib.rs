//! phonebook-server library
//!
//! REST surface over a `ContactRepository`: JSON CRUD, bulk operations driven
//! by uploaded files, delimited export, and read-only serving of the uploads.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use phonebook_common::ContactRepository;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The contact store, whichever backend was chosen at startup
    pub contacts: Arc<dyn ContactRepository>,
    /// Directory receiving uploaded files, served at `/files`
    pub files_dir: Arc<PathBuf>,
    /// Request body limit for uploads and JSON bodies
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        files_dir: impl Into<PathBuf>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            contacts,
            files_dir: Arc::new(files_dir.into()),
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let contacts = Router::new()
        .route("/api", get(api::list_contacts).post(api::create_contact))
        .route("/api/search", get(api::search_contacts))
        .route("/api/export", get(api::export_contacts))
        .route("/api/bulkdelete", post(api::bulk_delete_contacts))
        .route("/api/uploadBulkContacts", post(api::upload_bulk_contacts))
        .route("/api/updateBulkContacts", post(api::update_bulk_contacts))
        .route("/api/deleteBulkContacts", post(api::delete_bulk_contacts))
        .route(
            "/api/:id",
            get(api::get_contact)
                .patch(api::patch_contact)
                .delete(api::delete_contact),
        );

    let files = ServeDir::new(state.files_dir.as_path());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .merge(contacts)
        .merge(api::health_routes())
        .nest_service("/files", files)
        .layer(body_limit)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
