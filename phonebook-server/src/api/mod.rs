//! HTTP API handlers for phonebook-server

pub mod contacts;
pub mod error;
pub mod health;
pub mod uploads;

pub use contacts::{
    bulk_delete_contacts, create_contact, delete_contact, export_contacts, get_contact,
    list_contacts, patch_contact, search_contacts,
};
pub use error::ApiError;
pub use health::health_routes;
pub use uploads::{delete_bulk_contacts, update_bulk_contacts, upload_bulk_contacts};

use serde::Serialize;

/// Body of responses that only carry a status message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
