//! Contact entity and its validation rules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A stored contact
///
/// `id` is assigned once at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

impl Contact {
    /// Create a contact with a freshly assigned id
    ///
    /// Both fields must contain something other than whitespace.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let phone = phone.into();

        if is_blank(&name) {
            return Err(Error::BadInput("Name is required".to_string()));
        }
        if is_blank(&phone) {
            return Err(Error::BadInput("Phone is required".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            phone,
        })
    }
}

/// An unvalidated (name, phone) candidate produced by the bulk row parser
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactRow {
    pub name: String,
    pub phone: String,
}

impl ContactRow {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// True when both fields are usable for persistence
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.name) && !is_blank(&self.phone)
    }
}

/// Partial update of a contact
///
/// Absent or blank fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ContactPatch {
    /// New name, if one was supplied
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !is_blank(name))
    }

    /// New phone, if one was supplied
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|phone| !is_blank(phone))
    }

    pub fn apply_to(&self, contact: &mut Contact) {
        if let Some(name) = self.name() {
            contact.name = name.to_string();
        }
        if let Some(phone) = self.phone() {
            contact.phone = phone.to_string();
        }
    }
}

/// Empty or whitespace-only text
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
