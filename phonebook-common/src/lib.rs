//! # Phonebook Common Library
//!
//! Shared code for the phonebook service:
//! - Contact entity and validation
//! - Bulk row parsing (delimited text and spreadsheets) and delimited export
//! - Word-boundary name search
//! - The `ContactRepository` trait with in-memory and SQLite backends
//! - Database initialization

pub mod contact;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod repository;
pub mod search;

pub use contact::{Contact, ContactPatch, ContactRow};
pub use error::{Error, Result};
pub use repository::{ContactRepository, MemoryRepository};

#[cfg(feature = "sqlx")]
pub use repository::SqliteRepository;
