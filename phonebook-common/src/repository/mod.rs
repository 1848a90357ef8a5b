//! Contact repository
//!
//! One async interface, two storage backends. The rules that decide what a
//! mutation does (validation, uniqueness, bulk filtering, search) live here
//! so both backends behave identically; backends only store and retrieve.
//!
//! Single `create` is strict: any uniqueness violation fails the request.
//! Bulk operations are best-effort: offending rows are skipped and the rest
//! of the batch goes through.

mod memory;
#[cfg(feature = "sqlx")]
mod sqlite;

pub use memory::MemoryRepository;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteRepository;

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contact::is_blank;
use crate::{Contact, ContactPatch, ContactRow, Error, Result};

/// Authoritative collection of contacts
///
/// Mutations are serialized against each other; reads observe a consistent
/// snapshot and never a partially applied bulk operation.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// All contacts, in no particular order
    async fn list(&self) -> Result<Vec<Contact>>;

    /// Contacts whose name contains `term` at a word boundary, ignoring case
    ///
    /// An absent or empty term returns everything.
    async fn search(&self, term: Option<&str>) -> Result<Vec<Contact>>;

    async fn get(&self, id: Uuid) -> Result<Contact>;

    /// Create one contact
    ///
    /// Fails with `Conflict` when the name (ignoring case) or the phone is
    /// already taken, and with `BadInput` when a field is blank.
    async fn create(&self, name: &str, phone: &str) -> Result<Contact>;

    /// Update the supplied fields of one contact
    async fn patch(&self, id: Uuid, patch: &ContactPatch) -> Result<Contact>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Create every usable row, returning the contacts actually created
    ///
    /// Rows with a blank field or a phone already present (including one
    /// added earlier in the same batch) are skipped.
    async fn bulk_create(&self, rows: Vec<ContactRow>) -> Result<Vec<Contact>>;

    /// Rename the contact holding each row's phone, returning how many changed
    async fn bulk_update(&self, rows: Vec<ContactRow>) -> Result<usize>;

    /// Remove every contact whose phone appears in `rows`, returning the count
    async fn bulk_delete_by_phone(&self, rows: Vec<ContactRow>) -> Result<usize>;

    /// Remove the listed ids, ignoring unknown ones, returning the count
    async fn bulk_delete_by_ids(&self, ids: Vec<Uuid>) -> Result<usize>;
}

/// Check a single create against the existing collection
pub(crate) fn check_create<'a, I>(existing: I, name: &str, phone: &str) -> Result<Contact>
where
    I: IntoIterator<Item = &'a Contact> + Clone,
{
    let contact = Contact::new(name, phone)?;

    ensure_name_free(existing.clone().into_iter().map(|other| other.name.as_str()), name)?;
    if existing.into_iter().any(|other| other.phone == phone) {
        return Err(phone_taken());
    }

    Ok(contact)
}

/// Fail when `name` matches any of `names`, ignoring case
pub(crate) fn ensure_name_free<'a>(
    names: impl IntoIterator<Item = &'a str>,
    name: &str,
) -> Result<()> {
    let wanted = name.to_lowercase();

    if names.into_iter().any(|other| other.to_lowercase() == wanted) {
        return Err(Error::Conflict("Name must be unique".to_string()));
    }

    Ok(())
}

pub(crate) fn phone_taken() -> Error {
    Error::Conflict("Phone must be unique".to_string())
}

/// Check that a patch does not move `id` onto another contact's phone
pub(crate) fn check_patch<'a>(
    existing: impl IntoIterator<Item = &'a Contact>,
    id: Uuid,
    patch: &ContactPatch,
) -> Result<()> {
    if let Some(phone) = patch.phone() {
        if existing
            .into_iter()
            .any(|other| other.id != id && other.phone == phone)
        {
            return Err(phone_taken());
        }
    }

    Ok(())
}

/// Decide which rows of a bulk create become contacts
///
/// `phones` holds the phones already in use and is extended with each
/// accepted row.
pub(crate) fn plan_bulk_create(
    phones: &mut HashSet<String>,
    rows: impl IntoIterator<Item = ContactRow>,
) -> Vec<Contact> {
    rows.into_iter()
        .filter(ContactRow::is_complete)
        .filter(|row| phones.insert(row.phone.clone()))
        .filter_map(|row| Contact::new(row.name, row.phone).ok())
        .collect()
}

/// Renames requested by a bulk update, keyed by phone
///
/// Rows with a blank name or phone are ignored. A later row for the same
/// phone wins.
pub(crate) fn plan_bulk_update(rows: impl IntoIterator<Item = ContactRow>) -> Vec<ContactRow> {
    let rows: Vec<ContactRow> = rows.into_iter().filter(ContactRow::is_complete).collect();

    let mut seen = HashSet::new();
    let mut planned: Vec<ContactRow> = rows
        .into_iter()
        .rev()
        .filter(|row| seen.insert(row.phone.clone()))
        .collect();

    planned.reverse();
    planned
}

/// Phones named by a bulk delete, ignoring blanks
pub(crate) fn phones_to_delete(rows: impl IntoIterator<Item = ContactRow>) -> HashSet<String> {
    rows.into_iter()
        .map(|row| row.phone)
        .filter(|phone| !is_blank(phone))
        .collect()
}
