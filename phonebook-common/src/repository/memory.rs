//! In-memory backend

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    check_create, check_patch, phones_to_delete, plan_bulk_create, plan_bulk_update,
    ContactRepository,
};
use crate::search::NameMatcher;
use crate::{Contact, ContactPatch, ContactRow, Error, Result};

/// Contacts held in a map behind one lock
///
/// Every mutation holds the write lock for its whole duration, so uniqueness
/// checks and the writes they guard are atomic.
#[derive(Default)]
pub struct MemoryRepository {
    contacts: RwLock<HashMap<Uuid, Contact>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.read().await.values().cloned().collect())
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<Contact>> {
        let matcher = NameMatcher::new(term)?;
        let contacts = self.contacts.read().await;

        Ok(matcher.filter(contacts.values().cloned()))
    }

    async fn get(&self, id: Uuid) -> Result<Contact> {
        self.contacts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(Error::contact_not_found)
    }

    async fn create(&self, name: &str, phone: &str) -> Result<Contact> {
        let mut contacts = self.contacts.write().await;

        let contact = check_create(contacts.values(), name, phone)?;
        contacts.insert(contact.id, contact.clone());

        debug!(id = %contact.id, "Created contact");
        Ok(contact)
    }

    async fn patch(&self, id: Uuid, patch: &ContactPatch) -> Result<Contact> {
        let mut contacts = self.contacts.write().await;

        if !contacts.contains_key(&id) {
            return Err(Error::contact_not_found());
        }
        check_patch(contacts.values(), id, patch)?;

        let contact = contacts.get_mut(&id).ok_or_else(Error::contact_not_found)?;
        patch.apply_to(contact);

        debug!(%id, "Patched contact");
        Ok(contact.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.contacts
            .write()
            .await
            .remove(&id)
            .ok_or_else(Error::contact_not_found)?;

        debug!(%id, "Deleted contact");
        Ok(())
    }

    async fn bulk_create(&self, rows: Vec<ContactRow>) -> Result<Vec<Contact>> {
        let mut contacts = self.contacts.write().await;

        let mut phones: HashSet<String> = contacts.values().map(|c| c.phone.clone()).collect();
        let created = plan_bulk_create(&mut phones, rows);

        for contact in &created {
            contacts.insert(contact.id, contact.clone());
        }

        info!(created = created.len(), "Bulk created contacts");
        Ok(created)
    }

    async fn bulk_update(&self, rows: Vec<ContactRow>) -> Result<usize> {
        let mut contacts = self.contacts.write().await;

        let by_phone: HashMap<String, Uuid> = contacts
            .values()
            .map(|c| (c.phone.clone(), c.id))
            .collect();

        let mut updated = 0;
        for row in plan_bulk_update(rows) {
            let Some(id) = by_phone.get(&row.phone) else {
                continue;
            };
            if let Some(contact) = contacts.get_mut(id) {
                contact.name = row.name;
                updated += 1;
            }
        }

        info!(updated, "Bulk updated contacts");
        Ok(updated)
    }

    async fn bulk_delete_by_phone(&self, rows: Vec<ContactRow>) -> Result<usize> {
        let phones = phones_to_delete(rows);
        let mut contacts = self.contacts.write().await;

        let before = contacts.len();
        contacts.retain(|_, contact| !phones.contains(&contact.phone));
        let deleted = before - contacts.len();

        info!(deleted, "Bulk deleted contacts by phone");
        Ok(deleted)
    }

    async fn bulk_delete_by_ids(&self, ids: Vec<Uuid>) -> Result<usize> {
        let mut contacts = self.contacts.write().await;

        let deleted = ids
            .iter()
            .filter(|id| contacts.remove(*id).is_some())
            .count();

        info!(deleted, "Bulk deleted contacts by id");
        Ok(deleted)
    }
}
