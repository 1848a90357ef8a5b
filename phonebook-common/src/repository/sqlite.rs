//! SQLite backend
//!
//! Durable storage through `sqlx`. Each mutation runs in one transaction
//! behind a process-wide write gate, so uniqueness checks and the writes they
//! guard cannot interleave and readers see all of a bulk operation or none.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    check_patch, ensure_name_free, phone_taken, phones_to_delete, plan_bulk_create,
    plan_bulk_update, ContactRepository,
};
use crate::search::NameMatcher;
use crate::{Contact, ContactPatch, ContactRow, Error, Result};

type ContactRecord = (String, String, String);

const SELECT_CONTACTS: &str = "SELECT id, name, phone FROM contacts ORDER BY created_at, rowid";
const SELECT_BY_ID: &str = "SELECT id, name, phone FROM contacts WHERE id = ?";
const SELECT_BY_PHONE: &str = "SELECT id, name, phone FROM contacts WHERE phone = ?";

pub struct SqliteRepository {
    pool: SqlitePool,
    write_gate: Mutex<()>,
}

impl SqliteRepository {
    /// Wrap a pool whose schema was prepared by [`crate::db::init_database`]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn into_contact((id, name, phone): ContactRecord) -> Result<Contact> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Stored contact id {} is invalid: {}", id, e)))?;

    Ok(Contact { id, name, phone })
}

fn into_contacts(records: Vec<ContactRecord>) -> Result<Vec<Contact>> {
    records.into_iter().map(into_contact).collect()
}

async fn insert(tx: &mut Transaction<'_, Sqlite>, contact: &Contact) -> Result<()> {
    sqlx::query("INSERT INTO contacts (id, name, phone) VALUES (?, ?, ?)")
        .bind(contact.id.to_string())
        .bind(&contact.name)
        .bind(&contact.phone)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[async_trait]
impl ContactRepository for SqliteRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self) -> Result<Vec<Contact>> {
        let records = sqlx::query_as::<_, ContactRecord>(SELECT_CONTACTS)
            .fetch_all(&self.pool)
            .await?;

        into_contacts(records)
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<Contact>> {
        let matcher = NameMatcher::new(term)?;

        Ok(matcher.filter(self.list().await?))
    }

    async fn get(&self, id: Uuid) -> Result<Contact> {
        let record = sqlx::query_as::<_, ContactRecord>(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(Error::contact_not_found)?;

        into_contact(record)
    }

    async fn create(&self, name: &str, phone: &str) -> Result<Contact> {
        let contact = Contact::new(name, phone)?;

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let names = sqlx::query_scalar::<_, String>("SELECT name FROM contacts")
            .fetch_all(&mut *tx)
            .await?;
        ensure_name_free(names.iter().map(String::as_str), name)?;

        let phone_held = sqlx::query_scalar::<_, i64>("SELECT 1 FROM contacts WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if phone_held {
            return Err(phone_taken());
        }

        insert(&mut tx, &contact).await?;

        tx.commit().await?;

        debug!(id = %contact.id, "Created contact");
        Ok(contact)
    }

    async fn patch(&self, id: Uuid, patch: &ContactPatch) -> Result<Contact> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, ContactRecord>(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(Error::contact_not_found)?;
        let mut contact = into_contact(record)?;

        if let Some(phone) = patch.phone() {
            let holders = sqlx::query_as::<_, ContactRecord>(SELECT_BY_PHONE)
                .bind(phone)
                .fetch_all(&mut *tx)
                .await?;
            check_patch(&into_contacts(holders)?, id, patch)?;
        }

        patch.apply_to(&mut contact);
        sqlx::query("UPDATE contacts SET name = ?, phone = ? WHERE id = ?")
            .bind(&contact.name)
            .bind(&contact.phone)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(%id, "Patched contact");
        Ok(contact)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let _gate = self.write_gate.lock().await;

        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::contact_not_found());
        }

        debug!(%id, "Deleted contact");
        Ok(())
    }

    async fn bulk_create(&self, rows: Vec<ContactRow>) -> Result<Vec<Contact>> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut phones: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT phone FROM contacts")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

        let created = plan_bulk_create(&mut phones, rows);
        for contact in &created {
            insert(&mut tx, contact).await?;
        }

        tx.commit().await?;

        info!(created = created.len(), "Bulk created contacts");
        Ok(created)
    }

    async fn bulk_update(&self, rows: Vec<ContactRow>) -> Result<usize> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut updated = 0;
        for row in plan_bulk_update(rows) {
            let result = sqlx::query("UPDATE contacts SET name = ? WHERE phone = ?")
                .bind(&row.name)
                .bind(&row.phone)
                .execute(&mut *tx)
                .await?;
            updated += result.rows_affected() as usize;
        }

        tx.commit().await?;

        info!(updated, "Bulk updated contacts");
        Ok(updated)
    }

    async fn bulk_delete_by_phone(&self, rows: Vec<ContactRow>) -> Result<usize> {
        let phones = phones_to_delete(rows);

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut deleted = 0;
        for phone in &phones {
            let result = sqlx::query("DELETE FROM contacts WHERE phone = ?")
                .bind(phone)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected() as usize;
        }

        tx.commit().await?;

        info!(deleted, "Bulk deleted contacts by phone");
        Ok(deleted)
    }

    async fn bulk_delete_by_ids(&self, ids: Vec<Uuid>) -> Result<usize> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut deleted = 0;
        for id in &ids {
            let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected() as usize;
        }

        tx.commit().await?;

        info!(deleted, "Bulk deleted contacts by id");
        Ok(deleted)
    }
}
