//! Behavioral tests for `ContactRepository`
//!
//! Every scenario runs against both backends so they cannot drift apart:
//! uniqueness on create, best-effort bulk operations, patch semantics and
//! word-boundary search. Concurrency tests check that racing creates admit
//! one winner and that readers never observe half of a bulk operation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use phonebook_common::db::init_database;
use phonebook_common::{
    ContactPatch, ContactRepository, ContactRow, Error, MemoryRepository, SqliteRepository,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Test helper: fresh SQLite repository in its own temp directory
///
/// The directory guard must outlive the repository.
async fn sqlite_repo() -> (SqliteRepository, TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("contacts.db"))
        .await
        .expect("Should initialize database");

    (SqliteRepository::new(pool), dir)
}

/// Runs a scenario against the in-memory and the SQLite backend
macro_rules! backend_tests {
    ($($name:ident),* $(,)?) => {
        mod memory_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(&MemoryRepository::new()).await;
                }
            )*
        }

        mod sqlite_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    let (repo, _dir) = sqlite_repo().await;
                    super::$name(&repo).await;
                }
            )*
        }
    };
}

backend_tests!(
    create_then_get_round_trips,
    duplicate_phone_conflicts,
    duplicate_name_conflicts_ignoring_case,
    create_rejects_blank_fields,
    get_unknown_id_is_not_found,
    delete_then_get_is_not_found,
    delete_unknown_id_is_not_found,
    patch_name_only_keeps_phone,
    patch_phone_only_keeps_name,
    patch_blank_fields_change_nothing,
    patch_unknown_id_is_not_found,
    patch_onto_taken_phone_conflicts,
    search_is_word_boundary_anchored,
    search_without_term_returns_all,
    bulk_create_skips_blank_and_colliding_rows,
    bulk_create_ignores_name_uniqueness,
    bulk_update_renames_by_phone,
    bulk_update_large_batch,
    bulk_delete_by_phone_removes_only_matches,
    bulk_delete_by_ids_ignores_unknown,
    list_returns_everything,
);

async fn create_then_get_round_trips(repo: &dyn ContactRepository) {
    let created = repo.create("Ann Lee", "555-0100").await.unwrap();
    let fetched = repo.get(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.name, "Ann Lee");
    assert_eq!(fetched.phone, "555-0100");
}

async fn duplicate_phone_conflicts(repo: &dyn ContactRepository) {
    repo.create("Ann", "555-0100").await.unwrap();

    let result = repo.create("Bob", "555-0100").await;

    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

async fn duplicate_name_conflicts_ignoring_case(repo: &dyn ContactRepository) {
    repo.create("Ann Lee", "1").await.unwrap();

    let result = repo.create("aNN lEE", "2").await;

    assert!(matches!(result, Err(Error::Conflict(msg)) if msg == "Name must be unique"));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

async fn create_rejects_blank_fields(repo: &dyn ContactRepository) {
    assert!(matches!(
        repo.create("   ", "1").await,
        Err(Error::BadInput(_))
    ));
    assert!(matches!(repo.create("Ann", "").await, Err(Error::BadInput(_))));
    assert!(repo.list().await.unwrap().is_empty());
}

async fn get_unknown_id_is_not_found(repo: &dyn ContactRepository) {
    let result = repo.get(Uuid::new_v4()).await;

    assert!(matches!(result, Err(Error::NotFound(msg)) if msg == "Cannot find contact"));
}

async fn delete_then_get_is_not_found(repo: &dyn ContactRepository) {
    let created = repo.create("Ann", "1").await.unwrap();

    repo.delete(created.id).await.unwrap();

    assert!(matches!(repo.get(created.id).await, Err(Error::NotFound(_))));
}

async fn delete_unknown_id_is_not_found(repo: &dyn ContactRepository) {
    assert!(matches!(
        repo.delete(Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}

async fn patch_name_only_keeps_phone(repo: &dyn ContactRepository) {
    let created = repo.create("Ann", "1").await.unwrap();

    let patched = repo
        .patch(
            created.id,
            &ContactPatch {
                name: Some("Annie".to_string()),
                phone: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.id, created.id);
    assert_eq!(patched.name, "Annie");
    assert_eq!(patched.phone, "1");
    assert_eq!(repo.get(created.id).await.unwrap(), patched);
}

async fn patch_phone_only_keeps_name(repo: &dyn ContactRepository) {
    let created = repo.create("Ann", "1").await.unwrap();

    let patched = repo
        .patch(
            created.id,
            &ContactPatch {
                name: None,
                phone: Some("2".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.name, "Ann");
    assert_eq!(patched.phone, "2");
    assert_eq!(repo.get(created.id).await.unwrap(), patched);
}

async fn patch_blank_fields_change_nothing(repo: &dyn ContactRepository) {
    let created = repo.create("Ann", "1").await.unwrap();

    let patched = repo
        .patch(
            created.id,
            &ContactPatch {
                name: Some(" ".to_string()),
                phone: Some(String::new()),
            },
        )
        .await
        .unwrap();

    assert_eq!(patched, created);
}

async fn patch_unknown_id_is_not_found(repo: &dyn ContactRepository) {
    let result = repo
        .patch(Uuid::new_v4(), &ContactPatch::default())
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

async fn patch_onto_taken_phone_conflicts(repo: &dyn ContactRepository) {
    let ann = repo.create("Ann", "1").await.unwrap();
    repo.create("Bob", "2").await.unwrap();

    let result = repo
        .patch(
            ann.id,
            &ContactPatch {
                name: Some("Annie".to_string()),
                phone: Some("2".to_string()),
            },
        )
        .await;

    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(repo.get(ann.id).await.unwrap(), ann);
}

async fn search_is_word_boundary_anchored(repo: &dyn ContactRepository) {
    repo.create("Ann Lee", "1").await.unwrap();
    repo.create("Susan Ann", "2").await.unwrap();
    repo.create("Joanne", "3").await.unwrap();

    let names: HashSet<String> = repo
        .search(Some("ann"))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();

    assert_eq!(
        names,
        ["Ann Lee", "Susan Ann"]
            .into_iter()
            .map(String::from)
            .collect()
    );
}

async fn search_without_term_returns_all(repo: &dyn ContactRepository) {
    repo.create("Ann", "1").await.unwrap();
    repo.create("Bob", "2").await.unwrap();

    assert_eq!(repo.search(None).await.unwrap().len(), 2);
    assert_eq!(repo.search(Some("")).await.unwrap().len(), 2);
}

async fn bulk_create_skips_blank_and_colliding_rows(repo: &dyn ContactRepository) {
    let existing = repo.create("Existing", "100").await.unwrap();

    let rows = vec![
        ContactRow::new("Ann", "1"),
        ContactRow::new("", "2"),
        ContactRow::new("Blank Phone", " "),
        ContactRow::new("Collides", "100"),
        ContactRow::new("Bob", "3"),
        ContactRow::new("Bob Twin", "3"),
    ];

    let created = repo.bulk_create(rows).await.unwrap();

    let names: Vec<_> = created.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bob"]);

    let ids: HashSet<_> = created.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&existing.id));

    assert_eq!(repo.list().await.unwrap().len(), 3);
    assert_eq!(repo.get(existing.id).await.unwrap(), existing);
}

async fn bulk_create_ignores_name_uniqueness(repo: &dyn ContactRepository) {
    repo.create("Ann", "1").await.unwrap();

    let created = repo
        .bulk_create(vec![ContactRow::new("ann", "2")])
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
}

async fn bulk_update_renames_by_phone(repo: &dyn ContactRepository) {
    let ann = repo.create("Ann", "1").await.unwrap();
    let bob = repo.create("Bob", "2").await.unwrap();

    let updated = repo
        .bulk_update(vec![
            ContactRow::new("Annie", "1"),
            ContactRow::new("Nobody", "999"),
            ContactRow::new("", "2"),
        ])
        .await
        .unwrap();

    assert_eq!(updated, 1);
    assert_eq!(repo.get(ann.id).await.unwrap().name, "Annie");
    assert_eq!(repo.get(ann.id).await.unwrap().phone, "1");
    assert_eq!(repo.get(bob.id).await.unwrap(), bob);
    assert_eq!(repo.list().await.unwrap().len(), 2);
}

async fn bulk_update_large_batch(repo: &dyn ContactRepository) {
    const COUNT: usize = 5000;
    let phone = |i: usize| format!("555-{:05}", i);

    let created = repo
        .bulk_create(
            (0..COUNT)
                .map(|i| ContactRow::new(format!("Person {}", i), phone(i)))
                .collect(),
        )
        .await
        .unwrap();
    assert_eq!(created.len(), COUNT);

    let updated = repo
        .bulk_update(
            (0..COUNT)
                .rev()
                .map(|i| ContactRow::new(format!("Renamed {}", i), phone(i)))
                .collect(),
        )
        .await
        .unwrap();

    assert_eq!(updated, COUNT);
    let names: HashMap<Uuid, String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    for (i, contact) in created.iter().enumerate() {
        assert_eq!(names[&contact.id], format!("Renamed {}", i));
    }
}

async fn bulk_delete_by_phone_removes_only_matches(repo: &dyn ContactRepository) {
    let ann = repo.create("Ann", "1").await.unwrap();
    let bob = repo.create("Bob", "2").await.unwrap();

    let deleted = repo
        .bulk_delete_by_phone(vec![
            ContactRow::new("whoever", "1"),
            ContactRow::new("ghost", "404"),
        ])
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(matches!(repo.get(ann.id).await, Err(Error::NotFound(_))));
    assert_eq!(repo.get(bob.id).await.unwrap(), bob);
}

async fn bulk_delete_by_ids_ignores_unknown(repo: &dyn ContactRepository) {
    let ann = repo.create("Ann", "1").await.unwrap();
    let bob = repo.create("Bob", "2").await.unwrap();
    let carl = repo.create("Carl", "3").await.unwrap();

    let deleted = repo
        .bulk_delete_by_ids(vec![ann.id, Uuid::new_v4(), carl.id])
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(repo.list().await.unwrap(), vec![bob]);
}

async fn list_returns_everything(repo: &dyn ContactRepository) {
    assert!(repo.list().await.unwrap().is_empty());

    repo.create("Ann", "1").await.unwrap();
    repo.bulk_create(vec![ContactRow::new("Bob", "2"), ContactRow::new("Carl", "3")])
        .await
        .unwrap();

    assert_eq!(repo.list().await.unwrap().len(), 3);
}

// =============================================================================
// Concurrency
// =============================================================================

async fn same_phone_creates_admit_one(repo: Arc<dyn ContactRepository>) {
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.create(&format!("Person {}", i), "555").await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, Error::Conflict(_)), "unexpected error {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

/// Readers polling during a bulk create and a bulk delete must see the whole
/// batch or none of it
async fn bulk_mutations_are_all_or_nothing_to_readers(repo: Arc<dyn ContactRepository>) {
    const BATCH: usize = 2000;
    let rows: Vec<_> = (0..BATCH)
        .map(|i| ContactRow::new(format!("Person {}", i), format!("555-{:05}", i)))
        .collect();

    let writer = {
        let repo = Arc::clone(&repo);
        let rows = rows.clone();
        tokio::spawn(async move { repo.bulk_create(rows).await })
    };
    let mut observed = HashSet::new();
    while !writer.is_finished() {
        observed.insert(repo.list().await.unwrap().len());
        tokio::task::yield_now().await;
    }
    assert_eq!(writer.await.unwrap().unwrap().len(), BATCH);
    observed.insert(repo.list().await.unwrap().len());

    let writer = {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move { repo.bulk_delete_by_phone(rows).await })
    };
    while !writer.is_finished() {
        observed.insert(repo.search(Some("person")).await.unwrap().len());
        tokio::task::yield_now().await;
    }
    assert_eq!(writer.await.unwrap().unwrap(), BATCH);
    observed.insert(repo.list().await.unwrap().len());

    assert!(
        observed.iter().all(|&len| len == 0 || len == BATCH),
        "saw partial batch: {:?}",
        observed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_same_phone_creates_admit_one() {
    same_phone_creates_admit_one(Arc::new(MemoryRepository::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_same_phone_creates_admit_one() {
    let (repo, _dir) = sqlite_repo().await;
    same_phone_creates_admit_one(Arc::new(repo)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_bulk_mutations_are_atomic_to_readers() {
    bulk_mutations_are_all_or_nothing_to_readers(Arc::new(MemoryRepository::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_bulk_mutations_are_atomic_to_readers() {
    let (repo, _dir) = sqlite_repo().await;
    bulk_mutations_are_all_or_nothing_to_readers(Arc::new(repo)).await;
}

#[tokio::test]
async fn sqlite_contacts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.db");

    let created = {
        let repo = SqliteRepository::new(init_database(&path).await.unwrap());
        let created = repo.create("Ann", "1").await.unwrap();
        repo.pool().close().await;
        created
    };

    let repo = SqliteRepository::new(init_database(&path).await.unwrap());
    assert_eq!(repo.get(created.id).await.unwrap(), created);
}
