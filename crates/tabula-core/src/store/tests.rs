//! Tests for the store module.

use jiff::civil::date;
use tempfile::TempDir;

use super::*;
use crate::{
    error::TabulaError,
    journal::Operation,
    params::{Delete, Get, Insert, Update},
    row,
    value::Value,
};

const USERS: &str = r#"{
    "user": {
        "table": {
            "id": "INTEGER PRIMARY KEY",
            "userid": "VARCHAR(32)",
            "age": "INTEGER",
            "active": "BOOLEAN",
            "joined": "DATE",
            "country": "TEXT"
        },
        "index": ["userid"],
        "defaults": { "country": "NZ", "active": true }
    }
}"#;

/// Helper function to create a test store
async fn create_test_store(builder: StoreBuilder) -> (TempDir, Store) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog: Catalog = USERS.parse().expect("Failed to parse catalog");
    let store = builder
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_catalog(catalog)
        .build()
        .await
        .expect("Failed to create store");
    (temp_dir, store)
}

#[tokio::test]
async fn test_insert_then_get_typed() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new()).await;

    store
        .insert(Insert::new(
            "user",
            row! { "userid" => "u1", "age" => 47, "joined" => date(2024, 3, 1) },
        ))
        .await
        .expect("Failed to insert");

    let rows = store
        .get(Get::new("user").with_filter(row! { "userid" => "u1" }))
        .await
        .expect("Failed to get")
        .executed()
        .expect("not a dry run");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["age"], Value::Integer(47));
    assert_eq!(rows[0]["joined"], Value::Date(date(2024, 3, 1)));
    // Defaults fill the columns left out
    assert_eq!(rows[0]["country"], Value::from("NZ"));
    assert_eq!(rows[0]["active"], Value::Boolean(true));
}

#[tokio::test]
async fn test_filter_on_date_matches_stored_value() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new()).await;

    for (userid, joined) in [("u1", date(2024, 3, 1)), ("u2", date(2023, 1, 15))] {
        store
            .insert(Insert::new("user", row! { "userid" => userid, "joined" => joined }))
            .await
            .unwrap();
    }

    let rows = store
        .get(Get::new("user").with_filter(row! { "joined" => date(2023, 1, 15) }))
        .await
        .unwrap()
        .executed()
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["userid"], Value::from("u2"));
}

#[tokio::test]
async fn test_generated_key_is_journaled() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("log").join("mutations.log");
    let (_db_dir, store) =
        create_test_store(StoreBuilder::new().with_journal_path(&journal_path)).await;

    let result = store
        .insert(Insert::new("user", row! { "userid" => "u1" }).returning_key())
        .await
        .unwrap()
        .executed()
        .unwrap();
    assert_eq!(result.generated_key, Some(1));

    store
        .update(
            Update::new("user", row! { "age" => 48 }).with_filter(row! { "userid" => "u1" }),
        )
        .await
        .unwrap();

    let entries = store.journal().unwrap().entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].operation, Operation::Insert);
    assert_eq!(entries[0].keys, row! { "id" => 1 });
    assert_eq!(entries[1].operation, Operation::Update);
    assert_eq!(entries[1].keys, row! { "userid" => "u1" });
}

#[tokio::test]
async fn test_dry_run_is_not_journaled() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("mutations.log");
    let (_db_dir, store) =
        create_test_store(StoreBuilder::new().with_journal_path(&journal_path)).await;

    let outcome = store
        .insert(Insert::new("user", row! { "userid" => "u1" }).dry_run())
        .await
        .unwrap();

    assert!(outcome.is_dry_run());
    assert_eq!(outcome.statements().len(), 1);
    assert!(store.journal().unwrap().entries().unwrap().is_empty());

    let rows = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_unfiltered_delete_rejected_by_default() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new()).await;
    store
        .insert(Insert::new("user", row! { "userid" => "u1" }))
        .await
        .unwrap();

    let err = store.delete(Delete::new("user")).await.unwrap_err();
    assert!(matches!(
        err,
        TabulaError::UnfilteredMutation { ref operation, .. } if operation == "delete"
    ));

    let err = store
        .update(Update::new("user", row! { "age" => 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, TabulaError::UnfilteredMutation { .. }));

    let rows = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_unfiltered_delete_when_allowed() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new().allow_unfiltered(true)).await;
    store
        .insert(Insert::new(
            "user",
            vec![row! { "userid" => "u1" }, row! { "userid" => "u2" }],
        ))
        .await
        .unwrap();

    let deleted = store
        .delete(Delete::new("user"))
        .await
        .unwrap()
        .executed()
        .unwrap();
    assert_eq!(deleted.affected, 2);

    // Per-call opt-out still applies
    let err = store
        .delete(Delete::new("user").allow_unfiltered(false))
        .await
        .unwrap_err();
    assert!(matches!(err, TabulaError::UnfilteredMutation { .. }));
}

#[tokio::test]
async fn test_explicit_sql_mutations_bypass_filter_guard() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new()).await;
    store
        .insert(Insert::new(
            "user",
            vec![
                row! { "userid" => "u1", "age" => 30 },
                row! { "userid" => "u2", "age" => 95 },
            ],
        ))
        .await
        .unwrap();

    let updated = store
        .update(
            Update::new("user", row! { "age" => 31 })
                .with_sql("UPDATE user SET age = :age WHERE userid = 'u1'"),
        )
        .await
        .expect("explicit update carries its own WHERE")
        .executed()
        .unwrap();
    assert_eq!(updated.affected, 1);

    let deleted = store
        .delete(Delete::new("user").with_sql("DELETE FROM user WHERE age > 90"))
        .await
        .expect("explicit delete carries its own WHERE")
        .executed()
        .unwrap();
    assert_eq!(deleted.affected, 1);

    let rows = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["age"], Value::Integer(31));
}

#[tokio::test]
async fn test_null_as_empty_applies_to_updates() {
    let (_temp_dir, store) =
        create_test_store(StoreBuilder::new().with_null_as_empty(true)).await;
    store
        .insert(Insert::new("user", row! { "userid" => "u1", "country" => "AU" }))
        .await
        .unwrap();

    store
        .update(
            Update::new("user", row! { "country" => Value::Null })
                .with_filter(row! { "userid" => "u1" }),
        )
        .await
        .unwrap();

    let db = Database::new(store.database_path()).unwrap();
    let country: String = db
        .connection()
        .query_row("SELECT country FROM user WHERE userid = 'u1'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(country, "");
}

#[tokio::test]
async fn test_cache_serves_repeated_reads() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new().with_cache(true)).await;
    store
        .insert(Insert::new("user", row! { "userid" => "u1" }))
        .await
        .unwrap();

    let first = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(first.len(), 1);

    // Written behind the store's back, so the cached read stays
    let db = Database::new(store.database_path()).unwrap();
    db.connection()
        .execute("INSERT INTO user(userid) VALUES ('u2')", [])
        .unwrap();
    let cached = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(cached, first);

    // A mutation through the store clears the cache
    store
        .insert(Insert::new("user", row! { "userid" => "u3" }))
        .await
        .unwrap();
    let fresh = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(fresh.len(), 3);
}

#[tokio::test]
async fn test_rebuild_reconciles_new_columns() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let store = StoreBuilder::new()
        .with_database_path(Some(&db_path))
        .with_catalog(USERS.parse().unwrap())
        .build()
        .await
        .unwrap();
    store
        .insert(Insert::new("user", row! { "userid" => "u1" }))
        .await
        .unwrap();

    let extended: Catalog = r#"{
        "user": {
            "table": {
                "id": "INTEGER PRIMARY KEY",
                "userid": "VARCHAR(32)",
                "age": "INTEGER",
                "active": "BOOLEAN",
                "joined": "DATE",
                "country": "TEXT",
                "score": "REAL"
            },
            "defaults": { "score": 1.5 }
        }
    }"#
    .parse()
    .unwrap();

    let store = StoreBuilder::new()
        .with_database_path(Some(&db_path))
        .with_catalog(extended)
        .reconcile(true)
        .build()
        .await
        .unwrap();

    let rows = store.get(Get::new("user")).await.unwrap().executed().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["score"], Value::Number(1.5));
}

#[tokio::test]
async fn test_template_overlays_defaults() {
    let (_temp_dir, store) = create_test_store(StoreBuilder::new()).await;

    let template = store.template("user").unwrap();
    assert_eq!(template["userid"], Value::from(""));
    assert_eq!(template["age"], Value::Null);
    assert_eq!(template["country"], Value::from("NZ"));

    assert!(matches!(
        store.template("nope").unwrap_err(),
        TabulaError::InvalidInput { .. }
    ));
}
