//! Integration tests for the storage service.
//!
//! These tests run the service over both store backends and check the
//! round-trip, namespacing, batch and backup contracts.

use serde_json::{Value, json};
use std::sync::Arc;
use support_config::error::Error;
use support_config::storage::{StorageOptions, StorageService};
use support_config::store::{KeyValueStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a service over a fresh in-memory store.
fn setup() -> (Arc<MemoryStore>, StorageService) {
    let store = Arc::new(MemoryStore::new());
    let service = StorageService::new(store.clone());
    (store, service)
}

mod round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn primitives_and_objects_round_trip() {
        let (_store, service) = setup();
        let values = [
            json!("Damián"),
            json!("42"),
            json!(42),
            json!(0.7),
            json!(true),
            json!(null),
            json!(["breathing", "music"]),
            json!({"dailyGoals": {"stars": 5}, "favoriteFoods": []}),
        ];

        for (i, value) in values.iter().enumerate() {
            let key = format!("k{}", i);
            assert!(service.set_item(&key, value).await);
            // Bypass the cache so the store payload is what gets parsed
            service.clear_cache();
            assert_eq!(service.get_item(&key).await.as_ref(), Some(value), "key {}", key);
        }
    }

    #[tokio::test]
    async fn typed_structs_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Meal {
            name: String,
            stars: u32,
        }

        let (_store, service) = setup();
        let meal = Meal {
            name: "arroz".into(),
            stars: 2,
        };
        assert!(service.set_item("meal", &meal).await);
        service.clear_cache();
        let back: Meal = service
            .get_or(
                "meal",
                Meal {
                    name: String::new(),
                    stars: 0,
                },
            )
            .await;
        assert_eq!(back, meal);
    }

    #[tokio::test]
    async fn remove_then_get_returns_default() {
        let (_store, service) = setup();
        service.set_item("k", &json!(1)).await;
        assert!(service.remove_item("k").await);
        assert_eq!(service.get_item("k").await, None);
        assert_eq!(service.get_or("k", 9).await, 9);
    }
}

mod namespace_tests {
    use super::*;

    #[tokio::test]
    async fn get_all_keys_strips_prefix_and_skips_foreign_keys() {
        let (store, service) = setup();
        store.set("other_app:token", "x").await.unwrap();
        service.set_item("user", &json!({})).await;
        service.set_item("food", &json!({})).await;

        let mut keys = service.get_all_keys().await;
        keys.sort();
        assert_eq!(keys, vec!["food", "user"]);
    }

    #[tokio::test]
    async fn clear_removes_only_namespaced_keys() {
        let (store, service) = setup();
        store.set("other_app:token", "x").await.unwrap();
        service.set_item("a", &json!(1)).await;
        service.set_item("b", &json!(2)).await;

        assert!(service.clear().await);
        assert!(service.get_all_keys().await.is_empty());
        assert_eq!(service.get_item("a").await, None);
        assert_eq!(service.cache_len(), 0);
        assert_eq!(store.raw("other_app:token").as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn custom_prefix_is_used() {
        let store = Arc::new(MemoryStore::new());
        let service = StorageService::with_options(
            store.clone(),
            StorageOptions {
                prefix: "test:".into(),
                ..StorageOptions::default()
            },
        );
        service.set_item("x", &json!(1)).await;
        assert_eq!(store.raw("test:x").as_deref(), Some("1"));
        assert_eq!(service.prefix(), "test:");
    }
}

mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn multi_set_then_multi_get() {
        let (_store, service) = setup();
        assert!(
            service
                .multi_set(&[
                    ("a".to_string(), json!(1)),
                    ("b".to_string(), json!({"x": true})),
                ])
                .await
        );

        let got = service.multi_get(&["a", "b", "missing"]).await;
        assert_eq!(got["a"], Some(json!(1)));
        assert_eq!(got["b"], Some(json!({"x": true})));
        assert_eq!(got["missing"], None);
    }

    #[tokio::test]
    async fn multi_set_with_empty_key_writes_nothing() {
        let (store, service) = setup();
        assert!(
            !service
                .multi_set(&[("a".to_string(), json!(1)), (String::new(), json!(2))])
                .await
        );
        assert!(store.is_empty());
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_store_yields_false_and_defaults() {
        let (store, service) = setup();
        store.set_available(false);

        assert!(!service.set_item("k", &json!(1)).await);
        assert_eq!(service.get_item("k").await, None);
        assert_eq!(service.get_or("k", 5).await, 5);
        assert!(!service.remove_item("k").await);
        assert!(!service.clear().await);
        assert!(service.get_all_keys().await.is_empty());
        assert!(service.get_storage_info().await.is_none());
        assert!(service.export_data().await.is_none());

        let got = service.multi_get(&["k"]).await;
        assert_eq!(got["k"], None);
    }

    #[tokio::test]
    async fn write_item_surfaces_errors() {
        let (store, service) = setup();
        assert!(matches!(
            service.write_item("", &json!(1)).await,
            Err(Error::InvalidKey(_))
        ));

        store.set_available(false);
        assert!(matches!(
            service.write_item("k", &json!(1)).await,
            Err(Error::StorageUnavailable(_))
        ));
    }
}

mod backup_tests {
    use super::*;

    #[tokio::test]
    async fn export_then_import_into_fresh_store() {
        let (_store, service) = setup();
        service.set_item("user", &json!({"name": "Ana"})).await;
        service.set_item("stars", &json!(3)).await;

        let backup = service.export_data().await.unwrap();
        assert_eq!(backup.data.len(), 2);
        let payload = serde_json::to_value(&backup).unwrap();
        assert!(payload["timestamp"].is_string());
        assert_eq!(payload["version"], "1.0.0");

        let (_other_store, other) = setup();
        assert!(other.import_data(payload).await.unwrap());
        assert_eq!(other.get_item("user").await, Some(json!({"name": "Ana"})));
        assert_eq!(other.get_item("stars").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn import_without_data_fails() {
        let (store, service) = setup();
        let err = service
            .import_data(json!({"timestamp": "2024-01-01T00:00:00Z"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBackupFormat(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn import_into_unavailable_store_reports_false() {
        let (store, service) = setup();
        store.set_available(false);
        let ok = service
            .import_data(json!({"data": {"a": 1}}))
            .await
            .unwrap();
        assert!(!ok);
    }
}

mod sqlite_tests {
    use super::*;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.db");

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            let service = StorageService::new(store);
            assert!(service.set_item("user", &json!({"name": "Ana"})).await);
        }

        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let service = StorageService::new(store);
        assert_eq!(service.get_item("user").await, Some(json!({"name": "Ana"})));
        assert_eq!(service.get_all_keys().await, vec!["user"]);
    }

    #[tokio::test]
    async fn clear_then_keys_empty() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = StorageService::new(store);
        service.set_item("a", &json!(1)).await;
        service.set_item("b", &Value::Bool(false)).await;
        assert!(service.clear().await);
        assert!(service.get_all_keys().await.is_empty());
        assert_eq!(service.get_item("a").await, None);
    }
}
