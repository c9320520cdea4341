//! Integration tests for the file-backed key/value store
//!
//! Each test works in its own temporary directory.

use chatterbox::storage::{FileStore, KeyValueStore, default_store};
use tempfile::TempDir;

fn temp_store() -> (TempDir, FileStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path().join("store"));
    (dir, store)
}

mod file_store_tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let (_dir, store) = temp_store();
        let value = r#"{"name": "test", "count": 42}"#;

        store.set("test_key", value).expect("Failed to set");
        assert_eq!(store.get("test_key"), Some(value.to_string()));
    }

    #[test]
    fn test_get_nonexistent() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("nonexistent_key"), None);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = temp_store();
        store.set("to_delete", "value").expect("Failed to set");
        assert!(store.get("to_delete").is_some());

        store.remove("to_delete").expect("Failed to delete");
        assert!(store.get("to_delete").is_none());

        // removing a missing key is not an error
        store.remove("to_delete").expect("Second delete failed");
    }

    #[test]
    fn test_keys() {
        let (_dir, store) = temp_store();
        store.set("key1", "value1").expect("Failed to set key1");
        store.set("key2", "value2").expect("Failed to set key2");

        let keys = store.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"key1".to_string()));
        assert!(keys.contains(&"key2".to_string()));
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let (_dir, store) = temp_store();
        store.set("k", "first").expect("Failed to set");
        store.set("k", "second").expect("Failed to set");
        assert_eq!(store.get("k"), Some("second".to_string()));
    }

    #[test]
    fn test_special_characters_in_key() {
        let (_dir, store) = temp_store();
        store
            .set("chat_history_alice@example.com", "[]")
            .expect("Failed to set");

        assert_eq!(
            store.get("chat_history_alice@example.com"),
            Some("[]".to_string())
        );
        assert_eq!(store.keys(), vec!["chat_history_alice@example.com".to_string()]);
    }

    #[test]
    fn test_similar_keys_do_not_share_a_file() {
        let (_dir, store) = temp_store();
        store.set("chat_history_alice@corp.com", "alice").expect("Failed to set");
        store.set("chat_history_alice.corp.com", "eve").expect("Failed to set");
        store.set("chat_history_alice_corp_com", "mallory").expect("Failed to set");

        assert_eq!(store.get("chat_history_alice@corp.com"), Some("alice".to_string()));
        assert_eq!(store.get("chat_history_alice.corp.com"), Some("eve".to_string()));
        assert_eq!(store.get("chat_history_alice_corp_com"), Some("mallory".to_string()));
        assert_eq!(store.keys().len(), 3);
    }

    #[test]
    fn test_long_keys_sharing_a_prefix_stay_distinct() {
        let (_dir, store) = temp_store();
        let prefix = format!("chat_history_{}", "a".repeat(300));
        let first = format!("{prefix}@one.example");
        let second = format!("{prefix}@two.example");

        store.set(&first, "1").expect("Failed to set");
        store.set(&second, "2").expect("Failed to set");

        assert_eq!(store.get(&first), Some("1".to_string()));
        assert_eq!(store.get(&second), Some("2".to_string()));

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec![first.clone(), second]);

        store.remove(&first).expect("Failed to delete");
        assert_eq!(store.get(&first), None);
    }

    #[test]
    fn test_default_store_honours_override() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = default_store(Some(dir.path()));
        store.set("marker", "1").expect("Failed to set");
        assert!(dir.path().join("marker.json").exists());
    }
}

mod session_isolation_tests {
    use super::*;
    use chatterbox::{AppConfig, ChatContext, SharedStore, UserRole};
    use std::sync::Arc;

    #[test]
    fn test_lookalike_identifiers_get_separate_histories() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store: SharedStore = Arc::new(FileStore::new(dir.path()));
        let config = AppConfig::default();

        let mut alice = ChatContext::init(
            store.clone(),
            &config,
            "alice@corp.com",
            UserRole::Viewer,
            None,
        )
        .expect("Failed to sign in");
        alice
            .transcripts
            .append_user_message(None, "alice's secret plan")
            .expect("Failed to append");
        alice.teardown().expect("Failed to sign out");

        let eve = ChatContext::init(store.clone(), &config, "alice.corp.com", UserRole::Viewer, None)
            .expect("Failed to sign in");
        assert!(eve.transcripts.history().is_empty());
        eve.teardown().expect("Failed to sign out");

        let alice = ChatContext::init(store, &config, "alice@corp.com", UserRole::Viewer, None)
            .expect("Failed to sign in");
        assert_eq!(alice.transcripts.history().len(), 1);
    }
}
