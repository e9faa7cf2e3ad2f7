//! Contact message store behaviour through the `MessageStore` trait

use std::sync::Arc;

use tempfile::TempDir;
use validate_xml_batch::store::MessageUpdate;
use validate_xml_batch::{
    JsonFileStore, MessageStatus, MessageStore, NewMessage, StoreError,
};

fn new_message(subject: &str) -> NewMessage {
    NewMessage {
        name: "Grace".to_string(),
        email: "grace@example.org".to_string(),
        subject: subject.to_string(),
        message: "The order schema rejects my file".to_string(),
    }
}

fn store(dir: &TempDir) -> Arc<dyn MessageStore> {
    Arc::new(JsonFileStore::new(dir.path().join("data/contact_messages.json")))
}

#[tokio::test]
async fn test_submit_assigns_defaults_and_ids() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let first = store.submit(new_message("first")).await.unwrap();
    let second = store.submit(new_message("second")).await.unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.status, MessageStatus::New);
    assert_eq!(first.category, "general");
    assert_eq!(first.priority, "normal");
    assert!(first.admin_reply.is_none());
    assert!(dir.path().join("data/contact_messages.json").exists());

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(store.get(2).await.unwrap().subject, "second");
}

#[tokio::test]
async fn test_ids_stay_unique_after_delete() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    for subject in ["a", "b", "c"] {
        store.submit(new_message(subject)).await.unwrap();
    }
    store.delete(2).await.unwrap();

    let next = store.submit(new_message("d")).await.unwrap();
    assert_eq!(next.id, 4);

    let ids: Vec<u64> = store.list().await.unwrap().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3, 4]);
}

#[tokio::test]
async fn test_submit_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let missing = NewMessage {
        name: String::new(),
        ..new_message("x")
    };
    assert!(matches!(
        store.submit(missing).await,
        Err(StoreError::MissingField { field: "name" })
    ));

    let bad_email = NewMessage {
        email: "grace.example.org".to_string(),
        ..new_message("x")
    };
    assert!(matches!(
        store.submit(bad_email).await,
        Err(StoreError::InvalidEmail { .. })
    ));

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_status_stamps_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.submit(new_message("a")).await.unwrap();

    let updated = store
        .update(
            1,
            MessageUpdate {
                priority: Some("high".to_string()),
                admin_notes: Some("call back".to_string()),
                ..MessageUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.priority, "high");
    assert_eq!(updated.admin_notes, "call back");
    assert!(updated.updated_at.is_none());

    let updated = store
        .update(
            1,
            MessageUpdate {
                status: Some(MessageStatus::Read),
                ..MessageUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, MessageStatus::Read);
    assert!(updated.updated_at.is_some());
    // Persisted
    assert_eq!(store.get(1).await.unwrap(), updated);
}

#[tokio::test]
async fn test_reply() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.submit(new_message("a")).await.unwrap();

    assert!(matches!(
        store.reply(1, "   ", "admin").await,
        Err(StoreError::EmptyReply)
    ));

    let replied = store
        .reply(1, "Fixed in schema 1.2", "admin")
        .await
        .unwrap();
    assert_eq!(replied.status, MessageStatus::Replied);
    assert_eq!(replied.admin_reply.as_deref(), Some("Fixed in schema 1.2"));
    assert_eq!(replied.replied_by.as_deref(), Some("admin"));
    assert!(replied.replied_at.is_some());
    assert_eq!(replied.updated_at, replied.replied_at);
}

#[tokio::test]
async fn test_unknown_ids() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    assert!(matches!(
        store.get(9).await,
        Err(StoreError::NotFound { id: 9 })
    ));
    assert!(matches!(
        store.update(9, MessageUpdate::default()).await,
        Err(StoreError::NotFound { id: 9 })
    ));
    assert!(matches!(
        store.reply(9, "hi", "admin").await,
        Err(StoreError::NotFound { id: 9 })
    ));
    assert!(matches!(
        store.delete(9).await,
        Err(StoreError::NotFound { id: 9 })
    ));
}

#[tokio::test]
async fn test_stats() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    for subject in ["a", "b", "c"] {
        store.submit(new_message(subject)).await.unwrap();
    }
    store.reply(1, "done", "admin").await.unwrap();
    store
        .update(
            2,
            MessageUpdate {
                category: Some("bug".to_string()),
                ..MessageUpdate::default()
            },
        )
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_messages, 3);
    assert_eq!(stats.status_breakdown[&MessageStatus::New], 2);
    assert_eq!(stats.status_breakdown[&MessageStatus::Replied], 1);
    assert_eq!(stats.category_breakdown["general"], 2);
    assert_eq!(stats.category_breakdown["bug"], 1);
    assert_eq!(stats.priority_breakdown["normal"], 3);
    assert_eq!(stats.recent_activity.len(), 3);
}

#[tokio::test]
async fn test_concurrent_submits_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit(new_message(&format!("s{}", i))).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}
