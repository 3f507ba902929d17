use pretty_assertions::assert_eq;
use serde_json::json;
use statesync_sync::{LocalAdapter, LocalConfig, MemoryAdapter, PlatformAdapter, StateEntry, SyncError};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn entry(id: &str, entry_type: &str) -> StateEntry {
    let data = BTreeMap::from([("title".to_string(), json!(format!("{id} title")))]);
    StateEntry::with_timestamps(id, entry_type, data, 10.0, 12.5)
}

async fn open_local() -> (TempDir, LocalAdapter) {
    let dir = tempfile::tempdir().unwrap();
    let adapter = LocalAdapter::open(LocalConfig {
        state_dir: dir.path().join("state"),
    })
    .await
    .unwrap();
    (dir, adapter)
}

// ── Local directory ──────────────────────────────────────────────

#[tokio::test]
async fn local_open_creates_state_dir() {
    let (dir, adapter) = open_local().await;
    assert!(dir.path().join("state").is_dir());
    assert_eq!(adapter.state_dir(), dir.path().join("state"));
    assert!(adapter.health_check().await.unwrap());
}

#[tokio::test]
async fn local_put_then_get() {
    let (dir, adapter) = open_local().await;
    let card = entry("CARD-001", "kanban_card");

    assert!(adapter.put(&card).await.unwrap());

    assert!(dir.path().join("state/CARD-001.json").is_file());
    let stored = adapter.get("CARD-001").await.unwrap().unwrap();
    assert_eq!(stored, card);
    assert!(stored.validate());
}

#[tokio::test]
async fn local_get_missing_is_none() {
    let (_dir, adapter) = open_local().await;
    assert_eq!(adapter.get("CARD-404").await.unwrap(), None);
}

#[tokio::test]
async fn local_delete_reports_whether_anything_was_removed() {
    let (_dir, adapter) = open_local().await;
    adapter.put(&entry("CARD-001", "kanban_card")).await.unwrap();

    assert!(adapter.delete("CARD-001").await.unwrap());
    assert!(!adapter.delete("CARD-001").await.unwrap());
    assert_eq!(adapter.get("CARD-001").await.unwrap(), None);
}

#[tokio::test]
async fn local_list_filters_sorts_and_skips_garbage() {
    let (dir, adapter) = open_local().await;
    adapter.put(&entry("CARD-002", "kanban_card")).await.unwrap();
    adapter.put(&entry("CARD-001", "kanban_card")).await.unwrap();
    adapter.put(&entry("PR-7", "pr")).await.unwrap();
    std::fs::write(dir.path().join("state/broken.json"), b"{not json").unwrap();
    std::fs::write(dir.path().join("state/notes.txt"), b"ignored").unwrap();

    let all = adapter.list(None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["CARD-001", "CARD-002", "PR-7"]);

    let prs = adapter.list(Some("pr")).await.unwrap();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].id, "PR-7");
}

#[tokio::test]
async fn local_rejects_ids_that_escape_the_state_dir() {
    let (_dir, adapter) = open_local().await;
    for id in ["", "../etc/passwd", "a/b", "a\\b", ".hidden"] {
        let err = adapter.get(id).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidEntryId(_)), "{id:?}");
    }
}

#[tokio::test]
async fn local_health_fails_once_dir_is_gone() {
    let (dir, adapter) = open_local().await;
    std::fs::remove_dir_all(dir.path().join("state")).unwrap();
    assert!(!adapter.health_check().await.unwrap());
}

#[test]
fn local_config_default_dir() {
    assert_eq!(
        LocalConfig::default().state_dir,
        std::path::PathBuf::from(".statesync/state")
    );
}

// ── In memory ────────────────────────────────────────────────────

#[tokio::test]
async fn memory_adapter_roundtrip() {
    let adapter = MemoryAdapter::new();
    assert!(adapter.is_empty().await);

    adapter.put(&entry("CARD-001", "kanban_card")).await.unwrap();
    adapter.put(&entry("PR-7", "pr")).await.unwrap();

    assert_eq!(adapter.len().await, 2);
    assert_eq!(adapter.list(Some("pr")).await.unwrap().len(), 1);
    assert!(adapter.delete("PR-7").await.unwrap());
    assert!(!adapter.delete("PR-7").await.unwrap());
    assert_eq!(adapter.snapshot().await, vec![entry("CARD-001", "kanban_card")]);
}

#[tokio::test]
async fn memory_adapter_health_is_switchable() {
    let adapter = MemoryAdapter::default();
    assert!(adapter.health_check().await.unwrap());
    adapter.set_healthy(false);
    assert!(!adapter.health_check().await.unwrap());
}
