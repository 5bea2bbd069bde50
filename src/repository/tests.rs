//! Repository Integration Tests
//!
//! Tests for HabitStore and MicroTaskStore with an in-memory SQLite
//! database, plus a file-backed migration check.

use crate::domain::{Habit, HabitStatus, MicroTask, TimerState};
use crate::ordering::OrderPatch;
use crate::repository::{init_db, init_db_in_memory, HabitStore, MicroTaskStore, OrderStore, Repository};

fn habit(id: &str, status: HabitStatus, order: f64) -> Habit {
    Habit::new(id, "w1", "u1", id, status, order)
}

fn task(id: &str, order: f64) -> MicroTask {
    MicroTask::new(id, "w1", "u1", id, order)
}

fn habit_store() -> HabitStore {
    let db = init_db_in_memory().expect("Failed to init test DB");
    HabitStore::new(db.connection())
}

fn task_store() -> MicroTaskStore {
    let db = init_db_in_memory().expect("Failed to init test DB");
    MicroTaskStore::new(db.connection())
}

#[tokio::test]
async fn test_create_and_find_habit() {
    let store = habit_store();

    let created = store
        .create(&habit("h1", HabitStatus::NotStarted, 1.0))
        .await
        .expect("Failed to create");
    assert_eq!(created.id, "h1");
    assert!(created.created_at.is_some());
    assert!(created.updated_at.is_some());

    let found = store.find_by_id(&"h1".to_string()).await.expect("Find failed");
    assert_eq!(found.unwrap().title, "h1");
    let missing = store.find_by_id(&"nope".to_string()).await.expect("Find failed");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_list_by_scope_is_scoped_and_sorted() {
    let store = habit_store();
    store.create(&habit("h2", HabitStatus::Adopted, 2.0)).await.unwrap();
    store.create(&habit("h1", HabitStatus::Adopted, 1.0)).await.unwrap();
    let mut other = habit("other", HabitStatus::Adopted, 1.0);
    other.widget_id = "w2".to_string();
    store.create(&other).await.unwrap();

    let habits = store.list_by_scope("w1").await.expect("List failed");
    let ids: Vec<&str> = habits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["h1", "h2"]);
}

#[tokio::test]
async fn test_update_habit() {
    let store = habit_store();
    let mut created = store
        .create(&habit("h1", HabitStatus::NotStarted, 1.0))
        .await
        .unwrap();

    created.title = "Updated".to_string();
    created.success_count = 3;
    let updated = store.update(&created).await.expect("Update failed");
    assert_eq!(updated.title, "Updated");
    assert_eq!(updated.success_count, 3);

    let ghost = habit("ghost", HabitStatus::Adopted, 1.0);
    assert!(store.update(&ghost).await.is_err());
}

#[tokio::test]
async fn test_delete_habit() {
    let store = habit_store();
    store.create(&habit("h1", HabitStatus::Adopted, 1.0)).await.unwrap();
    store.delete(&"h1".to_string()).await.expect("Delete failed");
    assert!(store.find_by_id(&"h1".to_string()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_batch_upsert_applies_all_patches() {
    let store = habit_store();
    store.create(&habit("h1", HabitStatus::InProgress, 1.0)).await.unwrap();
    store.create(&habit("h2", HabitStatus::InProgress, 2.0)).await.unwrap();

    let rows = store
        .batch_upsert(&[
            OrderPatch { id: "h1".to_string(), order: 2.0, group: None },
            OrderPatch {
                id: "h2".to_string(),
                order: 1.0,
                group: Some(HabitStatus::Adopted),
            },
        ])
        .await
        .expect("Upsert failed");

    assert_eq!(rows.len(), 2);
    let h2 = store.find_by_id(&"h2".to_string()).await.unwrap().unwrap();
    assert_eq!(h2.status, HabitStatus::Adopted);
    assert_eq!(h2.order, 1.0);
}

#[tokio::test]
async fn test_batch_upsert_is_atomic() {
    let store = habit_store();
    store.create(&habit("h1", HabitStatus::InProgress, 1.0)).await.unwrap();

    let err = store
        .batch_upsert(&[
            OrderPatch { id: "h1".to_string(), order: 9.0, group: None },
            OrderPatch { id: "ghost".to_string(), order: 1.0, group: None },
        ])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));

    // The first patch must have rolled back with the batch.
    let h1 = store.find_by_id(&"h1".to_string()).await.unwrap().unwrap();
    assert_eq!(h1.order, 1.0);
}

#[tokio::test]
async fn test_save_habit_orders_procedure() {
    let store = habit_store();
    store.create(&habit("h1", HabitStatus::InProgress, 1.0)).await.unwrap();

    let args = serde_json::json!({
        "updates": [{ "id": "h1", "order": 5.0, "status": "adopted" }]
    });
    let rows = store
        .call_procedure("save_habit_orders", args)
        .await
        .expect("Procedure failed");
    assert_eq!(rows[0].status, HabitStatus::Adopted);
    assert_eq!(rows[0].order, 5.0);
}

#[tokio::test]
async fn test_unknown_procedure_is_not_found() {
    let store = habit_store();
    let err = store
        .call_procedure("frobnicate", serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("frobnicate"));
}

#[tokio::test]
async fn test_malformed_procedure_args() {
    let store = habit_store();
    let err = store
        .call_procedure("save_habit_orders", serde_json::json!({ "updates": [{}] }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("id"));
}

#[tokio::test]
async fn test_next_order_for_group() {
    let store = habit_store();
    let next = store
        .next_order_for_group("w1", HabitStatus::Adopted)
        .await
        .expect("Next order failed");
    assert_eq!(next, 1.0);

    store.create(&habit("h1", HabitStatus::Adopted, 4.5)).await.unwrap();
    store.create(&habit("h2", HabitStatus::InProgress, 9.0)).await.unwrap();
    let next = store
        .next_order_for_group("w1", HabitStatus::Adopted)
        .await
        .unwrap();
    assert_eq!(next, 5.5);
}

#[tokio::test]
async fn test_micro_task_crud_and_upsert() {
    let store = task_store();
    let created = store.create(&task("t1", 1.0)).await.expect("Create failed");
    assert_eq!(created.timer_state, TimerState::Never);
    store.create(&task("t2", 2.0)).await.unwrap();

    let rows = store
        .batch_upsert(&[
            OrderPatch { id: "t1".to_string(), order: 2.0, group: None },
            OrderPatch { id: "t2".to_string(), order: 1.0, group: None },
        ])
        .await
        .expect("Upsert failed");
    assert_eq!(rows.len(), 2);

    let tasks = store.list_by_scope("w1").await.unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t1"]);

    let next = store.next_order_for_group("w1", ()).await.unwrap();
    assert_eq!(next, 3.0);
}

#[tokio::test]
async fn test_archived_tasks_are_hidden_but_kept() {
    let store = task_store();
    let mut t1 = store.create(&task("t1", 1.0)).await.unwrap();
    store.create(&task("t2", 2.0)).await.unwrap();

    t1.archived_at = Some(1_700_000_000_000);
    store.update(&t1).await.expect("archive");

    let tasks = store.list_by_scope("w1").await.unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2"]);

    // The row itself survives, and new tasks append after the visible list.
    let found = store.find_by_id(&"t1".to_string()).await.unwrap().unwrap();
    assert_eq!(found.archived_at, Some(1_700_000_000_000));
    let next = store.next_order_for_group("w1", ()).await.unwrap();
    assert_eq!(next, 3.0);
}

#[tokio::test]
async fn test_micro_task_timer_fields_persist() {
    let store = task_store();
    let mut created = store.create(&task("t1", 1.0)).await.unwrap();
    created.timer_state = TimerState::Running;
    created.total_seconds = 90;
    created.last_started_at = Some(1_700_000_000_000);
    store.update(&created).await.expect("Update failed");

    let found = store.find_by_id(&"t1".to_string()).await.unwrap().unwrap();
    assert_eq!(found.timer_state, TimerState::Running);
    assert_eq!(found.total_seconds, 90);
    assert_eq!(found.last_started_at, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_file_backed_db_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dash.db");

    {
        let db = init_db(&path).expect("init");
        let store = HabitStore::new(db.connection());
        store.create(&habit("h1", HabitStatus::Adopted, 1.0)).await.unwrap();
    }

    // Reopening runs the migrations again; they must be idempotent.
    let db = init_db(&path).expect("reopen");
    let store = HabitStore::new(db.connection());
    let habits = store.list_by_scope("w1").await.unwrap();
    assert_eq!(habits.len(), 1);
}
