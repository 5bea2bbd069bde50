//! Micro-Task Store
//!
//! SQLite-backed implementation of Repository<MicroTask> and
//! OrderStore<MicroTask>. Micro-tasks are ungrouped, so group patches
//! carry no payload and `next_order_for_group` ignores the group.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, MicroTask, TimerState};
use crate::ordering::OrderPatch;

use super::procedures;
use super::traits::{OrderStore, Repository};

const TASK_COLUMNS: &str = r#"id, widget_id, user_id, title, "order", timer_state, total_seconds, last_started_at, archived_at, created_at, updated_at"#;

/// SQLite implementation of the micro-task repository
pub struct MicroTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl MicroTaskStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<MicroTask> {
    Ok(MicroTask {
        id: row.get(0)?,
        widget_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        order: row.get(4)?,
        timer_state: TimerState::from_str(&row.get::<_, String>(5)?),
        total_seconds: row.get(6)?,
        last_started_at: row.get(7)?,
        archived_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Parse `{"updates": [{"id", "order"}]}` procedure args
fn parse_order_updates(args: &serde_json::Value) -> DomainResult<Vec<OrderPatch<String, ()>>> {
    let updates = args
        .get("updates")
        .and_then(|value| value.as_array())
        .ok_or_else(|| DomainError::InvalidInput("missing updates array".to_string()))?;

    updates
        .iter()
        .map(|row| {
            let id = row
                .get("id")
                .and_then(|value| value.as_str())
                .ok_or_else(|| DomainError::InvalidInput("update row without id".to_string()))?;
            let order = row
                .get("order")
                .and_then(|value| value.as_f64())
                .ok_or_else(|| DomainError::InvalidInput("update row without order".to_string()))?;
            Ok(OrderPatch {
                id: id.to_string(),
                order,
                group: None,
            })
        })
        .collect()
}

#[async_trait]
impl Repository<MicroTask> for MicroTaskStore {
    async fn create(&self, entity: &MicroTask) -> DomainResult<MicroTask> {
        {
            let conn = self.conn.lock().await;
            let now = chrono::Utc::now().timestamp_millis();
            conn.execute(
                r#"INSERT INTO micro_tasks (id, widget_id, user_id, title, "order", timer_state, total_seconds, last_started_at, archived_at, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                params![
                    entity.id,
                    entity.widget_id,
                    entity.user_id,
                    entity.title,
                    entity.order,
                    entity.timer_state.as_str(),
                    entity.total_seconds,
                    entity.last_started_at,
                    entity.archived_at,
                    entity.created_at.unwrap_or(now),
                    now,
                ],
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        }

        self.find_by_id(&entity.id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("task {} vanished after insert", entity.id)))
    }

    async fn find_by_id(&self, id: &String) -> DomainResult<Option<MicroTask>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM micro_tasks WHERE id = ?1", TASK_COLUMNS))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(
                row_to_task(row).map_err(|e| DomainError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn list_by_scope(&self, scope: &str) -> DomainResult<Vec<MicroTask>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                r#"SELECT {} FROM micro_tasks WHERE widget_id = ?1 AND archived_at IS NULL ORDER BY "order" ASC"#,
                TASK_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let tasks = stmt
            .query_map(params![scope], row_to_task)
            .map_err(|e| DomainError::Internal(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(tasks)
    }

    async fn update(&self, entity: &MicroTask) -> DomainResult<MicroTask> {
        {
            let conn = self.conn.lock().await;
            let affected = conn
                .execute(
                    r#"UPDATE micro_tasks SET title = ?1, "order" = ?2, timer_state = ?3, total_seconds = ?4, last_started_at = ?5, archived_at = ?6, updated_at = ?7 WHERE id = ?8"#,
                    params![
                        entity.title,
                        entity.order,
                        entity.timer_state.as_str(),
                        entity.total_seconds,
                        entity.last_started_at,
                        entity.archived_at,
                        chrono::Utc::now().timestamp_millis(),
                        entity.id,
                    ],
                )
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            if affected == 0 {
                return Err(DomainError::NotFound(format!("task {} not found", entity.id)));
            }
        }

        self.find_by_id(&entity.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("task {} not found", entity.id)))
    }

    async fn delete(&self, id: &String) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM micro_tasks WHERE id = ?1", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore<MicroTask> for MicroTaskStore {
    async fn batch_upsert(&self, patches: &[OrderPatch<String, ()>]) -> DomainResult<Vec<MicroTask>> {
        if patches.is_empty() {
            return Ok(Vec::new());
        }

        {
            let mut conn = self.conn.lock().await;
            let tx = conn
                .transaction()
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            let now = chrono::Utc::now().timestamp_millis();

            for patch in patches {
                let affected = tx
                    .execute(
                        r#"UPDATE micro_tasks SET "order" = ?1, updated_at = ?2 WHERE id = ?3"#,
                        params![patch.order, now, patch.id],
                    )
                    .map_err(|e| DomainError::Internal(e.to_string()))?;

                if affected == 0 {
                    // Dropping the transaction rolls the whole batch back.
                    return Err(DomainError::NotFound(format!("task {} not found", patch.id)));
                }
            }

            tx.commit().map_err(|e| DomainError::Internal(e.to_string()))?;
        }

        let mut rows = Vec::with_capacity(patches.len());
        for patch in patches {
            if let Some(task) = self.find_by_id(&patch.id).await? {
                rows.push(task);
            }
        }
        Ok(rows)
    }

    async fn call_procedure(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> DomainResult<Vec<MicroTask>> {
        match name {
            procedures::SAVE_MICRO_TASK_ORDERS => {
                let patches = parse_order_updates(&args)?;
                log::debug!("save_micro_task_orders: {} updates", patches.len());
                self.batch_upsert(&patches).await
            }
            _ => Err(DomainError::NotFound(format!("procedure {} not found", name))),
        }
    }

    async fn next_order_for_group(&self, scope: &str, _group: ()) -> DomainResult<f64> {
        let conn = self.conn.lock().await;
        conn.query_row(
            r#"SELECT COALESCE(MAX("order"), 0) + 1 FROM micro_tasks WHERE widget_id = ?1 AND archived_at IS NULL"#,
            params![scope],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }
}
