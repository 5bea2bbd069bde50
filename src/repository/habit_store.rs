//! Habit Store
//!
//! SQLite-backed implementation of Repository<Habit> and OrderStore<Habit>.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Habit, HabitStatus};
use crate::ordering::OrderPatch;

use super::procedures;
use super::traits::{OrderStore, Repository};

const HABIT_COLUMNS: &str = r#"id, widget_id, user_id, title, status, "order", success_count, fail_count, success_updated_at, created_at, updated_at"#;

/// SQLite implementation of the habit repository
pub struct HabitStore {
    conn: Arc<Mutex<Connection>>,
}

impl HabitStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn row_to_habit(row: &rusqlite::Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        widget_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        status: HabitStatus::from_str(&row.get::<_, String>(4)?),
        order: row.get(5)?,
        success_count: row.get(6)?,
        fail_count: row.get(7)?,
        success_updated_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Parse `{"updates": [{"id", "order", "status"?}]}` procedure args
fn parse_order_updates(
    args: &serde_json::Value,
) -> DomainResult<Vec<OrderPatch<String, HabitStatus>>> {
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
            let group = row
                .get("status")
                .and_then(|value| value.as_str())
                .map(HabitStatus::from_str);
            Ok(OrderPatch {
                id: id.to_string(),
                order,
                group,
            })
        })
        .collect()
}

#[async_trait]
impl Repository<Habit> for HabitStore {
    async fn create(&self, entity: &Habit) -> DomainResult<Habit> {
        {
            let conn = self.conn.lock().await;
            let now = chrono::Utc::now().timestamp_millis();
            conn.execute(
                r#"INSERT INTO habits (id, widget_id, user_id, title, status, "order", success_count, fail_count, success_updated_at, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                params![
                    entity.id,
                    entity.widget_id,
                    entity.user_id,
                    entity.title,
                    entity.status.as_str(),
                    entity.order,
                    entity.success_count,
                    entity.fail_count,
                    entity.success_updated_at,
                    entity.created_at.unwrap_or(now),
                    now,
                ],
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        }

        self.find_by_id(&entity.id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("habit {} vanished after insert", entity.id)))
    }

    async fn find_by_id(&self, id: &String) -> DomainResult<Option<Habit>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(
                row_to_habit(row).map_err(|e| DomainError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn list_by_scope(&self, scope: &str) -> DomainResult<Vec<Habit>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                r#"SELECT {} FROM habits WHERE widget_id = ?1 ORDER BY status, "order" ASC"#,
                HABIT_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let habits = stmt
            .query_map(params![scope], row_to_habit)
            .map_err(|e| DomainError::Internal(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(habits)
    }

    async fn update(&self, entity: &Habit) -> DomainResult<Habit> {
        {
            let conn = self.conn.lock().await;
            let affected = conn
                .execute(
                    r#"UPDATE habits SET title = ?1, status = ?2, "order" = ?3, success_count = ?4, fail_count = ?5, success_updated_at = ?6, updated_at = ?7 WHERE id = ?8"#,
                    params![
                        entity.title,
                        entity.status.as_str(),
                        entity.order,
                        entity.success_count,
                        entity.fail_count,
                        entity.success_updated_at,
                        chrono::Utc::now().timestamp_millis(),
                        entity.id,
                    ],
                )
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            if affected == 0 {
                return Err(DomainError::NotFound(format!("habit {} not found", entity.id)));
            }
        }

        self.find_by_id(&entity.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("habit {} not found", entity.id)))
    }

    async fn delete(&self, id: &String) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM habits WHERE id = ?1", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore<Habit> for HabitStore {
    async fn batch_upsert(
        &self,
        patches: &[OrderPatch<String, HabitStatus>],
    ) -> DomainResult<Vec<Habit>> {
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
                let affected = match patch.group {
                    Some(status) => tx.execute(
                        r#"UPDATE habits SET "order" = ?1, status = ?2, updated_at = ?3 WHERE id = ?4"#,
                        params![patch.order, status.as_str(), now, patch.id],
                    ),
                    None => tx.execute(
                        r#"UPDATE habits SET "order" = ?1, updated_at = ?2 WHERE id = ?3"#,
                        params![patch.order, now, patch.id],
                    ),
                }
                .map_err(|e| DomainError::Internal(e.to_string()))?;

                if affected == 0 {
                    // Dropping the transaction rolls the whole batch back.
                    return Err(DomainError::NotFound(format!("habit {} not found", patch.id)));
                }
            }

            tx.commit().map_err(|e| DomainError::Internal(e.to_string()))?;
        }

        let mut rows = Vec::with_capacity(patches.len());
        for patch in patches {
            if let Some(habit) = self.find_by_id(&patch.id).await? {
                rows.push(habit);
            }
        }
        Ok(rows)
    }

    async fn call_procedure(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> DomainResult<Vec<Habit>> {
        match name {
            procedures::SAVE_HABIT_ORDERS => {
                let patches = parse_order_updates(&args)?;
                log::debug!("save_habit_orders: {} updates", patches.len());
                self.batch_upsert(&patches).await
            }
            _ => Err(DomainError::NotFound(format!("procedure {} not found", name))),
        }
    }

    async fn next_order_for_group(&self, scope: &str, group: HabitStatus) -> DomainResult<f64> {
        let conn = self.conn.lock().await;
        conn.query_row(
            r#"SELECT COALESCE(MAX("order"), 0) + 1 FROM habits WHERE widget_id = ?1 AND status = ?2"#,
            params![scope, group.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }
}
