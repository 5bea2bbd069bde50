//! Habit Service
//!
//! Orchestrates one habits widget: optimistic CRUD, success/fail
//! counters, and drag-and-drop reordering against an OrderStore.

use std::collections::HashMap;

use log::{debug, warn};

use crate::cache::ScopeCache;
use crate::domain::{DomainError, DomainResult, Habit, HabitStatus};
use crate::ordering::{group_and_sort, plan_reorder, OrderPatch};
use crate::repository::{procedures, OrderStore};

use super::{generate_id, DragEnd};

/// Habit widget orchestration over a store and an explicit scope cache
pub struct HabitService<S: OrderStore<Habit>> {
    store: S,
    cache: ScopeCache<Habit>,
}

impl<S: OrderStore<Habit>> HabitService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: ScopeCache::new(),
        }
    }

    pub fn cache(&self) -> &ScopeCache<Habit> {
        &self.cache
    }

    /// Fetch a widget's habits and populate the cache
    pub async fn load(&mut self, widget_id: &str) -> DomainResult<Vec<Habit>> {
        let mut habits = self.store.list_by_scope(widget_id).await?;
        habits.sort_by(|a, b| {
            a.status
                .as_str()
                .cmp(b.status.as_str())
                .then(a.order.total_cmp(&b.order))
        });
        self.cache.set(widget_id, habits.clone());
        Ok(habits)
    }

    /// Derived grouped view, recomputed from the cached flat list
    pub fn grouped(&self, widget_id: &str) -> HashMap<HabitStatus, Vec<Habit>> {
        group_and_sort(self.cache.get(widget_id).unwrap_or(&[]))
    }

    /// Plan and commit a drag gesture. `Ok(None)` means the drop was a
    /// no-op or invalid; no store call is made in that case.
    pub async fn handle_drag_end(
        &mut self,
        widget_id: &str,
        event: DragEnd<String, HabitStatus>,
    ) -> DomainResult<Option<Vec<Habit>>> {
        let grouped = self.grouped(widget_id);
        let Some(active) = grouped
            .values()
            .flatten()
            .find(|habit| habit.id == event.active_id)
            .cloned()
        else {
            return Ok(None);
        };

        // A group key absent from the map is just an empty column.
        let empty = Vec::new();
        let source_items = grouped.get(&active.status).unwrap_or(&empty);
        let target_items = grouped.get(&event.target_group).unwrap_or(&empty);

        let Some(patches) = plan_reorder(
            &active,
            source_items,
            event.target_group,
            target_items,
            event.drop,
        ) else {
            return Ok(None);
        };

        debug!(
            "habit reorder: {} patches for widget {}",
            patches.len(),
            widget_id
        );

        // Cross-group moves touch rows guarded by a status check server
        // side, so they go through the atomic procedure.
        let wants_procedure = patches.iter().any(|patch| patch.group.is_some());
        let store = &self.store;
        let patch_list = &patches;
        let rows = self
            .cache
            .commit(widget_id, &patches, || async move {
                if wants_procedure {
                    store
                        .call_procedure(procedures::SAVE_HABIT_ORDERS, order_updates_args(patch_list))
                        .await
                } else {
                    store.batch_upsert(patch_list).await
                }
            })
            .await?;

        Ok(Some(rows))
    }

    /// Create a habit at the end of its status column
    pub async fn create_habit(
        &mut self,
        widget_id: &str,
        user_id: &str,
        title: &str,
        status: HabitStatus,
    ) -> DomainResult<Habit> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("habit title is empty".to_string()));
        }

        let order = self.store.next_order_for_group(widget_id, status).await?;
        let habit = Habit::new(generate_id("habit"), widget_id, user_id, title, status, order);

        let snapshot = self.cache.snapshot(widget_id);
        self.cache.insert(widget_id, habit.clone());

        match self.store.create(&habit).await {
            Ok(created) => {
                self.cache.replace(widget_id, &habit.id, created.clone());
                Ok(created)
            }
            Err(err) => {
                warn!("habit create failed, rolling back: {}", err);
                self.cache.restore(widget_id, snapshot);
                Err(err)
            }
        }
    }

    /// Rename a habit; an unchanged or empty title is a no-op
    pub async fn rename_habit(
        &mut self,
        widget_id: &str,
        id: &str,
        title: &str,
    ) -> DomainResult<Option<Habit>> {
        let trimmed = title.trim();
        let Some(current) = self.cached_habit(widget_id, id) else {
            return Err(DomainError::NotFound(format!("habit {} not found", id)));
        };
        if trimmed.is_empty() || trimmed == current.title {
            return Ok(None);
        }

        let mut updated = current;
        updated.title = trimmed.to_string();
        self.commit_update(widget_id, updated).await.map(Some)
    }

    pub async fn delete_habit(&mut self, widget_id: &str, id: &str) -> DomainResult<()> {
        let snapshot = self.cache.snapshot(widget_id);
        self.cache.remove(widget_id, &id.to_string());

        let result = self.store.delete(&id.to_string()).await;
        if let Err(err) = &result {
            warn!("habit delete failed, rolling back: {}", err);
            self.cache.restore(widget_id, snapshot);
        }
        // Refetch on settle regardless of outcome.
        self.cache.invalidate(widget_id);
        result
    }

    pub async fn record_success(&mut self, widget_id: &str, id: &str) -> DomainResult<Habit> {
        self.adjust_counters(widget_id, id, |habit| {
            habit.success_count += 1;
            habit.success_updated_at = Some(chrono::Utc::now().timestamp_millis());
        })
        .await
    }

    pub async fn record_fail(&mut self, widget_id: &str, id: &str) -> DomainResult<Habit> {
        self.adjust_counters(widget_id, id, |habit| habit.fail_count += 1)
            .await
    }

    pub async fn set_success_count(
        &mut self,
        widget_id: &str,
        id: &str,
        value: i32,
    ) -> DomainResult<Habit> {
        self.adjust_counters(widget_id, id, |habit| {
            habit.success_count = value;
            habit.success_updated_at = Some(chrono::Utc::now().timestamp_millis());
        })
        .await
    }

    pub async fn set_fail_count(
        &mut self,
        widget_id: &str,
        id: &str,
        value: i32,
    ) -> DomainResult<Habit> {
        self.adjust_counters(widget_id, id, |habit| habit.fail_count = value)
            .await
    }

    /// Hide the fail badge by zeroing the counter
    pub async fn clear_fail(&mut self, widget_id: &str, id: &str) -> DomainResult<Habit> {
        self.set_fail_count(widget_id, id, 0).await
    }

    fn cached_habit(&self, widget_id: &str, id: &str) -> Option<Habit> {
        self.cache
            .get(widget_id)?
            .iter()
            .find(|habit| habit.id == id)
            .cloned()
    }

    async fn adjust_counters(
        &mut self,
        widget_id: &str,
        id: &str,
        mutate: impl FnOnce(&mut Habit),
    ) -> DomainResult<Habit> {
        let Some(current) = self.cached_habit(widget_id, id) else {
            return Err(DomainError::NotFound(format!("habit {} not found", id)));
        };

        let mut updated = current.clone();
        mutate(&mut updated);
        updated.success_count = updated.success_count.max(0);
        updated.fail_count = updated.fail_count.max(0);

        // Skip the write when nothing changed.
        if updated == current {
            return Ok(current);
        }

        self.commit_update(widget_id, updated).await
    }

    /// Optimistically swap the cached row, then persist it
    async fn commit_update(&mut self, widget_id: &str, updated: Habit) -> DomainResult<Habit> {
        let snapshot = self.cache.snapshot(widget_id);
        self.cache.replace(widget_id, &updated.id, updated.clone());

        match self.store.update(&updated).await {
            Ok(row) => {
                self.cache.replace(widget_id, &row.id, row.clone());
                Ok(row)
            }
            Err(err) => {
                warn!("habit update failed, rolling back: {}", err);
                self.cache.restore(widget_id, snapshot);
                Err(err)
            }
        }
    }
}

/// Build the `save_habit_orders` procedure payload from a patch set
fn order_updates_args(patches: &[OrderPatch<String, HabitStatus>]) -> serde_json::Value {
    let updates: Vec<serde_json::Value> = patches
        .iter()
        .map(|patch| {
            let mut row = serde_json::json!({
                "id": patch.id,
                "order": patch.order,
            });
            if let Some(status) = patch.group {
                row["status"] = serde_json::Value::String(status.as_str().to_string());
            }
            row
        })
        .collect();
    serde_json::json!({ "updates": updates })
}
