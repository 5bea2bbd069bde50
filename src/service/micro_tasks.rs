//! Micro-Task Service
//!
//! Orchestrates one micro-task widget: optimistic CRUD, stopwatch
//! transitions and drag-and-drop reordering of the single task list.

use log::{debug, warn};

use crate::cache::ScopeCache;
use crate::domain::{DomainError, DomainResult, MicroTask, TimerState};
use crate::ordering::{plan_reorder, DropTarget, OrderPatch};
use crate::repository::{procedures, OrderStore};

use super::generate_id;

/// Micro-task widget orchestration over a store and an explicit cache
pub struct MicroTaskService<S: OrderStore<MicroTask>> {
    store: S,
    cache: ScopeCache<MicroTask>,
}

impl<S: OrderStore<MicroTask>> MicroTaskService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: ScopeCache::new(),
        }
    }

    pub fn cache(&self) -> &ScopeCache<MicroTask> {
        &self.cache
    }

    /// Fetch a widget's tasks and populate the cache
    pub async fn load(&mut self, widget_id: &str) -> DomainResult<Vec<MicroTask>> {
        let mut tasks = self.store.list_by_scope(widget_id).await?;
        tasks.sort_by(|a, b| a.order.total_cmp(&b.order));
        self.cache.set(widget_id, tasks.clone());
        Ok(tasks)
    }

    /// Cached tasks in display order
    pub fn tasks(&self, widget_id: &str) -> Vec<MicroTask> {
        let mut tasks: Vec<MicroTask> = self
            .cache
            .get(widget_id)
            .map(|items| items.to_vec())
            .unwrap_or_default();
        tasks.sort_by(|a, b| a.order.total_cmp(&b.order));
        tasks
    }

    /// Plan and commit a drag within the single task list. `Ok(None)`
    /// means no-op; no store call is made.
    pub async fn reorder(
        &mut self,
        widget_id: &str,
        active_id: &str,
        drop: DropTarget<String>,
    ) -> DomainResult<Option<Vec<MicroTask>>> {
        let tasks = self.tasks(widget_id);
        let Some(active) = tasks.iter().find(|task| task.id == active_id).cloned() else {
            return Ok(None);
        };

        let Some(patches) = plan_reorder(&active, &tasks, (), &tasks, drop) else {
            return Ok(None);
        };

        debug!(
            "micro-task reorder: {} patches for widget {}",
            patches.len(),
            widget_id
        );

        let store = &self.store;
        let patch_list = &patches;
        let rows = self
            .cache
            .commit(widget_id, &patches, || async move {
                if patch_list.len() > 1 {
                    store
                        .call_procedure(
                            procedures::SAVE_MICRO_TASK_ORDERS,
                            order_updates_args(patch_list),
                        )
                        .await
                } else {
                    store.batch_upsert(patch_list).await
                }
            })
            .await?;

        Ok(Some(rows))
    }

    /// Create a task at the end of the list
    pub async fn create_task(
        &mut self,
        widget_id: &str,
        user_id: &str,
        title: &str,
    ) -> DomainResult<MicroTask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("task title is empty".to_string()));
        }

        let order = self.store.next_order_for_group(widget_id, ()).await?;
        let task = MicroTask::new(generate_id("task"), widget_id, user_id, title, order);

        let snapshot = self.cache.snapshot(widget_id);
        self.cache.insert(widget_id, task.clone());

        match self.store.create(&task).await {
            Ok(created) => {
                self.cache.replace(widget_id, &task.id, created.clone());
                Ok(created)
            }
            Err(err) => {
                warn!("task create failed, rolling back: {}", err);
                self.cache.restore(widget_id, snapshot);
                Err(err)
            }
        }
    }

    /// Archive a task: it drops out of the widget list but the row and
    /// its accumulated time survive for history views.
    pub async fn archive_task(&mut self, widget_id: &str, id: &str) -> DomainResult<MicroTask> {
        let Some(current) = self.cached_task(widget_id, id) else {
            return Err(DomainError::NotFound(format!("task {} not found", id)));
        };

        let snapshot = self.cache.snapshot(widget_id);
        self.cache.remove(widget_id, &id.to_string());

        let mut archived = current;
        archived.archived_at = Some(chrono::Utc::now().timestamp_millis());
        let result = self.store.update(&archived).await;
        if let Err(err) = &result {
            warn!("task archive failed, rolling back: {}", err);
            self.cache.restore(widget_id, snapshot);
        }
        // Refetch on settle regardless of outcome.
        self.cache.invalidate(widget_id);
        result
    }

    pub async fn delete_task(&mut self, widget_id: &str, id: &str) -> DomainResult<()> {
        let snapshot = self.cache.snapshot(widget_id);
        self.cache.remove(widget_id, &id.to_string());

        let result = self.store.delete(&id.to_string()).await;
        if let Err(err) = &result {
            warn!("task delete failed, rolling back: {}", err);
            self.cache.restore(widget_id, snapshot);
        }
        // Refetch on settle regardless of outcome.
        self.cache.invalidate(widget_id);
        result
    }

    /// Start (or resume) the stopwatch. Only one stopwatch runs per
    /// widget: any other running task is paused first, with its elapsed
    /// time folded in. Starting a running task is a no-op.
    pub async fn start_timer(&mut self, widget_id: &str, id: &str) -> DomainResult<MicroTask> {
        let Some(current) = self.cached_task(widget_id, id) else {
            return Err(DomainError::NotFound(format!("task {} not found", id)));
        };
        if current.timer_state == TimerState::Running {
            return Ok(current);
        }

        let now = chrono::Utc::now().timestamp_millis();
        let running_others: Vec<MicroTask> = self
            .cache
            .get(widget_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|task| task.timer_state == TimerState::Running && task.id != id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for other in running_others {
            self.commit_update(widget_id, fold_pause(other, now)).await?;
        }

        let mut updated = current;
        updated.timer_state = TimerState::Running;
        updated.last_started_at = Some(now);
        self.commit_update(widget_id, updated).await
    }

    /// Pause the stopwatch, folding the elapsed time into `total_seconds`
    pub async fn pause_timer(&mut self, widget_id: &str, id: &str) -> DomainResult<MicroTask> {
        let Some(current) = self.cached_task(widget_id, id) else {
            return Err(DomainError::NotFound(format!("task {} not found", id)));
        };
        if current.timer_state != TimerState::Running {
            return Ok(current);
        }

        let now = chrono::Utc::now().timestamp_millis();
        self.commit_update(widget_id, fold_pause(current, now)).await
    }

    fn cached_task(&self, widget_id: &str, id: &str) -> Option<MicroTask> {
        self.cache
            .get(widget_id)?
            .iter()
            .find(|task| task.id == id)
            .cloned()
    }

    async fn commit_update(
        &mut self,
        widget_id: &str,
        updated: MicroTask,
    ) -> DomainResult<MicroTask> {
        let snapshot = self.cache.snapshot(widget_id);
        self.cache.replace(widget_id, &updated.id, updated.clone());

        match self.store.update(&updated).await {
            Ok(row) => {
                self.cache.replace(widget_id, &row.id, row.clone());
                Ok(row)
            }
            Err(err) => {
                warn!("task update failed, rolling back: {}", err);
                self.cache.restore(widget_id, snapshot);
                Err(err)
            }
        }
    }
}

/// Stop a running task's stopwatch, folding the elapsed time since the
/// last start into `total_seconds`. Clock skew clamps to zero.
fn fold_pause(mut task: MicroTask, now: i64) -> MicroTask {
    let elapsed_seconds = task
        .last_started_at
        .map(|started| ((now - started) / 1000).max(0))
        .unwrap_or(0);
    task.timer_state = TimerState::Paused;
    task.total_seconds += elapsed_seconds;
    task.last_started_at = None;
    task
}

/// Build the `save_micro_task_orders` procedure payload from a patch set
fn order_updates_args(patches: &[OrderPatch<String, ()>]) -> serde_json::Value {
    let updates: Vec<serde_json::Value> = patches
        .iter()
        .map(|patch| {
            serde_json::json!({
                "id": patch.id,
                "order": patch.order,
            })
        })
        .collect();
    serde_json::json!({ "updates": updates })
}
