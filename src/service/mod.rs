//! Service Layer
//!
//! Widget-level orchestration: resolves drag events against cached
//! views, plans order patches and commits them optimistically.

mod habits;
mod micro_tasks;

pub use habits::HabitService;
pub use micro_tasks::MicroTaskService;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ordering::DropTarget;

/// A finished drag gesture, as reported by the UI layer
#[derive(Debug, Clone)]
pub struct DragEnd<Id, G> {
    pub active_id: Id,
    /// Group of the column the item was released over
    pub target_group: G,
    pub drop: DropTarget<Id>,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Generate a client-side id for an optimistic row. Unique within the
/// process; the timestamp keeps ids unique across restarts.
pub(crate) fn generate_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let serial = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:x}-{}", prefix, millis, serial)
}
