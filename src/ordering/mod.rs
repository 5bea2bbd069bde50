//! Ordering Core
//!
//! Fractional order-key allocation, drag-and-drop reorder planning,
//! group renumbering and the dense-sequence validation oracle.

mod allocator;
mod planner;
mod renumber;
pub mod validate;

pub use allocator::next_order;
pub use planner::{plan_reorder, DropTarget};
pub use renumber::{dense_patches, spaced_patches, RENUMBER_STEP};

use std::collections::HashMap;

use crate::domain::Orderable;

/// A partial update produced by the planner: new order key, and the new
/// group only when the item actually changed groups.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPatch<Id, G> {
    pub id: Id,
    pub order: f64,
    pub group: Option<G>,
}

/// Group items and sort each group by order key.
///
/// The sort is stable, so items with equal keys (pathological input the
/// planner's collision fallback repairs) keep their relative order.
pub fn group_and_sort<T: Orderable>(items: &[T]) -> HashMap<T::Group, Vec<T>> {
    let mut grouped: HashMap<T::Group, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(item.group()).or_default().push(item.clone());
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| a.order().total_cmp(&b.order()));
    }
    grouped
}

/// Apply patches to a flat item list in place (order and group fields only).
/// Patches referencing unknown ids are skipped.
pub fn apply_patches<T: Orderable>(items: &mut [T], patches: &[OrderPatch<T::Id, T::Group>]) {
    for patch in patches {
        if let Some(item) = items.iter_mut().find(|item| item.id() == patch.id) {
            item.set_order(patch.order);
            if let Some(group) = patch.group {
                item.set_group(group);
            }
        }
    }
}
