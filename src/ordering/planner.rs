//! Reorder Planner
//!
//! Turns a drag-and-drop gesture into the minimal set of order patches:
//! usually a single fractional-key update for the dragged item, plus a
//! dense renumbering of the source group when the item changed groups,
//! or a full spaced renumbering of the target group when fractional
//! precision has run out.

use crate::domain::Orderable;

use super::allocator::next_order;
use super::renumber::{dense_patches, spaced_patches};
use super::OrderPatch;

/// Where the dragged item was released
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget<Id> {
    /// Dropped onto another card
    Card(Id),
    /// Dropped onto a column background: append at the end of the group
    Column,
}

/// Plan the patches for a drag-end event.
///
/// `source_items` is the display-ordered list of the active item's current
/// group; `target_items` is the display-ordered target group list, which
/// still contains the active item when the move is within one group.
///
/// Returns `None` for invalid or no-op drops: dropping onto itself,
/// dropping onto a card absent from the target list, or releasing the item
/// on its own current position. No patches means no store call.
pub fn plan_reorder<T: Orderable>(
    active: &T,
    source_items: &[T],
    target_group: T::Group,
    target_items: &[T],
    drop: DropTarget<T::Id>,
) -> Option<Vec<OrderPatch<T::Id, T::Group>>> {
    let active_id = active.id();
    let same_group = target_group == active.group();

    let sanitized: Vec<&T> = target_items
        .iter()
        .filter(|item| item.id() != active_id)
        .collect();

    let insert_index = match &drop {
        DropTarget::Column => sanitized.len(),
        DropTarget::Card(over_id) => {
            // A self-drop sanitizes away its own target and bails here.
            let over_original = target_items.iter().position(|item| item.id() == *over_id)?;
            let over_sanitized = sanitized.iter().position(|item| item.id() == *over_id)?;

            // Direction-aware placement: when the item moves past a card it
            // originally sat above, it lands below that card. Derived from
            // list indices, never from pixel geometry.
            let source_index = target_items.iter().position(|item| item.id() == active_id);
            let dragging_downward =
                same_group && source_index.is_some_and(|index| over_original > index);
            usize::min(over_sanitized + usize::from(dragging_downward), sanitized.len())
        }
    };

    if same_group {
        // Releasing the item on its own slot is a no-op.
        if let Some(original_index) = target_items.iter().position(|item| item.id() == active_id) {
            if insert_index == original_index {
                return None;
            }
        }
    }

    let prev = insert_index
        .checked_sub(1)
        .and_then(|index| sanitized.get(index))
        .map(|item| item.order());
    let next = sanitized.get(insert_index).map(|item| item.order());
    let new_order = next_order(prev, next);

    // Simulate the insertion; any non-increasing adjacent pair means the
    // fractional precision is exhausted (or the input was already broken)
    // and the whole target sequence gets resequenced instead.
    let mut simulated: Vec<f64> = sanitized.iter().map(|item| item.order()).collect();
    simulated.insert(insert_index, new_order);
    let collision = simulated.windows(2).any(|pair| pair[0] >= pair[1]);

    let group_change = (!same_group).then_some(target_group);

    let mut patches = if collision {
        let mut sequence = sanitized;
        sequence.insert(insert_index, active);
        let mut renumbered = spaced_patches(sequence);
        if let Some(group) = group_change {
            if let Some(patch) = renumbered.iter_mut().find(|patch| patch.id == active_id) {
                patch.group = Some(group);
            }
        }
        renumbered
    } else {
        vec![OrderPatch {
            id: active_id.clone(),
            order: new_order,
            group: group_change,
        }]
    };

    if !same_group {
        // Close the gap the item left behind.
        let remaining: Vec<&T> = source_items
            .iter()
            .filter(|item| item.id() != active_id)
            .collect();
        patches.extend(dense_patches(remaining));
    }

    Some(patches)
}
