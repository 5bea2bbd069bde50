//! Group Renumbering
//!
//! Replaces a whole group's order keys with a fresh sequence matching
//! display order. Used to close gaps after cross-group moves and as the
//! fallback when fractional precision is exhausted.

use crate::domain::Orderable;

use super::OrderPatch;

/// Step between keys in the collision fallback. The wide spacing leaves
/// room for many midpoint insertions before the next renumbering.
pub const RENUMBER_STEP: f64 = 1000.0;

/// Renumber items to the dense sequence 1..N in display order.
pub fn dense_patches<'a, T, I>(items: I) -> Vec<OrderPatch<T::Id, T::Group>>
where
    T: Orderable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| OrderPatch {
            id: item.id(),
            order: (index + 1) as f64,
            group: None,
        })
        .collect()
}

/// Renumber items to 1000, 2000, 3000, ... in display order.
pub fn spaced_patches<'a, T, I>(items: I) -> Vec<OrderPatch<T::Id, T::Group>>
where
    T: Orderable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| OrderPatch {
            id: item.id(),
            order: (index + 1) as f64 * RENUMBER_STEP,
            group: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Habit, HabitStatus};

    fn habit(id: &str, order: f64) -> Habit {
        Habit::new(id, "w1", "u1", id, HabitStatus::InProgress, order)
    }

    #[test]
    fn test_dense_patches_follow_input_order() {
        let items = vec![habit("b", 7.25), habit("a", 0.0), habit("c", -3.0)];
        let patches = dense_patches(&items);
        let pairs: Vec<(String, f64)> = patches.iter().map(|p| (p.id.clone(), p.order)).collect();
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), 1.0),
                ("a".to_string(), 2.0),
                ("c".to_string(), 3.0),
            ],
        );
        assert!(patches.iter().all(|p| p.group.is_none()));
    }

    #[test]
    fn test_spaced_patches_step() {
        let items = vec![habit("a", 0.0), habit("b", 0.0)];
        let patches = spaced_patches(&items);
        assert_eq!(patches[0].order, 1000.0);
        assert_eq!(patches[1].order, 2000.0);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<Habit> = Vec::new();
        assert!(dense_patches(&items).is_empty());
        assert!(spaced_patches(&items).is_empty());
    }
}
