//! Sequencing Validation
//!
//! Post-condition checks used as a test oracle after planner invocations.
//! Nothing here runs on the live path.

use std::collections::HashMap;

use crate::domain::Orderable;

/// True when the sorted order keys are exactly the dense sequence 1..N.
pub fn is_dense<T: Orderable>(items: &[T]) -> bool {
    let mut orders: Vec<f64> = items.iter().map(|item| item.order()).collect();
    orders.sort_by(f64::total_cmp);
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == (index + 1) as f64)
}

/// True when order keys strictly increase in display order.
/// Holds for fractional keys too, where `is_dense` does not.
pub fn is_strictly_increasing<T: Orderable>(items: &[T]) -> bool {
    items
        .windows(2)
        .all(|pair| pair[0].order() < pair[1].order())
}

/// True when every group of the grouped map is dense.
pub fn all_groups_dense<T: Orderable>(grouped: &HashMap<T::Group, Vec<T>>) -> bool {
    grouped.values().all(|items| is_dense(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Habit, HabitStatus};

    fn habits(orders: &[f64]) -> Vec<Habit> {
        orders
            .iter()
            .enumerate()
            .map(|(i, order)| {
                Habit::new(format!("h{}", i), "w1", "u1", "t", HabitStatus::Adopted, *order)
            })
            .collect()
    }

    #[test]
    fn test_is_dense() {
        assert!(is_dense(&habits(&[1.0, 2.0, 3.0])));
        assert!(is_dense(&habits(&[3.0, 1.0, 2.0])));
        assert!(is_dense(&habits(&[])));
        assert!(!is_dense(&habits(&[1.0, 2.0, 4.0])));
        assert!(!is_dense(&habits(&[1.0, 2.0, 2.0])));
        assert!(!is_dense(&habits(&[0.0, 1.0, 2.0])));
    }

    #[test]
    fn test_is_strictly_increasing() {
        assert!(is_strictly_increasing(&habits(&[0.5, 1.25, 7.0])));
        assert!(is_strictly_increasing(&habits(&[])));
        assert!(!is_strictly_increasing(&habits(&[1.0, 1.0])));
        assert!(!is_strictly_increasing(&habits(&[2.0, 1.0])));
    }
}
