//! Habit Entity
//!
//! A habit card tracked on the dashboard. Habits live in one of three
//! status columns and are ordered within their column by a fractional
//! order key.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Orderable};

/// Status column a habit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HabitStatus {
    Adopted,
    InProgress,
    #[default]
    NotStarted,
}

impl HabitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitStatus::Adopted => "adopted",
            HabitStatus::InProgress => "in_progress",
            HabitStatus::NotStarted => "not_started",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "adopted" => HabitStatus::Adopted,
            "in_progress" => HabitStatus::InProgress,
            _ => HabitStatus::NotStarted,
        }
    }
}

/// A habit card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier, immutable
    pub id: String,
    /// Owning widget (cache scope)
    pub widget_id: String,
    pub user_id: String,
    pub title: String,
    /// Status column (ordering group)
    pub status: HabitStatus,
    /// Fractional order key within the status column
    pub order: f64,
    pub success_count: i32,
    pub fail_count: i32,
    /// Millisecond timestamp of the last success count change
    pub success_updated_at: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Habit {
    /// Create a new habit with zeroed counters
    pub fn new(
        id: impl Into<String>,
        widget_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        status: HabitStatus,
        order: f64,
    ) -> Self {
        Self {
            id: id.into(),
            widget_id: widget_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            status,
            order,
            success_count: 0,
            fail_count: 0,
            success_updated_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Habit {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Orderable for Habit {
    type Group = HabitStatus;

    fn group(&self) -> HabitStatus {
        self.status
    }

    fn order(&self) -> f64 {
        self.order
    }

    fn set_order(&mut self, order: f64) {
        self.order = order;
    }

    fn set_group(&mut self, group: HabitStatus) {
        self.status = group;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new("h1", "w1", "u1", "Stretch", HabitStatus::NotStarted, 1.0);
        assert_eq!(habit.id(), "h1");
        assert_eq!(habit.status, HabitStatus::NotStarted);
        assert_eq!(habit.success_count, 0);
        assert_eq!(habit.fail_count, 0);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(HabitStatus::Adopted.as_str(), "adopted");
        assert_eq!(HabitStatus::from_str("in_progress"), HabitStatus::InProgress);
        assert_eq!(HabitStatus::from_str("garbage"), HabitStatus::NotStarted);
    }

    #[test]
    fn test_orderable_accessors() {
        let mut habit = Habit::new("h1", "w1", "u1", "Run", HabitStatus::InProgress, 2.0);
        assert_eq!(habit.group(), HabitStatus::InProgress);
        habit.set_order(3.5);
        habit.set_group(HabitStatus::Adopted);
        assert_eq!(habit.order, 3.5);
        assert_eq!(habit.status, HabitStatus::Adopted);
    }
}
