//! Domain Layer
//!
//! Core entities and business rules.

mod entity;
mod habit;
mod micro_task;

pub use entity::{DomainError, DomainResult, Entity, Orderable};
pub use habit::{Habit, HabitStatus};
pub use micro_task::{format_duration, parse_duration, MicroTask, TimerState};
