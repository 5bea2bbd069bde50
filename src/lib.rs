//! Habit Dash Ordering Core
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - ordering: Order-key allocation, reorder planning, renumbering
//! - cache: Optimistic per-scope cache with snapshot rollback
//! - repository: Data access abstractions and SQLite implementation
//! - service: Widget-level orchestration (drag end -> plan -> commit)

pub mod cache;
pub mod domain;
pub mod ordering;
pub mod repository;
pub mod service;

pub use domain::{DomainError, DomainResult};
