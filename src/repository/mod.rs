//! Repository Layer
//!
//! Data access abstractions and SQLite implementations.

mod db;
mod habit_store;
mod micro_task_store;
mod traits;

#[cfg(test)]
mod tests;

pub use db::{init_db, init_db_in_memory, DbState};
pub use habit_store::HabitStore;
pub use micro_task_store::MicroTaskStore;
pub use traits::{OrderStore, Repository};

/// Remote procedure names understood by the stores
pub mod procedures {
    /// Batched habit order/status writes as one atomic call
    pub const SAVE_HABIT_ORDERS: &str = "save_habit_orders";
    /// Batched micro-task order writes as one atomic call
    pub const SAVE_MICRO_TASK_ORDERS: &str = "save_micro_task_orders";
}
