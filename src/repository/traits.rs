//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory, a hosted backend, etc.

use async_trait::async_trait;

use crate::domain::{DomainResult, Entity, Orderable};
use crate::ordering::OrderPatch;

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type. All operations are async to support
/// various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: &T::Id) -> DomainResult<Option<T>>;

    /// List all entities of one scope (widget), in stored display order
    async fn list_by_scope(&self, scope: &str) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: &T::Id) -> DomainResult<()>;
}

/// Extension for repositories backing orderable entities
#[async_trait]
pub trait OrderStore<T: Orderable>: Repository<T> {
    /// Apply id-keyed partial order/group updates atomically as one batch
    /// and return the confirmed rows. A missing id fails the whole batch.
    async fn batch_upsert(&self, patches: &[OrderPatch<T::Id, T::Group>]) -> DomainResult<Vec<T>>;

    /// Invoke a named atomic procedure for patch sets with cross-row
    /// invariants (e.g. group reassignment). Returns the confirmed rows.
    async fn call_procedure(&self, name: &str, args: serde_json::Value) -> DomainResult<Vec<T>>;

    /// `max(order) + 1` within a group, or `1` when the group is empty.
    /// Used when placing a brand-new item at the end of its group.
    async fn next_order_for_group(&self, scope: &str, group: T::Group) -> DomainResult<f64>;
}
