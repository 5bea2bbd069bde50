//! Domain Layer - Core Entity Traits
//!
//! These traits define the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe; orderable
//! entities additionally carry a group and a fractional order key.

use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Trait for entities positioned by a fractional order key within a group
///
/// The grouped, sorted view of orderable items is derived state; within a
/// single group, order keys are unique and strictly increasing in the
/// intended display sequence.
pub trait Orderable: Entity {
    /// The group (status column) the entity belongs to.
    /// Ungrouped collections use the unit type.
    type Group: Copy + Eq + std::hash::Hash + Send + Sync;

    fn group(&self) -> Self::Group;
    fn order(&self) -> f64;
    fn set_order(&mut self, order: f64);
    fn set_group(&mut self, group: Self::Group);
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Internal(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
