//! Optimistic Scope Cache
//!
//! Per-widget cached item lists with snapshot/rollback reconciliation.
//! The cache is an explicit object handed to callers; scope keys are
//! widget ids. One in-flight mutation per scope is assumed, enforced by
//! the caller.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use log::warn;

use crate::domain::{DomainResult, Entity, Orderable};
use crate::ordering::OrderPatch;

/// Cached item lists keyed by scope (widget id)
pub struct ScopeCache<T: Entity> {
    entries: HashMap<String, Vec<T>>,
    stale: HashSet<String>,
}

impl<T: Entity> Default for ScopeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> ScopeCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stale: HashSet::new(),
        }
    }

    /// Replace a scope's list and clear its staleness flag
    pub fn set(&mut self, scope: &str, items: Vec<T>) {
        self.entries.insert(scope.to_string(), items);
        self.stale.remove(scope);
    }

    pub fn get(&self, scope: &str) -> Option<&[T]> {
        self.entries.get(scope).map(Vec::as_slice)
    }

    /// Clone the scope's current list. An unknown scope snapshots empty.
    pub fn snapshot(&self, scope: &str) -> Vec<T> {
        self.entries.get(scope).cloned().unwrap_or_default()
    }

    /// Restore a previously taken snapshot exactly
    pub fn restore(&mut self, scope: &str, snapshot: Vec<T>) {
        self.entries.insert(scope.to_string(), snapshot);
    }

    pub fn insert(&mut self, scope: &str, item: T) {
        self.entries.entry(scope.to_string()).or_default().push(item);
    }

    pub fn remove(&mut self, scope: &str, id: &T::Id) {
        if let Some(items) = self.entries.get_mut(scope) {
            items.retain(|item| item.id() != *id);
        }
    }

    /// Replace the entry with the given id, e.g. swapping an optimistic
    /// row for its server-confirmed version
    pub fn replace(&mut self, scope: &str, id: &T::Id, item: T) {
        if let Some(items) = self.entries.get_mut(scope) {
            if let Some(slot) = items.iter_mut().find(|entry| entry.id() == *id) {
                *slot = item;
            }
        }
    }

    /// Replace cached entries with server-confirmed rows, matched by id.
    /// Rows for ids not in the cache are ignored.
    pub fn confirm(&mut self, scope: &str, rows: &[T]) {
        if let Some(items) = self.entries.get_mut(scope) {
            for row in rows {
                if let Some(slot) = items.iter_mut().find(|entry| entry.id() == row.id()) {
                    *slot = row.clone();
                }
            }
        }
    }

    /// Mark a scope as needing a refetch. Decoupled from the mutation
    /// error channel: both the success and the failure path invalidate.
    pub fn invalidate(&mut self, scope: &str) {
        self.stale.insert(scope.to_string());
    }

    pub fn is_stale(&self, scope: &str) -> bool {
        self.stale.contains(scope)
    }
}

impl<T: Orderable> ScopeCache<T> {
    /// Rewrite cached order/group fields in place for instant UI feedback
    pub fn apply_patches(&mut self, scope: &str, patches: &[OrderPatch<T::Id, T::Group>]) {
        if let Some(items) = self.entries.get_mut(scope) {
            crate::ordering::apply_patches(items, patches);
        }
    }

    /// Commit a planned patch set: snapshot, optimistic apply, then await
    /// the store commit. Success swaps in the confirmed rows; failure
    /// restores the snapshot and propagates the error. The scope is
    /// invalidated either way.
    pub async fn commit<F, Fut>(
        &mut self,
        scope: &str,
        patches: &[OrderPatch<T::Id, T::Group>],
        commit: F,
    ) -> DomainResult<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<Vec<T>>>,
    {
        let snapshot = self.snapshot(scope);
        self.apply_patches(scope, patches);

        match commit().await {
            Ok(rows) => {
                self.confirm(scope, &rows);
                self.invalidate(scope);
                Ok(rows)
            }
            Err(err) => {
                warn!("commit failed for scope {}, rolling back: {}", scope, err);
                self.restore(scope, snapshot);
                self.invalidate(scope);
                Err(err)
            }
        }
    }
}
