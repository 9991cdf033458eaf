//! Per-indicator memoization of computed values.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use super::IndicatorValue;
use crate::models::OrganizationId;

/// Lazily built key plus the values already computed for each organization.
///
/// Values are kept until [`IndicatorCache::clear`] is called; nothing is
/// invalidated when the underlying data changes. Two threads may compute the
/// same value concurrently, in which case the last write wins. Inputs are
/// the same for both, so the stored value is too.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    key: OnceLock<String>,
    values: RwLock<HashMap<OrganizationId, IndicatorValue>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached key, built by `init` on first access
    pub fn key<F>(&self, init: F) -> &str
    where
        F: FnOnce() -> String,
    {
        self.key.get_or_init(init)
    }

    pub fn get(&self, organization_id: OrganizationId) -> Option<IndicatorValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&organization_id)
            .copied()
    }

    pub fn insert(&self, organization_id: OrganizationId, value: IndicatorValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(organization_id, value);
    }

    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of memoized organizations
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
