//! Run-scoped record of forked queries
//!
//! Keyed by template query id. A query shared by several widgets is forked
//! once; later widgets reuse the stored clone.

use std::collections::HashMap;

use tenantdash_client::models::Query;

/// Template query id → its clone for this run
#[derive(Debug, Clone, Default)]
pub struct QueryCloneCache {
    clones: HashMap<i64, Query>,
}

impl QueryCloneCache {
    /// Empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of a template query
    #[inline]
    #[must_use]
    pub fn get(&self, source_id: i64) -> Option<&Query> {
        self.clones.get(&source_id)
    }

    /// Record a clone
    pub fn insert(&mut self, source_id: i64, clone: Query) {
        self.clones.insert(source_id, clone);
    }

    /// Number of forked queries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    /// Check for no forks yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_by_source_id() {
        let mut cache = QueryCloneCache::new();
        assert!(cache.get(1).is_none());

        cache.insert(1, Query::new("clone", 9, "SELECT 1"));
        assert_eq!(cache.get(1).map(|q| q.name.as_str()), Some("clone"));
        assert_eq!(cache.len(), 1);

        cache.insert(1, Query::new("again", 9, "SELECT 1"));
        assert_eq!(cache.len(), 1);
    }
}
