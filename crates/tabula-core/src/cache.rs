//! Memoized reads keyed on table, filter and ordering.
//!
//! The cache trusts nothing it cannot observe: whenever the journal's
//! modification time moves past the last time seen, every entry is
//! dropped. Mutations made through the owning store also clear it
//! directly, since file timestamps can be coarse.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use log::trace;

use crate::{error::Result, value::Row};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    table: String,
    filter: String,
    order_by: Vec<String>,
}

impl CacheKey {
    fn new(table: &str, filter: &Row, order_by: &[String]) -> Result<Self> {
        Ok(Self {
            table: table.to_string(),
            filter: serde_json::to_string(filter)?,
            order_by: order_by.to_vec(),
        })
    }
}

#[derive(Debug, Default)]
struct CacheState {
    seen: Option<SystemTime>,
    entries: HashMap<CacheKey, Vec<Row>>,
}

/// Thread-safe read cache.
#[derive(Debug, Default)]
pub struct ReadCache {
    state: Mutex<CacheState>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the cache if `modified` is newer than the last observed
    /// journal modification time.
    pub fn sync(&self, modified: Option<SystemTime>) {
        let mut state = self.lock();
        if modified > state.seen {
            if !state.entries.is_empty() {
                trace!("journal advanced, dropping {} cached read(s)", state.entries.len());
            }
            state.entries.clear();
            state.seen = modified;
        }
    }

    pub fn get(&self, table: &str, filter: &Row, order_by: &[String]) -> Result<Option<Vec<Row>>> {
        let key = CacheKey::new(table, filter, order_by)?;
        Ok(self.lock().entries.get(&key).cloned())
    }

    pub fn put(&self, table: &str, filter: &Row, order_by: &[String], rows: Vec<Row>) -> Result<()> {
        let key = CacheKey::new(table, filter, order_by)?;
        self.lock().entries.insert(key, rows);
        Ok(())
    }

    /// Drops every cached read of `table`.
    pub fn invalidate(&self, table: &str) {
        self.lock().entries.retain(|key, _| key.table != table);
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::row;

    #[test]
    fn test_hit_requires_same_key() {
        let cache = ReadCache::new();
        let filter = row! { "userid" => "u1" };
        let order = vec!["age DESC".to_string()];

        cache.put("user", &filter, &order, vec![row! { "age" => 3 }]).unwrap();

        assert_eq!(cache.get("user", &filter, &order).unwrap().unwrap().len(), 1);
        assert!(cache.get("user", &filter, &[]).unwrap().is_none());
        assert!(cache.get("user", &row! { "userid" => "u2" }, &order).unwrap().is_none());
        assert!(cache.get("visit", &filter, &order).unwrap().is_none());
    }

    #[test]
    fn test_sync_clears_when_journal_advances() {
        let cache = ReadCache::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);

        cache.sync(Some(t0));
        cache.put("user", &Row::new(), &[], Vec::new()).unwrap();

        cache.sync(Some(t0));
        assert_eq!(cache.len(), 1);

        cache.sync(None);
        assert_eq!(cache.len(), 1);

        cache.sync(Some(t0 + Duration::from_secs(1)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_table() {
        let cache = ReadCache::new();
        cache.put("user", &Row::new(), &[], Vec::new()).unwrap();
        cache.put("visit", &Row::new(), &[], Vec::new()).unwrap();

        cache.invalidate("user");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("visit", &Row::new(), &[]).unwrap().is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
