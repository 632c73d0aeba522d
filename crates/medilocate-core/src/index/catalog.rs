//! Shared, atomically swapped autocomplete index over the medicine catalog.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::trie::{MedicineTrie, DEFAULT_SUGGESTION_LIMIT};

/// Process-wide prefix index.
///
/// Readers take a snapshot `Arc` and search it without holding the lock.
/// A rebuild constructs a fresh trie and swaps it in whole, so readers see
/// either the old catalog or the new one.
#[derive(Debug)]
pub struct CatalogIndex {
    current: RwLock<Arc<MedicineTrie>>,
    limit: usize,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTION_LIMIT)
    }
}

impl CatalogIndex {
    /// Empty index returning at most `limit` suggestions.
    pub fn new(limit: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(MedicineTrie::new())),
            limit,
        }
    }

    /// Index preloaded with a catalog.
    pub fn with_names<I, S>(names: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = Self::new(limit);
        index.rebuild(names);
        index
    }

    /// Replace the index with one built from `names`.
    pub fn rebuild<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh = Arc::new(MedicineTrie::from_names(names));
        let size = fresh.len();
        // The lock only guards an Arc swap, so a poisoned lock still holds a whole trie
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        info!(names = size, "rebuilt medicine prefix index");
    }

    /// Current trie.
    pub fn snapshot(&self) -> Arc<MedicineTrie> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Autocomplete suggestions for `prefix`.
    pub fn search_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.snapshot().search_by_prefix(prefix, self.limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_rebuild_replaces_instead_of_patching() {
        let index = CatalogIndex::with_names(["Aspirin", "Amoxicillin"], 10);
        assert_eq!(index.len(), 2);

        index.rebuild(["Amoxicillin"]);
        assert_eq!(index.search_by_prefix("a"), vec!["amoxicillin"]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_snapshot_survives_rebuild() {
        let index = CatalogIndex::with_names(["Aspirin"], 10);
        let before = index.snapshot();

        index.rebuild(["Ibuprofen"]);

        assert!(before.contains("aspirin"));
        assert!(!index.snapshot().contains("aspirin"));
    }

    #[test]
    fn test_limit_is_applied() {
        let names: Vec<String> = (0..15).map(|i| format!("para{}", i)).collect();
        let index = CatalogIndex::with_names(&names, 10);
        assert_eq!(index.search_by_prefix("PARA").len(), 10);
    }

    #[test]
    fn test_concurrent_readers_see_whole_catalogs() {
        let old: Vec<String> = (0..50).map(|i| format!("old{:02}", i)).collect();
        let new: Vec<String> = (0..50).map(|i| format!("new{:02}", i)).collect();
        let index = Arc::new(CatalogIndex::with_names(&old, 100));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let seen = index.search_by_prefix("");
                        let olds = seen.iter().filter(|n| n.starts_with("old")).count();
                        let news = seen.iter().filter(|n| n.starts_with("new")).count();
                        assert!(
                            (olds == 50 && news == 0) || (olds == 0 && news == 50),
                            "partial index observed: {} old, {} new",
                            olds,
                            news
                        );
                    }
                })
            })
            .collect();

        for i in 0..20 {
            index.rebuild(if i % 2 == 0 { &new } else { &old });
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
