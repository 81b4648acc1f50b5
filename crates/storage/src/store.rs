use spendsort_core::{RuleError, RuleSet, UNCATEGORIZED};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::backend::{LoadError, PersistError, RuleBackend};

#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// The in-memory rules were changed but the backing store was not
    /// updated. The change stays in effect for this session.
    #[error("Rules were updated but could not be saved: {0}")]
    Persist(#[from] PersistError),
}

/// Owns the category → keyword rules for the process.
///
/// Every mutation holds the lock across both the in-memory change and the
/// write to the backend, so concurrent callers cannot lose each other's
/// updates.
pub struct RuleStore {
    backend: Box<dyn RuleBackend>,
    rules: Mutex<RuleSet>,
}

impl RuleStore {
    /// Loads the rules from `backend`.
    pub fn open(backend: impl RuleBackend + 'static) -> Result<Self, LoadError> {
        let rules = normalized(backend.load()?);
        Ok(Self::with_rules(backend, rules))
    }

    /// Like [`RuleStore::open`], but falls back to the default rules when the
    /// backend cannot be read. The load error is handed back so the caller can
    /// tell the user their rules were reset.
    pub fn open_or_default(backend: impl RuleBackend + 'static) -> (Self, Option<LoadError>) {
        match backend.load() {
            Ok(rules) => (Self::with_rules(backend, normalized(rules)), None),
            Err(e) => {
                tracing::warn!("Could not load rules, falling back to defaults: {e}");
                (Self::with_rules(backend, RuleSet::default()), Some(e))
            }
        }
    }

    fn with_rules(backend: impl RuleBackend + 'static, rules: RuleSet) -> Self {
        Self {
            backend: Box::new(backend),
            rules: Mutex::new(rules),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RuleSet> {
        // Mutations only append, so a poisoned set is still consistent.
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current rules for a categorization pass.
    pub fn snapshot(&self) -> RuleSet {
        self.lock().clone()
    }

    /// Category options for the editing surface, reserved category included.
    pub fn category_names(&self) -> Vec<String> {
        self.lock().category_names()
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.lock().contains_category(name)
    }

    /// Writes the current rules to the backend.
    pub fn save(&self) -> Result<(), PersistError> {
        let rules = self.lock();
        self.backend.save(&rules)
    }

    /// Adds an empty category. Returns `Ok(false)` without saving when the
    /// trimmed name is blank or already taken.
    pub fn add_category(&self, name: &str) -> Result<bool, RuleStoreError> {
        let mut rules = self.lock();
        if !rules.insert_category(name) {
            return Ok(false);
        }
        tracing::info!("Added category '{}'", name.trim());
        self.persist(&rules)?;
        Ok(true)
    }

    /// Adds a trimmed keyword to an existing category. Returns `Ok(false)`
    /// without saving when the keyword is blank or already present.
    pub fn add_keyword(&self, category: &str, keyword: &str) -> Result<bool, RuleStoreError> {
        let mut rules = self.lock();
        if !rules.insert_keyword(category, keyword)? {
            return Ok(false);
        }
        tracing::info!("Added keyword '{}' to category '{category}'", keyword.trim());
        self.persist(&rules)?;
        Ok(true)
    }

    fn persist(&self, rules: &RuleSet) -> Result<(), PersistError> {
        self.backend.save(rules).map_err(|e| {
            tracing::warn!("Rules changed in memory but were not saved: {e}");
            e
        })
    }
}

fn normalized(mut rules: RuleSet) -> RuleSet {
    let dropped = rules.normalize();
    if dropped > 0 {
        tracing::warn!("Dropped {dropped} invalid keywords while loading rules");
    }
    rules
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("categories", &self.lock().len())
            .finish_non_exhaustive()
    }
}

/// True when `name` is a category the user may assign keywords to.
pub fn is_assignable(name: &str) -> bool {
    !name.trim().is_empty() && name != UNCATEGORIZED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{JsonFileBackend, MemoryBackend};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn memory_store() -> (RuleStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = RuleStore::open(backend.clone()).unwrap();
        (store, backend)
    }

    #[test]
    fn fresh_store_holds_reserved_category() {
        let (store, _) = memory_store();
        assert_eq!(store.category_names(), vec![UNCATEGORIZED.to_string()]);
    }

    #[test]
    fn open_or_default_normalizes_loaded_rules() {
        let loaded: RuleSet =
            serde_json::from_str(r#"{"Uncategorized":["X"],"Coffee":["STARBUCKS"," STARBUCKS",""]}"#)
                .unwrap();
        let (store, err) = RuleStore::open_or_default(MemoryBackend::with_rules(loaded));
        assert!(err.is_none());
        let rules = store.snapshot();
        assert_eq!(rules.keywords(UNCATEGORIZED).unwrap().len(), 0);
        assert_eq!(rules.keywords("Coffee").unwrap(), &["STARBUCKS".to_string()]);
    }

    #[test]
    fn add_category_persists() {
        let (store, backend) = memory_store();
        assert!(store.add_category("Groceries").unwrap());
        assert!(backend.stored().unwrap().contains_category("Groceries"));
    }

    #[test]
    fn add_existing_category_does_not_persist() {
        let (store, backend) = memory_store();
        assert!(!store.add_category(UNCATEGORIZED).unwrap());
        assert!(!store.add_category("").unwrap());
        assert_eq!(backend.stored(), None);
    }

    #[test]
    fn add_keyword_is_idempotent() {
        let (store, backend) = memory_store();
        store.add_category("Coffee").unwrap();
        assert!(store.add_keyword("Coffee", "STARBUCKS").unwrap());
        let once = backend.stored().unwrap();
        assert!(!store.add_keyword("Coffee", " STARBUCKS  ").unwrap());
        assert_eq!(backend.stored().unwrap(), once);
        assert_eq!(
            store.snapshot().keywords("Coffee").unwrap(),
            &["STARBUCKS".to_string()]
        );
    }

    #[test]
    fn add_keyword_to_unknown_category_errors() {
        let (store, _) = memory_store();
        assert!(matches!(
            store.add_keyword("Nope", "X"),
            Err(RuleStoreError::Rule(RuleError::UnknownCategory(_)))
        ));
    }

    #[test]
    fn add_keyword_to_reserved_category_errors() {
        let (store, _) = memory_store();
        assert!(matches!(
            store.add_keyword(UNCATEGORIZED, "X"),
            Err(RuleStoreError::Rule(RuleError::ReservedCategory))
        ));
    }

    #[test]
    fn persist_failure_keeps_in_memory_change() {
        let (store, backend) = memory_store();
        store.add_category("Coffee").unwrap();
        backend.set_fail_writes(true);

        let result = store.add_keyword("Coffee", "STARBUCKS");
        assert!(matches!(result, Err(RuleStoreError::Persist(_))));
        assert_eq!(
            store.snapshot().keywords("Coffee").unwrap(),
            &["STARBUCKS".to_string()]
        );
        assert_eq!(backend.stored().unwrap().keywords("Coffee").unwrap().len(), 0);

        backend.set_fail_writes(false);
        store.save().unwrap();
        assert_eq!(backend.stored().unwrap(), store.snapshot());
    }

    #[test]
    fn reopen_sees_saved_rules() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("categories.json");
        {
            let store = RuleStore::open(JsonFileBackend::new(&path)).unwrap();
            store.add_category("Coffee").unwrap();
            store.add_keyword("Coffee", "STARBUCKS").unwrap();
        }
        let store = RuleStore::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(
            store.snapshot().keywords("Coffee").unwrap(),
            &["STARBUCKS".to_string()]
        );
    }

    #[test]
    fn open_normalizes_loaded_rules() {
        let loaded: RuleSet =
            serde_json::from_str(r#"{"Rent":["LANDLORD","LANDLORD"],"Uncategorized":["X"]}"#).unwrap();

        let store = RuleStore::open(MemoryBackend::with_rules(loaded)).unwrap();
        let rules = store.snapshot();
        assert_eq!(rules.keywords(UNCATEGORIZED).unwrap().len(), 0);
        assert_eq!(rules.keywords("Rent").unwrap(), &["LANDLORD".to_string()]);
    }

    #[test]
    fn open_reports_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            RuleStore::open(JsonFileBackend::new(&path)),
            Err(LoadError::Corrupt(_))
        ));
    }

    #[test]
    fn open_or_default_falls_back_explicitly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "garbage").unwrap();

        let (store, err) = RuleStore::open_or_default(JsonFileBackend::new(&path));
        assert!(matches!(err, Some(LoadError::Corrupt(_))));
        assert_eq!(store.snapshot(), RuleSet::default());
    }

    #[test]
    fn concurrent_keyword_adds_are_not_lost() {
        let (store, backend) = memory_store();
        store.add_category("Shops").unwrap();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.add_keyword("Shops", &format!("SHOP {i}")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(backend.stored().unwrap().keywords("Shops").unwrap().len(), 8);
    }

    #[test]
    fn assignable_categories() {
        assert!(is_assignable("Coffee"));
        assert!(!is_assignable(UNCATEGORIZED));
        assert!(!is_assignable("  "));
    }
}
