use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reserved fallback category. Always present, never holds keywords and
/// is never a match target.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),
    #[error("Category 'Uncategorized' is reserved and cannot hold keywords")]
    ReservedCategory,
}

/// Category name → keyword list, in insertion order.
///
/// Serializes as a single flat JSON object. Iteration order is the order in
/// which categories were added, and it decides which category wins when a
/// keyword appears under more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(IndexMap<String, Vec<String>>);

impl Default for RuleSet {
    fn default() -> Self {
        let mut map = IndexMap::new();
        map.insert(UNCATEGORIZED.to_string(), Vec::new());
        RuleSet(map)
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.0.get(category).map(Vec::as_slice)
    }

    /// All categories in iteration order, the reserved one included.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, kws)| (name.as_str(), kws.as_slice()))
    }

    pub fn category_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds an empty category. Returns `false` for a blank name or one that
    /// already exists.
    pub fn insert_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), Vec::new());
        true
    }

    /// Appends a trimmed keyword to an existing category. Returns `Ok(false)`
    /// when the trimmed keyword is empty or already listed there.
    pub fn insert_keyword(&mut self, category: &str, keyword: &str) -> Result<bool, RuleError> {
        if category == UNCATEGORIZED {
            return Err(RuleError::ReservedCategory);
        }
        let keywords = self
            .0
            .get_mut(category)
            .ok_or_else(|| RuleError::UnknownCategory(category.to_string()))?;

        let keyword = keyword.trim();
        if keyword.is_empty() || keywords.iter().any(|k| k == keyword) {
            return Ok(false);
        }
        keywords.push(keyword.to_string());
        Ok(true)
    }

    /// Restores the invariants on a rule set read from outside: the reserved
    /// category exists and is empty, and no category lists a blank or
    /// repeated keyword. Returns how many keywords were dropped.
    pub fn normalize(&mut self) -> usize {
        let mut dropped = 0;

        match self.0.get_mut(UNCATEGORIZED) {
            Some(reserved) => {
                dropped += reserved.len();
                reserved.clear();
            }
            None => {
                self.0.shift_insert(0, UNCATEGORIZED.to_string(), Vec::new());
            }
        }

        for keywords in self.0.values_mut() {
            let before = keywords.len();
            let mut seen: Vec<String> = Vec::with_capacity(before);
            for kw in keywords.drain(..) {
                let kw = kw.trim().to_string();
                if !kw.is_empty() && !seen.contains(&kw) {
                    seen.push(kw);
                }
            }
            dropped += before - seen.len();
            *keywords = seen;
        }

        dropped
    }
}
