//! Learns keywords from manual category corrections.

use spendsort_core::Transaction;

use crate::store::{is_assignable, RuleStore, RuleStoreError};

/// Teaches the store that `transaction.details` belongs to `new_category`.
///
/// Nothing happens when the category did not actually change, or when the new
/// category is the reserved fallback. The transaction itself is left alone;
/// updating its category is the caller's job. Returns whether a keyword was
/// added.
pub fn record_correction(
    transaction: &Transaction,
    previous_category: &str,
    new_category: &str,
    store: &RuleStore,
) -> Result<bool, RuleStoreError> {
    if new_category == previous_category || !is_assignable(new_category) {
        return Ok(false);
    }
    let learned = store.add_keyword(new_category, &transaction.details)?;
    if learned {
        tracing::debug!(
            "Transaction {} moved from '{previous_category}' to '{new_category}'",
            transaction.id
        );
    }
    Ok(learned)
}
