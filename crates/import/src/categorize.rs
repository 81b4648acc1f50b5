use spendsort_core::{RuleSet, Transaction, UNCATEGORIZED};

/// A category with its keywords lower-cased once up front.
struct CompiledCategory {
    name: String,
    keywords: Vec<String>,
}

/// Assigns categories by exact, case-insensitive comparison of a
/// transaction's full details against each category's keywords.
///
/// Categories are tried in rule set order and the first match wins. The
/// reserved category and categories without keywords are never candidates.
pub struct CategoryEngine {
    categories: Vec<CompiledCategory>,
}

impl CategoryEngine {
    pub fn new(rules: &RuleSet) -> Self {
        let categories = rules
            .categories()
            .filter(|(name, keywords)| *name != UNCATEGORIZED && !keywords.is_empty())
            .map(|(name, keywords)| CompiledCategory {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn find_category(&self, details: &str) -> Option<&str> {
        let details = details.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.keywords.iter().any(|k| *k == details))
            .map(|c| c.name.as_str())
    }

    /// Recomputes the category of every transaction in place. Returns how many
    /// ended up in a category other than the reserved one.
    pub fn apply(&self, transactions: &mut [Transaction]) -> usize {
        let mut matched = 0;
        for tx in transactions.iter_mut() {
            tx.category = match self.find_category(&tx.details) {
                Some(name) => {
                    matched += 1;
                    name.to_string()
                }
                None => UNCATEGORIZED.to_string(),
            };
        }
        tracing::debug!(
            "Categorized {matched} of {} transactions against {} categories",
            transactions.len(),
            self.categories.len()
        );
        matched
    }
}

/// Returns the transactions with categories assigned from `rules`, same length
/// and order. Running it again with the same rules changes nothing.
pub fn categorize(mut transactions: Vec<Transaction>, rules: &RuleSet) -> Vec<Transaction> {
    CategoryEngine::new(rules).apply(&mut transactions);
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use spendsort_core::{Money, TransactionId, TransactionKind};

    fn make_tx(id: usize, details: &str) -> Transaction {
        Transaction::new(
            TransactionId(id),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            details,
            Money::from_cents(500),
            TransactionKind::Debit,
        )
    }

    fn make_rules(entries: &[(&str, &[&str])]) -> RuleSet {
        let mut rules = RuleSet::new();
        for (category, keywords) in entries {
            rules.insert_category(category);
            for kw in *keywords {
                rules.insert_keyword(category, kw).unwrap();
            }
        }
        rules
    }

    #[test]
    fn exact_match_case_insensitive() {
        let engine = CategoryEngine::new(&make_rules(&[("Coffee", &["Starbucks"])]));
        assert_eq!(engine.find_category("STARBUCKS"), Some("Coffee"));
        assert_eq!(engine.find_category("starbucks"), Some("Coffee"));
    }

    #[test]
    fn substring_does_not_match() {
        let engine = CategoryEngine::new(&make_rules(&[("Coffee", &["STARBUCKS"])]));
        assert_eq!(engine.find_category("STARBUCKS RESERVE"), None);
        assert_eq!(engine.find_category("STAR"), None);
    }

    #[test]
    fn unmatched_stays_uncategorized() {
        let rules = make_rules(&[("Coffee", &["STARBUCKS"])]);
        let txs = categorize(vec![make_tx(0, "WHOLE FOODS")], &rules);
        assert_eq!(txs[0].category, UNCATEGORIZED);
    }

    #[test]
    fn first_category_in_rule_order_wins() {
        let rules = make_rules(&[("Food", &["DELI"]), ("Lunch", &["DELI"])]);
        let txs = categorize(vec![make_tx(0, "deli")], &rules);
        assert_eq!(txs[0].category, "Food");
    }

    #[test]
    fn empty_categories_are_skipped() {
        let rules = make_rules(&[("Empty", &[]), ("Coffee", &["COSTA"])]);
        let engine = CategoryEngine::new(&rules);
        assert_eq!(engine.find_category("COSTA"), Some("Coffee"));
        assert_eq!(engine.categories.len(), 1);
    }

    #[test]
    fn stale_category_is_reset() {
        let rules = make_rules(&[("Coffee", &["STARBUCKS"])]);
        let mut tx = make_tx(0, "UNKNOWN SHOP");
        tx.category = "Coffee".to_string();
        let txs = categorize(vec![tx], &rules);
        assert_eq!(txs[0].category, UNCATEGORIZED);
    }

    #[test]
    fn categorize_preserves_length_and_order() {
        let rules = make_rules(&[("Coffee", &["STARBUCKS"]), ("Rent", &["LANDLORD"])]);
        let txs = vec![make_tx(0, "LANDLORD"), make_tx(1, "X"), make_tx(2, "starbucks")];
        let out = categorize(txs, &rules);
        let got: Vec<_> = out.iter().map(|t| (t.id.0, t.category.as_str())).collect();
        assert_eq!(got, vec![(0, "Rent"), (1, UNCATEGORIZED), (2, "Coffee")]);
    }

    #[test]
    fn categorize_is_idempotent() {
        let rules = make_rules(&[("Coffee", &["STARBUCKS"]), ("Rent", &["LANDLORD"])]);
        let txs = vec![make_tx(0, "LANDLORD"), make_tx(1, "X"), make_tx(2, "Starbucks")];
        let once = categorize(txs, &rules);
        let twice = categorize(once.clone(), &rules);
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_counts_matches() {
        let engine = CategoryEngine::new(&make_rules(&[("Coffee", &["STARBUCKS"])]));
        let mut txs = vec![make_tx(0, "STARBUCKS"), make_tx(1, "X")];
        assert_eq!(engine.apply(&mut txs), 1);
    }

    #[test]
    fn no_rules_leaves_everything_uncategorized() {
        let txs = categorize(vec![make_tx(0, "A"), make_tx(1, "B")], &RuleSet::new());
        assert!(txs.iter().all(Transaction::is_uncategorized));
    }
}
