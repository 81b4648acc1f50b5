use spendsort_core::{
    filter_by_type, summarize, total_by_type, CategoryTotal, Money, RuleError, Transaction,
    TransactionId, TransactionKind,
};
use spendsort_import::{import::import_statement, CategoryEngine, ParseError};
use spendsort_storage::{record_correction, PersistError, RuleStore, RuleStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("No transaction with id {0}")]
    UnknownTransaction(TransactionId),
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// The transaction was recategorized and the keyword learned in memory,
    /// but the rules could not be saved.
    #[error("Category changed but the learned keyword was not saved: {0}")]
    Persist(#[from] PersistError),
}

/// The transactions of one uploaded statement.
///
/// Lives until the next upload. The only thing that outlives it is what the
/// user's corrections taught the [`RuleStore`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    transactions: Vec<Transaction>,
}

impl Session {
    /// Parses a statement and categorizes it against the current rules.
    pub fn load_statement(data: &[u8], store: &RuleStore) -> Result<Self, ParseError> {
        let transactions = import_statement(data, &store.snapshot())?;
        tracing::info!("Parsed {} transactions", transactions.len());
        Ok(Self { transactions })
    }

    /// Re-runs categorization with the store's current rules. Returns how many
    /// transactions landed in a real category. This overwrites any corrections
    /// made in this session.
    pub fn recategorize(&mut self, store: &RuleStore) -> usize {
        CategoryEngine::new(&store.snapshot()).apply(&mut self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn debits(&self) -> impl Iterator<Item = &Transaction> {
        filter_by_type(&self.transactions, TransactionKind::Debit)
    }

    pub fn credits(&self) -> impl Iterator<Item = &Transaction> {
        filter_by_type(&self.transactions, TransactionKind::Credit)
    }

    /// Per-category totals over debits only.
    pub fn expense_summary(&self) -> Vec<CategoryTotal> {
        summarize(self.debits())
    }

    pub fn expense_total(&self) -> Money {
        total_by_type(&self.transactions, TransactionKind::Debit)
    }

    pub fn income_total(&self) -> Money {
        total_by_type(&self.transactions, TransactionKind::Credit)
    }

    /// Moves a transaction to `new_category` and teaches the store its details
    /// as a keyword for that category.
    ///
    /// On [`CorrectionError::Persist`] the move and the learned keyword are
    /// both in effect; only the save failed.
    pub fn apply_correction(
        &mut self,
        id: TransactionId,
        new_category: &str,
        store: &RuleStore,
    ) -> Result<bool, CorrectionError> {
        if !store.contains_category(new_category) {
            return Err(CorrectionError::UnknownCategory(new_category.to_string()));
        }
        let tx = self
            .transactions
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or(CorrectionError::UnknownTransaction(id))?;

        let previous = std::mem::replace(&mut tx.category, new_category.to_string());

        match record_correction(tx, &previous, new_category, store) {
            Ok(learned) => Ok(learned),
            Err(RuleStoreError::Persist(e)) => Err(e.into()),
            Err(RuleStoreError::Rule(e)) => {
                tx.category = previous;
                Err(e.into())
            }
        }
    }
}
