use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::rules::UNCATEGORIZED;

/// Stable identity of a transaction within one uploaded statement.
///
/// Assigned from the row's position in the file at parse time, so it does not
/// change when the displayed table is sorted or filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub usize);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a transaction: a debit is an expense, a credit is incoming money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Debit => write!(f, "Debit"),
            TransactionKind::Credit => write!(f, "Credit"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debit" => Ok(TransactionKind::Debit),
            "Credit" => Ok(TransactionKind::Credit),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub details: String,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: String,
}

impl Transaction {
    /// Builds a freshly parsed transaction. The category starts out as
    /// [`UNCATEGORIZED`].
    pub fn new(
        id: TransactionId,
        date: NaiveDate,
        details: impl Into<String>,
        amount: Money,
        kind: TransactionKind,
    ) -> Self {
        Transaction {
            id,
            date,
            details: details.into(),
            amount,
            kind,
            category: UNCATEGORIZED.to_string(),
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}
