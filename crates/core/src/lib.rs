pub mod money;
pub mod rules;
pub mod summary;
pub mod transaction;

pub use money::Money;
pub use rules::{RuleError, RuleSet, UNCATEGORIZED};
pub use summary::{filter_by_type, summarize, total_by_type, CategoryTotal};
pub use transaction::{Transaction, TransactionId, TransactionKind};
