//! Per-category and per-type totals over categorized transactions.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::money::Money;
use super::transaction::{Transaction, TransactionKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    /// Percentage of the grand total, one decimal place. Zero when the grand
    /// total is zero.
    pub share: Decimal,
}

/// Sums amounts per category, largest total first. Equal totals are ordered by
/// category name so the output is deterministic.
pub fn summarize<'a, I>(transactions: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.category.as_str()).or_default() += tx.amount;
    }

    let grand_total: Money = totals.values().copied().sum();

    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            share: share_of(total, grand_total),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

pub fn total_by_type<'a, I>(transactions: I, kind: TransactionKind) -> Money
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

pub fn filter_by_type<'a, I>(transactions: I, kind: TransactionKind) -> impl Iterator<Item = &'a Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions.into_iter().filter(move |tx| tx.kind == kind)
}

fn share_of(part: Money, whole: Money) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part.as_decimal() * Decimal::ONE_HUNDRED / whole.as_decimal()).round_dp(1)
}
