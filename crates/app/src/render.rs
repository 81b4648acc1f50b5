//! Plain-text tables for the command line.

use spendsort_core::{CategoryTotal, Money, Transaction};

const DISPLAY_DATE_FORMAT: &str = "%d/%b/%Y";

pub fn format_amount(amount: Money, currency: &str) -> String {
    format!("{amount} {currency}")
}

pub fn transactions_table<'a, I>(transactions: I, currency: &str) -> String
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let rows: Vec<[String; 5]> = transactions
        .into_iter()
        .map(|tx| {
            [
                tx.id.to_string(),
                tx.date.format(DISPLAY_DATE_FORMAT).to_string(),
                tx.details.clone(),
                format_amount(tx.amount, currency),
                tx.category.clone(),
            ]
        })
        .collect();
    table(["ID", "Date", "Details", "Amount", "Category"], &rows)
}

pub fn summary_table(summary: &[CategoryTotal], currency: &str) -> String {
    let rows: Vec<[String; 3]> = summary
        .iter()
        .map(|row| {
            [
                row.category.clone(),
                format_amount(row.total, currency),
                format!("{}%", row.share),
            ]
        })
        .collect();
    table(["Category", "Amount", "Share"], &rows)
}

fn table<const N: usize>(header: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = header.map(str::len);
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(header.to_vec());
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}
