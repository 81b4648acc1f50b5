use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendsort_core::{Money, Transaction, TransactionId, TransactionKind};
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;

pub const DATE_COLUMN: &str = "Date";
pub const DETAILS_COLUMN: &str = "Details";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const TYPE_COLUMN: &str = "Debit/Credit";

/// Statement dates look like `05 Jan 2024`.
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Largest accepted amount, in whole currency units. Keeps statement totals
/// far inside `Decimal`'s range so summing rows cannot overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Invalid amount on line {line}: '{value}'")]
    InvalidAmount { line: u64, value: String },
    #[error("Invalid date on line {line}: '{value}' (expected e.g. 05 Jan 2024)")]
    InvalidDate { line: u64, value: String },
    #[error("Invalid Debit/Credit value on line {line}: '{value}'")]
    InvalidType { line: u64, value: String },
    #[error("Malformed CSV: {0}")]
    MalformedCsv(#[from] csv::Error),
}

/// Column positions of the required fields, resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMapping {
    date: usize,
    details: usize,
    amount: usize,
    kind: usize,
}

impl ColumnMapping {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(ParseError::MissingColumn(name))
        };
        Ok(Self {
            date: find(DATE_COLUMN)?,
            details: find(DETAILS_COLUMN)?,
            amount: find(AMOUNT_COLUMN)?,
            kind: find(TYPE_COLUMN)?,
        })
    }
}

/// Parses a bank statement export into transactions, in file order.
///
/// Any bad row aborts the whole parse; callers never see a partial statement.
pub fn parse<R: Read>(data: R) -> Result<Vec<Transaction>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mapping = ColumnMapping::from_headers(reader.headers()?)?;

    let mut transactions = Vec::new();
    for result in reader.records() {
        let record = result?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line());
        let field = |col: usize| record.get(col).unwrap_or_default();

        let date = parse_date(field(mapping.date), line)?;
        let amount = parse_amount(field(mapping.amount), line)?;
        let kind = field(mapping.kind)
            .parse::<TransactionKind>()
            .map_err(|_| ParseError::InvalidType {
                line,
                value: field(mapping.kind).to_string(),
            })?;

        transactions.push(Transaction::new(
            TransactionId(transactions.len()),
            date,
            field(mapping.details),
            amount,
            kind,
        ));
    }

    Ok(transactions)
}

pub fn parse_bytes(data: &[u8]) -> Result<Vec<Transaction>, ParseError> {
    parse(data)
}

fn parse_date(s: &str, line: u64) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| ParseError::InvalidDate {
        line,
        value: s.to_string(),
    })
}

/// Amounts are non-negative decimals that may carry thousands separators.
fn parse_amount(s: &str, line: u64) -> Result<Money, ParseError> {
    let invalid = || ParseError::InvalidAmount {
        line,
        value: s.to_string(),
    };
    let cleaned = s.trim().replace(',', "");
    let dec = Decimal::from_str(&cleaned).map_err(|_| invalid())?;
    let money = Money::new(dec);
    if money.is_negative() || dec > Decimal::from(MAX_AMOUNT) {
        return Err(invalid());
    }
    Ok(money)
}
