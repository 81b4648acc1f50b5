use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spendsort::render::{format_amount, summary_table, transactions_table};
use spendsort::{Config, CorrectionError, Session};
use spendsort_core::TransactionId;
use spendsort_storage::{JsonFileBackend, RuleStore, RuleStoreError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spendsort", version, about = "Sort bank statement spending into categories")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Category rules file, overriding the config
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Categorize a statement and print expenses, the expense summary and income
    Report { statement: PathBuf },
    /// Move one transaction to another category and learn its details as a keyword
    Correct {
        statement: PathBuf,
        id: usize,
        category: String,
    },
    /// Create an empty category
    AddCategory { name: String },
    /// Add a keyword to a category
    AddKeyword { category: String, keyword: String },
    /// List categories and their keywords
    Categories,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(spendsort::config::default_config_path);
    let config = Config::load(&config_path)?;
    let rules_path = cli.rules.clone().unwrap_or_else(|| config.rules_path());
    let currency = config.currency();

    let (store, load_error) = RuleStore::open_or_default(JsonFileBackend::new(&rules_path));
    if let Some(e) = load_error {
        eprintln!(
            "warning: {e}. Starting from an empty rule set; the next change will overwrite {}",
            rules_path.display()
        );
    }

    match cli.command {
        Command::Report { statement } => {
            let session = load_session(&statement, &store)?;
            print_report(&session, currency);
        }
        Command::Correct {
            statement,
            id,
            category,
        } => {
            let mut session = load_session(&statement, &store)?;
            match session.apply_correction(TransactionId(id), &category, &store) {
                Ok(true) => println!("Learned a new keyword for '{category}'."),
                Ok(false) => println!("No new keyword learned."),
                Err(CorrectionError::Persist(e)) => {
                    eprintln!("warning: {e}. The change only applies to this run.");
                }
                Err(e) => return Err(e.into()),
            }
            print_report(&session, currency);
        }
        Command::AddCategory { name } => {
            if report_persist(store.add_category(&name))? {
                println!("Category '{}' added.", name.trim());
            } else {
                println!("Category '{}' already exists or is blank.", name.trim());
            }
        }
        Command::AddKeyword { category, keyword } => {
            if report_persist(store.add_keyword(&category, &keyword))? {
                println!("Keyword '{}' added to '{category}'.", keyword.trim());
            } else {
                println!("Keyword '{}' is blank or already in '{category}'.", keyword.trim());
            }
        }
        Command::Categories => {
            for (name, keywords) in store.snapshot().categories() {
                println!("{name}: {}", keywords.join(", "));
            }
        }
    }

    Ok(())
}

fn load_session(statement: &Path, store: &RuleStore) -> Result<Session> {
    let data = std::fs::read(statement)
        .with_context(|| format!("reading {}", statement.display()))?;
    Session::load_statement(&data, store)
        .with_context(|| format!("Error loading the file {}", statement.display()))
}

/// Persist failures are warnings: the change still holds for this run.
fn report_persist(result: Result<bool, RuleStoreError>) -> Result<bool> {
    match result {
        Ok(changed) => Ok(changed),
        Err(RuleStoreError::Persist(e)) => {
            eprintln!("warning: {e}");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(session: &Session, currency: &str) {
    println!("Expenses (Debits)");
    print!("{}", transactions_table(session.debits(), currency));
    println!();
    println!("Expense Summary");
    print!("{}", summary_table(&session.expense_summary(), currency));
    println!();
    println!("Payments (Credits)");
    print!("{}", transactions_table(session.credits(), currency));
    println!("Total Income: {}", format_amount(session.income_total(), currency));
}
