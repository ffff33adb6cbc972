use clap::{Parser, ValueEnum};
use ledger_engine::application::engine::LedgerEngine;
use ledger_engine::config::{DEFAULT_MAX_PATH_HOPS, DEFAULT_MAX_PATH_RESULTS, EngineConfig};
use ledger_engine::domain::ports::LedgerStoreBox;
use ledger_engine::infrastructure::in_memory::InMemoryLedgerStore;
use ledger_engine::interfaces::csv::account_reader::AccountReader;
use ledger_engine::interfaces::csv::ledger_writer::LedgerWriter;
use ledger_engine::interfaces::csv::operation_reader::OperationReader;
use ledger_engine::logging::{DEFAULT_LOG_LEVEL, setup_logging};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Balances,
    Offers,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Genesis accounts CSV file (`account,native`), applied before the operations.
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Which part of the final state to print.
    #[arg(long, value_enum, default_value_t = Output::Balances)]
    output: Output,

    /// Maximum intermediate assets in a path payment.
    #[arg(long, default_value_t = DEFAULT_MAX_PATH_HOPS)]
    max_path_hops: usize,

    /// Maximum quotes returned by path discovery.
    #[arg(long, default_value_t = DEFAULT_MAX_PATH_RESULTS)]
    max_path_results: usize,

    /// Log level or filter directive.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    use ledger_engine::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?)),
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryLedgerStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.log_json);

    let config = EngineConfig {
        max_path_hops: cli.max_path_hops,
        max_path_results: cli.max_path_results,
    };
    let engine = LedgerEngine::new(open_store(cli.db_path)?, config);

    if let Some(path) = cli.accounts {
        let file = File::open(path).into_diagnostic()?;
        for record in AccountReader::new(file).accounts() {
            match record {
                Ok(genesis) => {
                    if let Err(e) = engine.fund_account(genesis.account, genesis.native).await {
                        eprintln!("Error funding account: {}", e);
                    }
                }
                Err(e) => eprintln!("Error reading account: {}", e),
            }
        }
    }

    let file = File::open(cli.input).into_diagnostic()?;
    for entry in OperationReader::new(file).transactions() {
        match entry {
            Ok(entry) => {
                if let Err(e) = engine.submit(entry.transaction).await {
                    eprintln!("Error processing transaction {}: {}", entry.tx, e);
                }
            }
            Err(e) => eprintln!("Error reading transaction: {}", e),
        }
    }

    let ledger = engine.snapshot().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = LedgerWriter::new(stdout.lock());
    let written = match cli.output {
        Output::Balances => writer.write_balances(&ledger),
        Output::Offers => writer.write_offers(&ledger),
    };
    written.into_diagnostic()?;

    Ok(())
}
