use bankcards::application::{Bank, OpeningBalance, Stores};
use bankcards::config::AppConfig;
use bankcards::domain::card::CardView;
use bankcards::domain::money::Balance;
use bankcards::domain::page::{CardSort, Direction, PageRequest, TransactionSort};
use bankcards::domain::ports::SharedCodec;
use bankcards::domain::transaction::TransactionView;
use bankcards::infrastructure::clock::SystemClock;
use bankcards::interfaces::csv::command_reader::CommandReader;
use bankcards::interfaces::csv::report_writer::ReportWriter;
use bankcards::logging::init_logging;
use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Report {
    Cards,
    Transactions,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Which final state to print
    #[arg(long, value_enum, default_value_t = Report::Cards)]
    report: Report,

    /// Give every new card this balance instead of the configured policy
    #[arg(long)]
    opening_balance: Option<Decimal>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>, codec: SharedCodec) -> Result<Stores> {
    match db_path {
        Some(path) => Stores::rocksdb(path, codec).into_diagnostic(),
        None => Ok(Stores::in_memory(codec)),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>, codec: SharedCodec) -> Result<Stores> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Stores::in_memory(codec))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).into_diagnostic()?;
    if let Some(value) = cli.opening_balance {
        config.cards.opening_balance = OpeningBalance::Fixed(Balance::new(value).into_diagnostic()?);
    }
    init_logging(&config.logging).into_diagnostic()?;

    let codec: SharedCodec = Arc::new(config.encryption.build_cipher().into_diagnostic()?);
    let stores = open_stores(cli.db_path, codec)?;
    let bank = Bank::new(stores, Arc::new(SystemClock), config.cards.opening_balance);

    // Process commands
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = command.execute(&bank).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    // Output final state
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    match cli.report {
        Report::Cards => {
            let cards = collect_cards(&bank, config.page_size).await?;
            writer.write_cards(&cards).into_diagnostic()?;
        }
        Report::Transactions => {
            let transactions = collect_transactions(&bank, config.page_size).await?;
            writer.write_transactions(&transactions).into_diagnostic()?;
        }
    }

    Ok(())
}

async fn collect_cards(bank: &Bank, page_size: usize) -> Result<Vec<CardView>> {
    let mut all = Vec::new();
    for page in 0.. {
        let request = PageRequest::new(page, page_size).sorted_by(CardSort::Id, Direction::Asc);
        let batch = bank.cards.list(None, None, &request).await.into_diagnostic()?;
        let done = batch.len() < page_size;
        all.extend(batch);
        if done {
            break;
        }
    }
    Ok(all)
}

async fn collect_transactions(bank: &Bank, page_size: usize) -> Result<Vec<TransactionView>> {
    let mut all = Vec::new();
    for page in 0.. {
        let request =
            PageRequest::new(page, page_size).sorted_by(TransactionSort::Id, Direction::Asc);
        let batch = bank.ledger.query(None, None, &request).await.into_diagnostic()?;
        let done = batch.len() < page_size;
        all.extend(batch);
        if done {
            break;
        }
    }
    Ok(all)
}
