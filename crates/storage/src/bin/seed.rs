use std::fmt;

use storage::repository::Storage;
use storage::sqlite::PoolSettings;
use vocab_core::Dictionary;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    dictionary: String,
    limit: Option<usize>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("VOCAB_DB_URL")
            .unwrap_or_else(|_| "sqlite:vocab.sqlite3?mode=rwc".into());
        let mut dictionary =
            std::env::var("VOCAB_DICTIONARY_PATH").unwrap_or_else(|_| "dictionary.xml".into());
        let mut limit = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--dictionary" => {
                    dictionary = require_value(&mut args, "--dictionary")?;
                }
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    limit = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            dictionary,
            limit,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Copies dictionary entries into the shared default word list.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:vocab.sqlite3?mode=rwc)");
    eprintln!("  --dictionary <path>       Dictionary XML (default: dictionary.xml)");
    eprintln!("  --limit <n>               Import at most n entries");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  VOCAB_DB_URL, VOCAB_DICTIONARY_PATH");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let xml = tokio::fs::read_to_string(&args.dictionary).await?;
    let dictionary = Dictionary::from_xml_str(&xml)?;
    let (storage, repo) = Storage::sqlite(&args.db_url, PoolSettings::default()).await?;

    let limit = args.limit.unwrap_or(usize::MAX);
    let mut inserted = 0_usize;
    for pair in dictionary.entries().iter().take(limit) {
        if storage.words.add_default_word(pair).await? {
            inserted += 1;
        }
    }
    repo.close().await;

    println!(
        "Imported {inserted} of {} dictionary entries from {} into {}",
        dictionary.len().min(limit),
        args.dictionary,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
