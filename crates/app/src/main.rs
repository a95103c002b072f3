use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use services::{AppConfig, AppServices, ChatController, Clock, Incoming, Input, Profile, Reply};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vocab_core::model::UserId;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

/// Command-line overrides on top of the environment configuration.
#[derive(Debug, Default)]
struct Args {
    db_url: Option<String>,
    dictionary: Option<PathBuf>,
    user_id: Option<u64>,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(value);
                }
                "--dictionary" => {
                    parsed.dictionary = Some(require_value(&mut args, "--dictionary")?.into());
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    let id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    parsed.user_id = Some(id);
                }
                "--help" | "-h" => parsed.help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.db_url {
            config.db_url.clone_from(url);
        }
        if let Some(path) = &self.dictionary {
            config.dictionary_path.clone_from(path);
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--dictionary <path>] [--user <id>]");
    eprintln!();
    eprintln!("Lines are sent as chat messages. Prefix a line with '!' to press a button,");
    eprintln!("e.g. '!start_test'. Button data is printed in brackets after each reply.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VOCAB_DB_URL, VOCAB_DICTIONARY_PATH, VOCAB_WORDS_PER_PAGE, RUST_LOG, ...");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line.strip_prefix('!') {
        Some(data) => Input::Button(data.trim().to_owned()),
        None => Input::Text(line.to_owned()),
    })
}

fn render_reply(reply: &Reply) -> String {
    let mut out = String::new();
    for message in &reply.messages {
        out.push_str(&message.text);
        out.push('\n');
        for row in &message.keyboard {
            let cells: Vec<String> = row
                .iter()
                .map(|button| format!("[{}] {}", button.data(), button.label))
                .collect();
            out.push_str("  ");
            out.push_str(&cells.join("  "));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

async fn chat_loop(
    controller: &ChatController,
    user_id: UserId,
    clock: Clock,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut purge = tokio::time::interval(PURGE_INTERVAL);
    let profile = Profile {
        username: std::env::var("USER").unwrap_or_default(),
        ..Profile::default()
    };

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    info!("stdin closed");
                    return Ok(());
                };
                let Some(input) = parse_line(&line) else {
                    continue;
                };
                let incoming = Incoming {
                    user_id,
                    profile: profile.clone(),
                    input,
                };
                let reply = controller.handle(incoming).await;
                stdout.write_all(render_reply(&reply).as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = purge.tick() => {
                controller.states().purge_expired(clock.now());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.help {
        print_usage();
        return Ok(());
    }

    init_tracing();

    let mut config = AppConfig::load().context("invalid configuration")?;
    args.apply(&mut config);
    let user_id = UserId::new(args.user_id.unwrap_or(1));

    let clock = Clock::default();
    let services = AppServices::new_sqlite(&config, clock)
        .await
        .with_context(|| format!("open storage at {}", config.db_url))?;
    let controller = ChatController::new(&services, &config);
    info!(user_id = user_id.value(), "chat ready");

    let outcome = chat_loop(&controller, user_id, clock).await;
    if let Err(err) = &outcome {
        warn!(error = %err, "chat loop stopped");
    }
    services.close().await;
    outcome
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::{Action, Button, OutgoingMessage};

    #[test]
    fn bang_prefix_marks_button_data() {
        assert!(matches!(parse_line("!start_test"), Some(Input::Button(d)) if d == "start_test"));
        assert!(matches!(parse_line(" hello "), Some(Input::Text(t)) if t == "hello"));
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = Args::parse(
            ["--db", "sqlite::memory:", "--user", "42"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(args.user_id, Some(42));
    }

    #[test]
    fn bad_user_id_is_rejected() {
        let err = Args::parse(["--user", "abc"].into_iter().map(String::from)).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidUserId { .. }));
    }

    #[test]
    fn buttons_are_printed_with_their_data() {
        let reply = Reply::one(
            OutgoingMessage::text("Главное меню:")
                .with_row(vec![Button::new("Тест", Action::StartQuiz)]),
        );
        let out = render_reply(&reply);
        assert!(out.contains("[start_test] Тест"));
    }
}
