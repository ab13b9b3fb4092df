use std::fmt;
use std::sync::Arc;

use certify_core::model::AssessmentId;
use certify_core::{EmptyStepPolicy, RetakePolicy};
use chrono::Utc;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppConfig, AppServices, Clock};
use storage::seed::seed_attempt_history;
use storage::sqlite::SqliteRepository;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPolicy { flag: &'static str, raw: String },
    InvalidAttempts { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPolicy { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
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

struct Args {
    config: AppConfig,
    competency: AssessmentId,
    attempts: u32,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui   [--api <url>] [--db <sqlite_url>]");
    eprintln!("                           [--retake-policy <repeat|advance|conclude>]");
    eprintln!("                           [--empty-step <stuck|zero>]");
    eprintln!("  cargo run -p app -- seed [--db <sqlite_url>] [--competency <id>] [--attempts <n>]");
    eprintln!();
    eprintln!("Defaults for ui:");
    eprintln!("  --api http://localhost:5000/api/v1/");
    eprintln!("  --db sqlite://certify.sqlite3");
    eprintln!("  --retake-policy repeat");
    eprintln!("  --empty-step stuck");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CERTIFY_API_URL, CERTIFY_DB_URL, CERTIFY_RETAKE_POLICY, CERTIFY_EMPTY_STEP");
    eprintln!("  RUST_LOG (default: info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

impl Args {
    /// Flags override the `CERTIFY_*` environment.
    fn parse(
        mut config: AppConfig,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut competency = AssessmentId::new("digital-literacy");
        let mut attempts = 6;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => config.api_url = require_value(args, "--api")?,
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = value;
                }
                "--retake-policy" => {
                    let value = require_value(args, "--retake-policy")?;
                    config.retake_policy =
                        value
                            .parse::<RetakePolicy>()
                            .map_err(|_| ArgsError::InvalidPolicy {
                                flag: "--retake-policy",
                                raw: value.clone(),
                            })?;
                }
                "--empty-step" => {
                    let value = require_value(args, "--empty-step")?;
                    config.empty_step =
                        value
                            .parse::<EmptyStepPolicy>()
                            .map_err(|_| ArgsError::InvalidPolicy {
                                flag: "--empty-step",
                                raw: value.clone(),
                            })?;
                }
                "--competency" => {
                    competency = AssessmentId::new(require_value(args, "--competency")?);
                }
                "--attempts" => {
                    let value = require_value(args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        config.db_url = normalize_sqlite_url(config.db_url);
        Ok(Self {
            config,
            competency,
            attempts,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: launching UI when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let env_config = AppConfig::from_env()?;
    let mut iter = argv.into_iter();
    let parsed = Args::parse(env_config, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    parsed.config.validate()?;

    // The local attempt log lives in SQLite; make sure the file can be opened.
    prepare_sqlite_file(&parsed.config.db_url)?;

    match cmd {
        Command::Ui => {
            info!(api = %parsed.config.api_url, db = %parsed.config.db_url, "starting ui");
            let services = AppServices::from_config(&parsed.config, Clock::system())
                .await?
                .with_runtime(Handle::current());
            let app: Arc<dyn UiApp> = Arc::new(services);
            let context = build_app_context(&app);

            // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Certify")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Seed => {
            let repo = SqliteRepository::connect(&parsed.config.db_url).await?;
            repo.migrate().await?;
            let written =
                seed_attempt_history(&repo, &parsed.competency, parsed.attempts, Utc::now())
                    .await?;
            info!(written, competency = %parsed.competency, "attempt log seeded");
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse(AppConfig::default(), &mut iter)
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "--api",
            "https://certify.example/api/v1/",
            "--db",
            "sqlite::memory:",
            "--retake-policy",
            "conclude",
            "--empty-step",
            "zero",
        ])
        .unwrap();
        assert_eq!(args.config.api_url, "https://certify.example/api/v1/");
        assert_eq!(args.config.db_url, "sqlite::memory:");
        assert_eq!(args.config.retake_policy, RetakePolicy::Conclude);
        assert_eq!(args.config.empty_step, EmptyStepPolicy::ZeroScore);
    }

    #[test]
    fn relative_db_paths_become_absolute() {
        let args = parse(&["--db", "data/certify.sqlite3"]).unwrap();
        assert!(args.config.db_url.starts_with("sqlite:///"));
        assert!(args.config.db_url.ends_with("data/certify.sqlite3"));
    }

    #[test]
    fn rejects_unknown_and_invalid_values() {
        assert!(matches!(parse(&["--nope"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            parse(&["--retake-policy", "sometimes"]),
            Err(ArgsError::InvalidPolicy { .. })
        ));
        assert!(matches!(parse(&["--db"]), Err(ArgsError::MissingValue { flag: "--db" })));
        assert!(matches!(
            parse(&["--attempts", "-1"]),
            Err(ArgsError::InvalidAttempts { .. })
        ));
    }
}
