use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use scoop_query::config::{self, ScoopContext, Settings};
use scoop_query::manifest::Package;
use scoop_query::query::{QueryKind, ScoopQuery, UpdateStatus};
use scoop_query::version::HttpFetcher;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "SCOOP_QUERY_LOG";

#[derive(Parser)]
#[command(name = "scoop-query")]
#[command(version, about = "Query Scoop manifests and check upstream versions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Scoop root directory (skips discovery)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Upper bound for one version check in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Maximum number of search results
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Log level; falls back to $SCOOP_QUERY_LOG, then warn
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Also write logs to the data directory
    #[arg(long, global = true)]
    log_file: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List installed apps
    List {
        /// Case-insensitive name filter
        keyword: Option<String>,
    },
    /// Search apps from added buckets (`keyword` or `bucket/keyword`)
    Search { query: String },
    /// Check an app against its upstream version
    Check {
        /// App name, optionally prefixed with its bucket
        name: String,
    },
    /// Show the query kinds offered by the library
    Kinds,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(root) = &self.root {
            settings.scoop_home = Some(root.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.check_timeout_ms = timeout_ms;
        }
        if let Some(limit) = self.limit {
            settings.search_limit = limit;
        }
        settings
    }
}

/// Logs go to stderr so stdout stays parseable; the guard flushes the file writer
fn initialize_tracing(log_level: Option<LogLevel>, log_file: bool) -> Result<Option<WorkerGuard>> {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level.to_filter_directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if !log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    let log_path = config::log_path();
    let log_dir = log_path.parent().unwrap_or(Path::new("."));
    let log_name = log_path
        .file_name()
        .with_context(|| format!("Invalid log path {}", log_path.display()))?;
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(Some(guard))
}

fn print_packages(packages: &[Package]) {
    for package in packages {
        match &package.description {
            Some(description) => println!(
                "{} {} [{}] {}",
                package.name, package.version, package.bucket, description
            ),
            None => println!("{} {} [{}]", package.name, package.version, package.bucket),
        }
    }
}

/// Installed app with exactly this name, else the first bucket manifest with it
async fn find_package(
    query: &ScoopQuery,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Option<Package>> {
    let bare_name = name.rsplit('/').next().unwrap_or(name);
    let is_named = |package: &Package| package.name.eq_ignore_ascii_case(bare_name);

    if !name.contains('/') {
        let installed = query.list(bare_name, cancel).await?;
        if let Some(package) = installed.into_iter().find(is_named) {
            return Ok(Some(package));
        }
    }

    let found = query.search(name, cancel).await?;
    Ok(found.into_iter().find(is_named))
}

async fn check_command(query: &ScoopQuery, name: &str, cancel: &CancellationToken) -> Result<()> {
    let package = find_package(query, name, cancel)
        .await?
        .with_context(|| format!("No installed app or manifest named {}", name))?;

    match query.check_update(&package, cancel).await? {
        UpdateStatus::UpToDate => println!("{} {} is up to date", package.name, package.version),
        UpdateStatus::UpdateAvailable(latest) => println!(
            "{} {} -> {} update available",
            package.name, package.version, latest
        ),
        UpdateStatus::Unresolved => println!(
            "{} {}: latest version could not be determined",
            package.name, package.version
        ),
    }

    Ok(())
}

fn print_kinds() {
    for kind in QueryKind::ALL {
        println!("{:<8} {}", kind.as_str(), kind.description());
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    if matches!(cli.command, Command::Kinds) {
        print_kinds();
        return Ok(());
    }

    let context = ScoopContext::resolve(cli.settings());
    let fetcher = Arc::new(HttpFetcher::new()?);
    let query = ScoopQuery::new(&context, fetcher)
        .context("Scoop root not found; pass --root or set SCOOP")?;

    match cli.command {
        Command::List { keyword } => {
            let packages = query
                .query(QueryKind::List, keyword.as_deref().unwrap_or_default(), &cancel)
                .await?;
            print_packages(&packages);
        }
        Command::Search { query: raw } => {
            let packages = query.query(QueryKind::Search, &raw, &cancel).await?;
            print_packages(&packages);
        }
        Command::Check { name } => check_command(&query, &name, &cancel).await?,
        Command::Kinds => print_kinds(),
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = initialize_tracing(cli.log_level, cli.log_file)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            run(cli, cancel).await
        })
}
