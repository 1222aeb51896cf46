//! fontseek - find the font files on this machine.
//!
//! Usage:
//!   fontseek                      List every font under the configured roots
//!   fontseek list --format json   Same, as JSON
//!   fontseek find QUERY           Fuzzy-filter fonts by name
//!   fontseek find QUERY --first   Print only the best match's path
//!   fontseek --help               Show help

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use tracing_subscriber::EnvFilter;

use fontseek_browse::{FontList, PathEcho};
use fontseek_core::{FontEntry, ScanConfig, ScanRequest, ScanResult, Settings};
use fontseek_scan::{CancellationToken, FontScanner};

#[derive(Parser)]
#[command(
    name = "fontseek",
    version,
    about = "Find the font files on this machine",
    long_about = "fontseek walks your font directories in parallel and lists every \
                  .ttf and .otf file it finds, sorted by name.\n\n\
                  Roots default to the usual Linux and macOS font directories, or \
                  to `roots` in the settings file."
)]
struct Cli {
    /// Directory to scan (repeatable, replaces the configured roots)
    #[arg(short, long = "root", value_name = "DIR", global = true)]
    roots: Vec<String>,

    /// Settings file (defaults to <config dir>/fontseek/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Stop scanning after this many seconds and show what was found
    #[arg(short, long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Also match upper- and mixed-case extensions such as .TTF
    #[arg(short = 'i', long, global = true)]
    ignore_case: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List every font found
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Fuzzy-filter fonts by name
    Find {
        /// Text to match against font names
        query: String,

        /// Print only the best match's path
        #[arg(long)]
        first: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    let mut config = settings.scan.clone();
    if cli.ignore_case {
        config.case_sensitive = false;
    }
    let request = if cli.roots.is_empty() {
        settings.request()
    } else {
        ScanRequest::new(cli.roots.iter().cloned())
    };

    let result = run_scan(config, &request, cli.timeout.map(Duration::from_secs)).await;

    match cli.command.unwrap_or(Command::List {
        format: OutputFormat::Text,
    }) {
        Command::List { format } => print_entries(result.entries.iter(), format)?,
        Command::Find {
            query,
            first,
            format,
        } => run_find(result, &query, first, format)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Could not load settings from {}", path.display())),
        None => match Settings::default_path() {
            Some(path) => Settings::load(&path).context("Could not load default settings"),
            None => Ok(Settings::default()),
        },
    }
}

/// Scan with Ctrl-C and the optional timeout wired to cancellation.
async fn run_scan(
    config: ScanConfig,
    request: &ScanRequest,
    timeout: Option<Duration>,
) -> ScanResult {
    let cancel = CancellationToken::new();

    // The first interrupt cancels the scan. Once the token is canceled the
    // handler stays installed, so a later interrupt has to exit by itself.
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !handle_interrupt(&on_interrupt) {
                std::process::exit(130);
            }
        }
    });
    let deadline = timeout.map(|limit| {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::info!(secs = limit.as_secs(), "scan timeout reached");
            on_deadline.cancel();
        })
    });

    let roots = request.len();
    eprintln!(
        "Scanning {roots} font director{}...",
        if roots == 1 { "y" } else { "ies" }
    );

    let scanner = FontScanner::with_config(config);
    let result = scanner.scan(&cancel, request).await;

    if let Some(deadline) = deadline {
        deadline.abort();
    }
    // Nothing left to cancel; interrupts while printing exit right away
    cancel.cancel();

    if result.is_canceled() {
        eprintln!("Scan canceled, results are partial");
    }
    eprintln!(
        "Found {} fonts in {:.2}s",
        result.len(),
        result.duration.as_secs_f64()
    );
    if !result.warnings.is_empty() {
        let skipped = result.warnings.len();
        eprintln!(
            "{skipped} entr{} skipped (use -vvv for details)",
            if skipped == 1 { "y" } else { "ies" }
        );
        for warning in &result.warnings {
            tracing::trace!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        }
    }

    result
}

/// Cancel on the first interrupt. Returns false when the process should exit.
fn handle_interrupt(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tracing::info!("interrupted, finishing with partial results");
    cancel.cancel();
    true
}

fn run_find(result: ScanResult, query: &str, first: bool, format: OutputFormat) -> Result<()> {
    let mut list = FontList::from(result);
    list.set_query(query);

    if first {
        return match list.choose(&mut PathEcho::stdout()) {
            Some(_) => Ok(()),
            None => Err(eyre!("No font matches {query:?}")),
        };
    }

    print_entries(list.visible(), format)
}

fn print_entries<'a>(
    entries: impl Iterator<Item = &'a FontEntry>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for entry in entries {
                println!("{}\t{}", entry.title(), entry.description());
            }
        }
        OutputFormat::Json => {
            let entries: Vec<&FontEntry> = entries.collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
