use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::prelude::*;

use ipcheck::config::Config;
use ipcheck::db::{self, HistoryStore, SqliteHistoryStore};
use ipcheck::error::AnalyzeError;
use ipcheck::output::{persist, report, terminal};
use ipcheck::pipeline::analyze::Analyzer;

/// ipcheck: ownership, reputation, device and location intelligence for an IP address.
///
/// Queries RDAP, AbuseIPDB, Shodan and a geolocation service, keeps a local
/// location history per IP, and writes a plain-text report.
#[derive(Parser)]
#[command(name = "ipcheck", version, about)]
struct Cli {
    /// Runs the interactive menu when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directories and the history database
    Init,

    /// Analyze an IP address and write a report
    Analyze {
        /// IPv4 or IPv6 address
        ip: String,

        /// Print the report without saving it to the results directory
        #[arg(long)]
        no_save: bool,
    },

    /// Show the stored location history for an IP address
    History {
        /// IPv4 or IPv6 address
        ip: String,
    },

    /// Interactive menu (analyze, view history, exit)
    Menu,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load()?;
    let _log_guard = init_logging(&config.logs_dir())?;

    let conn = db::initialize(&config.db_path)?;
    let store: Arc<dyn HistoryStore> = Arc::new(SqliteHistoryStore::new(conn));

    match cli.command {
        Some(Commands::Init) => {
            std::fs::create_dir_all(config.results_dir()).with_context(|| {
                format!("Failed to create {}", config.results_dir().display())
            })?;
            let table_count = store.table_count().await?;
            let record_count = store.record_count().await?;
            println!("Database initialized at: {}", config.db_path.display());
            println!("Tables: {table_count}  History records: {record_count}");
            println!("Reports will be written to: {}", config.results_dir().display());
            print_key_status(&config);
        }

        Some(Commands::Analyze { ip, no_save }) => {
            let analyzer = Analyzer::from_config(&config, store)?;
            analyze_and_report(&analyzer, &config.results_dir(), &ip, !no_save).await?;
        }

        Some(Commands::History { ip }) => {
            let analyzer = Analyzer::from_config(&config, store)?;
            let history = analyzer.history(&ip).await?;
            terminal::display_history(&ip, &history);
        }

        Some(Commands::Menu) | None => {
            let analyzer = Analyzer::from_config(&config, store)?;
            run_menu(&analyzer, &config).await?;
        }
    }

    Ok(())
}

/// Log to stderr (RUST_LOG, default ipcheck=info) and to a daily rolling
/// file that always captures INFO and above.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole run.
fn init_logging(logs_dir: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "ipcheck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ipcheck=info")),
        );

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn print_key_status(config: &Config) {
    let status = |configured: bool| {
        if configured {
            "configured".green()
        } else {
            "not set (section will be unavailable)".yellow()
        }
    };
    println!("  AbuseIPDB key: {}", status(config.abuseipdb_api_key.is_some()));
    println!("  Shodan key:    {}", status(config.shodan_api_key.is_some()));
}

/// Run one analysis, print the report, optionally save it.
async fn analyze_and_report(
    analyzer: &Analyzer,
    results_dir: &Path,
    ip: &str,
    save: bool,
) -> Result<(), AnalyzeError> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Analyzing {ip}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = analyzer.analyze(ip).await;
    spinner.finish_and_clear();
    let result = result?;

    let analyzed_at = Local::now();
    let text = report::format_report(&result, analyzed_at);
    terminal::display_report(&text);

    if save {
        match persist::save_report(results_dir, &result.ip, &text, analyzed_at) {
            Some(path) => println!("\nThe analysis results are saved to: {}", path.display()),
            None => println!("\n{}", "Failed to save analysis results".yellow()),
        }
    }

    Ok(())
}

/// The interactive loop: 1 analyze, 2 view history, 3 exit.
async fn run_menu(analyzer: &Analyzer, config: &Config) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Interactive session started");

    loop {
        println!("\n{}", "Menu:".bold());
        println!("1. IP Address Analysis");
        println!("2. View Analysis History");
        println!("3. Exit");

        let Some(choice) = prompt(&mut lines, "\nYour choice (1-3): ").await? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(ip) = prompt(&mut lines, "\nEnter the IP address: ").await? else {
                    break;
                };
                if let Err(e) = analyze_and_report(analyzer, &config.results_dir(), &ip, true).await {
                    println!("\n{} {e}", "Error:".red().bold());
                }
            }
            "2" => {
                let Some(ip) = prompt(&mut lines, "\nEnter IP to view history: ").await? else {
                    break;
                };
                match analyzer.history(&ip).await {
                    Ok(history) => terminal::display_history(&ip, &history),
                    Err(e) => println!("\n{} {e}", "Error:".red().bold()),
                }
            }
            "3" => break,
            _ => println!("\n{}", "Invalid choice! Please choose 1-3.".yellow()),
        }
    }

    println!("\nThank you for using ipcheck!");
    Ok(())
}

/// Print a prompt and read one trimmed line. None on end of input.
async fn prompt<R>(lines: &mut tokio::io::Lines<R>, message: &str) -> Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{message}");
    std::io::stdout().flush()?;
    let line = lines.next_line().await.context("Failed to read from stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}
