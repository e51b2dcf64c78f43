//! pubquery - ADS Publications Query mailer
//!
//! Queries the NASA ADS search API for publications matching configured
//! keywords and author names, merges and deduplicates the results, and
//! emails the new ones as a spreadsheet to the librarian distribution list.
//!
//! ## Usage
//!
//! ```bash
//! pubquery run --start 2017-06-15
//! pubquery run --start 2017-06-01 --end 2017-08-31 --output ./output --no-email
//! pubquery history path
//! ```

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use clap::{Parser, Subcommand};
use pubquery::ads::AdsClient;
use pubquery::config::Config;
use pubquery::history::BibcodeLog;
use pubquery::{mail, report, spreadsheet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// ADS Publications Query - monthly literature report mailer
#[derive(Parser)]
#[command(name = "pubquery")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query ADS and mail the publications spreadsheet
    Run {
        /// Start of the query window (YYYY-MM-DD, snapped to the first of its month)
        #[arg(long)]
        start: String,

        /// End of the query window (YYYY-MM-DD, snapped to the last day of its
        /// month; defaults to the end of the start month)
        #[arg(long)]
        end: Option<String>,

        /// Directory for a local CSV copy of the results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compile the report without emailing it or recording bibcodes
        #[arg(long)]
        no_email: bool,
    },

    /// Manage the previously reported bibcodes log
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show the log file path
    Path,
    /// Clear the log
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Run {
            start,
            end,
            output,
            no_email,
        } => run_query(start, end, output, no_email).await,
        Commands::History { action } => handle_history(action),
    }
}

// ============================================================================
// Query Pipeline
// ============================================================================

async fn run_query(
    start: String,
    end: Option<String>,
    output: Option<PathBuf>,
    no_email: bool,
) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let start = parse_date(&start).context("Invalid --start date")?;
    let end = end
        .as_deref()
        .map(parse_date)
        .transpose()
        .context("Invalid --end date")?;
    let (from, to) = query_window(start, end)?;

    println!("Querying publications from {} to {}", from, to);

    // ===========================================
    // STAGE 1: ADS Search
    // ===========================================
    println!("\n--- Stage 1: ADS Search ---");

    let client = AdsClient::new(config.ads_api_key.clone(), from, to)?;

    let by_keywords = client.by_keywords(&config.keywords).await?;
    let author_names: Vec<String> = config.authors.keys().cloned().collect();
    let by_authors = client.by_authors(&author_names).await?;

    println!(
        "Found {} keyword matches and {} author matches.",
        by_keywords.len(),
        by_authors.len()
    );

    // ===========================================
    // STAGE 2: Merge & Dedupe
    // ===========================================
    println!("\n--- Stage 2: Merge & Dedupe ---");

    let log = BibcodeLog::new(config.previous_bibcodes_file.clone());
    let seen = log.load().context("Failed to load bibcode log")?;

    let merged = report::merge_results(by_keywords, by_authors);
    let rows = report::compile_rows(merged, &seen);

    println!("{} new publications after deduplication.", rows.len());

    if rows.is_empty() {
        println!("Nothing new to report.");
        return Ok(());
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir).context("Failed to create output directory")?;
        save_csv(&dir.join("publications.csv"), &rows)?;
    }

    // ===========================================
    // STAGE 3: Spreadsheet & Mail
    // ===========================================
    println!("\n--- Stage 3: Spreadsheet & Mail ---");

    let buffer = spreadsheet::render(&rows).context("Failed to render spreadsheet")?;

    if no_email {
        println!("--no-email given, skipping delivery.");
        return Ok(());
    }

    mail::send(&config, buffer)
        .await
        .context("Failed to send report")?;

    // Only bibcodes that actually went out are recorded as reported.
    log.record(rows.iter().map(|r| r.bibcode.as_str()))
        .context("Failed to record reported bibcodes")?;

    println!(
        "\n✓ Report sent to {} recipient(s).",
        config.librarian_emails.len()
    );
    Ok(())
}

/// Parse a CLI date argument
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Expected YYYY-MM-DD, got '{}'", s))
}

/// Snap the window to whole months: the start to the first day of its month,
/// the end to the last day of its month (the start month when no end is given).
fn query_window(start: NaiveDate, end: Option<NaiveDate>) -> Result<(NaiveDate, NaiveDate)> {
    let from = month_start(start)?;
    let to = month_end(end.unwrap_or(start))?;

    if from > to {
        anyhow::bail!("Start date {} is after end date {}", from, to);
    }

    info!(from = %from, to = %to, "Query window");
    Ok((from, to))
}

fn month_start(date: NaiveDate) -> Result<NaiveDate> {
    date.with_day(1)
        .with_context(|| format!("Cannot snap {} to the start of its month", date))
}

fn month_end(date: NaiveDate) -> Result<NaiveDate> {
    let first = month_start(date)?;
    first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .with_context(|| format!("Cannot snap {} to the end of its month", date))
}

/// Save data to CSV file
fn save_csv<T: Serialize>(path: &Path, data: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context("Failed to create CSV writer")?;

    for item in data {
        wtr.serialize(item).context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// History Management
// ============================================================================

fn handle_history(action: HistoryAction) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let log = BibcodeLog::new(config.previous_bibcodes_file);

    match action {
        HistoryAction::Path => {
            println!("Bibcode log: {:?}", log.path());
        }
        HistoryAction::Clear => {
            log.clear()?;
            println!("Bibcode log cleared.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2017-06-15").expect("parses"), date(2017, 6, 15));
        assert!(parse_date("June 2017").is_err());
        assert!(parse_date("2017-06").is_err());
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(date(2017, 6, 15)).expect("ok"), date(2017, 6, 30));
        assert_eq!(month_end(date(2017, 12, 1)).expect("ok"), date(2017, 12, 31));
        // leap year
        assert_eq!(month_end(date(2016, 2, 10)).expect("ok"), date(2016, 2, 29));
    }

    #[test]
    fn test_query_window_defaults_to_start_month() {
        let (from, to) = query_window(date(2017, 6, 15), None).expect("ok");
        assert_eq!(from, date(2017, 6, 1));
        assert_eq!(to, date(2017, 6, 30));
    }

    #[test]
    fn test_query_window_snaps_both_ends() {
        let (from, to) = query_window(date(2017, 6, 15), Some(date(2017, 8, 3))).expect("ok");
        assert_eq!(from, date(2017, 6, 1));
        assert_eq!(to, date(2017, 8, 31));
    }

    #[test]
    fn test_query_window_same_month() {
        let (from, to) = query_window(date(2017, 6, 20), Some(date(2017, 6, 2))).expect("ok");
        assert_eq!(from, date(2017, 6, 1));
        assert_eq!(to, date(2017, 6, 30));
    }

    #[test]
    fn test_query_window_rejects_inverted_range() {
        assert!(query_window(date(2017, 8, 1), Some(date(2017, 6, 30))).is_err());
    }
}
