//! CLI entry point for the product feed triage pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use feed_triage::{
    OutputTables, Pipeline, ReportGenerator, RoundingMode, RunReport, TriageConfig, TriageResult,
};
use std::path::Path;
use tracing::{debug, info};

/// CLI-compatible rounding mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRoundingMode {
    /// Round halves to the nearest even digit (0.125 -> 0.12)
    HalfEven,
    /// Round halves away from zero (0.125 -> 0.13)
    HalfAwayFromZero,
}

impl From<CliRoundingMode> for RoundingMode {
    fn from(cli: CliRoundingMode) -> Self {
        match cli {
            CliRoundingMode::HalfEven => RoundingMode::HalfEven,
            CliRoundingMode::HalfAwayFromZero => RoundingMode::HalfAwayFromZero,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Product feed triage: normalize, classify and analyze a product feed",
    long_about = "Normalizes a delimited product feed, sorts every record into \
                  accepted / review / rejected with a tiered rule engine, and \
                  analyzes prices over the accepted records.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage (semicolon-delimited feed)\n  \
                  feed-triage -i data/products.csv\n\n  \
                  # Comma-delimited feed, custom output directory\n  \
                  feed-triage -i feed.csv --separator , -o results/\n\n  \
                  # Classify and summarize without writing anything\n  \
                  feed-triage -i feed.csv --dry-run\n\n  \
                  # Machine-readable output\n  \
                  feed-triage -i feed.csv --json | jq .counts"
)]
struct Args {
    /// Path to the delimited feed to process
    #[arg(short, long)]
    input: String,

    /// Output directory for the result tables
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Field delimiter of the input feed, also used for the output tables
    #[arg(long, default_value = ";", value_parser = parse_separator)]
    separator: u8,

    /// Prices strictly above this value are flagged for review
    #[arg(long, default_value = "30000")]
    very_high_price: f64,

    /// Length of the expensive and outlier rankings
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Rounding applied to the average and median price
    #[arg(long, value_enum, default_value = "half-even")]
    rounding: CliRoundingMode,

    /// Classify and print the summary without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a JSON run report to the output directory
    ///
    /// The report will be saved as triage_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Accepts a single ASCII character, or `tab` / `\t`.
fn parse_separator(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("separator must be a single ASCII character, got '{}'", value)),
        },
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = TriageConfig::builder()
        .output_dir(&args.output)
        .separator(args.separator)
        .very_high_price_threshold(args.very_high_price)
        .top_n(args.top_n)
        .rounding(args.rounding.into())
        .save_to_disk(!args.dry_run)
        .emit_report(args.emit_report && !args.dry_run)
        .build()?;

    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    info!("{}", "=".repeat(80));
    info!("Starting product feed triage...");
    info!("{}", "=".repeat(80));

    let result = pipeline
        .run(&args.input)
        .with_context(|| format!("Triage of {} failed", args.input))?;

    let output_dir = (!args.dry_run).then(|| Path::new(&args.output));
    let report = ReportGenerator::build_report(Some(Path::new(&args.input)), output_dir, &result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &result, &args);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &RunReport, result: &TriageResult, args: &Args) {
    let counts = &report.counts;
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    if args.dry_run {
        println!("DRY RUN - nothing was written");
    } else {
        println!("TRIAGE COMPLETE");
    }
    println!("{}", "=".repeat(80));
    println!();

    println!("Input:  {} ({} records)", args.input, counts.input);
    if !args.dry_run {
        println!("Output: {}/", args.output);
        for name in OutputTables::NAMES {
            println!("  - {}.csv", name);
        }
    }
    println!();

    println!("Dispositions:");
    println!("  Accepted: {}", counts.accepted);
    println!("  Review:   {}", counts.review);
    println!("  Rejected: {}", counts.rejected);
    println!();

    println!("Rule Triggers:");
    for row in report
        .rule_counts
        .iter()
        .filter(|r| r.reject_count > 0 || r.review_flag_count > 0)
    {
        println!(
            "  {:<20} reject: {:>6}  review: {:>6}",
            row.rule, row.reject_count, row.review_flag_count
        );
    }
    println!();

    println!("Accepted Prices:");
    println!("  Products: {}", summary.total_products);
    println!("  Average:  {}", format_price(summary.avg_price));
    println!("  Median:   {}", format_price(summary.median_price));
    if let Some(top) = result.price_analysis.top_expensive.first() {
        println!(
            "  Highest:  {} ({})",
            top.price,
            top.name.as_deref().or(top.id.as_deref()).unwrap_or("-")
        );
    }
    println!("  Duration: {}ms", report.duration_ms);
    println!();

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the JSON run report");
    println!("{}", "=".repeat(80));
}

fn format_price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
