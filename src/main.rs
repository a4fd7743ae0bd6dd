use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use site_audit::audit::{AuditClient, AuditError};
use site_audit::config::AuditConfig;
use site_audit::input::read_url_list;
use site_audit::report::{export_with_sheet, AbortHandle, Aggregator, BatchOutcome, ExportFormat};
use site_audit::utils::init_logger;
use site_audit::validator::invalid_urls;

/// Audit websites with PageSpeed Insights and export the scores
#[derive(Debug, Parser)]
#[command(name = "site-audit", version, about)]
struct Cli {
    /// URLs to analyze
    urls: Vec<String>,

    /// Bulk URL file: one URL per line, or a CSV with a `url` column
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// PageSpeed Insights API key
    #[arg(long, env = "PAGESPEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,

    /// Output path (defaults to seo_audit_results.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to ./site_audit.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AuditConfig::load(cli.config.as_deref())?;
    let log_file = init_logger(&config.log_dir)?;

    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.file {
        urls.extend(read_url_list(path)?);
    }
    if urls.is_empty() {
        bail!("No URLs given; pass them as arguments or with --file");
    }

    let invalid = invalid_urls(&urls);
    if !invalid.is_empty() {
        bail!("Invalid URLs found: {}", invalid.join(", "));
    }

    let client = match AuditClient::new(cli.api_key.as_deref(), &config) {
        Ok(client) => client,
        Err(e) => {
            report_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let aggregator = Aggregator::new(&client).with_parallel_strategies(config.parallel_strategies);
    watch_ctrl_c(aggregator.abort_handle());

    println!("Analyzing {} website(s)...", urls.len());
    let outcome = aggregator.run(&urls).await;
    print_outcome(&outcome);

    if outcome.batch.is_empty() {
        println!("No results to export. Diagnostics: {}", log_file.display());
        return Ok(ExitCode::FAILURE);
    }

    let artifact = export_with_sheet(&outcome.batch, cli.format, &config.sheet_name)
        .context("Failed to export results")?;
    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(artifact.default_file_name()));
    artifact.write_to(&output)?;
    println!("Report written to {} ({})", output.display(), artifact.mime_type());

    if outcome.fatal.is_some() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Exit status for a run killed by a second interrupt
const INTERRUPTED_EXIT: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    FinishCurrentUrl,
    Exit,
}

/// First Ctrl-C stops the batch after the current URL, the second exits at once
fn on_interrupt(abort: &AbortHandle) -> Interrupt {
    if abort.is_aborted() {
        return Interrupt::Exit;
    }
    abort.abort();
    Interrupt::FinishCurrentUrl
}

fn watch_ctrl_c(abort: AbortHandle) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&abort) {
                Interrupt::FinishCurrentUrl => {
                    warn!("Interrupt received, finishing current URL");
                    eprintln!("Interrupted: stopping after the current URL (Ctrl-C again to quit)");
                }
                Interrupt::Exit => {
                    warn!("Second interrupt received, exiting");
                    eprintln!("Interrupted again: exiting without export");
                    std::process::exit(INTERRUPTED_EXIT);
                }
            }
        }
    });
}

fn print_outcome(outcome: &BatchOutcome) {
    for failure in &outcome.failures {
        println!("Error analyzing {}:", failure.url);
        report_error(&failure.error);
    }

    if let Some(fatal) = &outcome.fatal {
        println!("Stopped at {}:", fatal.url);
        report_error(&fatal.error);
    }

    if !outcome.skipped.is_empty() {
        println!("Not analyzed: {}", outcome.skipped.join(", "));
    }

    if !outcome.batch.is_empty() {
        info!("Analysis completed for {} URLs", outcome.batch.len());
        println!("Analysis completed for {} URLs", outcome.batch.len());
    }
}

fn report_error(e: &AuditError) {
    let hint = match e {
        AuditError::Configuration => "Provide a key with --api-key or PAGESPEED_API_KEY.",
        AuditError::InvalidCredential(_) => {
            "Please check your PageSpeed Insights API key and try again."
        }
        AuditError::Permission => "Ensure the API key has PageSpeed Insights enabled.",
        AuditError::Fetch(_) => "Unable to fetch data from PageSpeed Insights. Please try again later.",
        AuditError::InvalidResponse(_) => "Received an invalid response from PageSpeed Insights.",
    };
    error!("{}: {:?}", e.category(), e);
    println!("  {}: {}", e.category(), hint);
    println!("  Detail: {}", e);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_exits() {
        let abort = AbortHandle::new();
        assert_eq!(on_interrupt(&abort), Interrupt::FinishCurrentUrl);
        assert!(abort.is_aborted());
        assert_eq!(on_interrupt(&abort), Interrupt::Exit);
    }
}
