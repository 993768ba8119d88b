// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use color_eyre::eyre::Result;
use tracing::{error, info, warn};

use rsbuster::core::scanner::run_full_scan;
use rsbuster::output::ConsoleReporter;
use rsbuster::{ScanSummary, StopSignal, logging, wordlist};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let json = cli.json;

    if let Err(e) = color_eyre::install() {
        eprintln!("warning: {e}");
    }
    if let Err(e) = logging::initialize_logging() {
        eprintln!("warning: diagnostic logging disabled: {e}");
    }

    match run(cli).await {
        Ok(summary) => {
            match json.then(|| serde_json::to_string(&summary)) {
                Some(Ok(line)) => eprintln!("{line}"),
                _ => eprintln!("{summary}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Scan aborted.");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ScanSummary> {
    let config = Arc::new(cli.to_config()?);
    let candidates = wordlist::load_wordlist(&cli.wordlist).await?;
    info!(
        target = %config.target,
        candidates = candidates.len(),
        concurrency = config.max_concurrency,
        allowed = ?config.allowed.iter().collect::<Vec<_>>(),
        "Configuration loaded."
    );

    let stop = StopSignal::new();
    spawn_interrupt_handler(stop.clone());

    let reporter = Box::new(ConsoleReporter::new(config.json));
    let summary = run_full_scan(config, candidates, reporter, stop).await?;
    Ok(summary)
}

/// Raises `stop` on Ctrl-C so the scan drains instead of dying mid-request.
fn spawn_interrupt_handler(stop: StopSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, draining in-flight requests.");
                eprintln!("\nInterrupt received, finishing in-flight requests...");
                stop.raise();
            }
            Err(e) => error!(error = %e, "Failed to listen for interrupt."),
        }
    });
}
