// src/core/scanner/mod.rs

// The scanning pipeline, leaf to root: a prober issues single requests, the
// retry policy wraps it, the scheduler drives a bounded pool of workers over
// the work queue, and the result sink filters and reports what comes back.
pub mod prober;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod sink;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use self::prober::{HttpProber, Prober};
use self::scheduler::{Scheduler, StopSignal};
use self::sink::ResultSink;
use crate::config::Config;
use crate::core::models::{Candidate, ScanSummary};
use crate::error::ScanError;
use crate::output::{LogWriter, Reporter};

/// Runs a complete scan with the real HTTP prober.
///
/// Prepares the results file (clearing it first when asked), builds the shared
/// HTTP client and hands everything to [`run_scan`]. Any file problem is
/// reported before a single request is sent.
///
/// # Arguments
/// * `config` - Immutable run configuration.
/// * `candidates` - Wordlist entries, in file order.
/// * `reporter` - Receives every reportable line (normally the console).
/// * `stop` - Raised by the interrupt handler to request a graceful drain.
///
/// # Returns
/// The run's `ScanSummary`, or the first configuration/file error.
pub async fn run_full_scan(
    config: Arc<Config>,
    candidates: Vec<Candidate>,
    reporter: Box<dyn Reporter>,
    stop: StopSignal,
) -> Result<ScanSummary, ScanError> {
    let log = match &config.output {
        Some(path) => {
            if config.clear_output {
                LogWriter::clear(path).await?;
            }
            Some(LogWriter::open(path).await?)
        }
        None => None,
    };

    let prober = Arc::new(HttpProber::new(&config.user_agent)?);
    let scheduler = Scheduler::new(prober, Arc::clone(&config));
    let sink = ResultSink::new(Arc::clone(&config), reporter, log);

    run_scan(&scheduler, candidates, &sink, stop).await
}

/// Feeds every result from the scheduler into the sink and tallies a summary.
///
/// A failing log append is fatal: the stop signal is raised, in-flight probes
/// are drained and the error is returned.
pub async fn run_scan<P>(
    scheduler: &Scheduler<P>,
    candidates: Vec<Candidate>,
    sink: &ResultSink,
    stop: StopSignal,
) -> Result<ScanSummary, ScanError>
where
    P: Prober + ?Sized + 'static,
{
    let mut summary = ScanSummary::new(Utc::now());
    let started = Instant::now();
    let mut stream = scheduler.run(candidates, stop.clone());

    while let Some(result) = stream.next().await {
        let reportable = sink.is_reportable(&result);
        summary.record(&result, reportable);

        if let Err(e) = sink.accept(result).await {
            error!(error = %e, "Failed to record result, stopping scan.");
            stop.raise();
            stream.join().await;
            return Err(e);
        }
    }
    stream.join().await;

    summary.elapsed = started.elapsed();
    summary.interrupted = stop.is_raised();
    if summary.interrupted {
        warn!(completed = summary.total, "Scan interrupted.");
    }
    info!(
        total = summary.total,
        reported = summary.reported,
        timeouts = summary.timeouts,
        network_errors = summary.network_errors,
        retried = summary.retried,
        "Scan finished."
    );
    Ok(summary)
}
