// src/core/scanner/sink.rs

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::core::models::{ProbeOutcome, ProbeResult};
use crate::error::ScanError;
use crate::output::{LogWriter, Reporter};

/// Filters finished probes and forwards the interesting ones to the console
/// and the results file.
///
/// A single filter gates both outputs: whatever is printed is also logged.
/// Lines arrive in completion order, not wordlist order.
pub struct ResultSink {
    config: Arc<Config>,
    reporter: Box<dyn Reporter>,
    log: Option<LogWriter>,
}

impl ResultSink {
    pub fn new(config: Arc<Config>, reporter: Box<dyn Reporter>, log: Option<LogWriter>) -> Self {
        Self { config, reporter, log }
    }

    /// Whether `result` passes the filter.
    ///
    /// Received responses are reported when verbose or when their status is
    /// on the allow-list. Timeouts and network errors are reported when
    /// verbose, or when `report_failures` is set.
    pub fn is_reportable(&self, result: &ProbeResult) -> bool {
        if self.config.verbose {
            return true;
        }
        match &result.final_outcome {
            ProbeOutcome::Success { status_code, .. } => self.config.allowed.contains(*status_code),
            ProbeOutcome::Timeout | ProbeOutcome::NetworkError { .. } => self.config.report_failures,
        }
    }

    /// Renders the line written for a reportable result.
    pub fn format(&self, result: &ProbeResult) -> Result<String, ScanError> {
        if self.config.json {
            Ok(serde_json::to_string(result)?)
        } else {
            Ok(result.report_line())
        }
    }

    /// Reports `result` if it passes the filter.
    ///
    /// # Returns
    /// `Ok(true)` if the result was printed (and logged), `Ok(false)` if it was
    /// dropped, or the file error if the log append failed.
    pub async fn accept(&self, result: ProbeResult) -> Result<bool, ScanError> {
        if !self.is_reportable(&result) {
            trace!(candidate = %result.candidate, kind = result.final_outcome.as_ref(), "Result filtered out.");
            return Ok(false);
        }

        let line = self.format(&result)?;
        self.reporter.report(&line, &result);
        if let Some(log) = &self.log {
            log.append_line(&line).await?;
        }
        debug!(
            candidate = %result.candidate,
            tag = %result.final_outcome.tag(),
            log = ?self.log.as_ref().map(LogWriter::path),
            "Result reported."
        );
        Ok(true)
    }
}
