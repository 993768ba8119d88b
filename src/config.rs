// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::core::models::{AllowedCodes, Target};
use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("rsbuster/", env!("CARGO_PKG_VERSION"));

/// Settings for a single run.
///
/// Built once before scheduling starts and then shared read-only (usually
/// behind an `Arc`) by the scheduler, the workers and the result sink.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: Target,
    /// Per-request timeout. There is no overall run deadline.
    pub timeout: Duration,
    pub max_concurrency: usize,
    /// Additional attempts after the first one for transport failures.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    /// Report every result regardless of status code or outcome kind.
    pub verbose: bool,
    pub allowed: AllowedCodes,
    /// Report timeouts and network errors even when not verbose.
    pub report_failures: bool,
    /// Emit results as JSON lines instead of `[status] "path"`.
    pub json: bool,
    pub output: Option<PathBuf>,
    /// Truncate `output` once before the run starts.
    pub clear_output: bool,
    pub user_agent: String,
}

impl Config {
    /// A configuration with every knob at its default.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_backoff: MAX_BACKOFF,
            verbose: false,
            allowed: AllowedCodes::default(),
            report_failures: false,
            json: false,
            output: None,
            clear_output: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Zero { name: "concurrency" });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero { name: "timeout" });
        }
        Ok(self)
    }
}
