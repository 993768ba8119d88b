// src/cli.rs

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rsbuster::config::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_USER_AGENT};
use rsbuster::{Config, ConfigError, Target};

#[derive(Parser, Debug)]
#[command(name = "rsbuster", version)]
#[command(about = "Enumerate hidden paths on a web server from a wordlist.")]
#[command(after_help = "Results are printed in completion order, not wordlist order.")]
pub struct Cli {
    /// The target website, e.g. https://example.com
    pub target: String,

    /// Points to the wordlist, one path per line ('#' starts a comment)
    #[arg(short, long)]
    pub wordlist: PathBuf,

    /// Appends reported lines to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 4)]
    pub timeout: u64,

    /// Report every result, whatever its status code
    #[arg(short, long)]
    pub verbose: bool,

    /// Adds a status code to the reported set (repeatable)
    #[arg(short, long = "allowed", value_name = "CODE")]
    pub allowed: Vec<u16>,

    /// Maximum number of requests in flight
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Extra attempts for requests that time out or fail to connect
    #[arg(short, long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Base delay before the first retry, doubled on each further retry
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// Truncate the output file before the run
    #[arg(long, requires = "output")]
    pub clear: bool,

    /// Also report timeouts and network errors when not verbose
    #[arg(long)]
    pub report_failures: bool,

    /// Emit results as JSON lines
    #[arg(long)]
    pub json: bool,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Freezes the arguments into an immutable run configuration.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::new(Target::parse(&self.target)?);
        config.timeout = Duration::from_secs(self.timeout);
        config.max_concurrency = self.concurrency;
        config.max_retries = self.retries;
        config.backoff_base = Duration::from_millis(self.backoff_ms);
        config.verbose = self.verbose;
        config.allowed.extend(self.allowed.iter().copied());
        config.report_failures = self.report_failures;
        config.json = self.json;
        config.output = self.output.clone();
        config.clear_output = self.clear;
        config.user_agent = self.user_agent.clone();
        config.validate()
    }
}
