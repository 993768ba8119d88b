// src/lib.rs

//! Bounded-concurrency web path enumeration.
//!
//! Candidates from a wordlist are probed against a target with at most
//! `max_concurrency` requests in flight. Transport failures are retried with
//! exponential backoff; responses whose status is on the allow-list are
//! printed and optionally appended to a results file.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod output;
pub mod wordlist;

pub use crate::config::Config;
pub use crate::core::models::{AllowedCodes, Candidate, ProbeOutcome, ProbeResult, ScanSummary, Target};
pub use crate::core::scanner::scheduler::StopSignal;
pub use crate::error::{ConfigError, ScanError};
