// src/core/mod.rs

/// Targets, candidates, probe outcomes and the run summary.
pub mod models;

/// Houses the scanning pipeline: prober, retry policy, work queue, scheduler
/// and result sink.
pub mod scanner;
