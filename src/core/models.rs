// src/core/models.rs

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use strum::AsRefStr;
use url::Url;

use crate::error::ConfigError;

/// Status codes worth reporting when no `--allowed` flag is given.
pub const DEFAULT_ALLOWED_CODES: [u16; 6] = [200, 303, 400, 403, 408, 501];

// --- Target & Candidate ---

/// The immutable base URL every candidate path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base: String,
}

impl Target {
    /// Parses and validates a target URL.
    ///
    /// Only `http` and `https` URLs with a host are accepted. The text as given
    /// (minus any trailing slash) is kept as the join base so that paths the
    /// user typed are not normalised away.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }

        let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidTarget {
            target: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidTarget {
                target: trimmed.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidTarget {
                target: trimmed.to_string(),
                reason: "missing host".to_string(),
            });
        }
        // Candidates are appended to the path; a query or fragment would swallow them.
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::InvalidTarget {
                target: trimmed.to_string(),
                reason: "query strings and fragments are not supported".to_string(),
            });
        }

        Ok(Self {
            base: trimmed.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the full request URL for a candidate, with exactly one `/`
    /// between the base and the candidate path.
    pub fn resolve(&self, candidate: &Candidate) -> String {
        format!("{}/{}", self.base, candidate.as_str().trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// A single path read from the wordlist. Never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Probe Models ---

/// The outcome of a single request attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProbeOutcome {
    /// A response was received. The status code is not interpreted here.
    Success {
        status_code: u16,
        #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
        elapsed: Duration,
    },
    /// The per-request timeout elapsed before a response arrived.
    Timeout,
    /// DNS, connect, TLS or any other transport failure.
    NetworkError { cause: String },
}

impl ProbeOutcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Success { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Only transport failures are worth another attempt; any received
    /// response, whatever its status, is a complete answer.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProbeOutcome::Success { .. })
    }

    /// The bracketed tag printed in front of a reported candidate.
    pub fn tag(&self) -> String {
        match self {
            ProbeOutcome::Success { status_code, .. } => status_code.to_string(),
            ProbeOutcome::Timeout => "TIMEOUT".to_string(),
            ProbeOutcome::NetworkError { .. } => "ERROR".to_string(),
        }
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// The final, post-retry outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub candidate: Candidate,
    #[serde(rename = "outcome")]
    pub final_outcome: ProbeOutcome,
    pub attempts_made: u32,
}

impl ProbeResult {
    /// Human-readable report line: `[<status>] "<candidate>"`.
    pub fn report_line(&self) -> String {
        format!("[{}] \"{}\"", self.final_outcome.tag(), self.candidate)
    }
}

// --- Allow-list ---

/// Status codes considered interesting enough to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCodes(BTreeSet<u16>);

impl AllowedCodes {
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        Self(codes.into_iter().collect())
    }

    /// Adds codes on top of the current set. Only used while building a `Config`.
    pub fn extend(&mut self, codes: impl IntoIterator<Item = u16>) {
        self.0.extend(codes);
    }

    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AllowedCodes {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_CODES)
    }
}

// --- Run Summary ---

/// Counters accumulated over a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub total: usize,
    pub reported: usize,
    pub successes: usize,
    pub timeouts: usize,
    pub network_errors: usize,
    /// Candidates that needed more than one attempt.
    pub retried: usize,
    pub interrupted: bool,
}

impl ScanSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed: Duration::ZERO,
            total: 0,
            reported: 0,
            successes: 0,
            timeouts: 0,
            network_errors: 0,
            retried: 0,
            interrupted: false,
        }
    }

    pub fn record(&mut self, result: &ProbeResult, reported: bool) {
        self.total += 1;
        if reported {
            self.reported += 1;
        }
        if result.attempts_made > 1 {
            self.retried += 1;
        }
        match result.final_outcome {
            ProbeOutcome::Success { .. } => self.successes += 1,
            ProbeOutcome::Timeout => self.timeouts += 1,
            ProbeOutcome::NetworkError { .. } => self.network_errors += 1,
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} probed, {} reported, {} timeouts, {} errors in {:.2}s",
            self.total,
            self.reported,
            self.timeouts,
            self.network_errors,
            self.elapsed.as_secs_f64()
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(s: &str) -> Candidate {
        Candidate::new(s).unwrap()
    }

    #[test]
    fn resolve_joins_with_single_slash() {
        let plain = Target::parse("http://example.test").unwrap();
        assert_eq!(plain.resolve(&candidate("admin")), "http://example.test/admin");

        let slashed = Target::parse("http://example.test/").unwrap();
        assert_eq!(slashed.resolve(&candidate("/admin")), "http://example.test/admin");

        let nested = Target::parse("https://example.test:8443/app/").unwrap();
        assert_eq!(nested.resolve(&candidate("login.php")), "https://example.test:8443/app/login.php");
    }

    #[test]
    fn target_rejects_bad_input() {
        assert!(matches!(Target::parse("  "), Err(ConfigError::EmptyTarget)));
        assert!(Target::parse("example.test").is_err());
        assert!(Target::parse("ftp://example.test").is_err());
        assert!(matches!(
            Target::parse("http://example.test/?lang=en"),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(matches!(Target::parse("http://example.test#top"), Err(ConfigError::InvalidTarget { .. })));
        assert!(Target::parse("http://example.test/app?").is_err());
    }

    #[test]
    fn candidate_is_trimmed_and_never_empty() {
        assert_eq!(Candidate::new("  admin \r").unwrap().as_str(), "admin");
        assert!(Candidate::new("   ").is_none());
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        let server_error = ProbeOutcome::Success { status_code: 500, elapsed: Duration::ZERO };
        assert!(!server_error.is_retryable());
        assert!(ProbeOutcome::Timeout.is_retryable());
        assert!(ProbeOutcome::NetworkError { cause: "refused".into() }.is_retryable());
    }

    #[test]
    fn report_line_uses_status_or_failure_tag() {
        let ok = ProbeResult {
            candidate: candidate("admin"),
            final_outcome: ProbeOutcome::Success { status_code: 200, elapsed: Duration::from_millis(3) },
            attempts_made: 1,
        };
        assert_eq!(ok.report_line(), "[200] \"admin\"");

        let timed_out = ProbeResult { final_outcome: ProbeOutcome::Timeout, ..ok };
        assert_eq!(timed_out.report_line(), "[TIMEOUT] \"admin\"");
    }

    #[test]
    fn default_allow_list_can_be_extended() {
        let mut allowed = AllowedCodes::default();
        assert!(allowed.contains(403));
        assert!(!allowed.contains(404));
        allowed.extend([404]);
        assert!(allowed.contains(404));
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let result = ProbeResult {
            candidate: candidate("admin"),
            final_outcome: ProbeOutcome::Success { status_code: 200, elapsed: Duration::from_millis(12) },
            attempts_made: 2,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["candidate"], "admin");
        assert_eq!(json["outcome"]["kind"], "success");
        assert_eq!(json["outcome"]["status_code"], 200);
        assert_eq!(json["outcome"]["elapsed_ms"], 12);
        assert_eq!(json["attempts_made"], 2);
    }
}
