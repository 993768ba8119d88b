// src/wordlist.rs

use std::path::Path;

use tracing::{debug, info};

use crate::core::models::Candidate;
use crate::error::ScanError;

/// Marks a wordlist line as a comment.
pub const COMMENT_MARKER: char = '#';

/// Reads the wordlist at `path` into candidates, preserving file order.
///
/// # Arguments
/// * `path` - Wordlist file, one path per line.
///
/// # Returns
/// The candidates, or a `ScanError::File` wrapping the I/O cause.
pub async fn load_wordlist(path: impl AsRef<Path>) -> Result<Vec<Candidate>, ScanError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ScanError::file(path, e))?;

    // Wordlists in the wild are not always valid UTF-8; keep what we can.
    let text = String::from_utf8_lossy(&bytes);
    let candidates = parse_wordlist(&text);
    info!(path = %path.display(), count = candidates.len(), "Loaded wordlist.");
    Ok(candidates)
}

/// Splits wordlist text into candidates. Blank lines and lines whose first
/// character is `#` are skipped; everything else is trimmed. Duplicates are kept.
pub fn parse_wordlist(text: &str) -> Vec<Candidate> {
    let candidates: Vec<Candidate> = text
        .lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .filter_map(Candidate::new)
        .collect();
    debug!(lines = text.lines().count(), kept = candidates.len(), "Parsed wordlist.");
    candidates
}
