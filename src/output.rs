// src/output.rs

//! Where reportable lines end up: the console and, optionally, a log file.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use crossterm::style::{StyledContent, Stylize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::models::{ProbeOutcome, ProbeResult};
use crate::error::ScanError;

/// Receives each line the result sink decided to report.
pub trait Reporter: Send + Sync {
    fn report(&self, line: &str, result: &ProbeResult);
}

/// Prints reported lines to stdout, colouring the status tag when stdout is
/// a terminal.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    colorize: bool,
}

impl ConsoleReporter {
    /// `plain` forces uncoloured output (used for JSON lines).
    pub fn new(plain: bool) -> Self {
        Self {
            colorize: !plain && std::io::stdout().is_terminal(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, line: &str, result: &ProbeResult) {
        let mut stdout = std::io::stdout().lock();
        let written = if self.colorize {
            writeln!(
                stdout,
                "[{}] \"{}\"",
                styled_tag(&result.final_outcome),
                result.candidate
            )
        } else {
            writeln!(stdout, "{line}")
        };
        // A closed stdout (e.g. piped into `head`) is not worth failing the run over.
        if let Err(e) = written {
            debug!(error = %e, "Failed to write to stdout.");
        }
    }
}

fn styled_tag(outcome: &ProbeOutcome) -> StyledContent<String> {
    let tag = outcome.tag();
    match outcome.status_code() {
        Some(200..=299) => tag.green().bold(),
        Some(300..=399) => tag.cyan(),
        Some(400..=499) => tag.yellow(),
        Some(_) => tag.red(),
        None => tag.dark_grey(),
    }
}

/// Append-only results file shared by the run.
///
/// The handle sits behind a mutex so concurrent appends never interleave
/// within a line. Each append is flushed before returning.
#[derive(Debug)]
pub struct LogWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogWriter {
    /// Opens `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ScanError::file(&path, e))?;
        info!(path = %path.display(), "Opened results file.");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Truncates `path` to empty, creating it if it does not exist.
    pub async fn clear(path: impl AsRef<Path>) -> Result<(), ScanError> {
        let path = path.as_ref();
        File::create(path)
            .await
            .map_err(|e| ScanError::file(path, e))?;
        info!(path = %path.display(), "Cleared results file.");
        Ok(())
    }

    /// Writes `lines` newline-joined, with a trailing newline.
    pub async fn append<S: AsRef<str>>(&self, lines: &[S]) -> Result<(), ScanError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for line in lines {
            buf.push_str(line.as_ref());
            buf.push('\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| ScanError::file(&self.path, e))?;
        file.flush().await.map_err(|e| ScanError::file(&self.path, e))
    }

    pub async fn append_line(&self, line: &str) -> Result<(), ScanError> {
        self.append(&[line]).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "old\n").unwrap();

        let log = LogWriter::open(&path).await.unwrap();
        assert_eq!(log.path(), path.as_path());
        log.append(&["[200] \"admin\"", "[403] \"secret\""]).await.unwrap();
        log.append_line("[200] \"login\"").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "old\n[200] \"admin\"\n[403] \"secret\"\n[200] \"login\"\n");
    }

    #[tokio::test]
    async fn clear_truncates_and_creates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "stale\nlines\n").unwrap();

        LogWriter::clear(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        let fresh = dir.path().join("fresh.txt");
        LogWriter::clear(&fresh).await.unwrap();
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn unwritable_path_is_a_file_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("results.txt");
        let err = LogWriter::open(&path).await.unwrap_err();
        assert!(matches!(err, ScanError::File { .. }));
    }
}
