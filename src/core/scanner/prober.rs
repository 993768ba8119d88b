// src/core/scanner/prober.rs

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{debug, trace};

use crate::core::models::{Candidate, ProbeOutcome, Target};

/// Issues exactly one request for one candidate and classifies the outcome.
///
/// Implementations must not retry and must not interpret status codes: any
/// received response is a `Success`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target, candidate: &Candidate, timeout: Duration) -> ProbeOutcome;
}

/// The `reqwest`-backed prober used for real scans.
///
/// One `Client` is shared by every worker so that connections are pooled.
/// Redirects are never followed, since a 3xx is part of the signal.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Builds the shared HTTP client.
    ///
    /// # Arguments
    /// * `user_agent` - Value sent in the `User-Agent` header of every probe.
    ///
    /// # Returns
    /// The prober, or the `reqwest` error if the TLS backend could not be set up.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target, candidate: &Candidate, timeout: Duration) -> ProbeOutcome {
        let url = target.resolve(candidate);
        trace!(url = %url, "Sending probe.");

        let started = Instant::now();
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let elapsed = started.elapsed();
                debug!(url = %url, status = status_code, elapsed_ms = elapsed.as_millis() as u64, "Probe answered.");
                // The body is never read; dropping the response releases the connection.
                ProbeOutcome::Success { status_code, elapsed }
            }
            Err(e) => classify_error(&url, e),
        }
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> ProbeOutcome {
    if e.is_timeout() {
        debug!(url, "Probe timed out.");
        return ProbeOutcome::Timeout;
    }

    // `reqwest::Error`'s Display hides the underlying cause (DNS, refused, TLS).
    let mut cause = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(inner) = source {
        cause.push_str(": ");
        cause.push_str(&inner.to_string());
        source = std::error::Error::source(inner);
    }
    debug!(url, cause = %cause, "Probe failed.");
    ProbeOutcome::NetworkError { cause }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers every connection with the given raw response head.
    async fn serve_fixed(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn redirect_is_reported_not_followed() {
        let base = serve_fixed("HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let target = Target::parse(&base).unwrap();
        let prober = HttpProber::new("test").unwrap();

        let outcome = prober
            .probe(&target, &Candidate::new("old").unwrap(), Duration::from_secs(2))
            .await;
        assert_eq!(outcome.status_code(), Some(302));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = Target::parse(&format!("http://{addr}")).unwrap();
        let prober = HttpProber::new("test").unwrap();
        let outcome = prober
            .probe(&target, &Candidate::new("admin").unwrap(), Duration::from_secs(2))
            .await;
        assert!(matches!(outcome, ProbeOutcome::NetworkError { .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let target = Target::parse(&format!("http://{addr}")).unwrap();
        let prober = HttpProber::new("test").unwrap();
        let outcome = prober
            .probe(&target, &Candidate::new("slow").unwrap(), Duration::from_millis(200))
            .await;
        assert_eq!(outcome, ProbeOutcome::Timeout);
    }
}
