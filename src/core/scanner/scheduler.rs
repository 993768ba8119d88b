// src/core/scanner/scheduler.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};

use super::prober::Prober;
use super::queue::WorkQueue;
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::core::models::{Candidate, ProbeResult};

/// Cooperative stop flag shared by the scheduler, its workers and whoever
/// handles the interrupt.
///
/// Raising it stops new candidates from being dispatched; probes already in
/// flight run to completion.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a bounded pool of workers over the candidate list.
pub struct Scheduler<P: ?Sized> {
    prober: Arc<P>,
    policy: RetryPolicy,
    config: Arc<Config>,
}

impl<P> Scheduler<P>
where
    P: Prober + ?Sized + 'static,
{
    pub fn new(prober: Arc<P>, config: Arc<Config>) -> Self {
        Self {
            policy: RetryPolicy::from_config(&config),
            prober,
            config,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts probing and returns the stream of results.
    ///
    /// At most `max_concurrency` workers are spawned. Each one claims the next
    /// candidate as soon as its previous probe finishes, so the budget stays
    /// saturated until the queue runs dry. Results are handed over through a
    /// channel of the same capacity: when the consumer lags, workers wait
    /// instead of piling results up.
    ///
    /// Candidates are dispatched in wordlist order but complete in whatever
    /// order the server answers.
    ///
    /// # Arguments
    /// * `candidates` - The wordlist entries. The scheduler owns them from here on.
    /// * `stop` - Once raised, no further candidate is dequeued.
    ///
    /// # Returns
    /// A `ResultStream` yielding one `ProbeResult` per dispatched candidate.
    pub fn run(&self, candidates: Vec<Candidate>, stop: StopSignal) -> ResultStream {
        let total = candidates.len();
        let queue = Arc::new(WorkQueue::new(candidates));
        let capacity = self.config.max_concurrency.max(1);
        let worker_count = capacity.min(total);
        let (tx, rx) = mpsc::channel(capacity);

        info!(total, workers = worker_count, target = %self.config.target, "Starting scheduler.");

        let workers = (0..worker_count)
            .map(|id| {
                let worker = Worker {
                    queue: Arc::clone(&queue),
                    prober: Arc::clone(&self.prober),
                    policy: self.policy.clone().bound_to(stop.clone()),
                    config: Arc::clone(&self.config),
                    stop: stop.clone(),
                    tx: tx.clone(),
                };
                tokio::spawn(worker.run().instrument(info_span!("worker", id)))
            })
            .collect();

        // The stream ends once every worker has dropped its sender.
        drop(tx);

        ResultStream { rx, workers, total }
    }
}

struct Worker<P: ?Sized> {
    queue: Arc<WorkQueue>,
    prober: Arc<P>,
    policy: RetryPolicy,
    config: Arc<Config>,
    stop: StopSignal,
    tx: mpsc::Sender<ProbeResult>,
}

impl<P> Worker<P>
where
    P: Prober + ?Sized,
{
    async fn run(self) {
        let mut handled = 0usize;
        loop {
            if self.stop.is_raised() {
                debug!(handled, "Stop raised, worker draining.");
                break;
            }
            let Some(candidate) = self.queue.dequeue_next() else {
                break;
            };

            let result = self
                .policy
                .execute_with_retry(self.prober.as_ref(), &self.config.target, candidate, self.config.timeout)
                .await;
            handled += 1;

            if self.tx.send(result).await.is_err() {
                debug!("Result consumer dropped, worker exiting.");
                break;
            }
        }
        debug!(handled, "Worker finished.");
    }
}

/// Lazy, finite sequence of results produced by [`Scheduler::run`].
pub struct ResultStream {
    rx: mpsc::Receiver<ProbeResult>,
    workers: Vec<JoinHandle<()>>,
    total: usize,
}

impl ResultStream {
    /// Waits for the next completed candidate. `None` once every worker is done.
    pub async fn next(&mut self) -> Option<ProbeResult> {
        self.rx.recv().await
    }

    /// Number of candidates handed to the scheduler.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Drains the stream into a vector, in completion order.
    pub async fn collect(mut self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.total);
        while let Some(result) = self.next().await {
            results.push(result);
        }
        self.join().await;
        results
    }

    /// Waits for every worker task to exit.
    ///
    /// Closing the receiver first means workers blocked on a full channel give
    /// up instead of waiting forever.
    pub async fn join(mut self) {
        self.rx.close();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task failed.");
            }
        }
    }
}
