//! Bounded worker pool for enrichment jobs
//!
//! Jobs go through a bounded queue to a fixed number of workers. Submitting
//! never waits: when the queue is full or closed the job is dropped and
//! counted. Shutting down closes the queue, lets queued and in-flight jobs
//! finish within a timeout, then aborts whatever is left.

use crate::enrich::{EnrichmentJob, EnrichmentResult, SentimentClassifier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinSet;

struct Shared {
    sender: Mutex<Option<Sender<EnrichmentJob>>>,
    results: Mutex<HashMap<String, EnrichmentResult>>,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn sender(&self) -> MutexGuard<'_, Option<Sender<EnrichmentJob>>> {
        self.sender.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn results(&self) -> MutexGuard<'_, HashMap<String, EnrichmentResult>> {
        self.results.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cheap handle used by the crawl to submit jobs and read results
#[derive(Clone)]
pub struct EnrichmentHandle {
    shared: Arc<Shared>,
}

impl EnrichmentHandle {
    /// Queues a job without waiting; returns false if it was dropped
    pub fn submit(&self, job: EnrichmentJob) -> bool {
        let guard = self.shared.sender();
        let Some(sender) = guard.as_ref() else {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Enrichment closed, dropping job for {}", job.user_id);
            return false;
        };

        match sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Enrichment queue full, dropping job for {}", job.user_id);
                false
            }
            Err(TrySendError::Closed(job)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Enrichment closed, dropping job for {}", job.user_id);
                false
            }
        }
    }

    /// Copies out every result stored so far, ordered by user id
    pub fn results(&self) -> Vec<EnrichmentResult> {
        let mut results: Vec<EnrichmentResult> = self.shared.results().values().cloned().collect();
        results.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        results
    }

    /// Number of jobs dropped because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Number of jobs whose classification failed
    pub fn failed(&self) -> u64 {
        self.shared.failed.load(Ordering::Relaxed)
    }
}

/// Owner of the enrichment workers
pub struct EnrichmentPool {
    handle: EnrichmentHandle,
    workers: JoinSet<()>,
}

impl EnrichmentPool {
    /// Spawns `workers` tasks on the current runtime draining a queue of
    /// `queue_capacity` jobs
    pub fn start(
        classifier: Arc<dyn SentimentClassifier>,
        workers: usize,
        queue_capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let shared = Arc::new(Shared {
            sender: Mutex::new(Some(sender)),
            results: Mutex::new(HashMap::new()),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let mut set = JoinSet::new();
        for worker_id in 0..workers.max(1) {
            set.spawn(run_worker(
                worker_id,
                Arc::clone(&receiver),
                Arc::clone(&classifier),
                Arc::clone(&shared),
            ));
        }

        tracing::debug!(
            "Enrichment pool started with {} workers, queue capacity {}",
            workers.max(1),
            queue_capacity.max(1)
        );

        Self {
            handle: EnrichmentHandle { shared },
            workers: set,
        }
    }

    pub fn handle(&self) -> EnrichmentHandle {
        self.handle.clone()
    }

    /// Stops accepting jobs and waits up to `timeout` for the queue to drain
    ///
    /// Returns true if every worker finished in time; otherwise the remaining
    /// work is aborted and its results are lost.
    pub async fn shutdown(mut self, timeout: Duration) -> bool {
        self.handle.shared.sender().take();

        let drained = tokio::time::timeout(timeout, async {
            while self.workers.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !drained {
            tracing::warn!(
                "Enrichment did not finish within {:?}, abandoning remaining jobs",
                timeout
            );
            self.workers.abort_all();
        }
        drained
    }

    /// Stops accepting jobs and abandons everything queued or in flight
    pub fn abort(mut self) {
        self.handle.shared.sender().take();
        self.workers.abort_all();
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<tokio::sync::Mutex<Receiver<EnrichmentJob>>>,
    classifier: Arc<dyn SentimentClassifier>,
    shared: Arc<Shared>,
) {
    loop {
        let job = { receiver.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        match classifier.classify(&job.comment_text, &job.post_text).await {
            Ok(sentiment) => {
                tracing::debug!(
                    "Worker {} classified {} as {}",
                    worker_id,
                    job.user_id,
                    sentiment.value
                );
                shared.results().insert(
                    job.user_id.clone(),
                    EnrichmentResult {
                        user_id: job.user_id,
                        brand: job.brand,
                        sentiment_value: sentiment.value,
                        reasoning: sentiment.reasoning,
                    },
                );
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Enrichment failed for {}: {}", job.user_id, e);
            }
        }
    }
}
