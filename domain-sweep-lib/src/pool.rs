//! Fixed-size worker pool with a bounded job queue.
//!
//! A producer feeds jobs from an iterator into a queue of capacity
//! `2 x workers`; it stalls while the queue is full, so a lazy candidate
//! stream is consumed only as fast as workers drain it. Each worker sends its
//! output into a results channel that a single collector drains.

use crate::error::DomainSweepError;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Upper bound on concurrent workers.
pub const MAX_WORKERS: usize = 100;

/// Counts reported once a pool run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub dispatched: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with `workers` workers, clamped to `1..=MAX_WORKERS`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.workers * 2
    }

    /// Run `handler` over every job and pass each output to `collect`.
    ///
    /// Workers are spawned tokio tasks; the producer and the collector run
    /// on the calling task. `collect` sees outputs in completion order.
    ///
    /// # Errors
    ///
    /// `Internal` if a worker task panicked. Outputs of the other workers
    /// have still been collected.
    pub async fn run<I, J, H, Fut, T, C>(
        &self,
        jobs: I,
        handler: H,
        mut collect: C,
    ) -> Result<PoolStats, DomainSweepError>
    where
        I: IntoIterator<Item = J>,
        J: Send + 'static,
        H: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnMut(T),
    {
        let (job_tx, job_rx) = mpsc::channel::<J>(self.queue_capacity());
        let (result_tx, mut result_rx) = mpsc::channel::<T>(self.queue_capacity());
        let job_rx = Arc::new(Mutex::new(job_rx));
        let handler = Arc::new(handler);

        let workers: Vec<_> = (0..self.workers)
            .map(|id| {
                let job_rx = Arc::clone(&job_rx);
                let result_tx = result_tx.clone();
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let mut handled = 0usize;
                    loop {
                        let job = job_rx.lock().await.recv().await;
                        let Some(job) = job else { break };
                        let output = (*handler)(job).await;
                        handled += 1;
                        if result_tx.send(output).await.is_err() {
                            break;
                        }
                    }
                    debug!("Worker {} finished after {} jobs", id, handled);
                })
            })
            .collect();
        drop(result_tx);

        let producer = async move {
            let mut dispatched = 0usize;
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    break;
                }
                dispatched += 1;
            }
            dispatched
        };

        let collector = async {
            let mut completed = 0usize;
            while let Some(output) = result_rx.recv().await {
                collect(output);
                completed += 1;
            }
            completed
        };

        let (dispatched, completed, joined) = tokio::join!(producer, collector, join_all(workers));

        if let Some(e) = joined.into_iter().find_map(|j| j.err()) {
            return Err(DomainSweepError::internal(format!("worker task failed: {}", e)));
        }

        Ok(PoolStats {
            dispatched,
            completed,
        })
    }
}
