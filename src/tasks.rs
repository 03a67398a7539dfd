//! Fire-and-forget backend writes.
//!
//! Message ingestion and buffer flushes must never block a chat turn, so they
//! are queued here and drained by a single background worker. Jobs run in
//! submission order. Failures are logged and counted, never returned.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::types::Speaker;
use crate::api::ApiClient;

/// A queued backend write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Ingest { text: String, speaker: Speaker },
    Flush { content_type: String },
}

/// Totals reported by the worker when the queue shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub completed: u64,
    pub failed: u64,
}

pub struct TaskQueue {
    tx: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<TaskStats>>,
}

impl TaskQueue {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(client: ApiClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(client, rx));
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Queue a job. Returns `false` if the queue has already shut down.
    pub fn enqueue(&self, job: Job) -> bool {
        match &self.tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Stop accepting jobs, wait for the queued ones to drain, and report totals.
    pub async fn shutdown(&mut self) -> TaskStats {
        self.tx.take();
        let Some(worker) = self.worker.take() else {
            return TaskStats::default();
        };
        match worker.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "task worker panicked");
                TaskStats::default()
            }
        }
    }
}

async fn run_worker(client: ApiClient, mut rx: mpsc::UnboundedReceiver<Job>) -> TaskStats {
    let mut stats = TaskStats::default();
    tracing::debug!("task worker started");

    while let Some(job) = rx.recv().await {
        let ok = match &job {
            Job::Ingest { text, speaker } => match client.ingest_message(text, *speaker).await {
                Ok(result) if result.success => true,
                Ok(result) => {
                    tracing::warn!(status = ?result.status, "ingest not accepted");
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "ingest failed");
                    false
                }
            },
            Job::Flush { content_type } => match client.flush_buffer(content_type).await {
                Ok(result) => {
                    tracing::info!(flushed = result.flushed, "buffer flush sent");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "flush failed");
                    false
                }
            },
        };
        if ok {
            stats.completed += 1;
        } else {
            stats.failed += 1;
        }
    }

    tracing::debug!(completed = stats.completed, failed = stats.failed, "task worker stopped");
    stats
}
