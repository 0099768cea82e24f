//! # World Task
//!
//! The single owner of all territory state. A dedicated task holds the
//! [`TerritoryGuard`] and runs jobs against it one at a time, in the order they
//! were scheduled. Everything else in the process (event hooks, commands,
//! the snapshot writer, the statistics monitor) reaches the state only by
//! scheduling a job through a [`WorldHandle`].
//!
//! Because jobs never overlap, the core crates need no internal locking, and a
//! snapshot captured inside a job is always a consistent view.
//!
//! A job that panics is logged and dropped; the task keeps serving the queue.

use std::panic::{catch_unwind, AssertUnwindSafe};
use territory_guard::TerritoryGuard;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Work executed on the world task.
pub type Job = Box<dyn FnOnce(&mut TerritoryGuard) + Send + 'static>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("world task has stopped")]
    Closed,
    #[error("world queue is full")]
    Busy,
    /// The job was accepted but never answered.
    #[error("job was dropped before completing")]
    Dropped,
}

/// Cloneable handle for scheduling jobs onto the world task.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    jobs: mpsc::Sender<Job>,
}

impl WorldHandle {
    /// Queues `job`, waiting for space if the queue is full.
    pub async fn schedule<F>(&self, job: F) -> Result<(), WorldError>
    where
        F: FnOnce(&mut TerritoryGuard) + Send + 'static,
    {
        self.jobs.send(Box::new(job)).await.map_err(|_| WorldError::Closed)
    }

    /// Queues `job` without waiting. For callers that must not block.
    pub fn try_schedule<F>(&self, job: F) -> Result<(), WorldError>
    where
        F: FnOnce(&mut TerritoryGuard) + Send + 'static,
    {
        self.jobs.try_send(Box::new(job)).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => WorldError::Busy,
            mpsc::error::TrySendError::Closed(_) => WorldError::Closed,
        })
    }

    /// Runs `job` on the world task and returns its result.
    pub async fn run<F, R>(&self, job: F) -> Result<R, WorldError>
    where
        F: FnOnce(&mut TerritoryGuard) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, answer) = oneshot::channel();
        self.schedule(move |guard| {
            // The caller may have given up waiting.
            let _ = reply.send(job(guard));
        })
        .await?;
        answer.await.map_err(|_| WorldError::Dropped)
    }

    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

/// Starts the world task.
///
/// The task ends once every [`WorldHandle`] has been dropped and the queue is
/// drained, handing the guard back through the join handle.
pub fn spawn_world(guard: TerritoryGuard, queue_capacity: usize) -> (WorldHandle, JoinHandle<TerritoryGuard>) {
    let (jobs, mut queue) = mpsc::channel::<Job>(queue_capacity.max(1));

    let task = tokio::spawn(async move {
        let mut guard = guard;
        let mut processed = 0u64;
        let mut failed = 0u64;

        info!("🌍 World task started");
        while let Some(job) = queue.recv().await {
            if catch_unwind(AssertUnwindSafe(|| job(&mut guard))).is_err() {
                failed += 1;
                error!("💥 World job panicked; state kept, queue continues");
            }
            processed += 1;
        }

        info!("🌍 World task stopped after {} jobs ({} failed)", processed, failed);
        guard
    });

    (WorldHandle { jobs }, task)
}
