//! Bounded-concurrency job runner.
//!
//! Submitting never blocks; at most `limit` jobs run at once and the rest
//! wait for a permit. Each job's outcome is reported with the input that
//! produced it, including jobs that panicked.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tracing::warn;

type JobFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;
type JobFn<I, T, E> = Arc<dyn Fn(I) -> JobFuture<T, E> + Send + Sync>;

/// Why a job did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum JobError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("job panicked: {0}")]
    Panicked(String),

    #[error("job cancelled")]
    Cancelled,
}

/// Result of one job, paired with its input.
#[derive(Debug)]
pub struct JobOutcome<I, T, E> {
    pub input: I,
    pub result: Result<T, JobError<E>>,
}

/// Runs one async job per submitted input with a fixed concurrency cap.
pub struct WorkerPool<I, T, E> {
    job: JobFn<I, T, E>,
    permits: Arc<Semaphore>,
    limit: usize,
    /// `None` marks a job that never got a permit.
    tasks: JoinSet<Option<Result<T, E>>>,
    inputs: HashMap<task::Id, I>,
}

impl<I, T, E> WorkerPool<I, T, E>
where
    I: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a pool running `job` at most `limit` times concurrently.
    /// A limit of zero is treated as one.
    pub fn new<F, Fut>(limit: usize, job: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let limit = limit.max(1);
        Self {
            job: Arc::new(move |input| -> JobFuture<T, E> { Box::pin(job(input)) }),
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            tasks: JoinSet::new(),
            inputs: HashMap::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of jobs submitted and not yet drained.
    pub fn pending(&self) -> usize {
        self.inputs.len()
    }

    /// Schedules a job for `input`. Must be called within a tokio runtime.
    pub fn submit(&mut self, input: I) {
        let job = Arc::clone(&self.job);
        let permits = Arc::clone(&self.permits);
        let arg = input.clone();

        let handle = self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return None;
            };
            Some(job(arg).await)
        });
        self.inputs.insert(handle.id(), input);
    }

    /// Waits for every submitted job and returns their outcomes in
    /// completion order.
    pub async fn drain(mut self) -> Vec<JobOutcome<I, T, E>> {
        let mut outcomes = Vec::with_capacity(self.inputs.len());

        while let Some(joined) = self.tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, Some(r))) => (id, r.map_err(JobError::Failed)),
                Ok((id, None)) => (id, Err(JobError::Cancelled)),
                Err(e) => (e.id(), Err(join_failure(e))),
            };

            match self.inputs.remove(&id) {
                Some(input) => outcomes.push(JobOutcome { input, result }),
                None => warn!(task = %id, "finished job has no recorded input"),
            }
        }

        outcomes
    }
}

fn join_failure<E>(err: JoinError) -> JobError<E> {
    if !err.is_panic() {
        return JobError::Cancelled;
    }
    let payload = err.into_panic();
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    JobError::Panicked(msg)
}
