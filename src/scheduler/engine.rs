//! Scheduler engine implementation.
//!
//! The scheduler owns the registry of live jobs. Each job runs on its
//! own timer task: sleep until the next occurrence of the expression,
//! invoke the target, recompute, re-arm. Delays beyond the platform
//! timer bound are split into bounded chunks; every chunk recomputes
//! the remaining delay from the expression and the clock, never from
//! subtracted elapsed time, so the chain cannot drift.

use chrono::Local;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::target::Target;
use crate::core::expression::{CronExpression, ExpressionError};
use crate::core::occurrence::UnsatisfiableSchedule;
use crate::core::types::JobId;
use crate::events::{Event, EventBus};

/// Default upper bound for a single timer arm: the classic 32-bit
/// millisecond timer limit, about 24.8 days.
const DEFAULT_MAX_TIMER_DELAY: Duration = Duration::from_millis(i32::MAX as u64);

/// Errors that can occur when scheduling a job.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The expression could not be parsed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// The expression parses but can never match an instant.
    #[error(transparent)]
    Unsatisfiable(#[from] UnsatisfiableSchedule),
}

/// How a fired target is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Await the target inside the job's timer task; the next arm waits
    /// for completion. A slow target delays only its own job.
    Wait,
    /// Spawn the invocation and re-arm immediately. Errors inside the
    /// target are not observed by the scheduler.
    Detached,
}

/// One live registry entry: a job's schedule and its armed timer task.
///
/// The timer task owns the mode and target; cancelling the token stops
/// the task at its next checkpoint without interrupting an in-flight
/// invocation.
struct ScheduledJob {
    expression: CronExpression,
    cancel: CancellationToken,
    #[allow(dead_code)]
    timer: JoinHandle<()>,
}

/// Schedules cron jobs onto per-job, self re-arming timer tasks.
///
/// Each `Scheduler` value owns its registry, so independent schedulers
/// can coexist in one process and tests can inject their own.
pub struct Scheduler {
    jobs: Arc<RwLock<HashMap<JobId, ScheduledJob>>>,
    event_bus: Arc<EventBus>,
    max_timer_delay: Duration,
}

impl Scheduler {
    /// Create a scheduler with an empty registry.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            event_bus: Arc::new(EventBus::new()),
            max_timer_delay: DEFAULT_MAX_TIMER_DELAY,
        }
    }

    /// Set the event bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Set the longest delay a single timer arm may cover. Longer
    /// delays are split into chunks of this size.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    pub fn with_max_timer_delay(mut self, bound: Duration) -> Self {
        assert!(!bound.is_zero(), "max timer delay cannot be zero");
        self.max_timer_delay = bound;
        self
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Parse `expression`, verify it can fire, register a job and arm
    /// its first timer.
    ///
    /// Returns the new job's id. Nothing is registered on error: an
    /// expression that cannot be parsed or can never match fails here,
    /// synchronously.
    pub async fn schedule(
        &self,
        expression: &str,
        mode: InvocationMode,
        target: Arc<dyn Target>,
    ) -> Result<JobId, SchedulerError> {
        let expr: CronExpression = expression.parse()?;
        let initial_delay_ms = expr.next_delay_ms(Local::now())?;

        let job_id = JobId::new();
        let cancel = CancellationToken::new();

        info!(
            job_id = %job_id,
            expression = %expr,
            delay_ms = initial_delay_ms,
            "Scheduling job"
        );

        let timer = tokio::spawn(run_job(JobContext {
            expression: expr.clone(),
            mode,
            target,
            job_id: job_id.clone(),
            cancel: cancel.clone(),
            jobs: Arc::clone(&self.jobs),
            event_bus: Arc::clone(&self.event_bus),
            max_timer_delay: self.max_timer_delay,
        }));

        self.jobs.write().await.insert(
            job_id.clone(),
            ScheduledJob {
                expression: expr,
                cancel,
                timer,
            },
        );

        self.event_bus
            .emit(Event::job_scheduled(job_id.clone(), expression.to_string()))
            .await;

        Ok(job_id)
    }

    /// Cancel a job, disposing its timer and removing it from the
    /// registry. Returns `false` if the id is unknown.
    ///
    /// Safe against a concurrent fire of the same job: an in-flight
    /// target invocation is never interrupted, but the job will not
    /// re-arm afterwards.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        let removed = self.jobs.write().await.remove(job_id);
        match removed {
            Some(job) => {
                job.cancel.cancel();
                info!(job_id = %job_id, "Cancelled job");
                self.event_bus.emit(Event::job_cancelled(job_id.clone())).await;
                true
            }
            None => false,
        }
    }

    /// Cancel every live job.
    pub async fn shutdown(&self) {
        let drained: Vec<(JobId, ScheduledJob)> =
            self.jobs.write().await.drain().collect();
        info!(jobs = drained.len(), "Shutting down scheduler");
        for (job_id, job) in drained {
            job.cancel.cancel();
            self.event_bus.emit(Event::job_cancelled(job_id)).await;
        }
    }

    /// Ids of all live jobs, in no particular order.
    pub async fn job_ids(&self) -> Vec<JobId> {
        self.jobs.read().await.keys().cloned().collect()
    }

    /// Whether a job id is live.
    pub async fn contains(&self, job_id: &JobId) -> bool {
        self.jobs.read().await.contains_key(job_id)
    }

    /// The expression a live job was scheduled with.
    pub async fn expression(&self, job_id: &JobId) -> Option<String> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|job| job.expression.to_string())
    }

    /// Number of live jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a job's timer task needs, bundled so the loop reads
/// without a dozen parameters.
struct JobContext {
    expression: CronExpression,
    mode: InvocationMode,
    target: Arc<dyn Target>,
    job_id: JobId,
    cancel: CancellationToken,
    jobs: Arc<RwLock<HashMap<JobId, ScheduledJob>>>,
    event_bus: Arc<EventBus>,
    max_timer_delay: Duration,
}

/// Timer loop for one job: arm, fire, re-arm until cancelled.
async fn run_job(ctx: JobContext) {
    let max_ms = ctx.max_timer_delay.as_millis() as f64;

    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        let delay_ms = match ctx.expression.next_delay_ms(Local::now()) {
            Ok(delay) => delay,
            Err(e) => {
                // A job that cannot re-arm must not die silently.
                error!(job_id = %ctx.job_id, error = %e, "Job cannot re-arm, removing it");
                ctx.jobs.write().await.remove(&ctx.job_id);
                ctx.event_bus
                    .emit(Event::job_failed(ctx.job_id.clone(), e.to_string()))
                    .await;
                break;
            }
        };

        if delay_ms > max_ms {
            // Too far out for one arm: wait one bounded chunk, then
            // recompute the remaining delay from scratch.
            debug!(
                job_id = %ctx.job_id,
                delay_ms,
                chunk_ms = max_ms,
                "Delay exceeds timer bound, arming intermediate chunk"
            );
            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                _ = tokio::time::sleep(ctx.max_timer_delay) => {}
            }
            continue;
        }

        debug!(job_id = %ctx.job_id, delay_ms, "Armed timer");
        // Ceiling, so the timer never wakes before the occurrence.
        let delay = Duration::from_millis(delay_ms.ceil() as u64);
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        if ctx.cancel.is_cancelled() {
            break;
        }

        debug!(job_id = %ctx.job_id, "Timer fired");
        ctx.event_bus.emit(Event::job_fired(ctx.job_id.clone())).await;

        match ctx.mode {
            InvocationMode::Wait => ctx.target.invoke().await,
            InvocationMode::Detached => {
                let target = Arc::clone(&ctx.target);
                tokio::spawn(async move {
                    target.invoke().await;
                });
            }
        }
    }
}
