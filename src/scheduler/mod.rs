//! Job registry and timer-driven scheduling.
//!
//! This module provides the scheduler that arms a timer per job,
//! invokes the job's target when the timer fires, and re-arms from the
//! job's cron expression.

mod engine;
mod target;

pub use engine::{InvocationMode, Scheduler, SchedulerError};
pub use target::{target_fn, FnTarget, Target};
