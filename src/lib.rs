//! Cron-expression job scheduling with self re-arming timers.
//!
//! cronloop parses cron expressions into per-field value sets, computes
//! the delay to the next matching instant, and drives registered jobs
//! with per-job timers that recompute and re-arm after every firing —
//! no polling loop. Delays beyond the platform timer bound are split
//! into bounded chunks that recompute from the wall clock, so long
//! waits never drift.
//!
//! # Example
//!
//! ```ignore
//! use cronloop::{target_fn, InvocationMode, Scheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::new();
//!
//!     // Every day at 04:00.
//!     let id = scheduler
//!         .schedule(
//!             "0 4 * * *",
//!             InvocationMode::Detached,
//!             Arc::new(target_fn(|| async { println!("nightly run") })),
//!         )
//!         .await?;
//!
//!     // ...
//!     scheduler.cancel(&id).await;
//!     Ok(())
//! }
//! ```
//!
//! Expressions have five fields (`minute hour day-of-month month
//! day-of-week`, Sunday = 0) or six with seconds prepended. Note that
//! day-of-month and day-of-week must BOTH match for a day to qualify,
//! unlike POSIX cron's union of the two.

pub mod core;
pub mod events;
pub mod scheduler;
pub mod testing;

pub use crate::core::expression::{CronExpression, ExpressionError};
pub use crate::core::field::FieldKind;
pub use crate::core::occurrence::{UnsatisfiableSchedule, MAX_MONTH_ADVANCES};
pub use crate::core::types::JobId;
pub use events::{Event, EventBus, EventHandler};
pub use scheduler::{target_fn, FnTarget, InvocationMode, Scheduler, SchedulerError, Target};
