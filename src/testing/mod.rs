//! Testing utilities for users of the cronloop library.
//!
//! This module provides target implementations for exercising
//! scheduled behavior:
//!
//! - [`CountingTarget`]: counts invocations
//! - [`RecordingTarget`]: records the instant of each invocation
//! - [`GatedTarget`]: blocks each invocation until released
//!
//! # Example
//!
//! ```ignore
//! use cronloop::testing::CountingTarget;
//! use cronloop::{InvocationMode, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let target = CountingTarget::new();
//! let id = scheduler
//!     .schedule("* * * * * *", InvocationMode::Detached, target.clone())
//!     .await?;
//! // ...wait, then assert on target.count()
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::scheduler::Target;

/// A target that counts how many times it has been invoked.
#[derive(Default)]
pub struct CountingTarget {
    count: AtomicU32,
}

impl CountingTarget {
    /// Create a new counting target.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of completed invocations.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Target for CountingTarget {
    async fn invoke(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A target that records the instant of each invocation.
#[derive(Default)]
pub struct RecordingTarget {
    invocations: Mutex<Vec<Instant>>,
}

impl RecordingTarget {
    /// Create a new recording target.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Instants of all invocations so far, in order.
    pub fn invocations(&self) -> Vec<Instant> {
        self.invocations.lock().expect("lock poisoned").clone()
    }

    /// Number of invocations so far.
    pub fn count(&self) -> usize {
        self.invocations.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl Target for RecordingTarget {
    async fn invoke(&self) {
        self.invocations
            .lock()
            .expect("lock poisoned")
            .push(Instant::now());
    }
}

/// A target that blocks each invocation on a gate until released.
///
/// Useful for holding an invocation in flight while asserting on
/// scheduler behavior around it (cancellation, overlap).
pub struct GatedTarget {
    started: Semaphore,
    gate: Semaphore,
    entered: AtomicU32,
    completed: AtomicU32,
}

impl GatedTarget {
    /// Create a new gated target with a closed gate.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Semaphore::new(0),
            gate: Semaphore::new(0),
            entered: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        })
    }

    /// Wait until an invocation has started and is blocked on the gate.
    pub async fn wait_entered(&self) {
        // The semaphore is never closed, so acquisition cannot fail.
        if let Ok(permit) = self.started.acquire().await {
            permit.forget();
        }
    }

    /// Let one blocked invocation finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Number of invocations that have started.
    pub fn entered(&self) -> u32 {
        self.entered.load(Ordering::SeqCst)
    }

    /// Number of invocations that have finished.
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Target for GatedTarget {
    async fn invoke(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.started.add_permits(1);
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
