//! Job lifecycle events and event handling.
//!
//! This module provides event emission for scheduler lifecycle events,
//! enabling observability into job registration, firing, and removal.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::core::types::JobId;

/// Lifecycle events emitted by a scheduler.
#[derive(Debug, Clone)]
pub enum Event {
    /// A job was registered and its first timer armed.
    JobScheduled {
        job_id: JobId,
        expression: String,
        timestamp: Instant,
    },

    /// A job's timer fired and its target was invoked.
    JobFired { job_id: JobId, timestamp: Instant },

    /// A job was cancelled and removed from the registry.
    JobCancelled { job_id: JobId, timestamp: Instant },

    /// A job could not re-arm and was removed from the registry.
    JobFailed {
        job_id: JobId,
        error: String,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::JobScheduled { timestamp, .. } => *timestamp,
            Event::JobFired { timestamp, .. } => *timestamp,
            Event::JobCancelled { timestamp, .. } => *timestamp,
            Event::JobFailed { timestamp, .. } => *timestamp,
        }
    }

    /// The job the event concerns.
    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobScheduled { job_id, .. } => job_id,
            Event::JobFired { job_id, .. } => job_id,
            Event::JobCancelled { job_id, .. } => job_id,
            Event::JobFailed { job_id, .. } => job_id,
        }
    }

    /// Create a JobScheduled event.
    pub fn job_scheduled(job_id: JobId, expression: String) -> Self {
        Event::JobScheduled {
            job_id,
            expression,
            timestamp: Instant::now(),
        }
    }

    /// Create a JobFired event.
    pub fn job_fired(job_id: JobId) -> Self {
        Event::JobFired {
            job_id,
            timestamp: Instant::now(),
        }
    }

    /// Create a JobCancelled event.
    pub fn job_cancelled(job_id: JobId) -> Self {
        Event::JobCancelled {
            job_id,
            timestamp: Instant::now(),
        }
    }

    /// Create a JobFailed event.
    pub fn job_failed(job_id: JobId, error: String) -> Self {
        Event::JobFailed {
            job_id,
            error,
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
