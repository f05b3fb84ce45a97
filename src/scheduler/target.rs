//! The invocation seam between the scheduler and user code.
//!
//! A [`Target`] is something the scheduler can fire with no further
//! arguments: the callable and whatever arguments it needs are bound
//! together by the caller before scheduling. The scheduler never learns
//! argument or return types.

use async_trait::async_trait;
use std::future::Future;

/// A pre-bound invocation fired by the scheduler.
#[async_trait]
pub trait Target: Send + Sync {
    /// Invoke the target. Errors are the target's own concern; the
    /// scheduler observes only completion.
    async fn invoke(&self);
}

/// Adapter turning an async closure into a [`Target`].
///
/// Built with [`target_fn`].
pub struct FnTarget<F> {
    f: F,
}

/// Wrap an async closure as a [`Target`].
///
/// ```ignore
/// let target = Arc::new(target_fn(|| async { println!("tick") }));
/// scheduler.schedule("0 * * * *", InvocationMode::Detached, target).await?;
/// ```
pub fn target_fn<F, Fut>(f: F) -> FnTarget<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    FnTarget { f }
}

#[async_trait]
impl<F, Fut> Target for FnTarget<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn invoke(&self) {
        (self.f)().await;
    }
}
