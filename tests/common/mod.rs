//! Common test utilities shared across integration tests.

use std::time::Duration;

/// Wait until `condition` returns true, polling every 10ms.
///
/// This is more reliable than fixed sleeps since timer scheduling can
/// vary under load.
///
/// # Panics
///
/// Panics if the timeout is reached before the condition holds.
pub async fn wait_until(description: &str, timeout: Duration, mut condition: impl FnMut() -> bool) {
    let start = tokio::time::Instant::now();
    loop {
        if condition() {
            return;
        }
        if start.elapsed() > timeout {
            panic!("Timeout waiting for {description}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
