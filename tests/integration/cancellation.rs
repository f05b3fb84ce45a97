//! Cancellation integration tests.
//!
//! Cancellation is cooperative: it disposes an armed timer immediately
//! but never interrupts an in-flight target invocation; it only
//! prevents the re-arm that would follow.

use chrono::{Local, Timelike};
use cronloop::testing::{CountingTarget, GatedTarget};
use cronloop::{InvocationMode, JobId, Scheduler};
use std::time::Duration;

use crate::common::wait_until;

#[tokio::test]
async fn test_cancel_right_after_schedule_prevents_any_fire() {
    let scheduler = Scheduler::new();
    let target = CountingTarget::new();

    // A boundary a few seconds out, so the cancel always lands before it.
    let second = (Local::now().second() + 3) % 60;
    let job_id = scheduler
        .schedule(
            &format!("{second} * * * * *"),
            InvocationMode::Detached,
            target.clone(),
        )
        .await
        .unwrap();

    assert!(scheduler.cancel(&job_id).await);

    // Well past the boundary the job would have fired on.
    tokio::time::sleep(Duration::from_millis(4000)).await;
    assert_eq!(target.count(), 0);

    // The id is gone, so a second cancel reports failure.
    assert!(!scheduler.cancel(&job_id).await);
}

#[tokio::test]
async fn test_cancel_unknown_id_returns_false() {
    let scheduler = Scheduler::new();
    assert!(!scheduler.cancel(&JobId::new()).await);
}

#[tokio::test]
async fn test_cancel_during_in_flight_fire_lets_it_finish_but_stops_rearm() {
    let scheduler = Scheduler::new();
    let target = GatedTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Wait, target.clone())
        .await
        .unwrap();

    // The fire is now blocked inside the target.
    target.wait_entered().await;

    // Cancelling mid-invocation succeeds and must not abort the target.
    assert!(scheduler.cancel(&job_id).await);
    target.release();

    wait_until("in-flight invocation to finish", Duration::from_millis(1000), || {
        target.completed() == 1
    })
    .await;

    // No re-arm: the next boundaries pass without another invocation.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(target.entered(), 1);
}

#[tokio::test]
async fn test_shutdown_stops_every_job() {
    let scheduler = Scheduler::new();
    let first = CountingTarget::new();
    let second = CountingTarget::new();

    scheduler
        .schedule("* * * * * *", InvocationMode::Detached, first.clone())
        .await
        .unwrap();
    scheduler
        .schedule("* * * * * *", InvocationMode::Detached, second.clone())
        .await
        .unwrap();

    scheduler.shutdown().await;
    assert!(scheduler.is_empty().await);

    // Let any invocation spawned just before the shutdown finish.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let counts = (first.count(), second.count());
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!((first.count(), second.count()), counts);
}
