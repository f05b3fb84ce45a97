//! Firing and re-arming integration tests.
//!
//! Every-second expressions keep these tests short while still going
//! through the full arm → fire → recompute → re-arm cycle against the
//! real clock. Timing assertions are deliberately loose; what they pin
//! down is that fires happen, re-arm, and never double-fire.

use cronloop::testing::{CountingTarget, GatedTarget, RecordingTarget};
use cronloop::{InvocationMode, Scheduler};
use std::time::Duration;

use crate::common::wait_until;

#[tokio::test]
async fn test_job_fires_and_rearms_every_second() {
    let scheduler = Scheduler::new();
    let target = CountingTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Detached, target.clone())
        .await
        .unwrap();

    // Two fires prove the timer re-armed itself after the first one.
    wait_until("two fires", Duration::from_millis(3500), || {
        target.count() >= 2
    })
    .await;

    assert!(scheduler.cancel(&job_id).await);
}

#[tokio::test]
async fn test_fires_never_double_fire_on_a_boundary() {
    let scheduler = Scheduler::new();
    let target = RecordingTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Wait, target.clone())
        .await
        .unwrap();

    wait_until("three fires", Duration::from_millis(4500), || {
        target.count() >= 3
    })
    .await;
    scheduler.cancel(&job_id).await;

    // Consecutive fires of an every-second schedule must be distinct
    // boundaries. A double fire would show up as a near-zero gap; real
    // boundaries stay far apart even with scheduling jitter.
    let invocations = target.invocations();
    for pair in invocations.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(
            gap > Duration::from_millis(100),
            "consecutive fires only {gap:?} apart"
        );
    }
}

#[tokio::test]
async fn test_long_delay_is_chunked_without_drift() {
    // A tiny timer bound forces every one-second wait through the
    // intermediate-chunk path many times before the real arm.
    let scheduler = Scheduler::new().with_max_timer_delay(Duration::from_millis(25));
    let target = CountingTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Detached, target.clone())
        .await
        .unwrap();

    wait_until("two chunked fires", Duration::from_millis(3500), || {
        target.count() >= 2
    })
    .await;

    scheduler.cancel(&job_id).await;
}

#[tokio::test]
async fn test_wait_mode_blocks_rearm_until_target_completes() {
    let scheduler = Scheduler::new();
    let target = GatedTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Wait, target.clone())
        .await
        .unwrap();

    target.wait_entered().await;

    // Two boundaries pass while the first invocation is held; the job
    // must not fire again until it completes.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(target.entered(), 1);
    assert_eq!(target.completed(), 0);

    target.release();
    wait_until("held invocation to finish", Duration::from_millis(1000), || {
        target.completed() == 1
    })
    .await;

    // Released, the job re-arms and fires again.
    wait_until("second fire", Duration::from_millis(2500), || {
        target.entered() >= 2
    })
    .await;

    scheduler.cancel(&job_id).await;
    target.release();
}

#[tokio::test]
async fn test_detached_mode_overlaps_slow_targets() {
    let scheduler = Scheduler::new();
    let target = GatedTarget::new();

    let job_id = scheduler
        .schedule("* * * * * *", InvocationMode::Detached, target.clone())
        .await
        .unwrap();

    target.wait_entered().await;

    // The first invocation is still held, yet the next boundary fires.
    wait_until("overlapping invocation", Duration::from_millis(2500), || {
        target.entered() >= 2
    })
    .await;
    assert_eq!(target.completed(), 0);

    scheduler.cancel(&job_id).await;
    target.release();
    target.release();
}
