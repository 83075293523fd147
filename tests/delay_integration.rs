use my_package::{Error, delay, delay_until_cancelled, spawn_delay};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn short_delay_resolves_near_requested_time() {
    let start = Instant::now();
    delay(0.01).await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test]
async fn negative_delay_is_invalid_argument() {
    assert!(matches!(delay(-1.0).await, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn cancelled_long_delay_ends_early() {
    let start = Instant::now();
    let handle = spawn_delay(10.0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());
    handle.cancel();

    let result = handle.wait().await;
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn delay_does_not_block_other_tasks() {
    let token = CancellationToken::new();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { delay_until_cancelled(10.0, &token).await })
    };

    // Other work progresses while the delay is suspended.
    let sum = tokio::spawn(async { my_package::add(40, 2) }).await.unwrap();
    assert_eq!(sum, 42);

    token.cancel();
    assert!(waiter.await.unwrap().unwrap_err().is_cancelled());
}

#[tokio::test]
async fn dropping_delay_future_cancels_it() {
    let result = tokio::time::timeout(Duration::from_millis(20), delay(10.0)).await;
    assert!(result.is_err(), "timeout should drop the pending delay");
}
