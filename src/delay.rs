//! Async delay example.
//!
//! The wait yields to the runtime instead of blocking the thread, and can be
//! cut short through a [`CancellationToken`].

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Convert a seconds value into a [`Duration`], rejecting negative, NaN,
/// infinite and out-of-range inputs.
pub fn duration_from_secs(seconds: f64) -> Result<Duration> {
    if seconds == 0.0 {
        return Ok(Duration::ZERO);
    }
    if seconds < 0.0 {
        return Err(Error::invalid_argument(format!(
            "delay must be non-negative, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| Error::invalid_argument(format!("invalid delay {seconds}: {e}")))
}

/// Suspend the current task for `seconds`.
///
/// Dropping the returned future cancels the wait.
pub async fn delay(seconds: f64) -> Result<()> {
    let duration = duration_from_secs(seconds)?;
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
    Ok(())
}

/// Like [`delay`], but ends early with [`Error::Cancelled`] once `token` fires.
pub async fn delay_until_cancelled(seconds: f64, token: &CancellationToken) -> Result<()> {
    let duration = duration_from_secs(seconds)?;
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = token.cancelled() => {
            debug!(seconds, "delay cancelled");
            Err(Error::Cancelled)
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// A delay running as its own task. Dropping the handle cancels it.
pub struct DelayHandle {
    token: CancellationToken,
    task: Option<JoinHandle<Result<()>>>,
}

impl DelayHandle {
    /// Stop the wait. A no-op once the delay has finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the task to finish and report how it ended.
    pub async fn wait(mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Err(Error::Cancelled);
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

impl Drop for DelayHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn [`delay_until_cancelled`] on the current runtime.
pub fn spawn_delay(seconds: f64) -> DelayHandle {
    spawn_delay_with_token(seconds, CancellationToken::new())
}

/// Spawn a delay that also stops when `token` (or any parent of it) fires.
pub fn spawn_delay_with_token(seconds: f64, token: CancellationToken) -> DelayHandle {
    let task_token = token.clone();
    let task = tokio::spawn(async move { delay_until_cancelled(seconds, &task_token).await });
    DelayHandle {
        token,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn negative_seconds_rejected() {
        let err = duration_from_secs(-1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn nan_and_infinity_rejected() {
        assert!(duration_from_secs(f64::NAN).is_err());
        assert!(duration_from_secs(f64::INFINITY).is_err());
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(duration_from_secs(-0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn fractional_seconds_convert() {
        assert_eq!(
            duration_from_secs(0.25).unwrap(),
            Duration::from_millis(250)
        );
    }

    #[tokio::test]
    async fn delay_negative_fails() {
        let err = delay(-1.0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_waits_requested_duration() {
        let start = Instant::now();
        delay(0.1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_completes_immediately() {
        let start = Instant::now();
        delay(0.0).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let err = delay_until_cancelled(10.0, &token).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn invalid_argument_wins_over_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let err = delay_until_cancelled(-1.0, &token).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_spawned_delay_ends_early() {
        let start = Instant::now();
        let handle = spawn_delay(10.0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
        let err = handle.wait().await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_token_cancels_child_delay() {
        let parent = CancellationToken::new();
        let handle = spawn_delay_with_token(10.0, parent.child_token());
        parent.cancel();
        assert!(handle.wait().await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_the_task() {
        let token = CancellationToken::new();
        let handle = spawn_delay_with_token(10.0, token.clone());
        assert!(!token.is_cancelled());
        drop(handle);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn uncancelled_spawned_delay_completes() {
        let handle = spawn_delay(0.5);
        handle.wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_completion_is_noop() {
        let handle = spawn_delay(0.01);
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        handle.cancel();
        handle.wait().await.unwrap();
    }
}
