//! Timers that work on every target the core ships to.
//!
//! - Native: re-exports of `tokio::time`
//! - WASM: `gloo-timers` (the browser's `setTimeout`), since tokio has no
//!   time driver on `wasm32-unknown-unknown`
//!
//! Code that bounds an operation by a deadline should go through
//! [`timeout`] here rather than `tokio::time` directly.
//!
//! ```rust
//! use core_runtime::time::{timeout, Duration};
//!
//! # async fn example() {
//! let result = timeout(Duration::from_millis(50), async { 42 }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

pub use std::time::Duration;

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::{error::Elapsed, sleep, timeout};

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}

/// Requires `future` to complete within `duration`.
#[cfg(target_arch = "wasm32")]
pub async fn timeout<F>(duration: Duration, future: F) -> Result<F::Output, Elapsed>
where
    F: std::future::Future,
{
    let deadline = sleep(duration);

    futures::pin_mut!(future);
    futures::pin_mut!(deadline);

    match futures::future::select(future, deadline).await {
        futures::future::Either::Left((output, _)) => Ok(output),
        futures::future::Either::Right(_) => Err(Elapsed),
    }
}

/// Error returned when a [`timeout`] expires.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

#[cfg(target_arch = "wasm32")]
impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline has elapsed")
    }
}

#[cfg(target_arch = "wasm32")]
impl std::error::Error for Elapsed {}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_returns_output_in_time() {
        let result = timeout(Duration::from_millis(100), async { "done" }).await;
        assert_eq!(result.ok(), Some("done"));
    }

    #[tokio::test]
    async fn test_timeout_expires() {
        let result = timeout(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sleep_waits_at_least_duration() {
        let before = std::time::Instant::now();
        sleep(Duration::from_millis(20)).await;
        assert!(before.elapsed() >= Duration::from_millis(20));
    }
}
