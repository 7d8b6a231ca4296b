//! # Async Facade
//!
//! The SDK's feature modules are blocking. [`AsyncFacade`] lifts any of them
//! onto tokio's blocking worker pool so each call becomes awaitable without
//! changing its semantics: same arguments, same result, same error values.
//!
//! ## How it works
//!
//! Each call moves a closure over the wrapped module to
//! [`tokio::task::spawn_blocking`] and awaits its completion. Concurrency is
//! bounded by the runtime's blocking pool, results resolve in completion
//! order, and a panic inside the blocking call resumes in the awaiting task.
//! Cancelling the awaiting future does not abort a call that already started
//! on the pool.
use std::sync::Arc;

/// Wraps a blocking feature module for use from async code.
///
/// The per-module async types (`AsyncQuery`, `AsyncDatabase`, ...) are fixed
/// mappings over this wrapper: one `async fn` per blocking method.
#[derive(Debug)]
pub struct AsyncFacade<T> {
    inner: Arc<T>,
}

impl<T> Clone for AsyncFacade<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AsyncFacade<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Runs `op` against the wrapped module on the blocking worker pool.
    pub async fn run<F, R>(&self, op: F) -> R
    where
        F: FnOnce(&T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        match tokio::task::spawn_blocking(move || op(&inner)).await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            // Only reachable when the runtime is shutting down mid-call.
            Err(join_error) => panic!("blocking call was cancelled: {join_error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Doubler {
        fn double(&self, value: i64) -> Result<i64, String> {
            if value < 0 {
                return Err("negative input".to_string());
            }
            Ok(value * 2)
        }
    }

    #[tokio::test]
    async fn results_match_the_blocking_call() {
        let facade = AsyncFacade::new(Doubler);
        assert_eq!(facade.run(|d| d.double(21)).await, Ok(42));
        assert_eq!(Doubler.double(21), Ok(42));
    }

    #[tokio::test]
    async fn errors_pass_through_unchanged() {
        let facade = AsyncFacade::new(Doubler);
        assert_eq!(
            facade.run(|d| d.double(-1)).await,
            Err("negative input".to_string())
        );
    }

    #[tokio::test]
    async fn panics_resume_in_the_awaiting_task() {
        let facade = AsyncFacade::new(Doubler);
        let result = tokio::spawn(async move { facade.run(|_| panic!("exploded")).await }).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_panic());
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        use std::time::{Duration, Instant};

        struct Sleeper;
        impl Sleeper {
            fn nap(&self) -> &'static str {
                std::thread::sleep(Duration::from_millis(150));
                "rested"
            }
        }

        let facade = AsyncFacade::new(Sleeper);
        let started = Instant::now();
        let (a, b) = tokio::join!(facade.run(|s| s.nap()), facade.run(|s| s.nap()));
        assert_eq!((a, b), ("rested", "rested"));
        // Two sequential naps would need at least 300ms.
        assert!(started.elapsed() < Duration::from_millis(290));
    }
}
