//! Shared execution policy for per-entity operations.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;

/// How a batch of per-entity operations is executed.
#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    /// Maximum number of operations in flight.
    pub concurrency: usize,
    /// Fixed delay after each operation completes, before its slot frees.
    pub delay: Option<Duration>,
}

impl RunPolicy {
    /// At most `n` operations in flight, no delay.
    pub fn bounded(n: usize) -> Self {
        Self {
            concurrency: n.max(1),
            delay: None,
        }
    }

    /// One slot per item: the whole batch runs concurrently.
    pub fn batch_wide(len: usize) -> Self {
        Self::bounded(len)
    }

    /// Strictly sequential execution.
    pub fn serial() -> Self {
        Self::bounded(1)
    }

    /// Adds a fixed post-completion delay. A zero delay means none.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = (!delay.is_zero()).then_some(delay);
        self
    }
}

/// Runs `op` over `items` with at most `policy.concurrency` operations in
/// flight, returning results in input order regardless of completion order.
///
/// One item's failure never aborts its siblings: `op` surfaces failures in
/// its own output type and the caller classifies them per item. With a
/// policy delay, each operation's slot is held for the delay after the
/// operation completes, which under `serial()` yields the rate-limited
/// one-call-per-interval pattern the publish queue needs.
pub async fn run_all<T, R, F, Fut>(items: Vec<T>, policy: RunPolicy, op: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let delay = policy.delay;
    stream::iter(items.into_iter().map(|item| {
        let operation = op(item);
        async move {
            let result = operation.await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }))
    .buffered(policy.concurrency.max(1))
    .collect()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn preserves_input_order() {
        // Later items finish first; results must still line up with input.
        let results = run_all(vec![3u64, 2, 1], RunPolicy::bounded(3), |n| async move {
            tokio::time::sleep(Duration::from_millis(n * 10)).await;
            n * 100
        })
        .await;
        assert_eq!(results, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn caps_in_flight_operations() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_all(vec![(); 8], RunPolicy::bounded(2), |_| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn serial_policy_runs_one_at_a_time() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        run_all(vec![(); 5], RunPolicy::serial(), |_| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_do_not_abort_siblings() {
        let results = run_all(vec![1u32, 2, 3], RunPolicy::bounded(3), |n| async move {
            if n == 2 {
                Err(format!("item {n} failed"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(results[0], Ok(1));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(3));
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped() {
        let results = run_all(vec![1u32], RunPolicy::bounded(0), |n| async move { n }).await;
        assert_eq!(results, vec![1]);
    }

    #[tokio::test]
    async fn delay_holds_the_slot() {
        tokio::time::pause();
        let started = std::time::Instant::now();
        let policy = RunPolicy::serial().with_delay(Duration::from_millis(500));
        let results = run_all(vec![(), ()], policy, |_| async {}).await;
        assert_eq!(results.len(), 2);
        // With paused time the sleeps auto-advance; this just asserts the
        // delayed path completes rather than hanging.
        let _ = started.elapsed();
    }
}
