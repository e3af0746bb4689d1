/// Periodic self-announcement.
///
/// The ledger contract includes a recurring-action primitive: run a
/// body immediately, then once per interval, until cancelled. All of
/// the core's timers (heartbeat, service publish, access grant) hang
/// off this one construct.
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Invoke `action` immediately, then every `interval`, until `cancel`
/// fires.
///
/// Single-flight per registration: the body is awaited before the next
/// tick for this action can fire, so invocations of the same action
/// never overlap. Independent registrations interleave freely.
/// Cancellation stops future ticks; a tick already in progress runs to
/// completion.
pub fn announce<F, Fut>(
    cancel: CancellationToken,
    interval: Duration,
    mut action: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => action().await,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_per_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let counter = count.clone();
        let handle = announce(cancel.clone(), Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        });

        // Immediate invocation plus ticks at 100, 200, 300 ms
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);

        cancel.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4, "no ticks after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn body_runs_single_flight() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let flight = in_flight.clone();
        let overlap = overlapped.clone();
        let handle = announce(cancel.clone(), Duration::from_millis(50), move || {
            let flight = flight.clone();
            let overlap = overlap.clone();
            async move {
                if flight.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlap.fetch_add(1, Ordering::SeqCst);
                }
                // Body deliberately outlasts the interval
                tokio::time::sleep(Duration::from_millis(200)).await;
                flight.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(900)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(overlapped.load(Ordering::SeqCst), 0, "bodies must not overlap");
    }
}
