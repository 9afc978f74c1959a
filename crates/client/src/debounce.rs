//! Debounce for a channel of values.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Quiet period before filter changes are applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Forward only the latest value once `rx` has been quiet for `delay`.
///
/// Each new value replaces the pending one and restarts the timer. When
/// `rx` closes, a pending value is flushed immediately and the output
/// closes after it.
pub fn debounce<T: Send + 'static>(
    mut rx: mpsc::Receiver<T>,
    delay: Duration,
) -> mpsc::Receiver<T> {
    let (tx, out) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut pending: Option<T> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            let sleep_until = deadline.unwrap_or_else(|| Instant::now() + delay);

            tokio::select! {
                () = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                    deadline = None;
                    if let Some(value) = pending.take()
                        && tx.send(value).await.is_err()
                    {
                        break;
                    }
                }

                received = rx.recv() => match received {
                    Some(value) => {
                        pending = Some(value);
                        deadline = Some(Instant::now() + delay);
                    }
                    None => {
                        if let Some(value) = pending.take() {
                            let _ = tx.send(value).await;
                        }
                        break;
                    }
                },
            }
        }
    });

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_last_value() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, DEFAULT_DEBOUNCE);

        for value in 1..=4 {
            tx.send(value).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(out.recv().await, Some(4));
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_emit() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, DEFAULT_DEBOUNCE);

        tx.send("a").await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(out.recv().await, Some("a"));

        tx.send("b").await.unwrap();
        tx.send("c").await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(out.recv().await, Some("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_emitted_before_quiet_period() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, DEFAULT_DEBOUNCE);

        tx.send(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_value_flushed_on_close() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, Duration::from_secs(60));

        tx.send(9).await.unwrap();
        drop(tx);

        assert_eq!(out.recv().await, Some(9));
        assert_eq!(out.recv().await, None);
    }
}
