// Polling read layer
//
// One poller per query key: an immediate read on spawn, then a re-read on a
// fixed interval and on explicit invalidation after a confirmed write. The
// cached value is eventually consistent within one poll interval. A failed
// poll keeps the previous value.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// A cached contract read refreshed on a fixed interval
pub struct PollingQuery<T> {
    rx: watch::Receiver<Option<T>>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T> PollingQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the poller. The fetch closure is issued once immediately, then
    /// every `period`, then whenever `invalidate` is called.
    pub fn spawn<F, Fut>(period: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let refresh = Arc::new(Notify::new());
        let notify = Arc::clone(&refresh);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            poll_once(&fetch, &tx).await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = notify.notified() => {
                        // refetch now and restart the cadence from here
                        ticker.reset();
                    }
                }
                if tx.is_closed() {
                    break;
                }
                poll_once(&fetch, &tx).await;
            }
        });

        Self { rx, refresh, task }
    }

    /// Last successfully fetched value, if any poll has succeeded yet
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Trigger an immediate refetch, used after a confirmed write
    pub fn invalidate(&self) {
        self.refresh.notify_one();
    }

    /// Subscribe to value updates
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }
}

impl<T> Drop for PollingQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_once<T, F, Fut>(fetch: &F, tx: &watch::Sender<Option<T>>)
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    match fetch().await {
        Ok(value) => {
            let _ = tx.send(Some(value));
        }
        Err(e) => log::warn!("poll failed, keeping previous value: {e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn failed_polls_keep_the_previous_value() {
        let count = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&count);

        let query = PollingQuery::spawn(Duration::from_secs(5), move || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Ok(42u64)
                } else {
                    anyhow::bail!("rpc down")
                }
            }
        });

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(query.latest(), Some(42));
    }
}
