// Timing behavior of the polling read layer, under tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use evm_dapp::reads::PollingQuery;

fn counting_query(period: Duration) -> (PollingQuery<usize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&count);
    let query = PollingQuery::spawn(period, move || {
        let calls = Arc::clone(&calls);
        async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
    });
    (query, count)
}

#[tokio::test(start_paused = true)]
async fn a_ten_second_interval_polls_twice_more_over_25_seconds() {
    let (query, count) = counting_query(Duration::from_secs(10));

    tokio::time::sleep(Duration::from_secs(25)).await;

    // one immediate read plus the ticks at 10s and 20s
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(query.latest(), Some(3));
}

#[tokio::test(start_paused = true)]
async fn the_first_read_is_issued_immediately() {
    let (query, count) = counting_query(Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(query.latest(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn invalidate_triggers_an_immediate_refetch() {
    let (query, count) = counting_query(Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    query.invalidate();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_new_values() {
    let (query, _count) = counting_query(Duration::from_secs(5));
    let mut rx = query.subscribe();

    tokio::time::sleep(Duration::from_secs(6)).await;

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), Some(2));
}
