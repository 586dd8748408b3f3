//! Tests for the request queue

use super::*;
use crate::error::ErrorKind;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_pending, assert_ready_ok, task};

#[test]
fn test_concurrency_is_at_least_one() {
    assert_eq!(ConcurrencyQueue::new(0).concurrency(), 1);
    assert_eq!(ConcurrencyQueue::default().concurrency(), DEFAULT_CONCURRENCY);
}

#[tokio::test]
async fn test_run_returns_task_outcome() {
    let queue = ConcurrencyQueue::new(2);

    let ok = queue.run(async { Ok::<_, Error>(42) }).await.unwrap();
    assert_eq!(ok, 42);

    let err = queue
        .run(async { Err::<u32, _>(Error::validation("bad")) })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Failed tasks release their slot too
    assert_eq!(queue.active(), 0);
}

#[tokio::test]
async fn test_never_exceeds_concurrency_under_burst() {
    let concurrency = 3;
    let queue = ConcurrencyQueue::new(concurrency);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let tasks = (0..concurrency * 5).map(|_| {
        let queue = queue.clone();
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        async move {
            queue
                .run(async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Error>(())
                })
                .await
        }
    });

    let results = join_all(tasks).await;
    assert!(results.iter().all(std::result::Result::is_ok));
    assert_eq!(max_seen.load(Ordering::SeqCst), concurrency);
    assert_eq!(queue.active(), 0);
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_fifo_admission_order() {
    let queue = ConcurrencyQueue::new(1);
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let tasks = (0..6).map(|i| {
        let queue = queue.clone();
        let order = Arc::clone(&order);
        async move {
            queue
                .run(async move {
                    order.lock().unwrap().push(i);
                    tokio::task::yield_now().await;
                    Ok::<_, Error>(())
                })
                .await
        }
    });
    join_all(tasks).await;

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_released_slot_admits_exactly_one_waiter() {
    let queue = ConcurrencyQueue::new(1);
    let first = queue.acquire().await.unwrap();

    let mut second = task::spawn(queue.acquire());
    let mut third = task::spawn(queue.acquire());
    assert_pending!(second.poll());
    assert_pending!(third.poll());
    assert_eq!(queue.pending(), 2);

    drop(first);
    assert!(second.is_woken());
    let second_slot = assert_ready_ok!(second.poll());
    assert_pending!(third.poll());
    assert_eq!(queue.active(), 1);

    drop(second_slot);
    let _third_slot = assert_ready_ok!(third.poll());
    assert_eq!(queue.active(), 1);
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_abandoned_waiter_does_not_leak_slot() {
    let queue = ConcurrencyQueue::new(1);
    let first = queue.acquire().await.unwrap();

    let mut abandoned = task::spawn(queue.acquire());
    assert_pending!(abandoned.poll());
    drop(abandoned);

    let mut next = task::spawn(queue.acquire());
    assert_pending!(next.poll());

    drop(first);
    let _slot = assert_ready_ok!(next.poll());
    assert_eq!(queue.active(), 1);
}

#[tokio::test]
async fn test_dropped_waiters_are_not_counted() {
    let queue = ConcurrencyQueue::new(1);
    let _held = queue.acquire().await.unwrap();

    let mut waiters: Vec<_> = (0..3).map(|_| task::spawn(queue.acquire())).collect();
    for waiter in &mut waiters {
        assert_pending!(waiter.poll());
    }
    assert_eq!(queue.pending(), 3);

    drop(waiters);
    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.clear(), 0);
    assert_eq!(queue.active(), 1);
}

#[tokio::test]
async fn test_clear_discards_pending_tasks() {
    let queue = ConcurrencyQueue::new(1);
    let running = queue.acquire().await.unwrap();

    let mut waiting = task::spawn(queue.run(async { Ok::<_, Error>("never") }));
    assert_pending!(waiting.poll());

    assert_eq!(queue.clear(), 1);
    let err = match waiting.poll() {
        std::task::Poll::Ready(result) => result.unwrap_err(),
        std::task::Poll::Pending => panic!("cleared task should settle"),
    };
    assert_eq!(err.kind(), ErrorKind::Abort);

    // The running task keeps its slot until it finishes
    assert_eq!(queue.active(), 1);
    drop(running);
    assert_eq!(queue.active(), 0);
}
