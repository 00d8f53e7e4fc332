use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mlog::{BufferRecord, PendingList, TaskPool, TaskQueue, MAX_POOL_TASKS};

fn record() -> Arc<BufferRecord> {
    Arc::new(BufferRecord::new(1, 1, 1024))
}

#[test]
fn test_pending_list_orders_by_timestamp() {
    let mut list = PendingList::new();
    let mut pool = TaskPool::new();
    // msg_len doubles as a marker so the drain order is observable.
    for (msec, marker) in [(30u64, 3usize), (10, 1), (20, 2), (40, 4)] {
        let mut task = pool.obtain();
        task.bind(msec, marker, record());
        list.push_ordered(task);
    }

    let drained: Vec<_> = list
        .drain_all()
        .into_iter()
        .map(|t| (t.msec(), t.msg_len()))
        .collect();
    assert_eq!(drained, vec![(10, 1), (20, 2), (30, 3), (40, 4)]);
    assert!(list.is_empty());
}

#[test]
fn test_pending_list_ties_keep_insertion_order() {
    let mut list = PendingList::new();
    let mut pool = TaskPool::new();
    for marker in 1..=4usize {
        let mut task = pool.obtain();
        task.bind(100, marker, record());
        list.push_ordered(task);
    }

    let markers: Vec<_> = list.drain_all().into_iter().map(|t| t.msg_len()).collect();
    assert_eq!(markers, vec![1, 2, 3, 4]);
}

#[test]
fn test_pending_list_insert_at_head() {
    let mut list = PendingList::new();
    let mut pool = TaskPool::new();

    let mut late = pool.obtain();
    late.bind(500, 1, record());
    list.push_ordered(late);

    // An older timestamp than everything pending goes to the head.
    let mut early = pool.obtain();
    early.bind(100, 2, record());
    list.push_ordered(early);

    let order: Vec<_> = list.drain_all().into_iter().map(|t| t.msec()).collect();
    assert_eq!(order, vec![100, 500]);
}

#[test]
fn test_pool_is_bounded() {
    let mut pool = TaskPool::new();
    let shells: Vec<_> = (0..MAX_POOL_TASKS + 100).map(|_| pool.obtain()).collect();
    assert!(pool.is_empty());

    for shell in shells {
        pool.recycle(shell);
    }
    // Shells beyond the bound are freed, not retained.
    assert_eq!(pool.len(), MAX_POOL_TASKS);
}

#[test]
fn test_pool_recycles_before_allocating() {
    let mut pool = TaskPool::new();
    let shell = pool.obtain();
    pool.recycle(shell);
    assert_eq!(pool.len(), 1);
    let _reused = pool.obtain();
    assert_eq!(pool.len(), 0);
}

#[test]
fn test_queue_post_and_drain() {
    let queue = TaskQueue::new();
    queue.post(2, 20, record()).unwrap();
    queue.post(1, 10, record()).unwrap();
    queue.post(3, 30, record()).unwrap();
    assert_eq!(queue.pending_len(), 3);

    let (batch, running) = queue.next_batch();
    assert!(running);
    let order: Vec<_> = batch.iter().map(|t| t.msec()).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert_eq!(queue.pending_len(), 0);
}

#[test]
fn test_queue_refuses_post_after_stop() {
    let queue = TaskQueue::new();
    queue.stop();

    let rec = record();
    let returned = queue
        .post(1, 10, Arc::clone(&rec))
        .expect_err("stopped queue must hand the record back");
    assert!(Arc::ptr_eq(&returned, &rec));
    assert_eq!(queue.pending_len(), 0);
}

#[test]
fn test_next_batch_wakes_on_stop() {
    let queue = Arc::new(TaskQueue::new());
    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.next_batch())
    };

    thread::sleep(Duration::from_millis(50));
    queue.stop();
    let (batch, running) = waiter.join().unwrap();
    assert!(batch.is_empty());
    assert!(!running);
}

#[test]
fn test_next_batch_wakes_on_post() {
    let queue = Arc::new(TaskQueue::new());
    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.next_batch())
    };

    thread::sleep(Duration::from_millis(50));
    queue.post(7, 1, record()).unwrap();
    let (batch, running) = waiter.join().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].msec(), 7);
    assert!(running);
}

#[test]
fn test_recycle_batch_respects_pool_bound() {
    let queue = TaskQueue::new();
    let mut pool = TaskPool::new();
    let shells: Vec<_> = (0..MAX_POOL_TASKS + 50).map(|_| pool.obtain()).collect();

    queue.recycle_batch(shells);
    assert_eq!(queue.pool_len(), MAX_POOL_TASKS);
}

#[test]
fn test_release_pool_frees_cached_shells() {
    let queue = TaskQueue::new();
    let mut pool = TaskPool::new();
    queue.recycle_batch((0..10).map(|_| pool.obtain()).collect());
    assert_eq!(queue.pool_len(), 10);

    queue.release_pool();
    assert_eq!(queue.pool_len(), 0);
}
