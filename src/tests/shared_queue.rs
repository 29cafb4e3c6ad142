use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::PoolError;
use crate::thread_pool::shared_queue::{BlockingQueue, Message};

#[test]
fn queue_is_fifo() {
    let queue = BlockingQueue::new();
    for i in 0..5 {
        queue.enqueue(i).unwrap();
    }
    assert_eq!(queue.len(), 5);

    for i in 0..5 {
        assert_eq!(queue.dequeue(), Message::Item(i));
    }
    assert!(queue.is_empty());
}

#[test]
fn close_drains_before_stop() {
    let queue = BlockingQueue::new();
    queue.enqueue("a").unwrap();
    queue.enqueue("b").unwrap();
    queue.close().unwrap();

    assert!(queue.is_closed());
    assert_eq!(queue.dequeue(), Message::Item("a"));
    assert_eq!(queue.dequeue(), Message::Item("b"));
    assert_eq!(queue.dequeue(), Message::Stop);
    assert_eq!(queue.dequeue(), Message::Stop);
}

#[test]
fn close_twice_is_fine() {
    let queue = BlockingQueue::<u8>::new();
    queue.close().unwrap();
    queue.close().unwrap();
    assert!(queue.is_closed());
}

#[test]
fn enqueue_after_close_fails() {
    let queue = BlockingQueue::new();
    queue.close().unwrap();

    let err = queue.enqueue(1).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PoolError>(),
        Some(PoolError::QueueClosed)
    ));
}

#[test]
fn close_wakes_blocked_consumers() {
    let queue = Arc::new(BlockingQueue::<u32>::new());

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || queue.dequeue())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    queue.close().unwrap();

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), Message::Stop);
    }
}

#[test]
fn consumers_share_items_without_loss() {
    let queue = Arc::new(BlockingQueue::new());
    for i in 0..100u32 {
        queue.enqueue(i).unwrap();
    }
    queue.close().unwrap();

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Message::Item(i) = queue.dequeue() {
                    seen.push(i);
                }
                seen
            })
        })
        .collect();

    let mut all: Vec<u32> = consumers
        .into_iter()
        .flat_map(|c| c.join().unwrap())
        .collect();
    all.sort();
    assert_eq!(all, (0..100).collect::<Vec<_>>());
}
