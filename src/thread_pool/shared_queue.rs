use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::error::PoolError;

/// What a consumer gets back from [`BlockingQueue::dequeue`].
#[derive(Debug, PartialEq, Eq)]
pub enum Message<T> {
    Item(T),
    Stop,
}

/// Unbounded FIFO shared by any number of producers and consumers.
///
/// Closing never drops queued items: consumers keep receiving them in order, and
/// only once the queue is empty does every `dequeue` (including the ones already
/// parked) return [`Message::Stop`].
pub struct BlockingQueue<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded::<T>();
        BlockingQueue {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Appends to the tail. Fails with [`PoolError::QueueClosed`] after `close`.
    pub fn enqueue(&self, item: T) -> Result<()> {
        match self.lock_sender()?.as_ref() {
            Some(sender) => sender.send(item).map_err(|_| anyhow!(PoolError::QueueClosed)),
            None => Err(anyhow!(PoolError::QueueClosed)),
        }
    }

    /// Blocks until an item is available, or returns `Stop` once closed and drained.
    pub fn dequeue(&self) -> Message<T> {
        match self.receiver.recv() {
            Ok(item) => Message::Item(item),
            Err(_) => Message::Stop,
        }
    }

    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        // the queue holds the only sender; dropping it disconnects every receiver
        drop(self.lock_sender()?.take());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        match self.sender.lock() {
            Ok(sender) => sender.is_none(),
            Err(_) => true,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    fn lock_sender(&self) -> Result<MutexGuard<'_, Option<Sender<T>>>> {
        self.sender
            .lock()
            .map_err(|e| anyhow!(PoolError::Poisoned(e.to_string())))
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
