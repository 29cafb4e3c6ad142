use std::fmt::Debug;
use std::iter::{self, FusedIterator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::outcome::Outcome;

pub mod shared_queue;
pub mod worker;

use shared_queue::{BlockingQueue, Message};
use worker::Worker;

/// A boxed worker function, for pools that mix different closures.
pub type TaskFn<T, R> = Box<dyn FnMut(T) -> Result<R> + Send + 'static>;

/// Fixed set of workers sharing one inbound task queue and one outbound outcome queue.
///
/// Any idle worker may claim any queued task, so every function in a pool has to
/// accept every task shape that gets submitted.
///
/// Dropping the pool is the graceful shutdown: inbound is closed, everything
/// already queued runs, and all threads are joined before `drop` returns.
pub struct Pool<T, R> {
    workers: Vec<Worker>,
    inbound: Arc<BlockingQueue<T>>,
    outbound: Arc<BlockingQueue<Outcome<R>>>,
    done: Receiver<String>,
    interrupter: Interrupter,
    queues_closed: AtomicBool,
    config: PoolConfig,
}

impl<T, R> Pool<T, R>
where
    T: Debug + Send + 'static,
    R: Send + 'static,
{
    pub fn new<I, F>(functions: I) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
        F: FnMut(T) -> Result<R> + Send + 'static,
    {
        Self::with_config(functions, PoolConfig::default())
    }

    /// Starts one worker per function. Threads are running when this returns.
    pub fn with_config<I, F>(functions: I, config: PoolConfig) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
        F: FnMut(T) -> Result<R> + Send + 'static,
    {
        let (done_sender, done) = unbounded::<String>();
        let mut pool = Pool {
            workers: Vec::new(),
            inbound: Arc::new(BlockingQueue::new()),
            outbound: Arc::new(BlockingQueue::new()),
            done,
            interrupter: Interrupter::default(),
            queues_closed: AtomicBool::new(false),
            config,
        };

        for (index, function) in functions.into_iter().enumerate() {
            let spawned = Worker::spawn_notifying(
                pool.config.worker_name(index),
                pool.inbound.clone(),
                Some(pool.outbound.clone()),
                function,
                &pool.config,
                Some(done_sender.clone()),
            );
            match spawned {
                Ok(worker) => pool.workers.push(worker),
                Err(e) => {
                    // join below waits for every sender to go away
                    drop(done_sender);
                    drop(pool);
                    return Err(e);
                }
            }
        }
        drop(done_sender);

        if pool.workers.is_empty() {
            return Err(anyhow!(PoolError::NoWorkers));
        }
        Ok(pool)
    }

    /// `size` workers, each running its own clone of `function`.
    pub fn uniform<F>(size: usize, function: F, config: PoolConfig) -> Result<Self>
    where
        F: FnMut(T) -> Result<R> + Clone + Send + 'static,
    {
        Self::with_config(iter::repeat(function).take(size), config)
    }

    /// Runs `body` against a fresh pool, then shuts it down gracefully even if `body` panics.
    pub fn scope<I, F, B, U>(functions: I, config: PoolConfig, body: B) -> Result<U>
    where
        I: IntoIterator<Item = F>,
        F: FnMut(T) -> Result<R> + Send + 'static,
        B: FnOnce(&Pool<T, R>) -> U,
    {
        let pool = Self::with_config(functions, config)?;
        Ok(body(&pool))
    }

    /// Queues every task and returns a sequence of exactly as many outcomes.
    ///
    /// Outcomes come back in completion order, not submission order. Tasks that
    /// can not be queued (the pool was stopped) are logged and not counted.
    pub fn execute<I>(&self, tasks: I) -> Outcomes<R>
    where
        I: IntoIterator<Item = T>,
    {
        let mut expected = 0;
        for task in tasks {
            match self.inbound.enqueue(task) {
                Ok(()) => expected += 1,
                Err(e) => log::warn!("problem adding to inbound: {:#}", e),
            }
        }

        Outcomes {
            outbound: self.outbound.clone(),
            remaining: expected,
        }
    }
}

impl<T, R> Pool<T, R> {
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// True while any worker is still willing to take tasks.
    pub fn is_running(&self) -> bool {
        self.workers.iter().any(|w| w.is_running())
    }

    /// Handle for delivering a process interruption to a thread blocked in [`Pool::join`].
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    /// Forced shutdown signal. Returns immediately; pair with [`Pool::join`] to wait.
    pub fn stop(&self) {
        if let Err(e) = self.inbound.close() {
            log::warn!("problem closing inbound: {:#}", e);
        }
        for worker in &self.workers {
            worker.stop();
        }
    }

    /// Waits for every worker to terminate, then closes both queues.
    ///
    /// Never fails. If the interrupter fires while waiting, every worker is told to
    /// stop and the wait continues without further interruption checks. A worker
    /// stuck inside a task that never returns blocks this call forever.
    pub fn join(&self) {
        if self.wait_for_workers(true) {
            log::info!("shutdown started, please be patient");
            self.stop();
        }

        for worker in &self.workers {
            worker.stop();
        }
        self.wait_for_workers(false);

        for worker in &self.workers {
            if let Err(e) = worker.join() {
                log::error!("unusual shutdown! {:#}", e);
            }
        }
        self.close_queues();
    }

    /// Returns true if the wait was cut short by the interrupter.
    fn wait_for_workers(&self, interruptible: bool) -> bool {
        let level = self.config.lifecycle_level();
        loop {
            match self.done.recv_timeout(self.config.poll_interval) {
                Ok(name) => log::debug!("{} finished", name),
                Err(RecvTimeoutError::Disconnected) => return false,
                Err(RecvTimeoutError::Timeout) => {
                    if interruptible && self.interrupter.is_interrupted() {
                        return true;
                    }
                    let waiting: Vec<&str> = self
                        .workers
                        .iter()
                        .filter(|w| !w.is_finished())
                        .map(|w| w.name())
                        .collect();
                    log::log!(level, "waiting on {}", waiting.join(", "));
                }
            }
        }
    }

    fn close_queues(&self) {
        if self.queues_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.inbound.close() {
            log::warn!("problem closing inbound: {:#}", e);
        }
        if let Err(e) = self.outbound.close() {
            log::warn!("problem closing outbound: {:#}", e);
        }
    }
}

impl<T, R> Drop for Pool<T, R> {
    fn drop(&mut self) {
        // let queued work finish, then wait for it
        if let Err(e) = self.inbound.close() {
            log::warn!("problem closing inbound: {:#}", e);
        }
        self.join();
    }
}

/// Lazy, single-pass sequence of outcomes returned by [`Pool::execute`].
pub struct Outcomes<R> {
    outbound: Arc<BlockingQueue<Outcome<R>>>,
    remaining: usize,
}

impl<R> Outcomes<R> {
    /// Outcomes still expected from the pool.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<R> Iterator for Outcomes<R> {
    type Item = Outcome<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.outbound.dequeue() {
            Message::Item(outcome) => {
                self.remaining -= 1;
                Some(outcome)
            }
            Message::Stop => {
                log::warn!(
                    "outbound closed with {} outcomes outstanding",
                    self.remaining
                );
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<R> FusedIterator for Outcomes<R> {}

/// Cloneable flag a host sets (from a Ctrl-C handler, say) to escalate a pending join.
#[derive(Clone, Default, Debug)]
pub struct Interrupter(Arc<AtomicBool>);

impl Interrupter {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
