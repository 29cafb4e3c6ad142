use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam::channel::Sender;
use log::Level;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::outcome::Outcome;
use crate::thread_pool::shared_queue::{BlockingQueue, Message};

/// One thread bound to one function, pulling tasks off a shared inbound queue.
///
/// Stopping is cooperative: [`Worker::stop`] clears the running flag, which the
/// loop only looks at right after a dequeue and right before publishing a result.
/// A call already in progress always runs to completion, so a task that never
/// returns keeps its worker (and any `join` waiting on it) blocked forever.
pub struct Worker {
    name: String,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn spawn<T, R, F>(
        name: String,
        inbound: Arc<BlockingQueue<T>>,
        outbound: Option<Arc<BlockingQueue<Outcome<R>>>>,
        function: F,
        config: &PoolConfig,
    ) -> Result<Worker>
    where
        T: Debug + Send + 'static,
        R: Send + 'static,
        F: FnMut(T) -> Result<R> + Send + 'static,
    {
        Self::spawn_notifying(name, inbound, outbound, function, config, None)
    }

    pub(crate) fn spawn_notifying<T, R, F>(
        name: String,
        inbound: Arc<BlockingQueue<T>>,
        outbound: Option<Arc<BlockingQueue<Outcome<R>>>>,
        function: F,
        config: &PoolConfig,
        done: Option<Sender<String>>,
    ) -> Result<Worker>
    where
        T: Debug + Send + 'static,
        R: Send + 'static,
        F: FnMut(T) -> Result<R> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let loop_name = name.clone();
        let loop_running = running.clone();
        let lifecycle = config.lifecycle_level();

        // the loop only exists once the thread does, so a failed spawn logs no DONE
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                WorkerLoop {
                    name: loop_name,
                    running: loop_running,
                    inbound,
                    outbound,
                    function,
                    lifecycle,
                    done,
                }
                .run()
            })
            .map_err(|source| {
                anyhow!(PoolError::Spawn {
                    name: name.clone(),
                    source,
                })
            })?;

        Ok(Worker {
            name,
            running,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clears the running flag. Does not interrupt a call in progress.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        match self.handle.lock() {
            Ok(handle) => handle.as_ref().map_or(true, |h| h.is_finished()),
            Err(_) => true,
        }
    }

    /// Blocks until the thread exits. Joining an already joined worker returns at once.
    pub fn join(&self) -> Result<()> {
        let handle = self
            .handle
            .lock()
            .map_err(|e| anyhow!(PoolError::Poisoned(e.to_string())))?
            .take();

        match handle {
            Some(handle) => handle
                .join()
                .map_err(|payload| anyhow!("{} died: {}", self.name, panic_message(&*payload))),
            None => Ok(()),
        }
    }
}

struct WorkerLoop<T, R, F> {
    name: String,
    running: Arc<AtomicBool>,
    inbound: Arc<BlockingQueue<T>>,
    outbound: Option<Arc<BlockingQueue<Outcome<R>>>>,
    function: F,
    lifecycle: Level,
    done: Option<Sender<String>>,
}

impl<T, R, F> WorkerLoop<T, R, F>
where
    T: Debug,
    F: FnMut(T) -> Result<R>,
{
    fn run(&mut self) {
        while self.is_running() {
            let task = match self.inbound.dequeue() {
                Message::Item(task) => task,
                Message::Stop => break,
            };
            if !self.is_running() {
                break;
            }

            let outcome = self.call(task);

            match &self.outbound {
                Some(outbound) if self.is_running() => {
                    if let Err(e) = outbound.enqueue(outcome) {
                        log::warn!("{} can not publish outcome: {}", self.name, e);
                    }
                }
                Some(_) => log::debug!("{} stopped, dropping outcome", self.name),
                None => {}
            }
        }
    }

    fn call(&mut self, task: T) -> Outcome<R> {
        let params = describe(&task);
        let function = &mut self.function;
        match panic::catch_unwind(AssertUnwindSafe(|| function(task))) {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(e)) => {
                log::warn!("{} can not execute with params={}: {:#}", self.name, params, e);
                Outcome::Failure(e)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                log::warn!("{} panicked with params={}: {}", self.name, params, message);
                Outcome::Failure(anyhow!(PoolError::TaskPanicked {
                    worker: self.name.clone(),
                    message,
                }))
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<T, R, F> Drop for WorkerLoop<T, R, F> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        log::log!(self.lifecycle, "{} DONE", self.name);
        if let Some(done) = self.done.take() {
            let _ = done.send(self.name.clone());
        }
    }
}

/// Debug form of a task for failure warnings, built only when warnings are on.
fn describe<T: Debug>(task: &T) -> String {
    if !log::log_enabled!(Level::Warn) {
        return String::new();
    }
    panic::catch_unwind(AssertUnwindSafe(|| format!("{:?}", task)))
        .unwrap_or_else(|_| String::from("<unprintable task>"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}
