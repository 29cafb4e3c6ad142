use std::time::Duration;

use log::Level;

/// Settings handed to a pool at construction.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker threads are named `"{name_prefix} {index}"`.
    pub name_prefix: String,
    /// How long `join` waits between interruption checks and progress logs.
    pub poll_interval: Duration,
    /// Lifecycle events go out at `Info` when set, `Debug` otherwise.
    pub verbose: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            name_prefix: String::from("worker"),
            poll_interval: Duration::from_millis(500),
            verbose: true,
        }
    }
}

impl PoolConfig {
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn lifecycle_level(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    pub(crate) fn worker_name(&self, index: usize) -> String {
        format!("{} {}", self.name_prefix, index)
    }
}
