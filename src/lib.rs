// taskpool runs batches of tasks on a fixed set of worker threads

pub mod config;
pub mod error;
pub mod outcome;
pub mod thread_pool;

pub use config::PoolConfig;
pub use error::PoolError;
pub use outcome::Outcome;
pub use thread_pool::{Interrupter, Outcomes, Pool, TaskFn};

#[cfg(test)]
pub mod tests;
