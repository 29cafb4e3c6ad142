use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("queue is closed")]
    QueueClosed,

    #[error("queue lock poisoned: {0}")]
    Poisoned(String),

    #[error("a pool needs at least one worker function")]
    NoWorkers,

    #[error("can not start thread {name}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task panicked on {worker}: {message}")]
    TaskPanicked { worker: String, message: String },
}
