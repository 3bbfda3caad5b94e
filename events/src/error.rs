use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Backpressure: the queue is at capacity and the event was rejected.
    #[error("event queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("event queue closed")]
    Closed,

    #[error("dispatch loop already running")]
    AlreadyRunning,

    #[error("no Tokio runtime available to run the dispatch loop")]
    NoRuntime,

    /// A cancelled `stop` left the previous dispatch loop still draining.
    #[error("previous dispatch loop is still stopping")]
    Stopping,

    #[error("dispatch loop not running")]
    NotRunning,

    #[error("dispatch loop panicked")]
    WorkerPanicked,
}
