use thiserror::Error;

/// Result type for the reconstruction core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the signal, clustering and dispatch layers
#[derive(Error, Debug)]
pub enum Error {
    /// Peak bounds were requested on a signal with no samples
    #[error("Empty signal, can't find peak bounds")]
    EmptySignal,

    /// An index does not address a sample of the signal
    #[error("Index {index} out of range for signal of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Two buffers that must line up do not
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Left extension of the sliding window must not grow the range
    #[error("Left extension must be <= 0, got {0}")]
    PositiveLeftExtension(i64),

    /// Peak/valley candidates violated their interleaving; this is a bug upstream
    #[error("Peak and valley lists are inconsistent: {0}")]
    Inconsistent(String),

    /// A time range whose stop precedes its start
    #[error("Invalid time range [{start}, {stop}]")]
    InvalidRange { start: i64, stop: i64 },

    /// A stored pulse starts before the event it was fetched for
    #[error("Pulse at {time} ns starts before event start {event_start} ns")]
    PulseBeforeEvent { time: i64, event_start: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The other end of a block queue is gone
    #[error("Block queue disconnected")]
    Disconnected,

    /// Another stage of the pipeline failed and raised the abort flag
    #[error("Stopped after another pipeline stage failed")]
    Cancelled,

    /// A sequence number arrived twice, or after it was already consumed
    #[error("Duplicate block sequence number {0}")]
    DuplicateSequence(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wire encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
