//! Error types for warp sessions.

use thiserror::Error;

/// Errors raised by [`WarpSession`](crate::WarpSession) and
/// [`SolveWorker`](crate::SolveWorker).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The background thread could not be started.
    #[error("failed to spawn solve worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The background thread has exited.
    #[error("solve worker disconnected")]
    WorkerDisconnected,

    /// The job queue is full.
    #[error("solve worker queue is full")]
    QueueFull,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
