use thiserror::Error;

/// Message surfaced when the event stream drops while a job is running.
pub const CONNECTION_LOST: &str = "connection lost";

/// Everything a session can report back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter a research topic")]
    Validation,
    #[error("Research is already in progress")]
    AlreadyRunning,
    #[error("{0}")]
    Submission(String),
    #[error("{0}")]
    Stream(String),
    /// The job itself reported an `error` status.
    #[error("{0}")]
    Job(String),
}
