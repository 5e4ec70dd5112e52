use research_core::{JobStatus, SessionId};
use serde::Deserialize;
use thiserror::Error;

/// Acknowledgement body of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Status(JobStatus),
    /// The transport failed or the server ended the stream.
    Lost { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        session_id: SessionId,
        result: Result<SubmitAck, ApiError>,
    },
    StatusChecked(Result<JobStatus, ApiError>),
    Stream {
        session_id: SessionId,
        event: StreamEvent,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiFailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Network,
    InvalidResponse,
}
