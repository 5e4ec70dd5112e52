use serde_json::Value;
use thiserror::Error;

/// Marker the server puts in the first `running` message of a job.
pub const START_MESSAGE_MARKER: &str = "Starting research";

/// Shown for an `error` frame that carries no message of its own.
pub const ERROR_FALLBACK_MESSAGE: &str = "Research failed";

/// One status frame as reported by the job service, either pushed on the
/// stream or returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running { message: Option<String> },
    Completed { result: String },
    Error { message: String },
    Heartbeat,
    /// A tag this client does not know. Treated as a no-op.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEventError {
    #[error("frame is not valid json: {0}")]
    InvalidJson(String),
    #[error("frame is not a json object")]
    NotAnObject,
    #[error("frame has no status tag")]
    MissingStatus,
    #[error("`{status}` frame is missing `{field}`")]
    MissingField {
        status: &'static str,
        field: &'static str,
    },
}

impl JobStatus {
    /// Parses one `{ "status": .., "message"?: .., "result"?: .. }` frame.
    pub fn parse(raw: &str) -> Result<Self, MalformedEventError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|err| MalformedEventError::InvalidJson(err.to_string()))?;
        let object = value.as_object().ok_or(MalformedEventError::NotAnObject)?;
        let tag = object
            .get("status")
            .and_then(Value::as_str)
            .ok_or(MalformedEventError::MissingStatus)?;
        let text_field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        };

        let status = match tag {
            "idle" => JobStatus::Idle,
            "running" => JobStatus::Running {
                message: text_field("message").filter(|message| !message.is_empty()),
            },
            "completed" => JobStatus::Completed {
                result: text_field("result")
                    .filter(|result| !result.is_empty())
                    .ok_or(MalformedEventError::MissingField {
                        status: "completed",
                        field: "result",
                    })?,
            },
            // An error always ends the session, with or without a message.
            "error" => JobStatus::Error {
                message: text_field("message")
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| ERROR_FALLBACK_MESSAGE.to_string()),
            },
            "heartbeat" => JobStatus::Heartbeat,
            other => JobStatus::Unknown(other.to_string()),
        };
        Ok(status)
    }

    pub fn tag(&self) -> &str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Running { .. } => "running",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Error { .. } => "error",
            JobStatus::Heartbeat => "heartbeat",
            JobStatus::Unknown(tag) => tag,
        }
    }

    /// `completed` and `error` end a session's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Error { .. })
    }

    /// True for the synthetic message announcing a freshly started job.
    pub fn is_start_message(message: &str) -> bool {
        message.contains(START_MESSAGE_MARKER)
    }
}
