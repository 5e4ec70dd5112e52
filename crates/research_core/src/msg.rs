#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Client started; look for a job that is already running.
    Loaded,
    /// Answer to `Effect::CheckStatus`.
    StatusChecked(Result<crate::JobStatus, String>),
    /// User asked to research a topic.
    SubmitRequested(String),
    /// The service accepted the submission.
    SubmitAccepted {
        session_id: crate::SessionId,
        message: Option<String>,
    },
    /// The submission call failed or was rejected.
    SubmitFailed {
        session_id: crate::SessionId,
        message: String,
    },
    /// A parsed frame from the session's stream.
    StreamStatus {
        session_id: crate::SessionId,
        status: crate::JobStatus,
    },
    /// Transport dropped or the server ended the stream.
    StreamLost {
        session_id: crate::SessionId,
        reason: String,
    },
    /// The post-completion display delay elapsed.
    ResultDisplayDue { session_id: crate::SessionId },
    /// User clicked "new research".
    ResetRequested,
    /// Client is shutting down.
    Unload,
    /// Fallback for placeholder wiring.
    NoOp,
}
