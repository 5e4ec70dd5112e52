use std::time::Duration;

use crate::{Notification, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the service whether a job is already running or finished.
    CheckStatus,
    Submit { session_id: SessionId, topic: String },
    AttachStream { session_id: SessionId },
    /// Close whatever stream is open. Safe when none is.
    CloseStream,
    /// Deliver `Msg::ResultDisplayDue` for this session after `delay`.
    ScheduleResultDisplay {
        session_id: SessionId,
        delay: Duration,
    },
    Notify(Notification),
}
