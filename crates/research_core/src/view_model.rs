use crate::{Phase, SessionError, SessionState, StatusKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub phase: Phase,
    pub stream: SessionState,
    pub percent: u8,
    pub activity: Vec<String>,
    pub status: Option<StatusLine>,
    pub result: Option<String>,
    pub last_error: Option<SessionError>,
    pub can_submit: bool,
    pub dirty: bool,
}
