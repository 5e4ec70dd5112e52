use std::time::Duration;

use crate::progress;
use crate::view_model::{SessionView, StatusLine};
use crate::{SessionError, StatusKind};

/// Identifies one submission (or resumed job) and the stream that belongs to it.
pub type SessionId = u64;

/// Where the job session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Streaming,
    Completed,
    Failed,
}

/// Lifecycle of the session's single stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    AwaitingConnection,
    Active(SessionId),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Pause between reaching 100% and handing the result to the observer.
    pub result_display_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            result_display_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: SessionSettings,
    phase: Phase,
    stream: SessionState,
    session_id: SessionId,
    percent: u8,
    activity: Vec<String>,
    status: Option<StatusLine>,
    /// Result received but not yet shown; submissions stay blocked meanwhile.
    pending_result: Option<String>,
    last_result: Option<String>,
    last_error: Option<SessionError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            stream: self.stream,
            percent: self.percent,
            activity: self.activity.clone(),
            status: self.status.clone(),
            result: self.last_result.clone(),
            last_error: self.last_error.clone(),
            can_submit: self.can_submit(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stream(&self) -> SessionState {
        self.stream
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn activity(&self) -> &[String] {
        &self.activity
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// True when a new submission would be accepted.
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Completed | Phase::Failed)
            && self.pending_result.is_none()
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Checks a topic against the current state and returns it trimmed.
    pub fn validate_submission(&self, topic: &str) -> Result<String, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::Validation);
        }
        if !self.can_submit() {
            return Err(SessionError::AlreadyRunning);
        }
        Ok(topic.to_string())
    }

    /// True if stream traffic tagged with `session_id` belongs to the open handle.
    pub(crate) fn owns_stream(&self, session_id: SessionId) -> bool {
        self.stream == SessionState::Active(session_id)
    }

    pub(crate) fn is_submitting(&self, session_id: SessionId) -> bool {
        self.phase == Phase::Submitting && self.session_id == session_id
    }

    pub(crate) fn begin_submission(&mut self) -> SessionId {
        let session_id = self.next_session();
        self.phase = Phase::Submitting;
        self.stream = SessionState::AwaitingConnection;
        self.percent = progress::SUBMIT_FLOOR;
        self.last_result = None;
        self.last_error = None;
        session_id
    }

    pub(crate) fn submission_failed(&mut self, error: SessionError) {
        self.phase = Phase::Idle;
        self.stream = SessionState::NotStarted;
        self.record_error(error);
    }

    pub(crate) fn start_streaming(&mut self) {
        self.phase = Phase::Streaming;
        self.stream = SessionState::Active(self.session_id);
        self.mark_dirty();
    }

    /// Enters `Streaming` without a submission, for a job found running at load.
    pub(crate) fn resume_streaming(&mut self) -> SessionId {
        let session_id = self.next_session();
        self.percent = progress::SUBMIT_FLOOR;
        self.last_result = None;
        self.last_error = None;
        self.start_streaming();
        session_id
    }

    pub(crate) fn set_percent(&mut self, percent: u8) -> bool {
        if self.percent == percent {
            return false;
        }
        self.percent = percent;
        self.mark_dirty();
        true
    }

    pub(crate) fn push_activity(&mut self, message: String) {
        self.activity.push(message);
        self.mark_dirty();
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusLine {
            message: message.into(),
            kind,
        });
        self.mark_dirty();
    }

    pub(crate) fn complete(&mut self, result: String) {
        self.phase = Phase::Completed;
        self.stream = SessionState::Closed;
        self.pending_result = Some(result);
        self.mark_dirty();
    }

    /// Moves the pending result into view once the display delay is over.
    pub(crate) fn release_result(&mut self, session_id: SessionId) -> Option<String> {
        if self.session_id != session_id {
            return None;
        }
        let result = self.pending_result.take()?;
        self.last_result = Some(result.clone());
        self.mark_dirty();
        Some(result)
    }

    pub(crate) fn fail(&mut self, error: SessionError) {
        self.phase = Phase::Failed;
        self.stream = SessionState::Closed;
        self.record_error(error);
    }

    /// Result of an earlier job reported by the status endpoint.
    pub(crate) fn show_previous_result(&mut self, result: String) {
        self.last_result = Some(result);
        self.mark_dirty();
    }

    pub(crate) fn record_error(&mut self, error: SessionError) {
        self.status = Some(StatusLine {
            message: error.to_string(),
            kind: StatusKind::Error,
        });
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn close_stream(&mut self) {
        if matches!(
            self.stream,
            SessionState::Active(_) | SessionState::AwaitingConnection
        ) {
            self.stream = SessionState::Closed;
            self.mark_dirty();
        }
    }

    /// Back to `Idle`, dropping everything the previous session produced.
    pub(crate) fn reset(&mut self) {
        self.next_session();
        self.phase = Phase::Idle;
        if self.stream != SessionState::NotStarted {
            self.stream = SessionState::Closed;
        }
        self.percent = 0;
        self.activity.clear();
        self.status = None;
        self.pending_result = None;
        self.last_result = None;
        self.last_error = None;
        self.mark_dirty();
    }

    fn next_session(&mut self) -> SessionId {
        self.session_id += 1;
        self.activity.clear();
        self.mark_dirty();
        self.session_id
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
