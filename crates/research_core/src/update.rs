use research_logging::{research_debug, research_info, research_warn};

use crate::error::CONNECTION_LOST;
use crate::{
    progress, AppState, Effect, JobStatus, Msg, Notification, Phase, SessionError, SessionId,
    StatusKind,
};

const STARTED_MESSAGE: &str = "Research started...";
const RESUMED_MESSAGE: &str = "Research in progress...";
const COMPLETED_MESSAGE: &str = "Research completed successfully!";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Loaded => vec![Effect::CheckStatus],
        Msg::StatusChecked(Ok(status)) => resume_from_status(&mut state, status),
        Msg::StatusChecked(Err(message)) => {
            research_warn!("Status check failed: {}", message);
            Vec::new()
        }
        Msg::SubmitRequested(topic) => match state.validate_submission(&topic) {
            Ok(topic) => {
                let session_id = state.begin_submission();
                research_info!("Submitting session={} topic={:?}", session_id, topic);
                vec![
                    Effect::Notify(Notification::Progress(state.percent())),
                    Effect::Submit { session_id, topic },
                ]
            }
            Err(err) => {
                research_info!("Submission rejected: {}", err);
                let message = err.to_string();
                state.record_error(err);
                vec![Effect::Notify(Notification::Error(message))]
            }
        },
        Msg::SubmitAccepted {
            session_id,
            message,
        } => {
            if !state.is_submitting(session_id) {
                research_debug!("Ignoring stale submit ack for session {}", session_id);
                return (state, Vec::new());
            }
            if let Some(message) = message {
                research_debug!("Service acknowledged session {}: {}", session_id, message);
            }
            state.start_streaming();
            vec![
                notify_status(&mut state, STARTED_MESSAGE, StatusKind::Success),
                Effect::AttachStream { session_id },
            ]
        }
        Msg::SubmitFailed {
            session_id,
            message,
        } => {
            if !state.is_submitting(session_id) {
                return (state, Vec::new());
            }
            research_warn!("Submission for session {} failed: {}", session_id, message);
            state.submission_failed(SessionError::Submission(message.clone()));
            vec![Effect::Notify(Notification::Error(message))]
        }
        Msg::StreamStatus { session_id, status } => {
            if !state.owns_stream(session_id) {
                research_debug!(
                    "Dropping {} frame for closed session {}",
                    status.tag(),
                    session_id
                );
                return (state, Vec::new());
            }
            apply_stream_status(&mut state, session_id, status)
        }
        Msg::StreamLost { session_id, reason } => {
            if !state.owns_stream(session_id) || state.phase() != Phase::Streaming {
                return (state, Vec::new());
            }
            research_warn!("Stream for session {} lost: {}", session_id, reason);
            state.fail(SessionError::Stream(CONNECTION_LOST.to_string()));
            vec![
                Effect::CloseStream,
                Effect::Notify(Notification::Error(CONNECTION_LOST.to_string())),
            ]
        }
        Msg::ResultDisplayDue { session_id } => match state.release_result(session_id) {
            Some(result) => vec![Effect::Notify(Notification::Complete(result))],
            None => Vec::new(),
        },
        Msg::ResetRequested => {
            state.reset();
            vec![Effect::CloseStream, Effect::Notify(Notification::Reset)]
        }
        Msg::Unload => {
            state.close_stream();
            vec![Effect::CloseStream]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_stream_status(
    state: &mut AppState,
    session_id: SessionId,
    status: JobStatus,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    let percent = progress::update(state.percent(), &status);
    match status {
        JobStatus::Running { message } => {
            if state.set_percent(percent) {
                effects.push(Effect::Notify(Notification::Progress(percent)));
            }
            if let Some(message) = message {
                effects.push(notify_status(state, message.clone(), StatusKind::Progress));
                if !JobStatus::is_start_message(&message) {
                    state.push_activity(message.clone());
                    effects.push(Effect::Notify(Notification::Activity(message)));
                }
            }
        }
        JobStatus::Completed { result } => {
            research_info!("Session {} completed ({} bytes)", session_id, result.len());
            state.set_percent(percent);
            effects.push(Effect::Notify(Notification::Progress(percent)));
            effects.push(notify_status(state, COMPLETED_MESSAGE, StatusKind::Success));
            state.complete(result);
            effects.push(Effect::CloseStream);
            effects.push(Effect::ScheduleResultDisplay {
                session_id,
                delay: state.settings().result_display_delay,
            });
        }
        JobStatus::Error { message } => {
            research_warn!("Session {} failed: {}", session_id, message);
            state.fail(SessionError::Job(message.clone()));
            effects.push(Effect::CloseStream);
            effects.push(Effect::Notify(Notification::Error(message)));
        }
        JobStatus::Heartbeat | JobStatus::Idle => {}
        JobStatus::Unknown(tag) => {
            research_debug!("Ignoring unknown status tag {:?}", tag);
        }
    }
    effects
}

fn resume_from_status(state: &mut AppState, status: JobStatus) -> Vec<Effect> {
    if !state.can_submit() {
        return Vec::new();
    }
    match status {
        JobStatus::Running { message } => {
            let session_id = state.resume_streaming();
            research_info!("Job already running; attaching as session {}", session_id);
            let message = message.unwrap_or_else(|| RESUMED_MESSAGE.to_string());
            vec![
                Effect::Notify(Notification::Progress(state.percent())),
                notify_status(state, message, StatusKind::Progress),
                Effect::AttachStream { session_id },
            ]
        }
        JobStatus::Completed { result } => {
            state.show_previous_result(result.clone());
            vec![Effect::Notify(Notification::Complete(result))]
        }
        _ => Vec::new(),
    }
}

fn notify_status(state: &mut AppState, message: impl Into<String>, kind: StatusKind) -> Effect {
    let message = message.into();
    state.set_status(message.clone(), kind);
    Effect::Notify(Notification::status(message, kind))
}
