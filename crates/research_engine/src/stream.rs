use std::sync::Arc;

use futures_util::StreamExt;
use research_core::{JobStatus, SessionId};
use research_logging::{research_debug, research_info, research_warn, STREAM_TARGET};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::sse::SseDecoder;
use crate::{ApiError, EngineEvent, EventSink, ResearchApi, StreamEvent};

struct ActiveStream {
    session_id: SessionId,
    cancel: CancellationToken,
}

/// Owns at most one live event stream.
///
/// Attaching while a stream is open closes the old one first. Once closed, a
/// stream reports nothing further, not even its own disconnection.
pub struct StreamController {
    api: Arc<dyn ResearchApi>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    active: Option<ActiveStream>,
}

impl StreamController {
    pub fn new(api: Arc<dyn ResearchApi>, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self {
            api,
            sink,
            runtime,
            active: None,
        }
    }

    pub fn attach(&mut self, session_id: SessionId) {
        self.close();
        research_info!(target: STREAM_TARGET, "Attaching stream for session {}", session_id);
        let cancel = CancellationToken::new();
        self.runtime.spawn(run_stream(
            self.api.clone(),
            self.sink.clone(),
            session_id,
            cancel.clone(),
        ));
        self.active = Some(ActiveStream { session_id, cancel });
    }

    /// Idempotent; fine to call with nothing attached.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            research_info!(
                target: STREAM_TARGET,
                "Closing stream for session {}",
                active.session_id
            );
            active.cancel.cancel();
        }
    }

    /// Session of the open stream. A stream the server ended still counts
    /// until it is closed.
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|active| active.session_id)
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_stream(
    api: Arc<dyn ResearchApi>,
    sink: Arc<dyn EventSink>,
    session_id: SessionId,
    cancel: CancellationToken,
) {
    let outcome = tokio::select! {
        _ = cancel.cancelled() => return,
        outcome = pump(api.as_ref(), sink.as_ref(), session_id, &cancel) => outcome,
    };
    if cancel.is_cancelled() {
        return;
    }

    let reason = match outcome {
        Ok(()) => "stream ended by server".to_string(),
        Err(err) => err.to_string(),
    };
    research_warn!(
        target: STREAM_TARGET,
        "Stream for session {} lost: {}",
        session_id,
        reason
    );
    sink.emit(EngineEvent::Stream {
        session_id,
        event: StreamEvent::Lost { reason },
    });
}

/// Reads frames until the body ends. Returns `Ok` on a clean end of stream.
async fn pump(
    api: &dyn ResearchApi,
    sink: &dyn EventSink,
    session_id: SessionId,
    cancel: &CancellationToken,
) -> Result<(), ApiError> {
    let mut body = api.open_stream().await?;
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for data in decoder.push(&chunk) {
            let status = match JobStatus::parse(&data) {
                Ok(status) => status,
                Err(err) => {
                    research_warn!(
                        target: STREAM_TARGET,
                        "Dropping malformed frame for session {}: {} ({:?})",
                        session_id,
                        err,
                        data
                    );
                    continue;
                }
            };
            if cancel.is_cancelled() {
                return Ok(());
            }
            research_debug!(
                target: STREAM_TARGET,
                "Session {} frame: {}",
                session_id,
                status.tag()
            );
            sink.emit(EngineEvent::Stream {
                session_id,
                event: StreamEvent::Status(status),
            });
        }
    }
    if decoder.pending_len() > 0 {
        research_debug!(
            target: STREAM_TARGET,
            "Discarding {} bytes of unterminated frame",
            decoder.pending_len()
        );
    }
    Ok(())
}
