use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use research_core::SessionId;
use research_logging::research_info;
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::api::{ApiSettings, ReqwestApi, ResearchApi};
use crate::stream::StreamController;
use crate::{ApiError, EngineEvent, EventSink};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
}

enum EngineCommand {
    Submit { session_id: SessionId, topic: String },
    CheckStatus,
    Attach { session_id: SessionId },
    Close,
    Shutdown,
}

/// Runs network work on a background tokio runtime and reports through an [`EventSink`].
///
/// Commands are handled in the order they are sent, so a close followed by an
/// attach never leaves two streams open.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let api = Arc::new(ReqwestApi::new(settings)?);
        Self::with_api(api, sink)
    }

    /// Fails up front if the runtime cannot be built, so no command is ever
    /// sent to a worker that is not running.
    pub fn with_api(
        api: Arc<dyn ResearchApi>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        Ok(Self::with_runtime(api, sink, Runtime::new()?))
    }

    /// Runs the engine on a caller-built runtime, which the worker thread takes over.
    pub fn with_runtime(
        api: Arc<dyn ResearchApi>,
        sink: Arc<dyn EventSink>,
        runtime: Runtime,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let mut streams =
                StreamController::new(api.clone(), sink.clone(), runtime.handle().clone());

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit { session_id, topic } => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let result = api.submit(&topic).await;
                            sink.emit(EngineEvent::Submitted { session_id, result });
                        });
                    }
                    EngineCommand::CheckStatus => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            sink.emit(EngineEvent::StatusChecked(api.status().await));
                        });
                    }
                    EngineCommand::Attach { session_id } => streams.attach(session_id),
                    EngineCommand::Close => streams.close(),
                    EngineCommand::Shutdown => break,
                }
            }

            streams.close();
            research_info!("Engine stopped");
        });

        Self {
            cmd_tx,
            worker: Some(worker),
        }
    }

    pub fn submit(&self, session_id: SessionId, topic: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            session_id,
            topic: topic.into(),
        });
    }

    pub fn check_status(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CheckStatus);
    }

    pub fn attach_stream(&self, session_id: SessionId) {
        let _ = self.cmd_tx.send(EngineCommand::Attach { session_id });
    }

    pub fn close_stream(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Close);
    }

    /// Closes any open stream and waits for the worker thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
