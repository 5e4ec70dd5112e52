use std::sync::{mpsc, Arc};
use std::thread;

use research_core::{Effect, Msg, Observer};
use research_engine::{
    ApiSettings, ChannelEventSink, EngineError, EngineEvent, EngineHandle, StreamEvent,
};
use research_logging::{research_debug, research_info};

use super::app::Inbound;

/// Executes core effects against the engine, timers and the observer.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Inbound>,
}

impl EffectRunner {
    pub fn new(settings: ApiSettings, msg_tx: mpsc::Sender<Inbound>) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::new(settings, Arc::new(ChannelEventSink::new(event_tx)))?;
        spawn_event_loop(event_rx, msg_tx.clone());
        Ok(Self { engine, msg_tx })
    }

    pub fn run(&self, effects: Vec<Effect>, observer: &mut dyn Observer) {
        for effect in effects {
            match effect {
                Effect::CheckStatus => self.engine.check_status(),
                Effect::Submit { session_id, topic } => {
                    research_info!(
                        "Submit session_id={} topic_len={} topic={}",
                        session_id,
                        topic.len(),
                        topic
                    );
                    self.engine.submit(session_id, topic);
                }
                Effect::AttachStream { session_id } => self.engine.attach_stream(session_id),
                Effect::CloseStream => self.engine.close_stream(),
                Effect::ScheduleResultDisplay { session_id, delay } => {
                    let msg_tx = self.msg_tx.clone();
                    thread::spawn(move || {
                        thread::sleep(delay);
                        let _ = msg_tx.send(Inbound::Msg(Msg::ResultDisplayDue { session_id }));
                    });
                }
                Effect::Notify(notification) => notification.deliver(observer),
            }
        }
    }

    /// Closes the stream and stops the engine thread.
    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

/// Translates engine events into core messages until the engine goes away.
fn spawn_event_loop(event_rx: mpsc::Receiver<EngineEvent>, msg_tx: mpsc::Sender<Inbound>) {
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            research_debug!("Engine event: {:?}", event);
            if msg_tx.send(Inbound::Msg(map_event(event))).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted {
            session_id,
            result: Ok(ack),
        } => Msg::SubmitAccepted {
            session_id,
            message: ack.message,
        },
        EngineEvent::Submitted {
            session_id,
            result: Err(err),
        } => Msg::SubmitFailed {
            session_id,
            message: err.message,
        },
        EngineEvent::StatusChecked(result) => {
            Msg::StatusChecked(result.map_err(|err| err.to_string()))
        }
        EngineEvent::Stream {
            session_id,
            event: StreamEvent::Status(status),
        } => Msg::StreamStatus { session_id, status },
        EngineEvent::Stream {
            session_id,
            event: StreamEvent::Lost { reason },
        } => Msg::StreamLost { session_id, reason },
    }
}
