use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use research_core::JobStatus;
use research_engine::{
    ApiError, ApiSettings, ByteStream, ChannelEventSink, EngineEvent, ResearchApi, ReqwestApi,
    StreamController, StreamEvent, SubmitAck,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc as tokio_mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Chunk = Result<Bytes, ApiError>;

/// Counts stream bodies dropped by the controller.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves stream bodies fed by test-controlled channels.
#[derive(Default)]
struct ScriptedApi {
    bodies: Mutex<VecDeque<tokio_mpsc::UnboundedReceiver<Chunk>>>,
    dropped: Arc<AtomicUsize>,
}

impl ScriptedApi {
    fn add_body(&self) -> tokio_mpsc::UnboundedSender<Chunk> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        self.bodies.lock().unwrap().push_back(rx);
        tx
    }

    fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResearchApi for ScriptedApi {
    async fn submit(&self, _topic: &str) -> Result<SubmitAck, ApiError> {
        Ok(SubmitAck::default())
    }

    async fn status(&self) -> Result<JobStatus, ApiError> {
        Ok(JobStatus::Idle)
    }

    async fn open_stream(&self) -> Result<ByteStream, ApiError> {
        let rx = self.bodies.lock().unwrap().pop_front().expect("scripted body");
        let guard = DropCounter(self.dropped.clone());
        let body = futures_util::stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|chunk| (chunk, (rx, guard)))
        });
        Ok(body.boxed())
    }
}

fn frame(json: &str) -> Chunk {
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

async fn next_event(rx: &mpsc::Receiver<EngineEvent>) -> Option<EngineEvent> {
    for _ in 0..300 {
        if let Ok(event) = rx.try_recv() {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn status_event(session_id: u64, status: JobStatus) -> EngineEvent {
    EngineEvent::Stream {
        session_id,
        event: StreamEvent::Status(status),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_delivers_frames_in_order_and_skips_malformed() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"status\":\"running\",\"message\":\"Starting research on: rust\"}\n\n",
        "data: not json\n\n",
        ": comment\n",
        "data: {\"status\":\"heartbeat\"}\n\n",
        "data: {\"status\":\"running\",\"message\":\"Agent researching\"}\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let api = ReqwestApi::new(ApiSettings::new(&server.uri()).unwrap()).unwrap();
    let (tx, rx) = mpsc::channel();
    let mut controller = StreamController::new(
        Arc::new(api),
        Arc::new(ChannelEventSink::new(tx)),
        Handle::current(),
    );
    controller.attach(3);

    assert_eq!(
        next_event(&rx).await,
        Some(status_event(
            3,
            JobStatus::Running {
                message: Some("Starting research on: rust".to_string())
            }
        ))
    );
    assert_eq!(
        next_event(&rx).await,
        Some(status_event(3, JobStatus::Heartbeat))
    );
    assert_eq!(
        next_event(&rx).await,
        Some(status_event(
            3,
            JobStatus::Running {
                message: Some("Agent researching".to_string())
            }
        ))
    );
    // The mock body ends, which the client sees as a dropped connection.
    assert!(matches!(
        next_event(&rx).await,
        Some(EngineEvent::Stream {
            session_id: 3,
            event: StreamEvent::Lost { .. }
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_http_failure_is_reported_as_lost() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = ReqwestApi::new(ApiSettings::new(&server.uri()).unwrap()).unwrap();
    let (tx, rx) = mpsc::channel();
    let mut controller = StreamController::new(
        Arc::new(api),
        Arc::new(ChannelEventSink::new(tx)),
        Handle::current(),
    );
    controller.attach(1);

    match next_event(&rx).await {
        Some(EngineEvent::Stream {
            session_id: 1,
            event: StreamEvent::Lost { reason },
        }) => assert!(reason.contains("500"), "reason was {reason}"),
        other => panic!("expected lost stream, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_stream_delivers_nothing_further() {
    let api = Arc::new(ScriptedApi::default());
    let body = api.add_body();
    let (tx, rx) = mpsc::channel();
    let mut controller = StreamController::new(
        api.clone(),
        Arc::new(ChannelEventSink::new(tx)),
        Handle::current(),
    );
    controller.attach(1);

    body.send(frame(r#"{"status":"running","message":"one"}"#))
        .unwrap();
    assert!(next_event(&rx).await.is_some());

    controller.close();
    assert_eq!(controller.active_session(), None);
    assert!(wait_until(|| api.dropped() == 1).await);

    let _ = body.send(frame(r#"{"status":"running","message":"two"}"#));
    drop(body);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn attach_replaces_the_previous_stream() {
    let api = Arc::new(ScriptedApi::default());
    let first = api.add_body();
    let second = api.add_body();
    let (tx, rx) = mpsc::channel();
    let mut controller = StreamController::new(
        api.clone(),
        Arc::new(ChannelEventSink::new(tx)),
        Handle::current(),
    );

    controller.attach(1);
    first.send(frame(r#"{"status":"heartbeat"}"#)).unwrap();
    assert_eq!(
        next_event(&rx).await,
        Some(status_event(1, JobStatus::Heartbeat))
    );

    controller.attach(2);
    assert_eq!(controller.active_session(), Some(2));
    assert!(wait_until(|| api.dropped() == 1).await);

    let _ = first.send(frame(r#"{"status":"running"}"#));
    second
        .send(frame(r#"{"status":"completed","result":"Report text"}"#))
        .unwrap();
    assert_eq!(
        next_event(&rx).await,
        Some(status_event(
            2,
            JobStatus::Completed {
                result: "Report text".to_string()
            }
        ))
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_error_mid_stream_reports_lost() {
    let api = Arc::new(ScriptedApi::default());
    let body = api.add_body();
    let (tx, rx) = mpsc::channel();
    let mut controller = StreamController::new(
        api.clone(),
        Arc::new(ChannelEventSink::new(tx)),
        Handle::current(),
    );
    controller.attach(4);

    body.send(Err(ApiError {
        kind: research_engine::ApiFailureKind::Network,
        message: "connection reset".to_string(),
    }))
    .unwrap();

    assert_eq!(
        next_event(&rx).await,
        Some(EngineEvent::Stream {
            session_id: 4,
            event: StreamEvent::Lost {
                reason: "connection reset".to_string()
            },
        })
    );
    assert_eq!(controller.active_session(), Some(4));
}

#[test]
fn close_without_a_stream_is_harmless() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (tx, _rx) = mpsc::channel();
    let mut controller = StreamController::new(
        Arc::new(ScriptedApi::default()),
        Arc::new(ChannelEventSink::new(tx)),
        runtime.handle().clone(),
    );

    controller.close();
    controller.close();
    assert_eq!(controller.active_session(), None);
}
