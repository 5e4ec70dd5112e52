use std::io;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use pretty_assertions::assert_eq;
use research_core::JobStatus;
use research_engine::{
    ApiError, ApiFailureKind, ApiSettings, ByteStream, ChannelEventSink, EngineError,
    EngineEvent, EngineHandle, ResearchApi, StreamEvent, SubmitAck,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn next_event(rx: &mpsc::Receiver<EngineEvent>) -> Option<EngineEvent> {
    for _ in 0..300 {
        if let Ok(event) = rx.try_recv() {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

fn engine_for(server: &MockServer) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel();
    let settings = ApiSettings::new(&server.uri()).unwrap();
    let engine = EngineHandle::new(settings, Arc::new(ChannelEventSink::new(tx))).unwrap();
    (engine, rx)
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_submits_checks_status_and_streams() {
    research_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/research"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "started",
            "message": "Research started for topic: rust"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "idle",
            "message": "",
            "result": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"status\":\"completed\",\"result\":\"Report text\"}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let (engine, rx) = engine_for(&server);

    engine.check_status();
    assert_eq!(
        next_event(&rx).await,
        Some(EngineEvent::StatusChecked(Ok(JobStatus::Idle)))
    );

    engine.submit(1, "rust");
    assert_eq!(
        next_event(&rx).await,
        Some(EngineEvent::Submitted {
            session_id: 1,
            result: Ok(SubmitAck {
                status: Some("started".to_string()),
                message: Some("Research started for topic: rust".to_string()),
            }),
        })
    );

    engine.attach_stream(1);
    assert_eq!(
        next_event(&rx).await,
        Some(EngineEvent::Stream {
            session_id: 1,
            event: StreamEvent::Status(JobStatus::Completed {
                result: "Report text".to_string()
            }),
        })
    );

    engine.close_stream();
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_reports_rejected_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/research"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Topic is required" })))
        .mount(&server)
        .await;

    let (engine, rx) = engine_for(&server);
    engine.submit(9, "x");

    match next_event(&rx).await {
        Some(EngineEvent::Submitted {
            session_id: 9,
            result: Err(err),
        }) => {
            assert_eq!(err.kind, ApiFailureKind::HttpStatus(400));
            assert_eq!(err.message, "Topic is required");
        }
        other => panic!("expected rejected submission, got {other:?}"),
    }
    engine.shutdown();
}

/// Answers every call without touching the network.
struct CannedApi;

#[async_trait::async_trait]
impl ResearchApi for CannedApi {
    async fn submit(&self, topic: &str) -> Result<SubmitAck, ApiError> {
        Ok(SubmitAck {
            status: Some("started".to_string()),
            message: Some(format!("Research started for topic: {topic}")),
        })
    }

    async fn status(&self) -> Result<JobStatus, ApiError> {
        Ok(JobStatus::Idle)
    }

    async fn open_stream(&self) -> Result<ByteStream, ApiError> {
        Err(ApiError {
            kind: ApiFailureKind::Network,
            message: "no stream".to_string(),
        })
    }
}

#[test]
fn engine_runs_on_a_caller_built_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::with_runtime(
        Arc::new(CannedApi),
        Arc::new(ChannelEventSink::new(tx)),
        runtime,
    );

    engine.submit(4, "rust");
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(3)).ok(),
        Some(EngineEvent::Submitted {
            session_id: 4,
            result: Ok(SubmitAck {
                status: Some("started".to_string()),
                message: Some("Research started for topic: rust".to_string()),
            }),
        })
    );
    engine.shutdown();
}

#[test]
fn engine_construction_reports_a_ready_worker() {
    let (tx, rx) = mpsc::channel();
    let engine =
        EngineHandle::with_api(Arc::new(CannedApi), Arc::new(ChannelEventSink::new(tx))).unwrap();

    engine.check_status();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(3)).ok(),
        Some(EngineEvent::StatusChecked(Ok(JobStatus::Idle)))
    );
    engine.shutdown();
}

#[test]
fn runtime_start_failure_is_surfaced_as_an_engine_error() {
    let err = EngineError::from(io::Error::other("no worker threads"));
    assert!(matches!(err, EngineError::Runtime(_)));
    assert_eq!(
        err.to_string(),
        "failed to start engine runtime: no worker threads"
    );
}
