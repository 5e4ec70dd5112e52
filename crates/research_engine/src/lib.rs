//! Research engine: HTTP calls, event-stream decoding and stream lifetime.
mod api;
mod engine;
mod sink;
mod sse;
mod stream;
mod types;

pub use api::{ApiSettings, ByteStream, ResearchApi, ReqwestApi};
pub use engine::{EngineError, EngineHandle};
pub use sink::{ChannelEventSink, EventSink};
pub use sse::SseDecoder;
pub use stream::StreamController;
pub use types::{ApiError, ApiFailureKind, EngineEvent, StreamEvent, SubmitAck};
