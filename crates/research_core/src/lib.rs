//! Research client core: status model, progress estimate and the pure job-session state machine.
mod effect;
mod error;
mod msg;
mod observer;
pub mod progress;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{SessionError, CONNECTION_LOST};
pub use msg::Msg;
pub use observer::{Notification, Observer, StatusKind};
pub use state::{AppState, Phase, SessionId, SessionSettings, SessionState};
pub use status::{
    JobStatus, MalformedEventError, ERROR_FALLBACK_MESSAGE, START_MESSAGE_MARKER,
};
pub use update::update;
pub use view_model::{SessionView, StatusLine};
