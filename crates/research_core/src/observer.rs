/// Flavour of a status line, used by renderers to pick an icon or colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Info,
    Progress,
    Success,
    Error,
}

/// One-way notification from the session to whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Status { message: String, kind: StatusKind },
    Progress(u8),
    Activity(String),
    Complete(String),
    Error(String),
    Reset,
}

/// Rendering side of the session boundary.
pub trait Observer {
    fn on_status(&mut self, message: &str, kind: StatusKind);
    fn on_progress(&mut self, percent: u8);
    fn on_activity(&mut self, message: &str);
    fn on_complete(&mut self, result: &str);
    fn on_error(&mut self, message: &str);
    fn on_reset(&mut self);
}

impl Notification {
    pub(crate) fn status(message: impl Into<String>, kind: StatusKind) -> Self {
        Notification::Status {
            message: message.into(),
            kind,
        }
    }

    /// Hands this notification to the matching observer callback.
    pub fn deliver(&self, observer: &mut dyn Observer) {
        match self {
            Notification::Status { message, kind } => observer.on_status(message, *kind),
            Notification::Progress(percent) => observer.on_progress(*percent),
            Notification::Activity(message) => observer.on_activity(message),
            Notification::Complete(result) => observer.on_complete(result),
            Notification::Error(message) => observer.on_error(message),
            Notification::Reset => observer.on_reset(),
        }
    }
}
