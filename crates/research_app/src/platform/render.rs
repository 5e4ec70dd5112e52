use std::io::Write;

use chrono::Local;
use research_core::{Observer, StatusKind};
use research_logging::research_warn;

const BAR_WIDTH: usize = 20;

/// Renders session notifications as plain terminal lines.
pub struct TerminalObserver<W: Write> {
    out: W,
}

impl<W: Write> TerminalObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            research_warn!("Failed to write to terminal: {}", err);
        }
    }
}

impl<W: Write> Observer for TerminalObserver<W> {
    fn on_status(&mut self, message: &str, kind: StatusKind) {
        let icon = match kind {
            StatusKind::Success => "✅",
            StatusKind::Error => "❌",
            StatusKind::Info | StatusKind::Progress => "⏳",
        };
        self.line(&format!("{icon} {message}"));
    }

    fn on_progress(&mut self, percent: u8) {
        self.line(&progress_bar(percent));
    }

    fn on_activity(&mut self, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        self.line(&format!("  [{stamp}] {message}"));
    }

    fn on_complete(&mut self, result: &str) {
        self.line("");
        self.line("=== Research result ===");
        self.line(result);
        self.line("=======================");
    }

    fn on_error(&mut self, message: &str) {
        self.line(&format!("❌ Error: {message}"));
    }

    fn on_reset(&mut self) {
        self.line("--- Ready for new research ---");
    }
}

fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}
