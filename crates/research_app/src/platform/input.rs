use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use research_core::Msg;

use super::app::Inbound;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Submit(String),
    Reset,
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Command {
    match line.trim() {
        "new" => Command::Reset,
        "quit" | "exit" => Command::Quit,
        _ => Command::Submit(line.to_string()),
    }
}

/// Forwards stdin lines to the event loop until `quit` or end of input.
pub(crate) fn spawn_stdin_reader(tx: mpsc::Sender<Inbound>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let msg = match parse_command(&line) {
                Command::Submit(topic) => Msg::SubmitRequested(topic),
                Command::Reset => Msg::ResetRequested,
                Command::Quit => break,
            };
            if tx.send(Inbound::Msg(msg)).is_err() {
                return;
            }
        }
        let _ = tx.send(Inbound::Quit);
    });
}
