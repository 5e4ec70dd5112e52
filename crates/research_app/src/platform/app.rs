use std::io::{self, Stdout};
use std::sync::mpsc;

use anyhow::Context;
use log::LevelFilter;
use research_core::{update, AppState, Msg, Phase};
use research_engine::ApiSettings;
use research_logging::{research_debug, research_info};

use super::config::ClientConfig;
use super::effects::EffectRunner;
use super::render::TerminalObserver;
use super::{input, logging};
use crate::cli::Cli;

/// Everything the event loop reacts to.
pub(crate) enum Inbound {
    Msg(Msg),
    /// Input closed or the user asked to leave.
    Quit,
}

/// Research the given topic once, or read topics from stdin.
enum Mode {
    OneShot { topic: Option<String> },
    Interactive,
}

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::load(cli.config.as_deref())?.apply_overrides(&cli);
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log_destination, level);
    research_info!("Research client starting against {}", config.base_url);

    let settings = ApiSettings::new(&config.base_url)
        .with_context(|| format!("invalid service url {:?}", config.base_url))?;
    let (msg_tx, msg_rx) = mpsc::channel::<Inbound>();
    let runner = EffectRunner::new(settings, msg_tx.clone()).context("starting engine")?;

    let mode = match cli.topic {
        Some(topic) => Mode::OneShot { topic: Some(topic) },
        None => {
            println!("Enter a research topic (`new` to reset, `quit` to exit).");
            input::spawn_stdin_reader(msg_tx.clone());
            Mode::Interactive
        }
    };

    let mut event_loop = EventLoop {
        state: AppState::with_settings(config.session_settings()),
        runner,
        observer: TerminalObserver::new(io::stdout()),
        mode,
        watching: false,
    };
    event_loop.dispatch(Msg::Loaded);

    while let Ok(inbound) = msg_rx.recv() {
        match inbound {
            Inbound::Msg(msg) => event_loop.dispatch(msg),
            Inbound::Quit => break,
        }
        if event_loop.finished() {
            break;
        }
    }

    event_loop.teardown();
    Ok(())
}

struct EventLoop {
    state: AppState,
    runner: EffectRunner,
    observer: TerminalObserver<Stdout>,
    mode: Mode,
    /// One-shot mode has a job to wait for.
    watching: bool,
}

impl EventLoop {
    fn dispatch(&mut self, msg: Msg) {
        let status_checked = matches!(msg, Msg::StatusChecked(_));
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            research_debug!(
                "phase={:?} stream={:?} percent={} activity={}",
                view.phase,
                view.stream,
                view.percent,
                view.activity.len()
            );
        }
        self.state = state;
        self.runner.run(effects, &mut self.observer);

        if status_checked {
            self.after_status_check();
        }
    }

    /// One-shot mode submits only once the service reported what it is doing,
    /// so an already running job is followed instead of rejected.
    fn after_status_check(&mut self) {
        let Mode::OneShot { topic } = &mut self.mode else {
            return;
        };
        self.watching = true;
        if self.state.phase() == Phase::Streaming {
            return;
        }
        if let Some(topic) = topic.take() {
            self.dispatch(Msg::SubmitRequested(topic));
        }
    }

    fn finished(&self) -> bool {
        match self.mode {
            Mode::OneShot { .. } => self.watching && self.state.can_submit(),
            Mode::Interactive => false,
        }
    }

    /// Same close path as a page unload.
    fn teardown(mut self) {
        self.dispatch(Msg::Unload);
        self.runner.shutdown();
        research_info!("Research client stopped");
    }
}
