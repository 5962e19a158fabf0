use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tracing::{info, warn};
use zappy_core::Session;
use zappy_proto::ClientRequest;

use crate::ui::{draw_ui, UiState};

const MIN_FREQUENCY: u32 = 1;
const MAX_FREQUENCY: u32 = 10_000;

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    session: Session,
    log_receiver: Receiver<String>,
}

impl InspectorApp {
    pub fn new(session: Session, peer: String, log_receiver: Receiver<String>) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::new(peer),
            session,
            log_receiver,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw = Instant::now();
        self.ui_state.snapshot = Some(self.session.state().snapshot());

        loop {
            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            for event in self.session.state().drain_animations() {
                self.ui_state.push_event(event);
            }

            if last_draw.elapsed() >= Duration::from_millis(100) {
                if let Some(snapshot) = self.session.state().take_snapshot_if_changed() {
                    self.ui_state.snapshot = Some(snapshot);
                }
                self.terminal.draw(|frame| draw_ui(frame, &self.ui_state))?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            self.request_frequency(faster(self.session.state().frequency()));
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            self.request_frequency(slower(self.session.state().frequency()));
                        }
                        KeyCode::Char('r') => {
                            self.send(&ClientRequest::MapContent);
                        }
                        _ => {}
                    }
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        self.session.shutdown();
        Ok(())
    }

    fn request_frequency(&mut self, frequency: Option<u32>) {
        match frequency {
            Some(frequency) => {
                if self.send(&ClientRequest::SetTimeUnit(frequency)) {
                    self.ui_state
                        .push_log(format!("Requested time unit {}", frequency));
                }
            }
            None => self
                .ui_state
                .push_log("Time unit unknown yet, waiting for the server"),
        }
    }

    fn send(&self, request: &ClientRequest) -> bool {
        if self.session.request(request) < 0 {
            warn!(target: "zappy::inspector", ?request, "request.failed");
            false
        } else {
            info!(target: "zappy::inspector", ?request, "request.sent");
            true
        }
    }
}

pub fn faster(current: Option<u32>) -> Option<u32> {
    current.map(|frequency| frequency.saturating_mul(2).clamp(MIN_FREQUENCY, MAX_FREQUENCY))
}

pub fn slower(current: Option<u32>) -> Option<u32> {
    current.map(|frequency| (frequency / 2).clamp(MIN_FREQUENCY, MAX_FREQUENCY))
}
