//! Interactive terminal host for a [`Visualizer`]

use crate::backend::{BackendRequest, ExecutionBackend};
use crate::visualizer::Visualizer;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Frame, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const PLAY_INTERVAL: Duration = Duration::from_secs(1);
const SPACE_DEBOUNCE: Duration = Duration::from_millis(200);

/// The main application state
pub struct App {
    pub visualizer: Visualizer,

    /// Tracer and request used by `r` to re-run the program
    rerun: Option<(Box<dyn ExecutionBackend>, BackendRequest)>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    pub fn new(visualizer: Visualizer) -> Self {
        let long_ago = Instant::now()
            .checked_sub(PLAY_INTERVAL)
            .unwrap_or_else(Instant::now);
        App {
            visualizer,
            rerun: None,
            should_quit: false,
            is_playing: false,
            last_play_time: long_ago,
            last_space_press: long_ago,
        }
    }

    /// Allow re-running the program with `r`
    pub fn with_rerun(mut self, backend: Box<dyn ExecutionBackend>, request: BackendRequest) -> Self {
        self.rerun = Some((backend, request));
        self
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                self.autoplay_tick();
            }

            // Poll with a timeout so autoplay keeps ticking
            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key)
                    }
                    Event::Resize(width, height) => {
                        debug!(width, height, "terminal resized");
                        self.visualizer.container_mut().resize(width, height);
                        self.visualizer.redraw_connectors();
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.visualizer
            .container_mut()
            .resize(area.width, area.height);
        self.visualizer.redraw_connectors();
        frame.render_widget(self.visualizer.container(), area);
    }

    fn autoplay_tick(&mut self) {
        if self.visualizer.next().is_err() {
            self.set_playing(false);
            self.notice("Playback complete");
        }
        self.last_play_time = Instant::now();
    }

    fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        self.visualizer.set_playing(playing);
    }

    fn notice(&mut self, message: impl Into<String>) {
        self.visualizer.set_notice(Some(message.into()));
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.set_playing(false);
                let n = c.to_digit(10).unwrap_or(1);
                let mut stepped = 0;
                for _ in 0..n {
                    if self.visualizer.next().is_err() {
                        break;
                    }
                    stepped += 1;
                }
                self.notice(format!("Stepped forward {} step(s)", stepped));
            }
            KeyCode::Left => {
                self.set_playing(false);
                match self.visualizer.prev() {
                    Ok(_) => self.notice("Stepped backward"),
                    Err(e) => self.notice(format!("Cannot step backward: {}", e)),
                }
            }
            KeyCode::Right => {
                self.set_playing(false);
                match self.visualizer.next() {
                    Ok(_) => self.notice("Stepped forward"),
                    Err(e) => self.notice(format!("Cannot step forward: {}", e)),
                }
            }
            KeyCode::Char(' ') => {
                if self.last_space_press.elapsed() >= SPACE_DEBOUNCE {
                    self.last_space_press = Instant::now();
                    let playing = !self.is_playing;
                    self.set_playing(playing);
                    if playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(PLAY_INTERVAL)
                            .unwrap_or_else(Instant::now);
                        self.notice("Playing...");
                    } else {
                        self.notice("Paused");
                    }
                }
            }
            KeyCode::Enter | KeyCode::End => {
                self.set_playing(false);
                if self.visualizer.jump_to_end().is_ok() {
                    self.notice("Jumped to end");
                }
            }
            KeyCode::Backspace | KeyCode::Home => {
                self.set_playing(false);
                if self.visualizer.jump_to_start().is_ok() {
                    self.notice("Jumped to start");
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.set_playing(false);
                self.rerun();
            }
            _ => {}
        }
    }

    fn rerun(&mut self) {
        let Some((backend, request)) = &self.rerun else {
            self.notice("No tracer configured");
            return;
        };
        let result = backend
            .execute(request)
            .and_then(|trace| self.visualizer.reload(trace));
        match result {
            Ok(()) => self.notice("Re-ran program"),
            Err(e) => {
                warn!(error = %e, "re-run failed");
                self.notice(e.to_string());
            }
        }
    }
}
