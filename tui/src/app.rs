//! Main Application
//!
//! The App turns terminal events into story input:
//! - Keys the story navigates on (space, arrows) are forwarded to the story
//! - Everything else scrolls the page by hand, like a reader would
//! - `g` or `:` opens a jump prompt (`section[:narration]`)
//!
//! Frames are drawn from a [`Page`] snapshot after every event and tick.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use scrollstory_core::{
    command_for_key, Focus, NarrationTarget, NavigationController, NavigationError,
    NavigationOutcome, SectionId, StoryKey, SurfaceInput, TargetResolution,
};

use crate::page::Page;
use crate::render::{self, StatusNote};
use crate::scroll::FRAME_MS;

/// Rows moved per mouse wheel notch
const WHEEL_ROWS: f64 = 3.0;

type JumpResult = Result<NavigationOutcome, NavigationError>;

/// Map a terminal key to a story key
#[must_use]
pub fn story_key(code: KeyCode) -> StoryKey {
    match code {
        KeyCode::Char(' ') => StoryKey::Space,
        KeyCode::Up => StoryKey::ArrowUp,
        KeyCode::Down => StoryKey::ArrowDown,
        KeyCode::Left => StoryKey::ArrowLeft,
        KeyCode::Right => StoryKey::ArrowRight,
        _ => StoryKey::Other,
    }
}

/// Parse jump prompt input: `section`, `section:3` or `section:narration-id`
#[must_use]
pub fn parse_jump(input: &str) -> Option<(SectionId, NarrationTarget)> {
    let input = input.trim();
    let (section, narration) = match input.split_once(':') {
        Some((section, narration)) => (section.trim(), narration.trim()),
        None => (input, ""),
    };
    if section.is_empty() {
        return None;
    }
    let target = if narration.is_empty() {
        NarrationTarget::First
    } else if let Ok(index) = narration.parse::<i64>() {
        NarrationTarget::Index(index)
    } else {
        NarrationTarget::Id(narration.to_string())
    };
    Some((SectionId::from(section), target))
}

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    page: Arc<Page>,
    controller: Arc<NavigationController>,
    /// Whether story keys navigate instead of scrolling
    keyboard: bool,
    /// Jump prompt input while the prompt is open
    prompt: Option<String>,
    note: StatusNote,
    jumps_tx: mpsc::UnboundedSender<JumpResult>,
    jumps_rx: mpsc::UnboundedReceiver<JumpResult>,
}

impl App {
    /// Create the app for a rendered story on `page`
    ///
    /// With `keyboard` off, space and the arrows scroll the page by hand.
    pub fn new(page: Arc<Page>, controller: Arc<NavigationController>, keyboard: bool) -> Self {
        let (jumps_tx, jumps_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            page,
            controller,
            keyboard,
            prompt: None,
            note: StatusNote::None,
            jumps_tx,
            jumps_rx,
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_MS));

        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key);
                        }
                        Some(Ok(Event::Mouse(mouse))) => self.handle_mouse(mouse),
                        Some(Ok(Event::Resize(w, h))) => self.handle_resize(w, h),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => self.running = false,
                    }
                }

                _ = ticker.tick() => {}
            }

            self.process_jump_results();
            self.render(terminal)?;
        }

        info!("Event loop finished");
        Ok(())
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: event::KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        if let Some(input) = self.prompt.as_mut() {
            match key.code {
                KeyCode::Esc => self.prompt = None,
                KeyCode::Enter => {
                    let input = self.prompt.take().unwrap_or_default();
                    self.jump(&input);
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char(':' | 'g') => {
                self.prompt = Some(String::new());
                self.note = StatusNote::None;
            }
            code => {
                let key = story_key(code);
                if self.keyboard && command_for_key(key, Focus::Body).is_some() {
                    self.note = StatusNote::None;
                    self.page.forward(SurfaceInput::Key {
                        key,
                        focus: Focus::Body,
                    });
                } else {
                    self.scroll_by_hand(code);
                }
            }
        }
    }

    fn scroll_by_hand(&self, code: KeyCode) {
        #[allow(clippy::cast_precision_loss)]
        let half_page = (self.page.viewport_rows() / 2).max(1) as f64;
        match code {
            KeyCode::Char('j') | KeyCode::Down => self.page.scroll_by(1.0),
            KeyCode::Char('k') | KeyCode::Up => self.page.scroll_by(-1.0),
            KeyCode::PageDown | KeyCode::Char(' ') => self.page.scroll_by(half_page),
            KeyCode::PageUp => self.page.scroll_by(-half_page),
            KeyCode::Home => self.page.scroll_to_edge(false),
            KeyCode::End => self.page.scroll_to_edge(true),
            _ => {}
        }
    }

    /// Handle mouse input
    fn handle_mouse(&self, mouse: event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.page.scroll_by(-WHEEL_ROWS),
            MouseEventKind::ScrollDown => self.page.scroll_by(WHEEL_ROWS),
            _ => {}
        }
    }

    /// Handle terminal resize
    fn handle_resize(&self, width: u16, height: u16) {
        debug!(width, height, "Terminal resized");
        self.page.set_size(width, height);
        self.page.forward(SurfaceInput::Resized {
            width: u32::from(width),
            height: u32::from(height),
        });
    }

    /// Jump to `section[:narration]` without blocking the event loop
    ///
    /// The outcome shows up in the status line once the scroll settles.
    pub fn jump(&mut self, input: &str) {
        let Some((section, target)) = parse_jump(input) else {
            self.note = StatusNote::Error("expected section[:narration]".to_string());
            return;
        };
        self.note = StatusNote::Message(format!("jumping to {section}…"));

        let controller = Arc::clone(&self.controller);
        let results = self.jumps_tx.clone();
        tokio::spawn(async move {
            let result = controller.scroll_to(&section, target, None).await;
            let _ = results.send(result);
        });
    }

    fn process_jump_results(&mut self) {
        while let Ok(result) = self.jumps_rx.try_recv() {
            self.note = match result {
                Ok(outcome) => {
                    let mut message = format!(
                        "{} #{} ({})",
                        outcome.section,
                        outcome.index,
                        outcome.direction.label()
                    );
                    if outcome.resolution == TargetResolution::Defaulted {
                        message.push_str(", narration not found");
                    }
                    StatusNote::Message(message)
                }
                Err(e) => StatusNote::Error(e.to_string()),
            };
        }
    }

    fn status_note(&self) -> StatusNote {
        match &self.prompt {
            Some(input) => StatusNote::Prompt(input.clone()),
            None => self.note.clone(),
        }
    }

    fn render(&self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let view = self.page.view();
        let position = self.controller.position();
        let note = self.status_note();
        terminal.draw(|frame| render::draw(frame, self.page.title(), &view, &position, &note))?;
        Ok(())
    }
}
