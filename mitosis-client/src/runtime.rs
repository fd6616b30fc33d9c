//! Terminal runtime: raw mode, event translation and the frame loop.
//!
//! One thread. The loop waits for terminal events only until the next frame
//! is due, then drains the network, runs the frame tick and re-arms the
//! scheduler. Handlers run to completion; nothing here blocks on the
//! network.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use glam::Vec2;
use mitosis_ws::{FrameMode, Transport, WsTransport};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::input::Direction;
use crate::render::{cell_center, CellSize, Surface, TerminalSurface};
use crate::scheduler::FrameScheduler;
use crate::session::{Session, SessionExit};

/// Raw mode, alternate screen and mouse capture for as long as it lives.
pub struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut guard = Self {
            keyboard_enhanced: false,
        };

        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.keyboard_enhanced = true;
        }
        Ok(guard)
    }

    /// Whether the terminal reports key releases.
    pub fn reports_key_release(&self) -> bool {
        self.keyboard_enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        if self.keyboard_enhanced {
            let _ = execute!(out, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(out, DisableMouseCapture, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Terminal event, reduced to what a session reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(Vec2),
    Click(Vec2),
    Key { direction: Direction, pressed: bool },
    Resize { cols: u16, rows: u16 },
    Quit,
}

/// Translate a crossterm event. Pointer positions land at the centre of the
/// reported cell.
pub fn translate(event: &Event, cell: CellSize) -> Option<InputEvent> {
    match event {
        Event::Mouse(mouse) => {
            let at = cell_center(cell, mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(InputEvent::Pointer(at)),
                MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::Click(at)),
                _ => None,
            }
        }
        Event::Key(key) => translate_key(key),
        Event::Resize(cols, rows) => Some(InputEvent::Resize {
            cols: *cols,
            rows: *rows,
        }),
        _ => None,
    }
}

fn translate_key(key: &KeyEvent) -> Option<InputEvent> {
    let pressed = match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => true,
        KeyEventKind::Release => false,
    };

    if pressed {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(InputEvent::Quit)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                return Some(InputEvent::Quit)
            }
            _ => {}
        }
    }

    let direction = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Direction::Up,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Direction::Down,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Direction::Left,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Direction::Right,
        _ => return None,
    };
    Some(InputEvent::Key { direction, pressed })
}

/// Synthesizes key releases for terminals that only report presses.
///
/// A direction with no press or repeat for `after` counts as released.
#[derive(Debug, Clone)]
pub struct KeyReleaseEmulator {
    after: Duration,
    last_press: [Option<Instant>; 4],
}

impl KeyReleaseEmulator {
    pub fn new(after: Duration) -> Self {
        Self {
            after,
            last_press: [None; 4],
        }
    }

    pub fn observe(&mut self, direction: Direction, pressed: bool, now: Instant) {
        self.last_press[slot(direction)] = pressed.then_some(now);
    }

    /// Directions whose release is now due. Each is reported once.
    pub fn expired(&mut self, now: Instant) -> Vec<Direction> {
        let mut released = Vec::new();
        for direction in Direction::ALL {
            let last = &mut self.last_press[slot(direction)];
            if matches!(last, Some(at) if now.duration_since(*at) >= self.after) {
                *last = None;
                released.push(direction);
            }
        }
        released
    }
}

fn slot(direction: Direction) -> usize {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

/// Frame loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub fps: u32,
    /// `None` when the terminal reports real key releases.
    pub key_release: Option<Duration>,
}

/// Apply one input event. Returns the exit when it ends the session.
pub fn dispatch<T: Transport, W: Write>(
    session: &mut Session<T>,
    surface: &mut TerminalSurface<W>,
    releases: Option<&mut KeyReleaseEmulator>,
    input: InputEvent,
    now: Instant,
) -> Option<SessionExit> {
    match input {
        InputEvent::Quit => return Some(SessionExit::Quit),
        InputEvent::Pointer(at) => {
            session.pointer_moved(at);
        }
        InputEvent::Click(at) => return session.click(at),
        InputEvent::Key { direction, pressed } => {
            if let Some(releases) = releases {
                releases.observe(direction, pressed, now);
            }
            session.key_changed(direction, pressed);
        }
        InputEvent::Resize { cols, rows } => {
            surface.resize(cols, rows);
            session.resize(surface.viewport());
        }
    }
    None
}

/// Drive one session until it quits or asks for a restart.
pub fn run_session<T: Transport, W: Write>(
    session: &mut Session<T>,
    surface: &mut TerminalSurface<W>,
    options: LoopOptions,
) -> io::Result<SessionExit> {
    let mut scheduler = FrameScheduler::new(options.fps, Instant::now());
    let mut releases = options.key_release.map(KeyReleaseEmulator::new);

    loop {
        let wait = scheduler.until_due(Instant::now());
        if event::poll(wait)? {
            let event = event::read()?;
            if let Some(input) = translate(&event, surface.cell_size()) {
                let exit = dispatch(session, surface, releases.as_mut(), input, Instant::now());
                if let Some(exit) = exit {
                    return Ok(exit);
                }
            }
        }

        let now = Instant::now();
        if !scheduler.is_due(now) {
            continue;
        }

        if let Some(releases) = releases.as_mut() {
            for direction in releases.expired(now) {
                session.key_changed(direction, false);
            }
        }
        session.poll_network();
        session.tick(surface)?;
        scheduler.rearm(Instant::now());

        if scheduler.ticks() % 600 == 0 {
            debug!(ticks = scheduler.ticks(), stats = ?session.stats(), "frame loop");
        }
    }
}

/// Run sessions until the player quits. Each restart opens a fresh
/// connection and builds a fresh session.
pub fn run(config: &ClientConfig) -> Result<()> {
    let guard = TerminalGuard::enter()?;
    let mut surface = TerminalSurface::stdout(config.cell_size)?;
    let options = LoopOptions {
        fps: config.fps,
        key_release: (!guard.reports_key_release()).then_some(config.key_release),
    };

    loop {
        let transport = connect(&config.server_url)?;
        let mut session = Session::start(config.session_config(), transport, surface.viewport());
        let exit = run_session(&mut session, &mut surface, options);
        session.close();

        match exit? {
            SessionExit::Restart => info!("restarting session"),
            SessionExit::Quit => {
                info!("quit");
                return Ok(());
            }
        }
    }
}

fn connect(url: &str) -> Result<WsTransport> {
    let transport = WsTransport::connect(url, FrameMode::Text).map_err(|source| {
        ClientError::Connect {
            url: url.to_string(),
            source,
        }
    })?;
    info!(%url, "connected");
    Ok(transport)
}
