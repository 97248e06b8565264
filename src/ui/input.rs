/// Keyboard input tracker.
///
/// Tracks which keys are currently held so that:
///   - a fresh press moves once, immediately
///   - holding a direction keeps moving at `repeat` intervals
///   - meta keys (regenerate, view toggles, quit) fire on the press edge only
///
/// Terminals that never report key release are handled by expiring a key
/// after `HOLD_TIMEOUT` without a Press/Repeat event.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::MoveDir;

/// After this long without a Press/Repeat event a key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_REGENERATE: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PATHS: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_VIEW: &[KeyCode] = &[KeyCode::Tab];

/// What the front end should do this frame, besides moving.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Quit,
    Regenerate,
    TogglePaths,
    ToggleView,
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
    /// When the held direction last produced a move.
    last_move: Option<Instant>,
    repeat: Duration,
}

impl InputState {
    pub fn new(repeat: Duration) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            last_move: None,
            repeat,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                match key.kind {
                    KeyEventKind::Release => {
                        self.last_active.remove(&key.code);
                    }
                    _ => {
                        let was_held = self.is_held(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Direction to move this frame: on a fresh press, or while held once
    /// the repeat interval has passed.
    pub fn movement(&mut self) -> Option<MoveDir> {
        let dirs = [
            (KEYS_UP, MoveDir::Up),
            (KEYS_DOWN, MoveDir::Down),
            (KEYS_LEFT, MoveDir::Left),
            (KEYS_RIGHT, MoveDir::Right),
        ];

        if let Some(&(_, dir)) = dirs.iter().find(|(keys, _)| self.any_pressed(keys)) {
            self.last_move = Some(Instant::now());
            return Some(dir);
        }

        let held = dirs.iter().find(|(keys, _)| self.any_held(keys)).map(|&(_, d)| d);
        match (held, self.last_move) {
            (Some(dir), Some(t)) if t.elapsed() >= self.repeat => {
                self.last_move = Some(Instant::now());
                Some(dir)
            }
            (None, _) => {
                self.last_move = None;
                None
            }
            _ => None,
        }
    }

    pub fn command(&self) -> Option<Command> {
        if self.ctrl_c_pressed() || self.any_pressed(KEYS_QUIT) {
            Some(Command::Quit)
        } else if self.any_pressed(KEYS_REGENERATE) {
            Some(Command::Regenerate)
        } else if self.any_pressed(KEYS_PATHS) {
            Some(Command::TogglePaths)
        } else if self.any_pressed(KEYS_VIEW) {
            Some(Command::ToggleView)
        } else {
            None
        }
    }

    // ── Internal ──

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
