/// Keyboard + mouse state tracker.
///
/// Tracks which keys and mouse buttons are currently held down and folds
/// them into a `ControlSnapshot` once per frame.
///
///   A / ←        →  Move left
///   D / →        →  Move right
///   W / ↑        →  Jump
///   J / LMB      →  Attack
///   K / RMB      →  Charge
///   Space        →  Begin
///   Enter        →  Confirm
///   R            →  Respawn
///   Esc / Ctrl+C →  Exit
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::controls::{Control, ControlSnapshot};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Which control a key drives, if any.
pub fn key_control(code: KeyCode) -> Option<Control> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Control::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Control::MoveRight),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Control::Jump),
        KeyCode::Char('j') | KeyCode::Char('J') => Some(Control::AttackPrimary),
        KeyCode::Char('k') | KeyCode::Char('K') => Some(Control::AttackSecondary),
        KeyCode::Char(' ') => Some(Control::Begin),
        KeyCode::Enter => Some(Control::Confirm),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Control::Respawn),
        KeyCode::Esc => Some(Control::Exit),
        _ => None,
    }
}

fn mouse_control(button: MouseButton) -> Option<Control> {
    match button {
        MouseButton::Left => Some(Control::AttackPrimary),
        MouseButton::Right => Some(Control::AttackSecondary),
        MouseButton::Middle => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Mouse buttons between Down and Up. Terminals always report Up.
    mouse_held: Vec<MouseButton>,

    ctrl_c: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            mouse_held: Vec::with_capacity(2),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.ctrl_c = false;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.ingest(ev, Instant::now()),
                Err(e) => {
                    tracing::warn!(error = %e, "terminal event read failed");
                    break;
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        self.expire(Instant::now());
    }

    /// Apply one terminal event as if it arrived at `now`.
    pub fn ingest(&mut self, ev: Event, now: Instant) {
        match ev {
            Event::Key(key) => self.ingest_key(key, now),
            Event::Mouse(m) => match m.kind {
                MouseEventKind::Down(b) => {
                    if !self.mouse_held.contains(&b) {
                        self.mouse_held.push(b);
                    }
                }
                MouseEventKind::Up(b) => self.mouse_held.retain(|h| *h != b),
                _ => {}
            },
            // Focus loss would strand held buttons otherwise.
            Event::FocusLost => self.release_all(),
            _ => {}
        }
    }

    fn ingest_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
            return;
        }
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted; timeout-based expiry handles it
            }
            _ => {
                self.last_active.insert(key.code, now);
            }
        }
    }

    pub fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn release_all(&mut self) {
        self.last_active.clear();
        self.mouse_held.clear();
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    /// Merge everything held right now into `snap`.
    pub fn fill(&self, snap: &mut ControlSnapshot) {
        for code in self.last_active.keys() {
            if let Some(c) = key_control(*code) {
                snap.press(c);
            }
        }
        for b in &self.mouse_held {
            if let Some(c) = mouse_control(*b) {
                snap.press(c);
            }
        }
        if self.ctrl_c {
            snap.press(Control::Exit);
        }
    }
}
