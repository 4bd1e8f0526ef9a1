/// Input state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered actions (jump, confirm) via the previous-frame
///     snapshot inside `FrameInput`
///   - Pointer position and button state from terminal mouse capture
///
/// Uses crossterm's keyboard enhancement for Release events when
/// available. Falls back to timeout-based release detection on
/// terminals that don't support it. Mouse button state is exact: the
/// terminal reports Down/Up pairs reliably under mouse capture.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::entity::{Buttons, FrameInput};
use crate::domain::geometry::Vec2;
use crate::ui::{CELL_H, CELL_W};

/// After this duration without a Press/Repeat event, consider the key
/// released. Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each (normalized) key.
    last_active: HashMap<KeyCode, Instant>,
    /// Last time any key event carried the shift modifier.
    modifier_active: Option<Instant>,
    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    pointer_cell: (u16, u16),
    primary_down: bool,
    secondary_down: bool,

    quit: bool,
    prev: Buttons,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            modifier_active: None,
            honor_release: false,
            pointer_cell: (0, 0),
            primary_down: false,
            secondary_down: false,
            quit: false,
            prev: Buttons::default(),
        }
    }

    /// Drain all pending terminal events and update key/pointer state.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(mouse)) => {
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => self.primary_down = true,
                        MouseEventKind::Up(MouseButton::Left) => self.primary_down = false,
                        MouseEventKind::Down(MouseButton::Right) => self.secondary_down = true,
                        MouseEventKind::Up(MouseButton::Right) => self.secondary_down = false,
                        _ => {}
                    }
                    self.pointer_cell = (mouse.column, mouse.row);
                }
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals
        // without Release events).
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        if let Some(t) = self.modifier_active {
            if now.duration_since(t) >= HOLD_TIMEOUT {
                self.modifier_active = None;
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.quit = true;
            return;
        }

        let code = normalize(key.code);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed; rely
                // on timeout-based expiry instead.
            }
            _ => {
                self.last_active.insert(code, Instant::now());
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.modifier_active = Some(Instant::now());
                }
            }
        }
    }

    /// Assemble the immutable per-frame snapshot the core consumes.
    pub fn frame_input(&mut self) -> FrameInput {
        let held = Buttons {
            left: self.any_held(KEYS_LEFT),
            right: self.any_held(KEYS_RIGHT),
            up: self.any_held(KEYS_UP),
            down: self.any_held(KEYS_DOWN),
            jump: self.any_held(KEYS_JUMP),
            modifier: self.modifier_active.is_some(),
            confirm: self.any_held(KEYS_CONFIRM),
            cancel: self.any_held(KEYS_CANCEL),
            primary: self.primary_down,
            secondary: self.secondary_down,
        };
        let prev = self.prev;
        self.prev = held;

        FrameInput { held, prev, pointer: self.pointer_world(), quit: self.quit }
    }

    /// Pointer in world units: the center of the hovered cell.
    fn pointer_world(&self) -> Vec2 {
        Vec2::new(
            self.pointer_cell.0 as f64 * CELL_W + CELL_W / 2.0,
            self.pointer_cell.1 as f64 * CELL_H + CELL_H / 2.0,
        )
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.last_active.contains_key(c))
    }
}

/// Fold shifted letters onto their base key so `A` and `a` track as
/// one held key.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
