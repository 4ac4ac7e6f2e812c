/// Raw key feed.
///
/// Turns crossterm key events into `(code, down)` transitions using the
/// game's integer key codes: ASCII for characters, 1005..=1008 for the
/// arrows (see `domain::rules`).
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it: a key with no Press/Repeat for `HOLD_TIMEOUT` counts as
/// released.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::rules::{
    KEY_ARROW_DOWN, KEY_ARROW_LEFT, KEY_ARROW_RIGHT, KEY_ARROW_UP, KEY_ESCAPE, KEY_SPACE,
};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each held key code.
    last_active: HashMap<i32, Instant>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events.
    /// Returns key transitions in arrival order; expired holds come last.
    pub fn drain_events(&mut self) -> Vec<(i32, bool)> {
        self.raw_events.clear();
        let mut transitions = vec![];

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);
            let Some(code) = key_code(key.code) else { continue };

            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    if self.last_active.remove(&code).is_some() {
                        transitions.push((code, false));
                    }
                }
                KeyEventKind::Release => {
                    // Ignore release when enhancement not confirmed;
                    // rely on timeout-based expiry instead
                }
                _ => {
                    // Press and Repeat both refresh the hold; only the
                    // first one is a key-down
                    if self.last_active.insert(code, Instant::now()).is_none() {
                        transitions.push((code, true));
                    }
                }
            }
        }

        let now = Instant::now();
        let expired: Vec<i32> = self.last_active.iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(code, _)| *code)
            .collect();
        for code in expired {
            self.last_active.remove(&code);
            transitions.push((code, false));
        }

        transitions
    }

    /// Did this frame contain a quit request (Esc or Ctrl+C)?
    pub fn quit_requested(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.kind != KeyEventKind::Release
                && (k.code == KeyCode::Esc
                    || (k.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))))
        })
    }
}

/// Game key code for a crossterm key, if the game has one.
pub fn key_code(code: KeyCode) -> Option<i32> {
    match code {
        KeyCode::Left => Some(KEY_ARROW_LEFT),
        KeyCode::Up => Some(KEY_ARROW_UP),
        KeyCode::Right => Some(KEY_ARROW_RIGHT),
        KeyCode::Down => Some(KEY_ARROW_DOWN),
        KeyCode::Esc => Some(KEY_ESCAPE),
        KeyCode::Char(' ') => Some(KEY_SPACE),
        KeyCode::Char(c) if c.is_ascii() => Some(c as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::{control_for, Control};

    #[test]
    fn arrows_and_letters_map_to_game_codes() {
        assert_eq!(key_code(KeyCode::Left), Some(1005));
        assert_eq!(key_code(KeyCode::Up), Some(1006));
        assert_eq!(key_code(KeyCode::Right), Some(1007));
        assert_eq!(key_code(KeyCode::Down), Some(1008));
        assert_eq!(key_code(KeyCode::Char('w')), Some(119));
        assert_eq!(key_code(KeyCode::Char(' ')), Some(32));
    }

    #[test]
    fn non_ascii_and_function_keys_ignored() {
        assert_eq!(key_code(KeyCode::Char('é')), None);
        assert_eq!(key_code(KeyCode::F(1)), None);
        assert_eq!(key_code(KeyCode::Tab), None);
    }

    #[test]
    fn mapped_codes_reach_controls() {
        assert_eq!(key_code(KeyCode::Char('A')).and_then(control_for), Some(Control::Left));
        assert_eq!(key_code(KeyCode::Down).and_then(control_for), Some(Control::Down));
    }
}
