/// Keyboard state and the per-frame action snapshot.
///
/// Movement keys are level-triggered (held); jump, record, restart and
/// quit are edge-triggered. Release events are honored only when the
/// terminal's keyboard enhancement is confirmed; otherwise a key counts as
/// released `HOLD_TIMEOUT` after its last Press/Repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{DirectionIntent, FrameInput};
use super::gamepad::GamepadState;

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_RECORD: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }
}

/// Everything the game loop needs from keyboard and gamepad this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actions {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub record: bool,
    pub restart: bool,
    pub quit: bool,
}

impl Actions {
    pub fn read(keys: &InputState, pad: &GamepadState) -> Self {
        Actions {
            left: keys.any_held(KEYS_LEFT) || pad.left_held(),
            right: keys.any_held(KEYS_RIGHT) || pad.right_held(),
            down: keys.any_held(KEYS_DOWN) || pad.down_held(),
            jump: keys.any_pressed(KEYS_JUMP) || pad.jump_pressed(),
            record: keys.any_pressed(KEYS_RECORD) || pad.record_pressed(),
            restart: keys.any_pressed(KEYS_RESTART) || pad.restart_pressed(),
            quit: keys.ctrl_c || keys.any_pressed(KEYS_QUIT) || pad.quit_pressed(),
        }
    }

    /// Fold a newer poll into an unconsumed snapshot: held keys take the
    /// newer value, edges stay set until the next tick consumes them.
    pub fn merge(self, newer: Actions) -> Actions {
        Actions {
            left: newer.left,
            right: newer.right,
            down: newer.down,
            jump: self.jump || newer.jump,
            record: self.record || newer.record,
            restart: self.restart || newer.restart,
            quit: self.quit || newer.quit,
        }
    }

    /// The simulation's view of this frame, with the classifier's answer
    /// (if it was asked this frame) merged in.
    pub fn frame_input(&self, intent: DirectionIntent) -> FrameInput {
        FrameInput {
            left: self.left,
            right: self.right,
            down: self.down,
            jump: self.jump,
            restart: self.restart,
            intent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputState, code: KeyCode) {
        input.apply(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Char(' '));
        assert!(input.any_pressed(KEYS_JUMP));
        input.fresh_presses.clear();
        press(&mut input, KeyCode::Char(' '));
        assert!(!input.any_pressed(KEYS_JUMP));
        assert!(input.any_held(KEYS_JUMP));
    }

    #[test]
    fn release_honored_only_when_enabled() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Left);
        let release = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Release);
        input.apply(release, Instant::now());
        assert!(input.is_held(KeyCode::Left));
        input.honor_release = true;
        input.apply(release, Instant::now());
        assert!(!input.is_held(KeyCode::Left));
    }

    #[test]
    fn ctrl_c_quits() {
        let mut input = InputState::new();
        input.apply(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        let actions = Actions::read(&input, &GamepadState::disconnected());
        assert!(actions.quit);
    }

    #[test]
    fn bindings_map_to_actions() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Char('d'));
        press(&mut input, KeyCode::Char('r'));
        press(&mut input, KeyCode::Enter);
        let actions = Actions::read(&input, &GamepadState::disconnected());
        assert!(actions.right && actions.record && actions.restart);
        assert!(!actions.left && !actions.jump && !actions.quit);
    }

    #[test]
    fn edges_survive_until_consumed() {
        let first = Actions { jump: true, left: true, ..Actions::default() };
        let merged = first.merge(Actions { right: true, ..Actions::default() });
        assert!(merged.jump && merged.right);
        assert!(!merged.left);
    }

    #[test]
    fn intent_passes_through() {
        let actions = Actions { down: true, ..Actions::default() };
        let fi = actions.frame_input(DirectionIntent::Up);
        assert!(fi.down);
        assert!(fi.wants_jump());
    }
}
