//! Polled keyboard state fed from window events.
//!
//! The game polls held keys once per update instead of reacting to events,
//! which is what the lane-step-on-release mechanic needs: the game arms a
//! trigger while a key is held and commits the step on the frame the key is
//! no longer held.

use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
            ..
        } = event
        {
            match state {
                ElementState::Pressed => self.press(*code),
                ElementState::Released => self.release(*code),
            }
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_toggle_held() {
        let mut input = InputState::new();
        assert!(!input.is_held(KeyCode::KeyA));
        input.press(KeyCode::KeyA);
        assert!(input.is_held(KeyCode::KeyA));
        input.release(KeyCode::KeyA);
        assert!(!input.is_held(KeyCode::KeyA));
    }

    #[test]
    fn release_without_press_is_a_no_op() {
        let mut input = InputState::new();
        input.release(KeyCode::Escape);
        assert!(!input.is_held(KeyCode::Escape));
    }
}
