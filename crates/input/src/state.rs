use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys the explorer reacts to. Backends translate their own key codes into
/// these and drop everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    /// Toggles the directional light.
    E,
    /// Collects nearby boxes.
    F,
    Escape,
}

/// Keyboard and mouse state for the current frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    down: HashSet<Key>,
    pressed: HashSet<Key>,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame edges and mouse motion. Held keys stay held.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Record a key transition reported by the window backend.
    pub fn key_event(&mut self, key: Key, is_down: bool) {
        if is_down {
            if self.down.insert(key) {
                self.pressed.insert(key);
                tracing::trace!(?key, "key pressed");
            }
        } else {
            self.down.remove(&key);
        }
    }

    /// Accumulate relative mouse motion in pixels.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Drop all held keys, e.g. when the window loses focus and will not
    /// receive the matching release events.
    pub fn release_all(&mut self) {
        self.down.clear();
        self.pressed.clear();
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }
}
