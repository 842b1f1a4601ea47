//! Keyboard sampling and translation of key releases into velocity intent

use macroquad::prelude::{is_key_pressed, is_key_released, KeyCode};
use shared::Vector2;

/// Keys the client listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    Enter,
    Escape,
}

impl Key {
    pub const ALL: [Key; 7] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Space,
        Key::Enter,
        Key::Escape,
    ];

    fn key_code(self) -> KeyCode {
        match self {
            Key::W => KeyCode::W,
            Key::A => KeyCode::A,
            Key::S => KeyCode::S,
            Key::D => KeyCode::D,
            Key::Space => KeyCode::Space,
            Key::Enter => KeyCode::Enter,
            Key::Escape => KeyCode::Escape,
        }
    }

    /// Velocity delta a release of this key stands for, if it is a
    /// movement key. Screen Y grows downwards, so W is negative.
    pub fn movement(self) -> Option<Vector2> {
        match self {
            Key::W => Some(Vector2::new(0.0, -1.0)),
            Key::S => Some(Vector2::new(0.0, 1.0)),
            Key::A => Some(Vector2::new(-1.0, 0.0)),
            Key::D => Some(Vector2::new(1.0, 0.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub action: KeyAction,
    pub key: Key,
}

impl InputEvent {
    pub fn pressed(key: Key) -> Self {
        Self {
            action: KeyAction::Pressed,
            key,
        }
    }

    pub fn released(key: Key) -> Self {
        Self {
            action: KeyAction::Released,
            key,
        }
    }
}

/// Folds this frame's key releases into `velocity` and renormalizes it.
///
/// Returns true if any movement key was released, i.e. if the velocity
/// needs to be sent to the server.
pub fn apply_released(events: &[InputEvent], velocity: &mut Vector2) -> bool {
    let mut changed = false;
    for event in events {
        if event.action != KeyAction::Released {
            continue;
        }
        if let Some(delta) = event.key.movement() {
            *velocity += delta;
            changed = true;
        }
    }

    if changed && velocity.length_squared() > 0.0 {
        *velocity = velocity.normalize();
    }
    changed
}

/// Collects the key transitions macroquad saw since the last frame.
pub fn poll_events() -> Vec<InputEvent> {
    let mut events = Vec::new();
    for key in Key::ALL {
        let code = key.key_code();
        if is_key_pressed(code) {
            events.push(InputEvent::pressed(key));
        }
        if is_key_released(code) {
            events.push(InputEvent::released(key));
        }
    }
    events
}

pub fn quit_requested(events: &[InputEvent]) -> bool {
    events.contains(&InputEvent::pressed(Key::Escape))
}
