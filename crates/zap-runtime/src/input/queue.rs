use std::collections::HashSet;

use glam::Vec2;

/// Input event types the engine understands.
/// Generic, with no game-specific semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch/click began at world coordinates (x, y).
    PointerDown { x: f32, y: f32 },
    /// A touch/click ended at world coordinates (x, y).
    PointerUp { x: f32, y: f32 },
    /// A touch/cursor moved to world coordinates (x, y).
    PointerMove { x: f32, y: f32 },
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
    /// A host-defined event. `kind` identifies it; `a`, `b`, `c` carry arbitrary data.
    Custom { kind: u32, a: f32, b: f32, c: f32 },
}

/// A queue of input events.
/// The host pushes events as it polls them; the engine drains them once per frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame key and pointer state built from drained input events.
///
/// "Just" states last for the frame in which the event arrived and are
/// cleared by `end_frame` in the late-update phase.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<u32>,
    just_down: HashSet<u32>,
    just_up: HashSet<u32>,
    pointer: Vec2,
    pointer_held: bool,
    pointer_just_down: bool,
    pointer_just_up: bool,
    custom: Vec<InputEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            match event {
                InputEvent::KeyDown { key_code } => {
                    // Key repeat does not count as a fresh press.
                    if self.held.insert(key_code) {
                        self.just_down.insert(key_code);
                    }
                }
                InputEvent::KeyUp { key_code } => {
                    if self.held.remove(&key_code) {
                        self.just_up.insert(key_code);
                    }
                }
                InputEvent::PointerDown { x, y } => {
                    self.pointer = Vec2::new(x, y);
                    self.pointer_held = true;
                    self.pointer_just_down = true;
                }
                InputEvent::PointerUp { x, y } => {
                    self.pointer = Vec2::new(x, y);
                    self.pointer_held = false;
                    self.pointer_just_up = true;
                }
                InputEvent::PointerMove { x, y } => {
                    self.pointer = Vec2::new(x, y);
                }
                InputEvent::Custom { .. } => self.custom.push(event),
            }
        }
    }

    pub fn key(&self, key_code: u32) -> bool {
        self.held.contains(&key_code)
    }

    pub fn key_down(&self, key_code: u32) -> bool {
        self.just_down.contains(&key_code)
    }

    pub fn key_up(&self, key_code: u32) -> bool {
        self.just_up.contains(&key_code)
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn pointer_held(&self) -> bool {
        self.pointer_held
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_just_down
    }

    pub fn pointer_up(&self) -> bool {
        self.pointer_just_up
    }

    /// Custom events received this frame.
    pub fn custom_events(&self) -> &[InputEvent] {
        &self.custom
    }

    pub fn end_frame(&mut self) {
        self.just_down.clear();
        self.just_up.clear();
        self.pointer_just_down = false;
        self.pointer_just_up = false;
        self.custom.clear();
    }
}
