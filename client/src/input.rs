//! Press detection from keyboard and mouse

use macroquad::prelude::*;

/// Reports `true` once per released-to-held transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeTrigger {
    prev: bool,
}

impl EdgeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, down: bool) -> bool {
        let pressed = down && !self.prev;
        self.prev = down;
        pressed
    }
}

/// Samples the press inputs once per frame
#[derive(Debug, Default)]
pub struct InputManager {
    press: EdgeTrigger,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// True on the frame a press starts.
    ///
    /// Space and the left mouse button both count; holding either does not repeat.
    pub fn update(&mut self) -> bool {
        let down = is_key_down(KeyCode::Space) || is_mouse_button_down(MouseButton::Left);
        self.press.update(down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_fires_once_per_hold() {
        let mut trigger = EdgeTrigger::new();
        assert!(!trigger.update(false));
        assert!(trigger.update(true));
        assert!(!trigger.update(true));
        assert!(!trigger.update(true));
        assert!(!trigger.update(false));
        assert!(trigger.update(true));
    }
}
