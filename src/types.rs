//! Shared types used across multiple modules.
//!
//! Kept separate so the tiling engine, the registry and the X11 backend can
//! agree on geometry without depending on each other.

use serde::Serialize;

/// A rectangle representing geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Same size, positioned at the parent's origin.
    ///
    /// Used for application windows, which never move inside their frame.
    pub fn at_origin(&self) -> Self {
        Self::new(0, 0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_at_origin() {
        let rect = Rect::new(960, 540, 960, 540);
        assert_eq!(rect.at_origin(), Rect::new(0, 0, 960, 540));
    }

    #[test]
    fn test_rect_serializes_flat() {
        let json = serde_json::to_string(&Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"x":1,"y":2,"width":3,"height":4}"#);
    }
}
