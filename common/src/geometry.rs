use serde::{Deserialize, Serialize};

/// A point or offset on the playfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// The point at `dist` from `anchor` along the direction from `anchor`
    /// to `self`. Falls back to `anchor` when the two points coincide.
    pub fn at_distance_from(self, anchor: Vec2, dist: f64) -> Vec2 {
        let len = self.distance(anchor);
        if len <= f64::EPSILON {
            return anchor;
        }
        Vec2 {
            x: anchor.x + (self.x - anchor.x) / len * dist,
            y: anchor.y + (self.y - anchor.y) / len * dist,
        }
    }
}
