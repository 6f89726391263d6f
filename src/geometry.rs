use serde::{Deserialize, Serialize};

use crate::error::{RoundError, RoundResult};

/// A point in canvas-scale coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle `[x0, y0, x1, y1]` with `x0 <= x1` and `y0 <= y1`.
///
/// Serialized as a plain four element array, which is how annotation files
/// store both the truth and the predicted region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> RoundResult<Self> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(RoundError::InvalidGeometry(format!(
                "non-finite coordinate in [{x0}, {y0}, {x1}, {y1}]"
            )));
        }
        if x0 > x1 || y0 > y1 {
            return Err(RoundError::InvalidGeometry(format!(
                "inverted rectangle [{x0}, {y0}, {x1}, {y1}]"
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Smallest rectangle with both points as corners
    pub fn spanning(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    pub fn y0(&self) -> f64 {
        self.y0
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Centre rounded to whole canvas pixels
    pub fn center(&self) -> (i64, i64) {
        (
            (self.x0 + self.width() / 2.0).round() as i64,
            (self.y0 + self.height() / 2.0).round() as i64,
        )
    }

    /// Closed on all four bounds
    pub fn contains(&self, p: Point) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }

    /// Overlapping region, `None` when the rectangles do not overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);

        if x0 < x1 && y0 < y1 {
            Some(Rect { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Map from default (annotation) scale to canvas scale
    pub fn scaled(&self, factor: f64) -> Rect {
        Rect {
            x0: self.x0 * factor,
            y0: self.y0 * factor,
            x1: self.x1 * factor,
            y1: self.y1 * factor,
        }
    }
}

impl TryFrom<[f64; 4]> for Rect {
    type Error = RoundError;

    fn try_from(v: [f64; 4]) -> Result<Self, Self::Error> {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}
