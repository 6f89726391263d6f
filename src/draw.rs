//! Draw commands handed to the rendering collaborator.
//!
//! The round engine never touches pixels; it emits these values at fixed
//! checkpoints and the renderer decides how to paint them.

use serde::Serialize;

use crate::geometry::{Point, Rect};

/// Canvas layer a command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Layer {
    Image,
    Animation,
}

/// What a stroke represents; the renderer maps this to colour and width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stroke {
    Click,
    Predicted,
    Truth,
    Hint,
    Search,
}

/// Banner shown when a round is evaluated. Translation happens downstream,
/// keyed by [`RoundEndText::key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundEndText {
    WellSpotted,
    Missed,
    TooSlow,
}

impl RoundEndText {
    pub fn key(&self) -> &'static str {
        match self {
            RoundEndText::WellSpotted => "WellSpotted",
            RoundEndText::Missed => "Missed",
            RoundEndText::TooSlow => "TooSlow",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RoundEndText::WellSpotted)
    }
}

/// Half-size of the click cross in default-scale pixels
pub const CLICK_SIZE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    Rectangle {
        layer: Layer,
        rect: Rect,
        stroke: Stroke,
    },
    Cross {
        at: Point,
        size: f64,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        stroke: Stroke,
    },
    Text(RoundEndText),
    Clear(Layer),
}

/// Cell `position` of an `cells x cells` search grid covering a square canvas,
/// walked row by row.
pub fn search_cell(position: u32, cells: u32, canvas_size: f64) -> Rect {
    let cells = cells.max(1);
    let side = canvas_size / f64::from(cells);
    let base_x = f64::from(position % cells) * side;
    let base_y = f64::from(position / cells) * side;

    Rect::spanning(
        Point::new(base_x.round(), base_y.round()),
        Point::new((base_x + side).round(), (base_y + side).round()),
    )
}
