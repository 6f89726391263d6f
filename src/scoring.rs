//! Round scoring: point-in-rectangle for the player, Intersection-over-Union
//! for the predictor, and the per-mode point formulas.
//!
//! Everything here is a pure function of its arguments.

use serde::Serialize;

use crate::config::GameMode;
use crate::error::{RoundError, RoundResult};
use crate::geometry::{Point, Rect};

/// The predictor is correct when its IoU with the truth strictly exceeds this
pub const AI_CORRECT_THRESHOLD: f64 = 0.5;

/// Casual / adventure points for a correct, hinted answer (doubled without hint)
pub const CASUAL_BASE_POINTS: f64 = 0.5;

/// Result of one evaluated round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub player_correct: bool,
    pub ai_correct: bool,
    pub player_round_score: f64,
    pub ai_round_score: f64,
    pub hinted: bool,
    pub click: Option<Point>,
    /// Countdown value when the round stopped (click or timeout)
    pub round_time_remaining_ms: u32,
    pub iou: f64,
}

/// Inclusive on all four bounds
pub fn is_player_correct(click: Point, truth: &Rect) -> bool {
    truth.contains(click)
}

pub fn intersection_over_union(a: &Rect, b: &Rect) -> RoundResult<f64> {
    let intersection = a.intersection(b).map(|r| r.area()).unwrap_or(0.0);
    let union = a.area() + b.area() - intersection;

    if union <= 0.0 {
        return Err(RoundError::InvalidGeometry(format!(
            "zero-area union of {:?} and {:?}",
            <[f64; 4]>::from(*a),
            <[f64; 4]>::from(*b)
        )));
    }

    Ok((intersection / union).clamp(0.0, 1.0))
}

pub fn ai_correct(truth: &Rect, predicted: &Rect) -> RoundResult<bool> {
    Ok(intersection_over_union(truth, predicted)? > AI_CORRECT_THRESHOLD)
}

fn hint_factor(hinted: bool) -> f64 {
    if hinted {
        1.0
    } else {
        2.0
    }
}

/// Casual and adventure reward a correct answer; competitive rewards speed.
/// Either way an unhinted answer is worth double.
pub fn player_round_score(
    mode: GameMode,
    correct: bool,
    hinted: bool,
    round_time_remaining_ms: u32,
) -> f64 {
    if !correct {
        return 0.0;
    }
    match mode {
        GameMode::Casual | GameMode::Adventure => CASUAL_BASE_POINTS * hint_factor(hinted),
        GameMode::Competitive => {
            (f64::from(round_time_remaining_ms) / 100.0).round() * hint_factor(hinted)
        }
    }
}

/// Casual and adventure give one point; competitive rewards prediction quality
pub fn ai_round_score(mode: GameMode, correct: bool, iou: f64, ai_score_multiplier: f64) -> f64 {
    if !correct {
        return 0.0;
    }
    match mode {
        GameMode::Casual | GameMode::Adventure => 1.0,
        GameMode::Competitive => (iou * ai_score_multiplier).round(),
    }
}

/// Inputs for evaluating one round
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub mode: GameMode,
    pub click: Option<Point>,
    pub truth: &'a Rect,
    pub predicted: &'a Rect,
    pub hinted: bool,
    pub round_time_remaining_ms: u32,
    pub ai_score_multiplier: f64,
}

pub fn evaluate(e: Evaluation<'_>) -> RoundResult<RoundOutcome> {
    let iou = intersection_over_union(e.truth, e.predicted)?;
    let ai_correct = iou > AI_CORRECT_THRESHOLD;
    let player_correct = e
        .click
        .map(|c| is_player_correct(c, e.truth))
        .unwrap_or(false);

    Ok(RoundOutcome {
        player_correct,
        ai_correct,
        player_round_score: player_round_score(
            e.mode,
            player_correct,
            e.hinted,
            e.round_time_remaining_ms,
        ),
        ai_round_score: ai_round_score(e.mode, ai_correct, iou, e.ai_score_multiplier),
        hinted: e.hinted,
        click: e.click,
        round_time_remaining_ms: e.round_time_remaining_ms,
        iou,
    })
}
