//! The round state machine.
//!
//! A round is stepped by an external clock and by player input, one event at a
//! time. Every side effect (draw calls, hint reveals, the evaluated outcome) is
//! returned as data so the sequence can be replayed and asserted on without a
//! renderer or a wall clock.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationPair;
use crate::clock::RoundClock;
use crate::config::RoundConfig;
use crate::draw::{search_cell, DrawCommand, Layer, RoundEndText, Stroke, CLICK_SIZE};
use crate::error::{RoundError, RoundResult};
use crate::geometry::Point;
use crate::hint::HintScheduler;
use crate::scoring::{self, Evaluation, RoundOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Phase {
    /// No round data yet
    Idle,
    /// Waiting on the image / annotation pair
    Loading,
    /// Countdown running, accepting a click
    Running,
    /// Reveal sequence after the click or the timeout
    Settling,
    /// Search sweep shown before the predictor's answer
    Animating,
    /// Round evaluated
    Ended,
}

/// Input to the machine. Ticks and clicks share one FIFO queue.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    Tick,
    Click(Point),
    /// Player asked for the hint before it was due
    HintRequest,
    /// Surrounding screen went away; nothing may fire afterwards
    Teardown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundEffect {
    PhaseChanged { from: Phase, to: Phase },
    Draw(DrawCommand),
    HintShown(Point),
    /// Timer entered its last seconds; display only
    Urgent,
    /// The predictor is "searching"
    Thinking,
    Evaluated(RoundOutcome),
}

#[derive(Debug)]
pub struct RoundMachine {
    config: RoundConfig,
    hints: HintScheduler,
    phase: Phase,
    clock: RoundClock,
    pair: Option<AnnotationPair>,
    click: Option<Point>,
    hinted: bool,
    urgent: bool,
    outcome: Option<RoundOutcome>,
    torn_down: bool,
    rng: StdRng,
}

impl RoundMachine {
    pub fn new(config: RoundConfig) -> RoundResult<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible hint placement
    pub fn with_seed(config: RoundConfig, seed: u64) -> RoundResult<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoundConfig, rng: StdRng) -> RoundResult<Self> {
        config.timings.validate()?;
        Ok(Self {
            hints: HintScheduler::new(config.timings.hint_time_ms, config.timings.hint_range),
            clock: RoundClock::new(config.timings.round_duration_ms),
            config,
            phase: Phase::Idle,
            pair: None,
            click: None,
            hinted: false,
            urgent: false,
            outcome: None,
            torn_down: false,
            rng,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn click(&self) -> Option<Point> {
        self.click
    }

    pub fn hinted(&self) -> bool {
        self.hinted
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }

    pub fn round_time(&self) -> u32 {
        self.clock.round_time()
    }

    pub fn end_time(&self) -> u32 {
        self.clock.end_time()
    }

    pub fn animation_position(&self) -> u32 {
        self.clock.animation_position()
    }

    pub fn pair(&self) -> Option<&AnnotationPair> {
        self.pair.as_ref()
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// How long until the next tick is due, `None` while no timer runs
    pub fn tick_interval(&self) -> Option<Duration> {
        if self.torn_down {
            return None;
        }
        match self.phase {
            Phase::Running | Phase::Settling => Some(RoundClock::countdown_interval()),
            Phase::Animating => Some(RoundClock::animation_interval(&self.config.timings)),
            Phase::Idle | Phase::Loading | Phase::Ended => None,
        }
    }

    /// Discard the previous round and wait for new data
    pub fn begin_loading(&mut self) -> RoundResult<Vec<RoundEffect>> {
        self.ensure_alive("load a round")?;
        let mut effects = Vec::new();
        match self.phase {
            Phase::Loading => {}
            Phase::Idle | Phase::Ended => {
                self.reset_round_state();
                self.transition(Phase::Loading, &mut effects);
            }
            phase => {
                return Err(RoundError::InvalidPhase {
                    action: "load a round",
                    phase,
                })
            }
        }
        Ok(effects)
    }

    /// Record a failed fetch. The machine stays where it is so the caller can retry.
    pub fn load_failed(&self, reason: &str) {
        log::warn!("round data failed to load ({}): {}", self.phase, reason);
    }

    pub fn start_round(&mut self, pair: AnnotationPair) -> RoundResult<Vec<RoundEffect>> {
        self.ensure_alive("start a round")?;
        if !matches!(self.phase, Phase::Idle | Phase::Loading | Phase::Ended) {
            return Err(RoundError::InvalidPhase {
                action: "start a round",
                phase: self.phase,
            });
        }

        if let Err(e) = scoring::intersection_over_union(&pair.truth, &pair.predicted) {
            log::warn!("aborting round start: {}", e);
            self.reset_round_state();
            self.phase = Phase::Idle;
            return Err(e);
        }

        let mut effects = Vec::new();
        self.reset_round_state();
        self.pair = Some(pair);
        self.transition(Phase::Running, &mut effects);
        Ok(effects)
    }

    /// Process exactly one queued event
    pub fn handle(&mut self, event: RoundEvent) -> Vec<RoundEffect> {
        if self.torn_down {
            log::debug!("ignoring {:?} after teardown", event);
            return Vec::new();
        }

        let mut effects = Vec::new();
        match event {
            RoundEvent::Tick => self.on_tick(&mut effects),
            RoundEvent::Click(p) => self.on_click(p, &mut effects),
            RoundEvent::HintRequest => self.on_hint_request(&mut effects),
            RoundEvent::Teardown => {
                log::debug!("round torn down while {}", self.phase);
                self.torn_down = true;
            }
        }
        effects
    }

    fn ensure_alive(&self, action: &'static str) -> RoundResult<()> {
        if self.torn_down {
            return Err(RoundError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn reset_round_state(&mut self) {
        self.clock.reset(self.config.timings.round_duration_ms);
        self.pair = None;
        self.click = None;
        self.hinted = false;
        self.urgent = false;
        self.outcome = None;
    }

    fn transition(&mut self, to: Phase, effects: &mut Vec<RoundEffect>) {
        let from = self.phase;
        log::debug!("round phase {} -> {}", from, to);
        self.phase = to;
        effects.push(RoundEffect::PhaseChanged { from, to });
    }

    fn on_tick(&mut self, effects: &mut Vec<RoundEffect>) {
        match self.phase {
            Phase::Running => self.countdown_step(effects),
            Phase::Settling => self.settle_step(effects),
            Phase::Animating => self.animation_step(effects),
            Phase::Idle | Phase::Loading | Phase::Ended => {}
        }
    }

    fn on_click(&mut self, p: Point, effects: &mut Vec<RoundEffect>) {
        if self.phase != Phase::Running {
            log::debug!("ignoring click while {}", self.phase);
            return;
        }
        self.click = Some(p);
        self.transition(Phase::Settling, effects);
    }

    fn on_hint_request(&mut self, effects: &mut Vec<RoundEffect>) {
        if self.phase == Phase::Running && !self.hinted {
            self.reveal_hint(effects);
        }
    }

    fn countdown_step(&mut self, effects: &mut Vec<RoundEffect>) {
        let remaining = self.clock.tick_countdown();

        if self.hints.should_reveal(remaining, self.hinted) {
            self.reveal_hint(effects);
        } else if remaining == self.config.timings.red_time_ms {
            self.urgent = true;
            effects.push(RoundEffect::Urgent);
        }

        if remaining == 0 {
            self.transition(Phase::Settling, effects);
        }
    }

    fn reveal_hint(&mut self, effects: &mut Vec<RoundEffect>) {
        let Some(pair) = self.pair.as_ref() else {
            return;
        };
        let center = self.hints.compute(&pair.truth, &mut self.rng);
        self.hinted = true;
        effects.push(RoundEffect::HintShown(center));
        effects.push(RoundEffect::Draw(DrawCommand::Circle {
            center,
            radius: self.config.timings.hint_radius,
            stroke: Stroke::Hint,
        }));
    }

    /// Handle the checkpoint at the current settle time, then move the
    /// count-up forward unless the checkpoint left Settling.
    fn settle_step(&mut self, effects: &mut Vec<RoundEffect>) {
        let t = self.clock.end_time();
        let timings = &self.config.timings;
        let (predicted_at, truth_at, evaluate_at) = (
            timings.predicted_reveal_ms,
            timings.truth_reveal_ms,
            timings.evaluation_ms,
        );
        let show_ai = self.config.show_ai;

        if t == 0 {
            if let Some(at) = self.click {
                effects.push(RoundEffect::Draw(DrawCommand::Cross {
                    at,
                    size: CLICK_SIZE * self.config.canvas_scale(),
                    stroke: Stroke::Click,
                }));
            }
            if show_ai {
                effects.push(RoundEffect::Thinking);
                effects.push(self.search_cell_draw(0));
                self.transition(Phase::Animating, effects);
                return;
            }
        } else if t == predicted_at {
            if show_ai {
                if let Some(pair) = &self.pair {
                    effects.push(RoundEffect::Draw(DrawCommand::Rectangle {
                        layer: Layer::Image,
                        rect: pair.predicted,
                        stroke: Stroke::Predicted,
                    }));
                }
            }
        } else if t == truth_at {
            if let Some(pair) = &self.pair {
                effects.push(RoundEffect::Draw(DrawCommand::Rectangle {
                    layer: Layer::Image,
                    rect: pair.truth,
                    stroke: Stroke::Truth,
                }));
            }
        } else if t == evaluate_at {
            self.evaluate(effects);
            return;
        }

        self.clock.tick_count_up();
    }

    fn animation_step(&mut self, effects: &mut Vec<RoundEffect>) {
        effects.push(RoundEffect::Draw(DrawCommand::Clear(Layer::Animation)));

        let cells = self.config.timings.animation_cells;
        let position = self.clock.tick_animation();
        if position >= cells * cells {
            self.clock.tick_count_up();
            self.transition(Phase::Settling, effects);
        } else {
            effects.push(self.search_cell_draw(position));
        }
    }

    fn search_cell_draw(&self, position: u32) -> RoundEffect {
        RoundEffect::Draw(DrawCommand::Rectangle {
            layer: Layer::Animation,
            rect: search_cell(
                position,
                self.config.timings.animation_cells,
                self.config.canvas_size,
            ),
            stroke: Stroke::Search,
        })
    }

    fn evaluate(&mut self, effects: &mut Vec<RoundEffect>) {
        let Some(pair) = self.pair.as_ref() else {
            log::error!("evaluation reached without round data");
            self.transition(Phase::Ended, effects);
            return;
        };

        let result = scoring::evaluate(Evaluation {
            mode: self.config.game_mode,
            click: self.click,
            truth: &pair.truth,
            predicted: &pair.predicted,
            hinted: self.hinted,
            round_time_remaining_ms: self.clock.round_time(),
            ai_score_multiplier: self.config.timings.ai_score_multiplier,
        });

        match result {
            Ok(outcome) => {
                let text = match (self.click, outcome.player_correct) {
                    (None, _) => RoundEndText::TooSlow,
                    (Some(_), true) => RoundEndText::WellSpotted,
                    (Some(_), false) => RoundEndText::Missed,
                };
                log::info!(
                    "round evaluated: player {} ({}), predictor {} ({}, iou {:.3})",
                    if outcome.player_correct { "hit" } else { "miss" },
                    outcome.player_round_score,
                    if outcome.ai_correct { "hit" } else { "miss" },
                    outcome.ai_round_score,
                    outcome.iou
                );
                effects.push(RoundEffect::Draw(DrawCommand::Text(text)));
                effects.push(RoundEffect::Evaluated(outcome.clone()));
                self.outcome = Some(outcome);
            }
            Err(e) => log::error!("round could not be evaluated: {}", e),
        }

        self.transition(Phase::Ended, effects);
    }
}
