//! Timed spotting rounds against a region predictor: the round state machine,
//! scoring, achievements and adventure ranks, and their persistence. The
//! `spotter` binary is a line-based front end over these modules.
pub mod annotations;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod draw;
pub mod error;
pub mod game;
pub mod geometry;
pub mod hint;
pub mod levels;
pub mod progression;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod store;
pub mod util;
