use thiserror::Error;

use crate::round::Phase;

/// Errors raised while preparing or driving a round
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoundError {
    /// Malformed truth/predicted rectangle (inverted corners, NaN, zero-area union)
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Timing constants that a 100ms tick could never hit
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image or annotation retrieval failed; the round stays in Loading
    #[error("round data could not be loaded: {0}")]
    LoadFailed(String),

    #[error("cannot {action} while the round is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },
}

pub type RoundResult<T> = Result<T, RoundError>;

/// Errors from the achievement / star-rank persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt value stored for {key}: {value}")]
    Corrupt { key: String, value: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
