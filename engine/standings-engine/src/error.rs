//! Error types for the standings engine

use crate::types::{BracketKind, ParticipantId};
use thiserror::Error;

/// Result type for standings engine operations
pub type Result<T> = std::result::Result<T, StandingsError>;

/// Failures that stop a computation outright
///
/// Recoverable data defects are reported as [`crate::EngineWarning`] instead.
#[derive(Error, Debug)]
pub enum StandingsError {
    #[error("Duplicate roster stat for participant {participant}")]
    DuplicateRosterStat { participant: ParticipantId },

    #[error("Invalid round {round} on {bracket} bracket node {index} (rounds start at 1)")]
    InvalidRound { bracket: BracketKind, index: usize, round: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rayon::ThreadPoolBuildError> for StandingsError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        StandingsError::ThreadPool(err.to_string())
    }
}
