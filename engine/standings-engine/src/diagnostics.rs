//! Recoverable data-integrity findings reported alongside results

use crate::types::{BracketKind, ParticipantId};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Where a participant was expected but missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    RosterStats,
    Brackets,
    IdentityMap,
}

/// A defect in the input that the engine worked around
///
/// None of these abort a computation. Callers inspect them to decide whether
/// the partial result is acceptable.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum EngineWarning {
    #[error("{bracket} bracket node {index} (round {round}) is missing its winner or loser")]
    MalformedBracketNode { bracket: BracketKind, index: usize, round: u32 },

    #[error("Week {week}: {team} vs {opponent} has only one side recorded")]
    IncompleteWeekPairing { week: u32, team: ParticipantId, opponent: ParticipantId },

    #[error("Week {week}: {team} and {opponent} tied at {score}, no record emitted")]
    TiedScore { week: u32, team: ParticipantId, opponent: ParticipantId, score: f64 },

    #[error("Week {week}: {team} recorded more than once against {opponent}")]
    DuplicateScoreRow { week: u32, team: ParticipantId, opponent: ParticipantId },

    #[error("Week {week}: {team} is paired against itself")]
    SelfPairing { week: u32, team: ParticipantId },

    #[error("{bracket} bracket has no nodes")]
    EmptyBracket { bracket: BracketKind },

    #[error("{bracket} bracket final round {round} has no usable championship match")]
    AmbiguousFinal { bracket: BracketKind, round: u32 },

    #[error("{bracket} bracket: {participant} could not take placement {placement} ({reason})")]
    PlacementConflict {
        bracket: BracketKind,
        participant: ParticipantId,
        placement: u32,
        reason: String,
    },

    #[error("{participant} appears in both brackets, keeping the winners bracket placement")]
    BracketOverlap { participant: ParticipantId },

    #[error("{participant} is missing from {missing_from:?}")]
    UnresolvableParticipant { participant: ParticipantId, missing_from: DataSource },

    #[error("Duplicate match {year}/{league} week {week} between {a} and {b} ignored")]
    DuplicateMatch { year: i32, league: String, week: u32, a: ParticipantId, b: ParticipantId },
}

/// A best-effort result plus every warning raised while producing it
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<EngineWarning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, warnings: Vec<EngineWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self { value, warnings: Vec::new() }
    }

    /// True when the input needed no workarounds
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome { value: f(self.value), warnings: self.warnings }
    }

    pub fn into_parts(self) -> (T, Vec<EngineWarning>) {
        (self.value, self.warnings)
    }
}

/// Collects warnings and logs each one as it is raised
#[derive(Debug, Default)]
pub(crate) struct WarningSink {
    warnings: Vec<EngineWarning>,
}

impl WarningSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, warning: EngineWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub(crate) fn extend(&mut self, warnings: Vec<EngineWarning>) {
        self.warnings.extend(warnings);
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome::new(value, self.warnings)
    }
}
