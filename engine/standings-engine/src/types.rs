use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a league member across seasons
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a league (one league id per season on most platforms)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub String);

impl LeagueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeagueId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LeagueId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One side of a weekly matchup as reported by the platform
///
/// Every real match shows up as two rows, one per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub week: u32,
    pub team: ParticipantId,
    pub opponent: ParticipantId,
    pub score: f64,
    #[serde(default)]
    pub is_playoff: bool,
    #[serde(default)]
    pub placement_type: Option<String>,
}

/// Canonical result of one head-to-head pairing in one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub week: u32,
    pub winner: ParticipantId,
    pub loser: ParticipantId,
    pub winner_score: f64,
    pub loser_score: f64,
    pub is_playoff: bool,
    /// Advisory label such as "Championship" or "3rd Place"
    pub placement_type: Option<String>,
}

impl MatchRecord {
    /// Score the given participant put up in this match, if they played in it
    pub fn score_of(&self, participant: &ParticipantId) -> Option<f64> {
        if &self.winner == participant {
            Some(self.winner_score)
        } else if &self.loser == participant {
            Some(self.loser_score)
        } else {
            None
        }
    }

    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.winner == participant || &self.loser == participant
    }
}

/// Which bracket tree a node or placement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracketKind {
    /// Top placements, winning advances toward 1st
    Winners,
    /// Bottom placements, winning advances toward last
    Losers,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Winners => write!(f, "winners"),
            BracketKind::Losers => write!(f, "losers"),
        }
    }
}

/// One match of a single-elimination bracket tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketMatchNode {
    /// Round number, ascending from the first round (1-based)
    pub round: u32,
    /// Placement decided by this match for its winner, when the platform says so
    #[serde(default)]
    pub explicit_placement: Option<u32>,
    #[serde(default)]
    pub winner: Option<ParticipantId>,
    #[serde(default)]
    pub loser: Option<ParticipantId>,
}

impl BracketMatchNode {
    pub fn new(round: u32, winner: &str, loser: &str) -> Self {
        Self {
            round,
            explicit_placement: None,
            winner: Some(ParticipantId::from(winner)),
            loser: Some(ParticipantId::from(loser)),
        }
    }

    pub fn with_placement(mut self, placement: u32) -> Self {
        self.explicit_placement = Some(placement);
        self
    }

    /// Both sides recorded
    pub fn is_complete(&self) -> bool {
        self.winner.is_some() && self.loser.is_some()
    }
}

/// Regular-season record of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSeasonStat {
    pub participant: ParticipantId,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

/// How confident the resolver was about a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementSource {
    /// Final-round match of the bracket
    Championship,
    /// Explicit placement carried by a bracket node
    Explicit,
    /// Low-confidence fill for participants nothing else placed
    Fallback,
}

/// Final season placement of one participant derived from bracket results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub participant: ParticipantId,
    pub placement: u32,
    pub placement_name: String,
    pub bracket: BracketKind,
    pub source: PlacementSource,
}

/// One row of a season's final standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub participant: ParticipantId,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
    /// Final position, 1..N with no gaps
    pub rank: u32,
    pub placement: Option<u32>,
    pub high_game: f64,
    pub low_game: f64,
}

/// Human-readable name for an overall placement
pub fn placement_name(placement: u32) -> String {
    match placement {
        1 => "Champion".to_string(),
        2 => "Runner-up".to_string(),
        n => format!("{} Place", ordinal(n)),
    }
}

/// English ordinal ("3rd", "11th", "22nd")
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(102), "102nd");
    }

    #[test]
    fn test_placement_names() {
        assert_eq!(placement_name(1), "Champion");
        assert_eq!(placement_name(2), "Runner-up");
        assert_eq!(placement_name(3), "3rd Place");
        assert_eq!(placement_name(10), "10th Place");
    }

    #[test]
    fn test_match_record_score_lookup() {
        let record = MatchRecord {
            week: 3,
            winner: "alice".into(),
            loser: "bob".into(),
            winner_score: 120.5,
            loser_score: 98.25,
            is_playoff: false,
            placement_type: None,
        };

        assert_eq!(record.score_of(&"alice".into()), Some(120.5));
        assert_eq!(record.score_of(&"bob".into()), Some(98.25));
        assert_eq!(record.score_of(&"carol".into()), None);
        assert!(record.involves(&"bob".into()));
    }
}
