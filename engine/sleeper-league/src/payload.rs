//! Sleeper API response shapes
//!
//! Only the fields the standings engine consumes are modelled; everything
//! else in the responses is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /league/{league_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperLeague {
    pub league_id: String,
    pub name: String,
    pub season: String,
    #[serde(default)]
    pub previous_league_id: Option<String>,
    #[serde(default)]
    pub total_rosters: Option<u32>,
    #[serde(default)]
    pub settings: LeagueSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSettings {
    /// First week of the playoffs; weeks from here on are playoff weeks
    #[serde(default)]
    pub playoff_week_start: Option<u32>,
    #[serde(default)]
    pub playoff_teams: Option<u32>,
}

/// `GET /league/{league_id}/rosters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperRoster {
    pub roster_id: u32,
    /// Absent for orphaned rosters
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub settings: RosterSettings,
}

/// Season record as Sleeper stores it; points are split into whole and hundredths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSettings {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    #[serde(default)]
    pub fpts: f64,
    #[serde(default)]
    pub fpts_decimal: f64,
    #[serde(default)]
    pub fpts_against: f64,
    #[serde(default)]
    pub fpts_against_decimal: f64,
}

impl RosterSettings {
    pub fn points_for(&self) -> f64 {
        self.fpts + self.fpts_decimal / 100.0
    }

    pub fn points_against(&self) -> f64 {
        self.fpts_against + self.fpts_against_decimal / 100.0
    }
}

/// `GET /league/{league_id}/matchups/{week}`, one entry per roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperMatchup {
    pub roster_id: u32,
    /// Rosters sharing a matchup id played each other; `None` on bye weeks
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
}

/// `GET /league/{league_id}/winners_bracket` and `/losers_bracket`
///
/// `w` and `l` are roster ids and stay empty until the match is played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperBracketMatch {
    pub r: u32,
    #[serde(default)]
    pub m: Option<u32>,
    /// Roster id or a `{"w": m}` / `{"l": m}` reference to an earlier match
    #[serde(default)]
    pub t1: Option<serde_json::Value>,
    #[serde(default)]
    pub t2: Option<serde_json::Value>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub l: Option<u32>,
    #[serde(default)]
    pub p: Option<u32>,
}

impl SleeperBracketMatch {
    /// Whether this match was played between these two rosters
    pub fn is_between(&self, a: u32, b: u32) -> bool {
        matches!((self.w, self.l), (Some(w), Some(l)) if (w == a && l == b) || (w == b && l == a))
    }
}

/// Everything fetched for one league season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonPayload {
    pub league: SleeperLeague,
    pub rosters: Vec<SleeperRoster>,
    /// Weekly matchups keyed by week number
    #[serde(default)]
    pub matchups: BTreeMap<u32, Vec<SleeperMatchup>>,
    #[serde(default)]
    pub winners_bracket: Vec<SleeperBracketMatch>,
    #[serde(default)]
    pub losers_bracket: Vec<SleeperBracketMatch>,
}

impl SeasonPayload {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_reconstruction() {
        let settings: RosterSettings = serde_json::from_str(
            r#"{"wins": 9, "losses": 5, "fpts": 1523, "fpts_decimal": 48,
                "fpts_against": 1400, "fpts_against_decimal": 6}"#,
        )
        .unwrap();

        assert_eq!(settings.wins, 9);
        assert_eq!(settings.ties, 0);
        assert!((settings.points_for() - 1523.48).abs() < 1e-9);
        assert!((settings.points_against() - 1400.06).abs() < 1e-9);
    }

    #[test]
    fn test_bracket_match_with_references() {
        let node: SleeperBracketMatch = serde_json::from_str(
            r#"{"r": 2, "m": 5, "t1": {"w": 1}, "t2": {"w": 2}, "w": 3, "l": 7, "p": 1}"#,
        )
        .unwrap();

        assert_eq!(node.p, Some(1));
        assert!(node.is_between(7, 3));
        assert!(!node.is_between(3, 4));
    }

    #[test]
    fn test_unplayed_bracket_match() {
        let node: SleeperBracketMatch =
            serde_json::from_str(r#"{"r": 1, "m": 1, "t1": 4, "t2": 5, "w": null, "l": null}"#)
                .unwrap();
        assert!(node.w.is_none());
        assert!(!node.is_between(4, 5));
    }
}
