//! Season pipeline: one league season in, standings and records out
//!
//! Seasons share nothing, so [`compute_seasons`] fans them out across a rayon
//! pool. The records of every computed season then feed one
//! [`HeadToHeadIndex`] through [`build_history`].

use crate::bracket::{BracketResolver, IdentityMap};
use crate::config::EngineConfig;
use crate::diagnostics::{EngineWarning, Outcome, WarningSink};
use crate::error::Result;
use crate::head_to_head::{HeadToHeadIndex, TaggedMatch};
use crate::normalizer::normalize_rows;
use crate::standings::StandingsAggregator;
use crate::types::{
    BracketMatchNode, LeagueId, MatchRecord, ParticipantId, PlacementResult, RosterSeasonStat,
    ScoreRow, StandingRow,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

/// Everything known about one season of one league
#[derive(Debug, Clone)]
pub struct SeasonInput {
    pub year: i32,
    pub league: LeagueId,
    pub roster_stats: Vec<RosterSeasonStat>,
    pub score_rows: Vec<ScoreRow>,
    pub winners_bracket: Vec<BracketMatchNode>,
    pub losers_bracket: Vec<BracketMatchNode>,
    /// Roster slot to owner mapping for bracket nodes
    pub identity: IdentityMap,
}

impl SeasonInput {
    pub fn new(year: i32, league: impl Into<LeagueId>) -> Self {
        Self {
            year,
            league: league.into(),
            roster_stats: Vec::new(),
            score_rows: Vec::new(),
            winners_bracket: Vec::new(),
            losers_bracket: Vec::new(),
            identity: IdentityMap::new(),
        }
    }
}

/// Derived results of one season
#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    pub year: i32,
    pub league: LeagueId,
    pub records: Vec<MatchRecord>,
    pub placements: Vec<PlacementResult>,
    pub standings: Vec<StandingRow>,
    pub warnings: Vec<EngineWarning>,
}

impl SeasonReport {
    /// Participant ranked first
    pub fn champion(&self) -> Option<&ParticipantId> {
        self.standings.first().map(|row| &row.participant)
    }

    pub fn playoff_records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter().filter(|record| record.is_playoff)
    }

    /// Serialize the whole report for export
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Records tagged with this season's year and league
    pub fn tagged_matches(&self) -> impl Iterator<Item = TaggedMatch> + '_ {
        self.records
            .iter()
            .map(|record| TaggedMatch::new(self.year, self.league.clone(), record.clone()))
    }
}

/// Compute one season from its complete input
pub fn compute_season(input: &SeasonInput, config: &EngineConfig) -> Result<SeasonReport> {
    let mut sink = WarningSink::new();

    let (records, warnings) = normalize_rows(&input.score_rows).into_parts();
    sink.extend(warnings);

    let (placements, warnings) = BracketResolver::new(&config.bracket)
        .resolve(&input.winners_bracket, &input.losers_bracket, &input.identity)?
        .into_parts();
    sink.extend(warnings);

    let (standings, warnings) = StandingsAggregator::new(config.standings.clone())
        .aggregate(&input.roster_stats, &placements, &input.score_rows)?
        .into_parts();
    sink.extend(warnings);

    let warnings = sink.finish(()).warnings;
    info!(
        "Computed {} season {}: {} records, {} placements, {} standings rows, {} warnings",
        input.league,
        input.year,
        records.len(),
        placements.len(),
        standings.len(),
        warnings.len()
    );

    Ok(SeasonReport {
        year: input.year,
        league: input.league.clone(),
        records,
        placements,
        standings,
        warnings,
    })
}

/// Compute many independent seasons, preserving input order
pub fn compute_seasons(inputs: &[SeasonInput], config: &EngineConfig) -> Result<Vec<SeasonReport>> {
    config.validate()?;

    if !config.parallelism.enabled || inputs.len() < 2 {
        return inputs.iter().map(|input| compute_season(input, config)).collect();
    }

    let threads = config.parallelism.max_threads.min(inputs.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("season-worker-{i}"))
        .build()?;
    info!("Computing {} seasons on {} threads", inputs.len(), threads);

    pool.install(|| inputs.par_iter().map(|input| compute_season(input, config)).collect())
}

/// Index every record of every report
pub fn build_history(reports: &[SeasonReport]) -> Outcome<HeadToHeadIndex> {
    let corpus: Vec<TaggedMatch> = reports.iter().flat_map(SeasonReport::tagged_matches).collect();
    HeadToHeadIndex::build(&corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(week: u32, team: &str, opponent: &str, score: f64) -> ScoreRow {
        ScoreRow {
            week,
            team: team.into(),
            opponent: opponent.into(),
            score,
            is_playoff: week >= 15,
            placement_type: None,
        }
    }

    fn stat(who: &str, wins: u32, points_for: f64) -> RosterSeasonStat {
        RosterSeasonStat {
            participant: who.into(),
            wins,
            losses: 1 - wins,
            ties: 0,
            points_for,
            points_against: 0.0,
        }
    }

    fn two_team_season(year: i32) -> SeasonInput {
        let mut input = SeasonInput::new(year, "league");
        input.roster_stats = vec![stat("alice", 1, 120.0), stat("bob", 0, 90.0)];
        input.score_rows = vec![
            row(1, "alice", "bob", 120.0),
            row(1, "bob", "alice", 90.0),
            row(15, "bob", "alice", 130.0),
            row(15, "alice", "bob", 110.0),
        ];
        input.winners_bracket = vec![BracketMatchNode::new(1, "bob", "alice").with_placement(1)];
        input
    }

    #[test]
    fn test_playoff_result_outranks_regular_season() {
        let report = compute_season(&two_team_season(2024), &EngineConfig::default()).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.playoff_records().count(), 1);
        assert_eq!(report.champion().map(|p| p.as_str()), Some("bob"));
        assert_eq!(report.standings[1].participant.as_str(), "alice");
        assert_eq!(report.standings[1].high_game, 120.0);
        // Only the missing losers bracket is worth reporting
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_history_spans_seasons() {
        let config = EngineConfig::default();
        let inputs = vec![two_team_season(2023), two_team_season(2024)];
        let reports = compute_seasons(&inputs, &config).unwrap();
        assert_eq!(reports.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2023, 2024]);

        let index = build_history(&reports).value;
        let stats = index.get_stats(&"alice".into(), &"bob".into());
        assert_eq!(stats.total_games, 4);
        assert_eq!(stats.a_wins, 2);
        assert_eq!(stats.playoff_games, 2);
    }
}
