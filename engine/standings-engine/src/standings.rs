//! # Standings Aggregator
//!
//! Merges regular-season records with bracket placements into one strictly
//! ordered table. Placed participants come first by placement; everyone else
//! follows by wins, then points for. Participant id ascending breaks whatever
//! is left, so the same input always yields the same ranks.

use crate::config::{ScoreScope, StandingsConfig};
use crate::diagnostics::{DataSource, EngineWarning, Outcome, WarningSink};
use crate::error::{Result, StandingsError};
use crate::types::{ParticipantId, PlacementResult, RosterSeasonStat, ScoreRow, StandingRow};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;

/// Builds the final standings table of one season
#[derive(Debug, Clone, Default)]
pub struct StandingsAggregator {
    config: StandingsConfig,
}

/// Highest and lowest weekly score of one participant
#[derive(Debug, Clone, Copy, PartialEq)]
struct GameRange {
    high: f64,
    low: f64,
}

impl StandingsAggregator {
    pub fn new(config: StandingsConfig) -> Self {
        Self { config }
    }

    /// Rank every participant in `stats`
    ///
    /// `scores` only feeds the high and low game columns and may be empty.
    pub fn aggregate(
        &self,
        stats: &[RosterSeasonStat],
        placements: &[PlacementResult],
        scores: &[ScoreRow],
    ) -> Result<Outcome<Vec<StandingRow>>> {
        let mut sink = WarningSink::new();

        let mut by_participant: HashMap<&ParticipantId, &RosterSeasonStat> = HashMap::new();
        for stat in stats {
            if by_participant.insert(&stat.participant, stat).is_some() {
                return Err(StandingsError::DuplicateRosterStat {
                    participant: stat.participant.clone(),
                });
            }
        }

        let mut placement_of: HashMap<&ParticipantId, u32> = HashMap::new();
        for result in placements {
            if !by_participant.contains_key(&result.participant) {
                sink.push(EngineWarning::UnresolvableParticipant {
                    participant: result.participant.clone(),
                    missing_from: DataSource::RosterStats,
                });
                continue;
            }
            let entry = placement_of.entry(&result.participant).or_insert(result.placement);
            *entry = (*entry).min(result.placement);
        }

        if !placements.is_empty() {
            for stat in stats {
                if !placement_of.contains_key(&stat.participant) {
                    sink.push(EngineWarning::UnresolvableParticipant {
                        participant: stat.participant.clone(),
                        missing_from: DataSource::Brackets,
                    });
                }
            }
        }

        let ranges = self.game_ranges(scores);

        let mut rows: Vec<StandingRow> = stats
            .iter()
            .map(|stat| {
                let range = ranges.get(&stat.participant).copied();
                StandingRow {
                    participant: stat.participant.clone(),
                    wins: stat.wins,
                    losses: stat.losses,
                    ties: stat.ties,
                    points_for: stat.points_for,
                    points_against: stat.points_against,
                    rank: 0,
                    placement: placement_of.get(&stat.participant).copied(),
                    high_game: range.map_or(0.0, |r| r.high),
                    low_game: range.map_or(0.0, |r| r.low),
                }
            })
            .collect();

        rows.sort_by(compare_rows);
        for (index, row) in rows.iter_mut().enumerate() {
            row.rank = index as u32 + 1;
        }

        info!(
            "Ranked {} participants ({} with playoff placements)",
            rows.len(),
            rows.iter().filter(|row| row.placement.is_some()).count()
        );

        Ok(sink.finish(rows))
    }

    fn game_ranges(&self, scores: &[ScoreRow]) -> HashMap<ParticipantId, GameRange> {
        let mut ranges: HashMap<ParticipantId, GameRange> = HashMap::new();
        let in_scope = |row: &&ScoreRow| match self.config.high_low_scope {
            ScoreScope::RegularSeason => !row.is_playoff,
            ScoreScope::AllWeeks => true,
        };

        for row in scores.iter().filter(in_scope) {
            ranges
                .entry(row.team.clone())
                .and_modify(|range| {
                    range.high = range.high.max(row.score);
                    range.low = range.low.min(row.score);
                })
                .or_insert(GameRange { high: row.score, low: row.score });
        }
        ranges
    }
}

/// Rank with the default configuration and no weekly scores
pub fn aggregate_standings(
    stats: &[RosterSeasonStat],
    placements: &[PlacementResult],
) -> Result<Outcome<Vec<StandingRow>>> {
    StandingsAggregator::default().aggregate(stats, placements, &[])
}

/// Total order over standings rows
fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    let primary = match (a.placement, b.placement) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            b.wins.cmp(&a.wins).then_with(|| b.points_for.total_cmp(&a.points_for))
        }
    };
    primary.then_with(|| a.participant.cmp(&b.participant))
}
