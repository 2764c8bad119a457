//! # Head-to-Head Index
//!
//! Bidirectional adjacency over every recorded match of every season and
//! league. A match between A and B is stored once and shared under both
//! `A -> B` and `B -> A`, so a pairwise query is two hash lookups no matter
//! how large the corpus grows. The index is rebuilt wholesale whenever the
//! corpus changes.

use crate::diagnostics::{EngineWarning, Outcome, WarningSink};
use crate::types::{LeagueId, MatchRecord, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Identity of a stored match within one participant pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub year: i32,
    pub league: LeagueId,
    pub week: u32,
}

/// A match record tagged with the season and league it was played in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedMatch {
    pub year: i32,
    pub league: LeagueId,
    pub record: MatchRecord,
}

impl TaggedMatch {
    pub fn new(year: i32, league: LeagueId, record: MatchRecord) -> Self {
        Self { year, league, record }
    }

    pub fn key(&self) -> MatchKey {
        MatchKey { year: self.year, league: self.league.clone(), week: self.record.week }
    }
}

/// Aggregate results between two participants, from A's point of view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadToHeadStats {
    pub a_wins: u32,
    pub b_wins: u32,
    pub total_games: u32,
    pub a_avg_score: f64,
    pub b_avg_score: f64,
    pub a_total_points: f64,
    pub b_total_points: f64,
    pub playoff_games: u32,
}

impl HeadToHeadStats {
    /// Reduce a list of matches between `a` and `b`
    ///
    /// Matches that do not involve both participants are ignored.
    pub fn from_matches<'a>(
        a: &ParticipantId,
        b: &ParticipantId,
        matches: impl IntoIterator<Item = &'a TaggedMatch>,
    ) -> Self {
        let mut stats = HeadToHeadStats::default();

        for tagged in matches {
            let record = &tagged.record;
            let (Some(a_score), Some(b_score)) = (record.score_of(a), record.score_of(b)) else {
                continue;
            };

            stats.total_games += 1;
            stats.a_total_points += a_score;
            stats.b_total_points += b_score;
            if &record.winner == a {
                stats.a_wins += 1;
            } else {
                stats.b_wins += 1;
            }
            if record.is_playoff {
                stats.playoff_games += 1;
            }
        }

        if stats.total_games > 0 {
            stats.a_avg_score = stats.a_total_points / stats.total_games as f64;
            stats.b_avg_score = stats.b_total_points / stats.total_games as f64;
        }
        stats
    }
}

/// All-time record of one participant across the whole index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CareerRecord {
    pub wins: u32,
    pub losses: u32,
    pub points_for: f64,
    pub points_against: f64,
    pub opponents: u32,
}

/// Pair-keyed index of every match in the corpus
#[derive(Debug, Clone, Default)]
pub struct HeadToHeadIndex {
    pairs: HashMap<ParticipantId, HashMap<ParticipantId, Vec<Arc<TaggedMatch>>>>,
    match_count: usize,
}

impl HeadToHeadIndex {
    /// Build the index from the full corpus
    ///
    /// A second record with the same `(year, league, week)` for the same pair
    /// is dropped and reported, which keeps that key unique per pair.
    pub fn build<'a>(corpus: impl IntoIterator<Item = &'a TaggedMatch>) -> Outcome<Self> {
        let mut sink = WarningSink::new();
        let mut index = HeadToHeadIndex::default();
        let mut seen: HashSet<(ParticipantId, ParticipantId, MatchKey)> = HashSet::new();

        for tagged in corpus {
            let record = &tagged.record;
            if record.winner == record.loser {
                sink.push(EngineWarning::SelfPairing {
                    week: record.week,
                    team: record.winner.clone(),
                });
                continue;
            }

            let (low, high) = if record.winner <= record.loser {
                (record.winner.clone(), record.loser.clone())
            } else {
                (record.loser.clone(), record.winner.clone())
            };
            if !seen.insert((low, high, tagged.key())) {
                sink.push(EngineWarning::DuplicateMatch {
                    year: tagged.year,
                    league: tagged.league.to_string(),
                    week: record.week,
                    a: record.winner.clone(),
                    b: record.loser.clone(),
                });
                continue;
            }

            let shared = Arc::new(tagged.clone());
            index.insert(&record.winner, &record.loser, Arc::clone(&shared));
            index.insert(&record.loser, &record.winner, shared);
            index.match_count += 1;
        }

        info!(
            "Built head-to-head index: {} matches across {} participants",
            index.match_count,
            index.pairs.len()
        );
        sink.finish(index)
    }

    fn insert(&mut self, from: &ParticipantId, to: &ParticipantId, tagged: Arc<TaggedMatch>) {
        self.pairs
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_default()
            .push(tagged);
    }

    /// Every match between `a` and `b`, newest first
    ///
    /// Sorted by year descending, then week descending, then league.
    pub fn get_head_to_head(&self, a: &ParticipantId, b: &ParticipantId) -> Vec<&TaggedMatch> {
        let Some(stored) = self.pairs.get(a).and_then(|opponents| opponents.get(b)) else {
            return Vec::new();
        };

        let mut seen = HashSet::with_capacity(stored.len());
        let mut matches: Vec<&TaggedMatch> =
            stored.iter().map(|m| m.as_ref()).filter(|m| seen.insert(m.key())).collect();

        matches.sort_by(|x, y| {
            y.year
                .cmp(&x.year)
                .then_with(|| y.record.week.cmp(&x.record.week))
                .then_with(|| x.league.cmp(&y.league))
        });
        matches
    }

    /// Aggregate stats for `a` against `b`
    pub fn get_stats(&self, a: &ParticipantId, b: &ParticipantId) -> HeadToHeadStats {
        HeadToHeadStats::from_matches(a, b, self.get_head_to_head(a, b))
    }

    /// Everyone `participant` has played, sorted by identifier
    pub fn opponents(&self, participant: &ParticipantId) -> Vec<&ParticipantId> {
        let mut opponents: Vec<&ParticipantId> = self
            .pairs
            .get(participant)
            .map(|opponents| opponents.keys().collect())
            .unwrap_or_default();
        opponents.sort();
        opponents
    }

    /// Win/loss and points totals for `participant` against the whole field
    pub fn career_record(&self, participant: &ParticipantId) -> CareerRecord {
        let mut record = CareerRecord::default();
        for opponent in self.opponents(participant) {
            let stats = self.get_stats(participant, opponent);
            record.wins += stats.a_wins;
            record.losses += stats.b_wins;
            record.points_for += stats.a_total_points;
            record.points_against += stats.b_total_points;
            record.opponents += 1;
        }
        record
    }

    /// Every participant with at least one indexed match, sorted
    pub fn participants(&self) -> Vec<&ParticipantId> {
        let mut participants: Vec<&ParticipantId> = self.pairs.keys().collect();
        participants.sort();
        participants
    }

    /// Number of distinct matches stored
    pub fn len(&self) -> usize {
        self.match_count
    }

    pub fn is_empty(&self) -> bool {
        self.match_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(year: i32, league: &str, week: u32, winner: &str, loser: &str) -> TaggedMatch {
        TaggedMatch::new(
            year,
            league.into(),
            MatchRecord {
                week,
                winner: winner.into(),
                loser: loser.into(),
                winner_score: 120.0,
                loser_score: 100.0,
                is_playoff: week >= 15,
                placement_type: None,
            },
        )
    }

    fn corpus() -> Vec<TaggedMatch> {
        vec![
            tagged(2022, "L1", 3, "alice", "bob"),
            tagged(2023, "L1", 1, "bob", "alice"),
            tagged(2023, "L1", 9, "alice", "bob"),
            tagged(2023, "L1", 9, "carol", "dave"),
            tagged(2024, "L2", 16, "alice", "bob"),
            tagged(2024, "L2", 2, "alice", "carol"),
        ]
    }

    #[test]
    fn test_lookup_is_sorted_newest_first() {
        let index = HeadToHeadIndex::build(&corpus()).value;
        let a = ParticipantId::from("alice");
        let b = ParticipantId::from("bob");

        let keys: Vec<(i32, u32)> =
            index.get_head_to_head(&a, &b).iter().map(|m| (m.year, m.record.week)).collect();
        assert_eq!(keys, vec![(2024, 16), (2023, 9), (2023, 1), (2022, 3)]);
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let index = HeadToHeadIndex::build(&corpus()).value;
        let a = ParticipantId::from("alice");
        let b = ParticipantId::from("bob");

        assert_eq!(index.get_head_to_head(&a, &b), index.get_head_to_head(&b, &a));
    }

    #[test]
    fn test_stats_reduction() {
        let index = HeadToHeadIndex::build(&corpus()).value;
        let a = ParticipantId::from("alice");
        let b = ParticipantId::from("bob");

        let stats = index.get_stats(&a, &b);
        assert_eq!(stats.total_games, 4);
        assert_eq!(stats.a_wins, 3);
        assert_eq!(stats.b_wins, 1);
        assert_eq!(stats.playoff_games, 1);
        assert_eq!(stats.a_total_points, 460.0);
        assert_eq!(stats.a_avg_score, 115.0);
        assert_eq!(stats.b_avg_score, 105.0);

        let reversed = index.get_stats(&b, &a);
        assert_eq!(reversed.a_wins, 1);
        assert_eq!(reversed.b_wins, 3);
    }

    #[test]
    fn test_duplicate_match_is_stored_once() {
        let mut matches = corpus();
        matches.push(tagged(2023, "L1", 9, "bob", "alice"));

        let outcome = HeadToHeadIndex::build(&matches);
        assert_eq!(outcome.value.len(), 6);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(outcome.warnings[0], EngineWarning::DuplicateMatch { week: 9, .. }));
    }

    #[test]
    fn test_same_week_different_league_kept() {
        let matches =
            vec![tagged(2023, "L1", 4, "alice", "bob"), tagged(2023, "L2", 4, "alice", "bob")];

        let index = HeadToHeadIndex::build(&matches).value;
        assert_eq!(index.get_head_to_head(&"alice".into(), &"bob".into()).len(), 2);
    }

    #[test]
    fn test_unknown_pair_is_empty() {
        let index = HeadToHeadIndex::build(&corpus()).value;
        let stats = index.get_stats(&"bob".into(), &"dave".into());
        assert_eq!(stats, HeadToHeadStats::default());
        assert!(index.get_head_to_head(&"nobody".into(), &"bob".into()).is_empty());
    }

    #[test]
    fn test_opponents_and_career_record() {
        let index = HeadToHeadIndex::build(&corpus()).value;
        let alice = ParticipantId::from("alice");

        let opponents: Vec<&str> = index.opponents(&alice).iter().map(|p| p.as_str()).collect();
        assert_eq!(opponents, vec!["bob", "carol"]);

        let career = index.career_record(&alice);
        assert_eq!(career.wins, 4);
        assert_eq!(career.losses, 1);
        assert_eq!(career.opponents, 2);
        assert_eq!(index.participants().len(), 4);
    }

    #[test]
    fn test_self_match_is_rejected() {
        let outcome = HeadToHeadIndex::build(&[tagged(2023, "L1", 1, "alice", "alice")]);
        assert!(outcome.value.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }
}
