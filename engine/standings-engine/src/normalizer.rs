//! Pairing of per-team weekly score rows into canonical match records
//!
//! Each real match arrives as two rows, one per side. Rows are grouped by
//! week and unordered team pair; only pairings with both sides present become
//! a [`MatchRecord`]. Ties never produce a record: the pairing is reported as
//! [`EngineWarning::TiedScore`] and neither side is credited.

use crate::diagnostics::{EngineWarning, Outcome, WarningSink};
use crate::types::{MatchRecord, ParticipantId, ScoreRow};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Unordered team pair within one week
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairingKey {
    week: u32,
    low: ParticipantId,
    high: ParticipantId,
}

impl PairingKey {
    fn of(row: &ScoreRow) -> Self {
        let (low, high) = if row.team <= row.opponent {
            (row.team.clone(), row.opponent.clone())
        } else {
            (row.opponent.clone(), row.team.clone())
        };
        Self { week: row.week, low, high }
    }
}

/// Rows collected for one pairing, indexed by which side of the key they fill
#[derive(Debug, Default)]
struct Pairing<'a> {
    low_side: Option<&'a ScoreRow>,
    high_side: Option<&'a ScoreRow>,
}

/// Normalize the rows of a single week
///
/// Rows belonging to other weeks are ignored.
pub fn normalize_week(week: u32, rows: &[ScoreRow]) -> Outcome<Vec<MatchRecord>> {
    let week_rows: Vec<ScoreRow> = rows.iter().filter(|row| row.week == week).cloned().collect();
    normalize_rows(&week_rows)
}

/// Normalize rows spanning any number of weeks
///
/// Records come back ordered by week, then by the first appearance of the
/// pairing in `rows`.
pub fn normalize_rows(rows: &[ScoreRow]) -> Outcome<Vec<MatchRecord>> {
    let mut sink = WarningSink::new();
    let mut order: Vec<PairingKey> = Vec::new();
    let mut pairings: HashMap<PairingKey, Pairing<'_>> = HashMap::new();

    for row in rows {
        if row.team == row.opponent {
            sink.push(EngineWarning::SelfPairing { week: row.week, team: row.team.clone() });
            continue;
        }

        let key = PairingKey::of(row);
        let pairing = pairings.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Pairing::default()
        });

        let slot =
            if row.team == key.low { &mut pairing.low_side } else { &mut pairing.high_side };
        if slot.is_some() {
            sink.push(EngineWarning::DuplicateScoreRow {
                week: row.week,
                team: row.team.clone(),
                opponent: row.opponent.clone(),
            });
            continue;
        }
        *slot = Some(row);
    }

    let mut records = Vec::with_capacity(order.len());
    for key in &order {
        let Some(pairing) = pairings.get(key) else {
            continue;
        };

        let (a, b) = match (pairing.low_side, pairing.high_side) {
            (Some(a), Some(b)) => (a, b),
            (Some(present), None) | (None, Some(present)) => {
                sink.push(EngineWarning::IncompleteWeekPairing {
                    week: key.week,
                    team: present.team.clone(),
                    opponent: present.opponent.clone(),
                });
                continue;
            }
            (None, None) => continue,
        };

        if let Some(record) = pair_rows(a, b, &mut sink) {
            records.push(record);
        }
    }

    records.sort_by_key(|record| record.week);
    debug!("Normalized {} score rows into {} match records", rows.len(), records.len());

    sink.finish(records)
}

/// Decide the winner of one complete pairing
fn pair_rows(a: &ScoreRow, b: &ScoreRow, sink: &mut WarningSink) -> Option<MatchRecord> {
    let (winner, loser) = match a.score.partial_cmp(&b.score) {
        Some(Ordering::Greater) => (a, b),
        Some(Ordering::Less) => (b, a),
        _ => {
            sink.push(EngineWarning::TiedScore {
                week: a.week,
                team: a.team.clone(),
                opponent: b.team.clone(),
                score: a.score,
            });
            return None;
        }
    };

    Some(MatchRecord {
        week: a.week,
        winner: winner.team.clone(),
        loser: loser.team.clone(),
        winner_score: winner.score,
        loser_score: loser.score,
        is_playoff: a.is_playoff || b.is_playoff,
        placement_type: a.placement_type.clone().or_else(|| b.placement_type.clone()),
    })
}
