//! # Bracket Tree Resolver
//!
//! Turns the winners and losers bracket trees of one season into a total order
//! of placements. Each tree is first resolved on its own into local placements
//! `1..size`, where local 1 is the winner of the final-round match:
//!
//! 1. The final-round match decides local 1 (winner) and 2 (loser).
//! 2. A node carrying an explicit placement `p` sends its winner to `p`, then,
//!    once every explicit winner is seated, its loser to `p + 1` when `p` is
//!    below the tree size and the slot is still free.
//! 3. Anyone still unseated takes the smallest free slot, in the configured
//!    [`FallbackOrder`]. These are reported with [`PlacementSource::Fallback`].
//!
//! The winners tree maps local placements straight onto `1..K`. The losers
//! tree is inverted through [`invert_consolation_placement`], since winning a
//! consolation match moves a team toward the bottom of the league.
//! Participants found in both trees keep their winners placement and are
//! removed from the losers tree before it is sized.

use crate::config::{BracketConfig, FallbackOrder};
use crate::diagnostics::{DataSource, EngineWarning, Outcome, WarningSink};
use crate::error::{Result, StandingsError};
use crate::types::{
    placement_name, BracketKind, BracketMatchNode, ParticipantId, PlacementResult,
    PlacementSource,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Map a losers-bracket local placement onto the overall standings
///
/// `local` 1 is the team that won the consolation final, which finishes last
/// overall at `winners_size + losers_size`. Explicit placement `p` lands on
/// `winners_size + losers_size + 1 - p`. Returns `None` unless `local` lies in
/// `1..=losers_size`.
pub fn invert_consolation_placement(
    local: u32,
    winners_size: u32,
    losers_size: u32,
) -> Option<u32> {
    if local == 0 || local > losers_size {
        return None;
    }
    winners_size.checked_add(losers_size)?.checked_add(1)?.checked_sub(local)
}

/// Maps roster slots referenced by bracket nodes to the owning participant
///
/// An empty map passes every identifier through unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    owners: HashMap<ParticipantId, ParticipantId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: impl Into<ParticipantId>, owner: impl Into<ParticipantId>) {
        self.owners.insert(slot.into(), owner.into());
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Owner of `slot`, or `None` when a non-empty map has no entry for it
    pub fn owner_of(&self, slot: &ParticipantId) -> Option<ParticipantId> {
        if self.owners.is_empty() {
            return Some(slot.clone());
        }
        self.owners.get(slot).cloned()
    }
}

impl FromIterator<(ParticipantId, ParticipantId)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, ParticipantId)>>(iter: I) -> Self {
        Self { owners: iter.into_iter().collect() }
    }
}

/// Placement seated inside one tree, before mapping onto the league
#[derive(Debug, Clone, PartialEq)]
struct LocalPlacement {
    participant: ParticipantId,
    local: u32,
    source: PlacementSource,
}

/// Seat assignments for one tree, `1..=size`
#[derive(Debug)]
struct PlacementBoard {
    size: u32,
    seats: HashMap<u32, ParticipantId>,
    seated: HashMap<ParticipantId, (u32, PlacementSource)>,
}

impl PlacementBoard {
    fn new(size: u32) -> Self {
        Self { size, seats: HashMap::new(), seated: HashMap::new() }
    }

    fn is_seated(&self, participant: &ParticipantId) -> bool {
        self.seated.contains_key(participant)
    }

    /// Seat a participant, or explain why the seat cannot be taken
    fn seat(
        &mut self,
        participant: &ParticipantId,
        local: u32,
        source: PlacementSource,
    ) -> std::result::Result<(), String> {
        if local == 0 || local > self.size {
            return Err(format!("placement outside 1..={}", self.size));
        }
        if let Some((existing, _)) = self.seated.get(participant) {
            return Err(format!("already placed at {existing}"));
        }
        if let Some(holder) = self.seats.get(&local) {
            return Err(format!("slot held by {holder}"));
        }
        self.seats.insert(local, participant.clone());
        self.seated.insert(participant.clone(), (local, source));
        Ok(())
    }

    fn smallest_free(&self) -> Option<u32> {
        (1..=self.size).find(|slot| !self.seats.contains_key(slot))
    }

    fn into_placements(self) -> Vec<LocalPlacement> {
        let mut placements: Vec<LocalPlacement> = self
            .seated
            .into_iter()
            .map(|(participant, (local, source))| LocalPlacement { participant, local, source })
            .collect();
        placements.sort_by_key(|p| p.local);
        placements
    }
}

/// Resolves winners and losers brackets into overall placements
#[derive(Debug, Clone, Default)]
pub struct BracketResolver {
    fallback_order: FallbackOrder,
}

impl BracketResolver {
    pub fn new(config: &BracketConfig) -> Self {
        Self { fallback_order: config.fallback_order }
    }

    /// Resolve both trees into placements `1..K+M`, ordered by placement
    pub fn resolve(
        &self,
        winners: &[BracketMatchNode],
        losers: &[BracketMatchNode],
        identity: &IdentityMap,
    ) -> Result<Outcome<Vec<PlacementResult>>> {
        let mut sink = WarningSink::new();

        let winners = apply_identity(BracketKind::Winners, winners, identity, &mut sink)?;
        let losers = apply_identity(BracketKind::Losers, losers, identity, &mut sink)?;

        // Winners placements take priority; overlapping participants leave the
        // losers tree before it is sized
        let in_winners: HashSet<ParticipantId> = appearance_order(&winners).into_iter().collect();
        let overlap: HashSet<ParticipantId> = appearance_order(&losers)
            .into_iter()
            .filter(|participant| in_winners.contains(participant))
            .inspect(|participant| {
                sink.push(EngineWarning::BracketOverlap { participant: participant.clone() })
            })
            .collect();

        let (winners_local, winners_size) =
            self.resolve_tree(BracketKind::Winners, &winners, &HashSet::new(), &mut sink);
        let (losers_local, losers_size) =
            self.resolve_tree(BracketKind::Losers, &losers, &overlap, &mut sink);

        let mut results = Vec::with_capacity(winners_local.len() + losers_local.len());

        for local in winners_local {
            results.push(PlacementResult {
                placement_name: placement_name(local.local),
                participant: local.participant,
                placement: local.local,
                bracket: BracketKind::Winners,
                source: local.source,
            });
        }

        let last_place = winners_size + losers_size;
        for local in losers_local {
            let Some(placement) =
                invert_consolation_placement(local.local, winners_size, losers_size)
            else {
                continue;
            };
            let name = if placement == last_place {
                "Last Place".to_string()
            } else {
                placement_name(placement)
            };
            results.push(PlacementResult {
                participant: local.participant,
                placement,
                placement_name: name,
                bracket: BracketKind::Losers,
                source: local.source,
            });
        }

        results.sort_by_key(|r| r.placement);
        info!(
            "Resolved {} placements (winners bracket {}, losers bracket {})",
            results.len(),
            winners_size,
            losers_size
        );

        Ok(sink.finish(results))
    }

    /// Seat every participant of one tree at a local placement `1..=size`
    ///
    /// Participants in `excluded` are not seated and do not count toward the size.
    fn resolve_tree(
        &self,
        kind: BracketKind,
        nodes: &[BracketMatchNode],
        excluded: &HashSet<ParticipantId>,
        sink: &mut WarningSink,
    ) -> (Vec<LocalPlacement>, u32) {
        if nodes.is_empty() {
            sink.push(EngineWarning::EmptyBracket { bracket: kind });
            return (Vec::new(), 0);
        }

        let participants: Vec<ParticipantId> =
            appearance_order(nodes).into_iter().filter(|p| !excluded.contains(p)).collect();
        let seatable = |participant: &&ParticipantId| !excluded.contains(*participant);
        let size = participants.len() as u32;
        let mut board = PlacementBoard::new(size);

        for (index, node) in nodes.iter().enumerate() {
            if !is_well_formed(node) {
                let round = node.round;
                sink.push(EngineWarning::MalformedBracketNode { bracket: kind, index, round });
            }
        }

        let championship = find_championship(kind, nodes, sink);
        if let Some(index) = championship {
            let node = &nodes[index];
            if let (Some(winner), Some(loser)) = (&node.winner, &node.loser) {
                debug!("{} bracket final: {} over {}", kind, winner, loser);
                // A final with an excluded side is left to fallback
                if seatable(&winner) && seatable(&loser) {
                    seat_or_warn(&mut board, kind, winner, 1, PlacementSource::Championship, sink);
                    seat_or_warn(&mut board, kind, loser, 2, PlacementSource::Championship, sink);
                }
            }
        }

        let explicit: Vec<(&BracketMatchNode, u32)> = nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| Some(*index) != championship && is_well_formed(node))
            .filter_map(|(_, node)| node.explicit_placement.map(|p| (node, p)))
            .collect();

        for (node, p) in &explicit {
            if let Some(winner) = node.winner.as_ref().filter(seatable) {
                seat_or_warn(&mut board, kind, winner, *p, PlacementSource::Explicit, sink);
            }
        }

        for (node, p) in &explicit {
            if *p >= size {
                continue;
            }
            if let Some(loser) = node.loser.as_ref().filter(seatable) {
                seat_or_warn(&mut board, kind, loser, p + 1, PlacementSource::Explicit, sink);
            }
        }

        let mut unplaced: Vec<ParticipantId> =
            participants.into_iter().filter(|p| !board.is_seated(p)).collect();
        if self.fallback_order == FallbackOrder::ParticipantId {
            unplaced.sort();
        }
        for participant in unplaced {
            // The board has exactly one seat per participant, so a free seat exists
            if let Some(slot) = board.smallest_free() {
                debug!("{} bracket fallback: {} seated at {}", kind, participant, slot);
                seat_or_warn(&mut board, kind, &participant, slot, PlacementSource::Fallback, sink);
            }
        }

        (board.into_placements(), size)
    }
}

/// Resolve with default configuration and no identity mapping
pub fn resolve_placements(
    winners: &[BracketMatchNode],
    losers: &[BracketMatchNode],
) -> Result<Outcome<Vec<PlacementResult>>> {
    BracketResolver::default().resolve(winners, losers, &IdentityMap::new())
}

fn seat_or_warn(
    board: &mut PlacementBoard,
    kind: BracketKind,
    participant: &ParticipantId,
    local: u32,
    source: PlacementSource,
    sink: &mut WarningSink,
) {
    if let Err(reason) = board.seat(participant, local, source) {
        sink.push(EngineWarning::PlacementConflict {
            bracket: kind,
            participant: participant.clone(),
            placement: local,
            reason,
        });
    }
}

/// Both sides recorded and distinct
fn is_well_formed(node: &BracketMatchNode) -> bool {
    match (&node.winner, &node.loser) {
        (Some(winner), Some(loser)) => winner != loser,
        _ => false,
    }
}

/// Distinct participants, winner before loser within each node
fn appearance_order(nodes: &[BracketMatchNode]) -> Vec<ParticipantId> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for node in nodes {
        for participant in [&node.winner, &node.loser].into_iter().flatten() {
            if seen.insert(participant.clone()) {
                order.push(participant.clone());
            }
        }
    }
    order
}

/// Index of the match deciding local placements 1 and 2
///
/// Within the final round: a node marked as placement 1, else the only
/// well-formed node, else the only well-formed node without an explicit
/// placement. Anything else is ambiguous and the championship rule is skipped.
fn find_championship(
    kind: BracketKind,
    nodes: &[BracketMatchNode],
    sink: &mut WarningSink,
) -> Option<usize> {
    let final_round = nodes.iter().map(|node| node.round).max()?;
    let candidates: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.round == final_round && is_well_formed(node))
        .map(|(index, _)| index)
        .collect();

    if let Some(&index) = candidates.iter().find(|&&i| nodes[i].explicit_placement == Some(1)) {
        return Some(index);
    }
    if let [only] = candidates.as_slice() {
        return Some(*only);
    }
    let unmarked: Vec<usize> =
        candidates.iter().copied().filter(|&i| nodes[i].explicit_placement.is_none()).collect();
    if let [only] = unmarked.as_slice() {
        return Some(*only);
    }

    sink.push(EngineWarning::AmbiguousFinal { bracket: kind, round: final_round });
    None
}

/// Validate rounds and rewrite roster slots to their owners
fn apply_identity(
    kind: BracketKind,
    nodes: &[BracketMatchNode],
    identity: &IdentityMap,
    sink: &mut WarningSink,
) -> Result<Vec<BracketMatchNode>> {
    let mut unresolved: HashSet<ParticipantId> = HashSet::new();
    let mut map = |slot: &Option<ParticipantId>, sink: &mut WarningSink| {
        let slot = slot.as_ref()?;
        let owner = identity.owner_of(slot);
        if owner.is_none() && unresolved.insert(slot.clone()) {
            sink.push(EngineWarning::UnresolvableParticipant {
                participant: slot.clone(),
                missing_from: DataSource::IdentityMap,
            });
        }
        owner
    };

    let mut mapped = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if node.round == 0 {
            return Err(StandingsError::InvalidRound { bracket: kind, index, round: node.round });
        }
        mapped.push(BracketMatchNode {
            round: node.round,
            explicit_placement: node.explicit_placement,
            winner: map(&node.winner, &mut *sink),
            loser: map(&node.loser, &mut *sink),
        });
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement_of(results: &[PlacementResult], who: &str) -> u32 {
        results
            .iter()
            .find(|r| r.participant.as_str() == who)
            .map(|r| r.placement)
            .unwrap_or_else(|| panic!("{who} was not placed"))
    }

    #[test]
    fn test_inversion_maps_final_winner_to_last() {
        assert_eq!(invert_consolation_placement(1, 4, 2), Some(6));
        assert_eq!(invert_consolation_placement(2, 4, 2), Some(5));
        assert_eq!(invert_consolation_placement(1, 6, 6), Some(12));
        assert_eq!(invert_consolation_placement(6, 6, 6), Some(7));
        assert_eq!(invert_consolation_placement(3, 6, 6), Some(10));
    }

    #[test]
    fn test_inversion_rejects_out_of_range_local() {
        assert_eq!(invert_consolation_placement(0, 4, 2), None);
        assert_eq!(invert_consolation_placement(3, 4, 2), None);
        assert_eq!(invert_consolation_placement(9, 0, 2), None);
        assert_eq!(invert_consolation_placement(1, u32::MAX, 1), None);
    }

    #[test]
    fn test_four_team_winners_bracket() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode::new(1, "C", "D"),
            BracketMatchNode::new(2, "A", "C"),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        let results = &outcome.value;

        assert_eq!(placement_of(results, "A"), 1);
        assert_eq!(placement_of(results, "C"), 2);
        assert_eq!(placement_of(results, "B"), 3);
        assert_eq!(placement_of(results, "D"), 4);
        assert_eq!(results[0].placement_name, "Champion");
        assert_eq!(results[0].source, PlacementSource::Championship);
        assert_eq!(results[2].source, PlacementSource::Fallback);
        // Only the empty losers bracket is reported
        assert_eq!(
            outcome.warnings,
            vec![EngineWarning::EmptyBracket { bracket: BracketKind::Losers }]
        );
    }

    #[test]
    fn test_single_match_losers_bracket_is_inverted() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode::new(1, "C", "D"),
            BracketMatchNode::new(2, "A", "C"),
        ];
        let losers = vec![BracketMatchNode::new(1, "E", "F")];

        let results = resolve_placements(&winners, &losers).unwrap().value;

        assert_eq!(placement_of(&results, "E"), 6);
        assert_eq!(placement_of(&results, "F"), 5);
        let last = results.last().unwrap();
        assert_eq!(last.participant.as_str(), "E");
        assert_eq!(last.placement_name, "Last Place");
        assert_eq!(last.bracket, BracketKind::Losers);
    }

    #[test]
    fn test_explicit_placements_with_third_place_game() {
        // Six-team bracket: two byes, a 3rd place game and a 5th place game
        let winners = vec![
            BracketMatchNode::new(1, "C", "F"),
            BracketMatchNode::new(1, "D", "E"),
            BracketMatchNode::new(2, "A", "D"),
            BracketMatchNode::new(2, "B", "C"),
            BracketMatchNode::new(2, "E", "F").with_placement(5),
            BracketMatchNode::new(3, "A", "B").with_placement(1),
            BracketMatchNode::new(3, "C", "D").with_placement(3),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        let results = &outcome.value;

        assert_eq!(placement_of(results, "A"), 1);
        assert_eq!(placement_of(results, "B"), 2);
        assert_eq!(placement_of(results, "C"), 3);
        assert_eq!(placement_of(results, "D"), 4);
        assert_eq!(placement_of(results, "E"), 5);
        assert_eq!(placement_of(results, "F"), 6);
        assert!(results.iter().all(|r| r.source != PlacementSource::Fallback));
    }

    #[test]
    fn test_championship_beats_conflicting_explicit_placement() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode::new(1, "C", "D").with_placement(1),
            BracketMatchNode::new(2, "A", "C"),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        let results = &outcome.value;

        assert_eq!(placement_of(results, "A"), 1);
        assert_eq!(placement_of(results, "C"), 2);
        assert!(outcome.warnings.iter().any(|w| matches!(
            w,
            EngineWarning::PlacementConflict { placement: 1, .. }
        )));
    }

    #[test]
    fn test_explicit_loser_never_pushed_past_bracket_size() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode::new(1, "C", "D").with_placement(4),
            BracketMatchNode::new(2, "A", "B"),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        let mut placements: Vec<u32> = outcome.value.iter().map(|r| r.placement).collect();
        placements.sort();
        assert_eq!(placements, vec![1, 2, 3, 4]);
        assert_eq!(placement_of(&outcome.value, "C"), 4);
        assert_eq!(placement_of(&outcome.value, "D"), 3);
    }

    #[test]
    fn test_missing_winner_is_skipped_not_fatal() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode {
                round: 1,
                explicit_placement: None,
                winner: None,
                loser: Some("D".into()),
            },
            BracketMatchNode::new(2, "A", "C"),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        assert_eq!(outcome.value.len(), 4);
        assert_eq!(placement_of(&outcome.value, "A"), 1);
        assert!(outcome.warnings.iter().any(|w| matches!(
            w,
            EngineWarning::MalformedBracketNode { index: 1, .. }
        )));
    }

    #[test]
    fn test_empty_brackets_yield_nothing() {
        let outcome = resolve_placements(&[], &[]).unwrap();
        assert!(outcome.value.is_empty());
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn test_round_zero_is_rejected() {
        let winners = vec![BracketMatchNode::new(0, "A", "B")];
        let err = resolve_placements(&winners, &[]).unwrap_err();
        assert!(matches!(err, StandingsError::InvalidRound { index: 0, .. }));
    }

    #[test]
    fn test_ambiguous_final_falls_back() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "B"),
            BracketMatchNode::new(1, "C", "D"),
        ];

        let outcome = resolve_placements(&winners, &[]).unwrap();
        let placements: Vec<(&str, u32)> =
            outcome.value.iter().map(|r| (r.participant.as_str(), r.placement)).collect();
        assert_eq!(placements, vec![("A", 1), ("B", 2), ("C", 3), ("D", 4)]);
        assert!(outcome.value.iter().all(|r| r.source == PlacementSource::Fallback));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::AmbiguousFinal { round: 1, .. })));
    }

    #[test]
    fn test_fallback_by_participant_id() {
        let winners = vec![
            BracketMatchNode::new(1, "A", "Z"),
            BracketMatchNode::new(1, "C", "B"),
            BracketMatchNode::new(2, "A", "C"),
        ];
        let resolver =
            BracketResolver::new(&BracketConfig { fallback_order: FallbackOrder::ParticipantId });

        let results = resolver.resolve(&winners, &[], &IdentityMap::new()).unwrap().value;
        assert_eq!(placement_of(&results, "B"), 3);
        assert_eq!(placement_of(&results, "Z"), 4);
    }

    #[test]
    fn test_identity_map_rewrites_roster_slots() {
        let winners = vec![BracketMatchNode::new(1, "1", "2")];
        let losers = vec![BracketMatchNode::new(1, "3", "4")];
        let identity: IdentityMap = [("1", "alice"), ("2", "bob"), ("3", "carol")]
            .into_iter()
            .map(|(slot, owner)| (ParticipantId::from(slot), ParticipantId::from(owner)))
            .collect();

        let outcome = BracketResolver::default().resolve(&winners, &losers, &identity).unwrap();
        let results = &outcome.value;

        assert_eq!(placement_of(results, "alice"), 1);
        assert_eq!(placement_of(results, "bob"), 2);
        // Slot 4 has no owner, so carol is the only consolation participant
        assert_eq!(placement_of(results, "carol"), 3);
        assert!(outcome.warnings.iter().any(|w| matches!(
            w,
            EngineWarning::UnresolvableParticipant { missing_from: DataSource::IdentityMap, .. }
        )));
    }

    #[test]
    fn test_bracket_overlap_keeps_winners_placement() {
        let winners = vec![BracketMatchNode::new(1, "A", "B")];
        let losers = vec![BracketMatchNode::new(1, "B", "C")];

        let outcome = resolve_placements(&winners, &losers).unwrap();
        assert_eq!(placement_of(&outcome.value, "B"), 2);
        assert_eq!(placement_of(&outcome.value, "C"), 3);
        assert_eq!(
            outcome.warnings,
            vec![EngineWarning::BracketOverlap { participant: "B".into() }]
        );
    }

    #[test]
    fn test_bracket_overlap_leaves_no_gap() {
        let winners = vec![BracketMatchNode::new(1, "A", "B")];
        let losers = vec![BracketMatchNode::new(1, "C", "B")];

        let outcome = resolve_placements(&winners, &losers).unwrap();
        let placements: Vec<(&str, u32)> =
            outcome.value.iter().map(|r| (r.participant.as_str(), r.placement)).collect();
        assert_eq!(placements, vec![("A", 1), ("B", 2), ("C", 3)]);
        assert_eq!(outcome.value[2].placement_name, "Last Place");
        assert_eq!(
            outcome.warnings,
            vec![EngineWarning::BracketOverlap { participant: "B".into() }]
        );
    }
}
