//! Sleeper payloads to engine inputs
//!
//! Participants are identified by owner user id so records line up across
//! seasons, where roster ids are reassigned. Orphaned rosters fall back to a
//! `roster:<league_id>:<roster_id>` identifier, so the same roster id in
//! another league season is a different participant.

use crate::error::{Result, SleeperError};
use crate::payload::{SeasonPayload, SleeperBracketMatch, SleeperMatchup};
use standings_engine::{
    ordinal, BracketMatchNode, IdentityMap, ParticipantId, RosterSeasonStat, ScoreRow,
    SeasonInput,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Roster id to participant mapping of one league season
#[derive(Debug, Clone, Default)]
pub struct RosterOwners {
    owners: HashMap<u32, ParticipantId>,
}

impl RosterOwners {
    pub fn from_payload(payload: &SeasonPayload) -> Result<Self> {
        let mut owners = HashMap::with_capacity(payload.rosters.len());
        for roster in &payload.rosters {
            let participant = match &roster.owner_id {
                Some(owner) => ParticipantId::new(owner.clone()),
                None => {
                    warn!(
                        "Roster {} in league {} has no owner",
                        roster.roster_id, payload.league.league_id
                    );
                    orphan_id(&payload.league.league_id, roster.roster_id)
                }
            };
            if owners.insert(roster.roster_id, participant).is_some() {
                return Err(SleeperError::DuplicateRoster { roster_id: roster.roster_id });
            }
        }
        Ok(Self { owners })
    }

    pub fn get(&self, roster_id: u32) -> Option<&ParticipantId> {
        self.owners.get(&roster_id)
    }

    /// Identity map keyed by the roster ids bracket nodes carry
    pub fn identity_map(&self) -> IdentityMap {
        self.owners
            .iter()
            .map(|(roster, owner)| (ParticipantId::new(roster.to_string()), owner.clone()))
            .collect()
    }
}

fn orphan_id(league_id: &str, roster_id: u32) -> ParticipantId {
    ParticipantId::new(format!("roster:{league_id}:{roster_id}"))
}

/// Convert one fetched league season into engine input
pub fn season_input(payload: &SeasonPayload) -> Result<SeasonInput> {
    let league = &payload.league;
    let year: i32 = league.season.trim().parse().map_err(|_| SleeperError::InvalidSeason {
        league_id: league.league_id.clone(),
        season: league.season.clone(),
    })?;
    let owners = RosterOwners::from_payload(payload)?;

    let mut input = SeasonInput::new(year, league.league_id.as_str());
    input.identity = owners.identity_map();
    input.roster_stats = roster_stats(payload, &owners);
    input.winners_bracket = payload.winners_bracket.iter().map(bracket_node).collect();
    input.losers_bracket = payload.losers_bracket.iter().map(bracket_node).collect();
    input.score_rows = score_rows(payload, &owners);

    info!(
        "Loaded Sleeper league {} ({}): {} rosters, {} score rows, {} bracket matches",
        league.league_id,
        year,
        input.roster_stats.len(),
        input.score_rows.len(),
        input.winners_bracket.len() + input.losers_bracket.len()
    );
    Ok(input)
}

fn roster_stats(payload: &SeasonPayload, owners: &RosterOwners) -> Vec<RosterSeasonStat> {
    payload
        .rosters
        .iter()
        .filter_map(|roster| {
            let participant = owners.get(roster.roster_id)?.clone();
            Some(RosterSeasonStat {
                participant,
                wins: roster.settings.wins,
                losses: roster.settings.losses,
                ties: roster.settings.ties,
                points_for: roster.settings.points_for(),
                points_against: roster.settings.points_against(),
            })
        })
        .collect()
}

/// Roster ids stand in for participants until the identity map is applied
fn bracket_node(node: &SleeperBracketMatch) -> BracketMatchNode {
    BracketMatchNode {
        round: node.r,
        explicit_placement: node.p,
        winner: node.w.map(|roster| roster.to_string().into()),
        loser: node.l.map(|roster| roster.to_string().into()),
    }
}

fn score_rows(payload: &SeasonPayload, owners: &RosterOwners) -> Vec<ScoreRow> {
    let playoff_start = payload.league.settings.playoff_week_start;
    let mut rows = Vec::new();

    for (&week, matchups) in &payload.matchups {
        let is_playoff = playoff_start.is_some_and(|start| start > 0 && week >= start);

        let mut games: BTreeMap<u32, Vec<&SleeperMatchup>> = BTreeMap::new();
        for matchup in matchups {
            if let Some(matchup_id) = matchup.matchup_id {
                games.entry(matchup_id).or_default().push(matchup);
            }
        }

        for (matchup_id, sides) in games {
            let [home, away] = sides.as_slice() else {
                debug!("Week {week} matchup {matchup_id} has {} rosters, skipping", sides.len());
                continue;
            };
            let (Some(home_id), Some(away_id)) =
                (owners.get(home.roster_id), owners.get(away.roster_id))
            else {
                warn!("Week {week} matchup {matchup_id} references an unknown roster");
                continue;
            };
            let (Some(home_points), Some(away_points)) = (home.points, away.points) else {
                debug!("Week {week} matchup {matchup_id} has no score yet, skipping");
                continue;
            };

            let placement_type = if is_playoff {
                playoff_label(payload, home.roster_id, away.roster_id, week, playoff_start)
            } else {
                None
            };

            for (team, opponent, score) in
                [(home_id, away_id, home_points), (away_id, home_id, away_points)]
            {
                rows.push(ScoreRow {
                    week,
                    team: team.clone(),
                    opponent: opponent.clone(),
                    score,
                    is_playoff,
                    placement_type: placement_type.clone(),
                });
            }
        }
    }
    rows
}

/// Label for a playoff game, taken from the bracket match the two rosters played
fn playoff_label(
    payload: &SeasonPayload,
    a: u32,
    b: u32,
    week: u32,
    playoff_start: Option<u32>,
) -> Option<String> {
    let round = playoff_start.map(|start| week + 1 - start)?;
    let find = |bracket: &[SleeperBracketMatch]| {
        bracket.iter().find(|node| node.r == round && node.is_between(a, b)).cloned()
    };

    if let Some(node) = find(&payload.winners_bracket) {
        return Some(match node.p {
            Some(1) => "Championship".to_string(),
            Some(p) => format!("{} Place Game", ordinal(p)),
            None => format!("Playoff Round {}", node.r),
        });
    }
    find(&payload.losers_bracket).map(|node| match node.p {
        Some(1) => "Consolation Final".to_string(),
        _ => "Consolation".to_string(),
    })
}
