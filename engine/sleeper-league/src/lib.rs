//! # Sleeper League Adapter
//!
//! Converts already-fetched Sleeper league payloads (league, rosters, weekly
//! matchups and both playoff brackets) into
//! [`standings_engine::SeasonInput`]s, and runs a whole league history through
//! the engine. Fetching is left to the caller.

pub mod convert;
pub mod error;
pub mod payload;


pub use convert::{season_input, RosterOwners};
pub use error::{Result, SleeperError};
pub use payload::{SeasonPayload, SleeperBracketMatch, SleeperLeague, SleeperMatchup, SleeperRoster};

use standings_engine::{
    build_history, compute_seasons, EngineConfig, HeadToHeadIndex, Outcome, SeasonReport,
};
use tracing::info;

/// Every season of a league plus the head-to-head index over all of them
#[derive(Debug)]
pub struct LeagueHistory {
    /// Oldest season first
    pub seasons: Vec<SeasonReport>,
    pub head_to_head: Outcome<HeadToHeadIndex>,
}

/// Run every fetched season through the engine
///
/// Payloads may arrive in any order; seasons are computed oldest first.
pub fn load_history(payloads: &[SeasonPayload], config: &EngineConfig) -> Result<LeagueHistory> {
    let mut inputs = payloads.iter().map(season_input).collect::<Result<Vec<_>>>()?;
    inputs.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.league.cmp(&b.league)));

    let seasons = compute_seasons(&inputs, config)?;
    let head_to_head = build_history(&seasons);
    info!(
        "Loaded league history: {} seasons, {} matches",
        seasons.len(),
        head_to_head.value.len()
    );

    Ok(LeagueHistory { seasons, head_to_head })
}
