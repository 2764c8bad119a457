use standings_engine::StandingsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SleeperError>;

#[derive(Error, Debug)]
pub enum SleeperError {
    #[error("League {league_id} has a non-numeric season: {season}")]
    InvalidSeason { league_id: String, season: String },

    #[error("Roster {roster_id} appears more than once")]
    DuplicateRoster { roster_id: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] StandingsError),
}
