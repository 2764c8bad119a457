//! # Standings Engine
//!
//! Turns the raw primitives of a fantasy league season (roster records, weekly
//! score rows, winners and losers bracket trees) into a fully ranked standings
//! table, and indexes every recorded matchup across seasons and leagues so that
//! any two participants' shared history resolves in constant time.
//!
//! Every component is a pure transformation over fully materialized input.
//! Recoverable data problems never abort a computation; they are collected as
//! [`EngineWarning`]s next to the best-effort result in an [`Outcome`].

pub mod bracket;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod head_to_head;
pub mod normalizer;
pub mod season;
pub mod standings;
pub mod types;



pub use bracket::{invert_consolation_placement, resolve_placements, BracketResolver, IdentityMap};
pub use cache::{CacheStats, MatchupCache};
pub use config::EngineConfig;
pub use diagnostics::{EngineWarning, Outcome};
pub use error::{Result, StandingsError};
pub use head_to_head::{CareerRecord, HeadToHeadIndex, HeadToHeadStats, MatchKey, TaggedMatch};
pub use normalizer::{normalize_rows, normalize_week};
pub use season::{build_history, compute_season, compute_seasons, SeasonInput, SeasonReport};
pub use standings::{aggregate_standings, StandingsAggregator};
pub use types::*;

/// Current version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default time-to-live for a cached head-to-head index (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Longest accepted cache time-to-live (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;
