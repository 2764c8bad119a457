//! Configuration for the standings engine

use crate::error::{Result, StandingsError};
use crate::{DEFAULT_CACHE_TTL_SECS, MAX_CACHE_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the standings engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bracket resolution configuration
    #[serde(default)]
    pub bracket: BracketConfig,

    /// Standings aggregation configuration
    #[serde(default)]
    pub standings: StandingsConfig,

    /// Head-to-head cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Season fan-out configuration
    #[serde(default)]
    pub parallelism: ParallelismConfig,
}

/// Order in which unplaced bracket participants receive fallback placements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackOrder {
    /// First appearance in the node list, winner before loser within a node
    #[default]
    FirstAppearance,
    /// Participant identifier ascending
    ParticipantId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketConfig {
    #[serde(default)]
    pub fallback_order: FallbackOrder,
}

/// Which weeks count toward a participant's high and low game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreScope {
    #[default]
    RegularSeason,
    AllWeeks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsConfig {
    #[serde(default)]
    pub high_low_scope: ScoreScope,
}

/// When a cached head-to-head index must be rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StalenessPolicy {
    /// Valid for `ttl_seconds` after it was built
    #[default]
    Ttl,
    /// Valid until the caller presents a different corpus version
    CorpusVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub staleness: StalenessPolicy,

    /// Lifetime of a cached index under the `Ttl` policy
    pub ttl_seconds: u64,
}

/// Season fan-out settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelismConfig {
    /// Compute independent seasons concurrently
    pub enabled: bool,

    /// Upper bound on worker threads (0 is rejected, use `enabled = false` instead)
    pub max_threads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { staleness: StalenessPolicy::Ttl, ttl_seconds: DEFAULT_CACHE_TTL_SECS }
    }
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self { enabled: true, max_threads: 4 }
    }
}

impl CacheConfig {
    /// Get TTL as Duration, if the policy is time based
    pub fn ttl(&self) -> Option<Duration> {
        match self.staleness {
            StalenessPolicy::Ttl => Some(Duration::from_secs(self.ttl_seconds)),
            StalenessPolicy::CorpusVersion => None,
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.cache.staleness == StalenessPolicy::Ttl && self.cache.ttl_seconds == 0 {
            return Err(StandingsError::Config("cache TTL must be greater than zero".to_string()));
        }
        if self.cache.ttl_seconds > MAX_CACHE_TTL_SECS {
            return Err(StandingsError::Config(format!(
                "cache TTL must not exceed {MAX_CACHE_TTL_SECS} seconds"
            )));
        }
        if self.parallelism.max_threads == 0 {
            return Err(StandingsError::Config(
                "parallelism.max_threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
