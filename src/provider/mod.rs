//! External Collaborators
//!
//! Seams to the outside world. The simulation reads historical data through
//! [`StatsProvider`] and optionally hands finished games to a
//! [`narrative::NarrativeGenerator`]. Everything a provider returns is treated
//! as an immutable snapshot for one run.

pub mod memory;
pub mod narrative;

pub use memory::{Dataset, InMemoryProvider, LeagueAverageRecord, ParkRecord};
pub use narrative::{narrate, NarrativeError, NarrativeGenerator, RecapNarrator};

use thiserror::Error;

use crate::game::matchup::TeamRoster;
use crate::game::park::ParkProfile;
use crate::stats::era::StatCategory;
use crate::stats::player::{PlayerId, PlayerSeasonStats};

/// Errors from a stats provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested record does not exist.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of record ("player", "roster", "park", "league average")
        kind: &'static str,
        /// Lookup key as text
        key: String,
    },

    /// Backing data is malformed.
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backing data could not be read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Missing `kind` identified by `key`.
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        ProviderError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Source of historical statistics.
///
/// Implementations must be deterministic: the same question always gets the
/// same answer during a run.
pub trait StatsProvider: Send + Sync {
    /// One player's raw line for a season.
    fn player_season_stats(&self, player: PlayerId, season: u16) -> Result<PlayerSeasonStats, ProviderError>;

    /// A team's lineup and pitching staff for a season.
    fn team_roster(&self, team: &str, season: u16) -> Result<TeamRoster, ProviderError>;

    /// Park dimensions as of a season.
    fn park_profile(&self, park: &str, season: u16) -> Result<ParkProfile, ProviderError>;

    /// League-wide average for one category in one season.
    fn league_average(&self, category: StatCategory, season: u16) -> Result<f64, ProviderError>;
}
