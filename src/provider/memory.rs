//! In-Memory Provider
//!
//! A [`StatsProvider`] over a [`Dataset`] held in memory. Datasets are plain
//! JSON; the bundled sample league is compiled into the binary.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use tracing::info;

use super::{ProviderError, StatsProvider};
use crate::game::matchup::TeamRoster;
use crate::game::park::ParkProfile;
use crate::stats::era::StatCategory;
use crate::stats::player::{PlayerId, PlayerSeasonStats};

const SAMPLE_LEAGUE: &str = include_str!("../../data/sample_league.json");

/// Park dimensions valid over a span of seasons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkRecord {
    /// Dimensions and environment
    #[serde(flatten)]
    pub profile: ParkProfile,
    /// First season these dimensions apply; open-ended when absent.
    #[serde(default)]
    pub first_season: Option<u16>,
    /// Last season the record applies to; `None` means still current
    #[serde(default)]
    pub last_season: Option<u16>,
}

impl ParkRecord {
    fn covers(&self, season: u16) -> bool {
        self.first_season.map_or(true, |first| season >= first)
            && self.last_season.map_or(true, |last| season <= last)
    }
}

/// League averages for one season.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueAverageRecord {
    /// Season
    pub season: u16,
    /// Average per category
    pub averages: BTreeMap<StatCategory, f64>,
}

/// Serialized form of a historical data snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    /// Player seasons
    pub players: Vec<PlayerSeasonStats>,
    /// Team rosters
    pub rosters: Vec<TeamRoster>,
    /// Parks, one record per configuration
    pub parks: Vec<ParkRecord>,
    /// League averages by season
    pub league_averages: Vec<LeagueAverageRecord>,
}

/// Provider answering from an indexed [`Dataset`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    players: BTreeMap<(PlayerId, u16), PlayerSeasonStats>,
    rosters: BTreeMap<(String, u16), TeamRoster>,
    parks: BTreeMap<String, Vec<ParkRecord>>,
    averages: BTreeMap<(StatCategory, u16), f64>,
}

impl InMemoryProvider {
    /// Index a dataset. Later duplicates replace earlier ones.
    pub fn new(dataset: Dataset) -> Self {
        let mut provider = Self::default();
        for player in dataset.players {
            provider.players.insert((player.id, player.season), player);
        }
        for roster in dataset.rosters {
            provider.rosters.insert((roster.team.clone(), roster.season), roster);
        }
        for park in dataset.parks {
            provider.parks.entry(park.profile.name.clone()).or_default().push(park);
        }
        for season in dataset.league_averages {
            for (category, value) in season.averages {
                provider.averages.insert((category, season.season), value);
            }
        }
        provider
    }

    /// Load a dataset from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ProviderError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Ok(Self::new(dataset))
    }

    /// Load a dataset from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let provider = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            players = provider.players.len(),
            rosters = provider.rosters.len(),
            "Loaded dataset"
        );
        Ok(provider)
    }

    /// The bundled two-team sample league.
    pub fn sample() -> Result<Self, ProviderError> {
        Self::from_json_str(SAMPLE_LEAGUE)
    }

    /// Teams available, as (name, season).
    pub fn teams(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.rosters.keys().map(|(team, season)| (team.as_str(), *season))
    }

    /// Park names available.
    pub fn park_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parks.keys().map(String::as_str)
    }
}

impl StatsProvider for InMemoryProvider {
    fn player_season_stats(&self, player: PlayerId, season: u16) -> Result<PlayerSeasonStats, ProviderError> {
        self.players
            .get(&(player, season))
            .cloned()
            .ok_or_else(|| ProviderError::not_found("player", format!("{player} in {season}")))
    }

    fn team_roster(&self, team: &str, season: u16) -> Result<TeamRoster, ProviderError> {
        self.rosters
            .get(&(team.to_string(), season))
            .cloned()
            .ok_or_else(|| ProviderError::not_found("roster", format!("{team} {season}")))
    }

    fn park_profile(&self, park: &str, season: u16) -> Result<ParkProfile, ProviderError> {
        self.parks
            .get(park)
            .and_then(|records| {
                records
                    .iter()
                    .filter(|r| r.covers(season))
                    // Most recent renovation that covers the season
                    .max_by_key(|r| r.first_season.unwrap_or(0))
            })
            .map(|r| r.profile.clone())
            .ok_or_else(|| ProviderError::not_found("park", format!("{park} in {season}")))
    }

    fn league_average(&self, category: StatCategory, season: u16) -> Result<f64, ProviderError> {
        self.averages
            .get(&(category, season))
            .copied()
            .ok_or_else(|| ProviderError::not_found("league average", format!("{category:?} {season}")))
    }
}

// =============================================================================
// TESTS
// =============================================================================
