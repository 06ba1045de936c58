//! Matchup Context
//!
//! Everything fixed for the length of one game: the park, both teams'
//! batting orders and starting pitchers, and the normalized profiles of
//! every player involved. Built once before the first pitch from provider
//! data; any missing data fails here, before a game exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{LineupStrategy, SimConfig};
use crate::core::hash::{HashDomain, StateHasher};
use crate::error::SimError;
use crate::game::events::{Participant, TeamSheet};
use crate::game::lineup::{optimize_lineup, LINEUP_SIZE};
use crate::game::outcome::LeagueBaseline;
use crate::game::park::ParkProfile;
use crate::game::state::TeamSide;
use crate::provider::StatsProvider;
use crate::sim::SimulationRequest;
use crate::stats::era::{EraNormalizer, LeagueTable};
use crate::stats::player::{Capability, PlayerId, PlayerSeasonStats};
use crate::stats::profile::{BatterProfile, NormalizedStatLine, PitcherProfile, ProfileCache, ReferenceEra};

/// First season of professional league play.
pub const FIRST_SEASON: u16 = 1871;

/// A team's players for a season, as the provider lists them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    /// Team name
    pub team: String,
    /// Season
    pub season: u16,
    /// Batters in the provider's preferred order
    pub lineup: Vec<PlayerId>,
    /// Pitching staff, starter first
    pub pitchers: Vec<PlayerId>,
}

// =============================================================================
// TEAM CONTEXT
// =============================================================================

/// One team as it takes the field.
#[derive(Clone, Debug)]
pub struct TeamContext {
    /// Home or away
    pub side: TeamSide,
    /// Team name
    pub name: String,
    /// Season the roster comes from
    pub season: u16,
    /// Batting order, exactly nine
    pub lineup: Vec<PlayerId>,
    /// Normalized line of the starting pitcher
    pub starter: Arc<NormalizedStatLine>,
    starter_profile: PitcherProfile,
    batters: BTreeMap<PlayerId, Arc<NormalizedStatLine>>,
}

impl TeamContext {
    /// Normalized batting profile of a player in the order.
    pub fn batter(&self, player: PlayerId) -> Option<&BatterProfile> {
        self.batters.get(&player).and_then(|line| line.batting.as_ref())
    }

    /// Full normalized line of a player in the order.
    pub fn batter_line(&self, player: PlayerId) -> Option<&Arc<NormalizedStatLine>> {
        self.batters.get(&player)
    }

    /// The starting pitcher's profile.
    pub fn pitcher(&self) -> &PitcherProfile {
        &self.starter_profile
    }

    /// Header as written into the event log.
    pub fn sheet(&self) -> TeamSheet {
        TeamSheet {
            name: self.name.clone(),
            season: self.season,
            batters: self
                .lineup
                .iter()
                .map(|id| Participant {
                    id: *id,
                    name: self.batters.get(id).map_or_else(|| id.to_string(), |l| l.name.clone()),
                })
                .collect(),
            starter: Participant {
                id: self.starter.player,
                name: self.starter.name.clone(),
            },
        }
    }
}

// =============================================================================
// MATCHUP CONTEXT
// =============================================================================

/// Immutable inputs for one game.
#[derive(Clone, Debug)]
pub struct MatchupContext {
    /// Derived from the seed and teams, never random
    pub game_id: Uuid,
    /// Seed for the game's random draws
    pub seed: u64,
    /// Era every statistic is scaled to
    pub reference_era: ReferenceEra,
    /// Ballpark
    pub park: ParkProfile,
    /// Visiting team
    pub away: TeamContext,
    /// Home team
    pub home: TeamContext,
    /// League rates of the reference era
    pub baseline: LeagueBaseline,
    normalizer: EraNormalizer,
    cache: ProfileCache,
}

impl MatchupContext {
    /// Load and normalize everything a game needs.
    pub fn build<P>(provider: &P, request: &SimulationRequest, config: &SimConfig) -> Result<Self, SimError>
    where
        P: StatsProvider + ?Sized,
    {
        for season in [request.away_season, request.home_season, request.reference_era.season()] {
            validate_season(season)?;
        }

        let away_roster = provider.team_roster(&request.away_team, request.away_season)?;
        let home_roster = provider.team_roster(&request.home_team, request.home_season)?;
        let park = provider.park_profile(&request.park, request.home_season)?;
        park.validate().map_err(SimError::DataUnavailable)?;

        let seasons = [request.away_season, request.home_season, request.reference_era.season()];
        let table = LeagueTable::load(provider, &seasons, config.normalizer.fallback_radius);
        if table.is_empty() {
            return Err(SimError::DataUnavailable(format!(
                "no league averages within {} seasons of {:?}",
                config.normalizer.fallback_radius, seasons
            )));
        }
        let baseline = LeagueBaseline::from_table(&table, request.reference_era.season());
        let normalizer = EraNormalizer::new(table, config.normalizer.clone());

        let mut cache = ProfileCache::new();
        let strategy = config.rules.lineup_strategy;
        let era = request.reference_era;
        let away = build_team(provider, TeamSide::Away, &away_roster, era, strategy, &normalizer, &mut cache)?;
        let home = build_team(provider, TeamSide::Home, &home_roster, era, strategy, &normalizer, &mut cache)?;

        let game_id = derive_game_id(request);
        info!(
            game_id = %game_id,
            away = %away.name,
            away_season = away.season,
            home = %home.name,
            home_season = home.season,
            park = %park.name,
            reference_era = era.season(),
            "Matchup ready"
        );

        Ok(Self {
            game_id,
            seed: request.seed,
            reference_era: era,
            park,
            away,
            home,
            baseline,
            normalizer,
            cache,
        })
    }

    /// One team by side.
    pub fn team(&self, side: TeamSide) -> &TeamContext {
        match side {
            TeamSide::Away => &self.away,
            TeamSide::Home => &self.home,
        }
    }

    /// Normalizer built for this matchup.
    pub fn normalizer(&self) -> &EraNormalizer {
        &self.normalizer
    }

    /// Profiles built for this matchup.
    pub fn profiles(&self) -> &ProfileCache {
        &self.cache
    }
}

fn validate_season(season: u16) -> Result<(), SimError> {
    let current = Utc::now().year();
    if season < FIRST_SEASON || i32::from(season) > current {
        return Err(SimError::DataUnavailable(format!(
            "season {season} is outside {FIRST_SEASON}..={current}"
        )));
    }
    Ok(())
}

fn derive_game_id(request: &SimulationRequest) -> Uuid {
    let mut hasher = StateHasher::new(HashDomain::GameId);
    hasher
        .put(&request.seed)
        .put(&request.away_team)
        .put(&request.away_season)
        .put(&request.home_team)
        .put(&request.home_season)
        .put(&request.park)
        .put(&request.reference_era.season());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    Uuid::from_bytes(bytes)
}

fn build_team<P>(
    provider: &P,
    side: TeamSide,
    roster: &TeamRoster,
    era: ReferenceEra,
    strategy: LineupStrategy,
    normalizer: &EraNormalizer,
    cache: &mut ProfileCache,
) -> Result<TeamContext, SimError>
where
    P: StatsProvider + ?Sized,
{
    let label = format!("{} {}", roster.team, roster.season);

    let mut eligible: Vec<PlayerSeasonStats> = Vec::with_capacity(roster.lineup.len());
    for &id in &roster.lineup {
        let stats = provider.player_season_stats(id, roster.season)?;
        if stats.can(Capability::CanBat) && stats.batting.is_some() {
            eligible.push(stats);
        } else {
            debug!(team = %label, player = %id, "Skipping player without a batting line");
        }
    }
    if eligible.len() < LINEUP_SIZE {
        return Err(SimError::InvalidRoster(format!(
            "{label} has {} eligible batters, {LINEUP_SIZE} needed",
            eligible.len()
        )));
    }

    let mut batters = BTreeMap::new();
    for stats in &eligible {
        batters.insert(stats.id, cache.get_or_build(stats, era, normalizer));
    }

    let lineup: Vec<PlayerId> = match strategy {
        LineupStrategy::AsListed => eligible.iter().take(LINEUP_SIZE).map(|s| s.id).collect(),
        LineupStrategy::Optimized => {
            let candidates: Vec<_> = eligible
                .iter()
                .filter_map(|s| {
                    let line = batters.get(&s.id)?;
                    Some((s.id, line.batting.as_ref()?.slash))
                })
                .collect();
            optimize_lineup(&candidates)
        }
    };
    batters.retain(|id, _| lineup.contains(id));

    let mut starter = None;
    for &id in &roster.pitchers {
        let stats = provider.player_season_stats(id, roster.season)?;
        if stats.can(Capability::CanPitch) && stats.pitching.is_some() {
            starter = Some(cache.get_or_build(&stats, era, normalizer));
            break;
        }
    }
    let starter = starter.ok_or_else(|| SimError::InvalidRoster(format!("{label} has no eligible pitcher")))?;
    let starter_profile = starter
        .pitching
        .clone()
        .ok_or_else(|| SimError::InvalidRoster(format!("{label}: starter has no pitching profile")))?;

    debug!(team = %label, lineup = ?lineup, starter = %starter.player, "Team set");

    Ok(TeamContext {
        side,
        name: roster.team.clone(),
        season: roster.season,
        lineup,
        starter,
        starter_profile,
        batters,
    })
}

// =============================================================================
// TESTS
// =============================================================================
