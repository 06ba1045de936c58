//! Normalized Player Profiles
//!
//! `build` turns a raw [`PlayerSeasonStats`] into a [`NormalizedStatLine`]
//! on the reference era's scale. Lines are immutable and cached per
//! (player, season, reference era) for the life of one matchup.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::stats::arsenal::{
    default_arsenal, normalize_usage, ArsenalEntry, PitchType, PitchUsage, DEFAULT_FASTBALL_VELOCITY,
};
use crate::stats::era::{Degradation, EraNormalizer, StatCategory};
use crate::stats::player::{Capabilities, Capability, Hand, MetricRange, PlayerId, PlayerSeasonStats};

/// Season every statistic is rescaled onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceEra(pub u16);

impl ReferenceEra {
    /// Season number.
    #[inline]
    pub fn season(self) -> u16 {
        self.0
    }
}

// =============================================================================
// PROFILES
// =============================================================================

/// Season slash line, kept raw for lineup construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlashLine {
    /// Batting average
    pub avg: f64,
    /// On-base percentage
    pub obp: f64,
    /// Slugging percentage
    pub slg: f64,
}

impl SlashLine {
    /// On-base plus slugging.
    pub fn ops(&self) -> f64 {
        self.obp + self.slg
    }
}

/// Era-normalized batting profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatterProfile {
    /// Strikeouts per plate appearance
    pub strikeout_rate: f64,
    /// Walks per plate appearance
    pub walk_rate: f64,
    /// Hit-by-pitches per plate appearance
    pub hit_by_pitch_rate: f64,
    /// Average on balls in play
    pub babip: f64,
    /// Slugging minus average
    pub isolated_power: f64,
    /// Home runs per plate appearance
    pub home_run_rate: f64,
    /// Exit velocity tendency (mph)
    pub launch_speed: MetricRange,
    /// Launch angle tendency (degrees)
    pub launch_angle: MetricRange,
    /// Raw season slash line
    pub slash: SlashLine,
}

impl BatterProfile {
    /// Bat-to-ball skill: one minus strikeout rate.
    #[inline]
    pub fn contact(&self) -> f64 {
        1.0 - self.strikeout_rate
    }

    /// Plate discipline: walk rate.
    #[inline]
    pub fn discipline(&self) -> f64 {
        self.walk_rate
    }

    /// Raw power: isolated power.
    #[inline]
    pub fn power(&self) -> f64 {
        self.isolated_power
    }
}

/// Era-normalized pitching profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitcherProfile {
    /// Strikeouts per batter faced
    pub strikeout_rate: f64,
    /// Walks per batter faced
    pub walk_rate: f64,
    /// Hits per batter faced
    pub hit_rate: f64,
    /// Home runs per batter faced
    pub home_run_rate: f64,
    /// Usage sums to 1.
    pub arsenal: Vec<ArsenalEntry>,
}

impl PitcherProfile {
    /// Arsenal entry for a pitch type.
    pub fn pitch(&self, pitch_type: PitchType) -> Option<&ArsenalEntry> {
        self.arsenal.iter().find(|e| e.pitch_type == pitch_type)
    }
}

/// A player's season rescaled to a reference era.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatLine {
    /// Player id
    pub player: PlayerId,
    /// Display name
    pub name: String,
    /// Season the statistics come from
    pub season: u16,
    /// Era they were scaled to
    pub reference_era: ReferenceEra,
    /// Batting side
    pub bats: Hand,
    /// Throwing arm
    pub throws: Hand,
    /// What the player may do
    pub capabilities: Capabilities,
    /// Present when the player can bat
    pub batting: Option<BatterProfile>,
    /// Present when the player can pitch
    pub pitching: Option<PitcherProfile>,
    /// Reduced-accuracy conditions met while building.
    pub degradations: BTreeSet<Degradation>,
}

impl NormalizedStatLine {
    /// Built with reduced accuracy.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

// =============================================================================
// BUILD
// =============================================================================

/// Normalize every tracked statistic of one player season.
pub fn build(
    stats: &PlayerSeasonStats,
    era: ReferenceEra,
    normalizer: &EraNormalizer,
) -> NormalizedStatLine {
    let mut notes = BTreeSet::new();
    let source = stats.season;
    let target = era.season();

    let batting = match (&stats.batting, stats.can(Capability::CanBat)) {
        (Some(line), true) => {
            let n = Some(line.plate_appearances);
            let mut scale = |raw: f64, category| normalizer.scale(raw, category, source, target, n, &mut notes);
            Some(BatterProfile {
                strikeout_rate: scale(line.strikeout_rate(), StatCategory::StrikeoutRate),
                walk_rate: scale(line.walk_rate(), StatCategory::WalkRate),
                hit_by_pitch_rate: scale(line.hit_by_pitch_rate(), StatCategory::HitByPitchRate),
                babip: scale(line.babip(), StatCategory::Babip),
                isolated_power: scale(line.isolated_power(), StatCategory::IsolatedPower),
                home_run_rate: scale(line.home_run_rate(), StatCategory::HomeRunRate),
                launch_speed: line.launch_speed,
                launch_angle: line.launch_angle,
                slash: SlashLine {
                    avg: line.avg(),
                    obp: line.obp(),
                    slg: line.slg(),
                },
            })
        }
        _ => None,
    };

    let pitching = match (&stats.pitching, stats.can(Capability::CanPitch)) {
        (Some(line), true) => {
            let n = Some(line.batters_faced);
            let mut arsenal = build_arsenal(&line.arsenal, source, target, normalizer, &mut notes);
            normalize_usage(&mut arsenal);

            let mut scale = |raw: f64, category| normalizer.scale(raw, category, source, target, n, &mut notes);
            Some(PitcherProfile {
                strikeout_rate: scale(line.strikeout_rate(), StatCategory::PitcherStrikeoutRate),
                walk_rate: scale(line.walk_rate(), StatCategory::PitcherWalkRate),
                hit_rate: scale(line.hit_rate(), StatCategory::PitcherHitRate),
                home_run_rate: scale(line.home_run_rate(), StatCategory::PitcherHomeRunRate),
                arsenal,
            })
        }
        _ => None,
    };

    if !notes.is_empty() {
        warn!(
            player = %stats.id,
            name = %stats.name,
            season = source,
            degradations = notes.len(),
            "Normalized with reduced accuracy"
        );
    }

    NormalizedStatLine {
        player: stats.id,
        name: stats.name.clone(),
        season: source,
        reference_era: era,
        bats: stats.bats,
        throws: stats.throws,
        capabilities: stats.capabilities,
        batting,
        pitching,
        degradations: notes,
    }
}

fn build_arsenal(
    usage: &[PitchUsage],
    source: u16,
    target: u16,
    normalizer: &EraNormalizer,
    notes: &mut BTreeSet<Degradation>,
) -> Vec<ArsenalEntry> {
    let fallback;
    let usage = if usage.is_empty() {
        let league_velocity = normalizer
            .table()
            .nearest(StatCategory::PitchVelocity, source)
            .map_or(DEFAULT_FASTBALL_VELOCITY, |avg| avg.value);
        fallback = default_arsenal(league_velocity);
        &fallback[..]
    } else {
        usage
    };

    usage
        .iter()
        .map(|pitch| {
            let velocity_mean =
                normalizer.scale(pitch.velocity, StatCategory::PitchVelocity, source, target, None, notes);
            let movement = normalizer.scale(
                pitch.movement.unwrap_or_else(|| pitch.pitch_type.default_movement()),
                StatCategory::PitchMovement,
                source,
                target,
                None,
                notes,
            );
            ArsenalEntry {
                pitch_type: pitch.pitch_type,
                usage: pitch.usage,
                velocity_mean,
                velocity_sd: pitch
                    .velocity_sd
                    .filter(|sd| sd.is_finite() && *sd > 0.0)
                    .unwrap_or_else(|| pitch.pitch_type.default_velocity_sd()),
                movement,
            }
        })
        .collect()
}

// =============================================================================
// CACHE
// =============================================================================

/// Cache key for a normalized line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileKey {
    /// Player
    pub player: PlayerId,
    /// Source season
    pub season: u16,
    /// Target era
    pub reference_era: ReferenceEra,
}

/// Normalized lines built for one matchup.
///
/// Each key is built at most once; later requests share the same `Arc`.
#[derive(Clone, Debug, Default)]
pub struct ProfileCache {
    lines: BTreeMap<ProfileKey, Arc<NormalizedStatLine>>,
    builds: u32,
}

impl ProfileCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached line, building it on first request.
    pub fn get_or_build(
        &mut self,
        stats: &PlayerSeasonStats,
        era: ReferenceEra,
        normalizer: &EraNormalizer,
    ) -> Arc<NormalizedStatLine> {
        let key = ProfileKey {
            player: stats.id,
            season: stats.season,
            reference_era: era,
        };
        if let Some(line) = self.lines.get(&key) {
            return Arc::clone(line);
        }

        self.builds += 1;
        let line = Arc::new(build(stats, era, normalizer));
        self.lines.insert(key, Arc::clone(&line));
        line
    }

    /// Cached line, without building.
    pub fn get(&self, key: &ProfileKey) -> Option<&Arc<NormalizedStatLine>> {
        self.lines.get(key)
    }

    /// Whether a line is cached.
    pub fn contains(&self, key: &ProfileKey) -> bool {
        self.lines.contains_key(key)
    }

    /// Number of distinct lines held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Nothing cached.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// How many times `build` has run.
    pub fn builds(&self) -> u32 {
        self.builds
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::era::{LeagueTable, NormalizerConfig};
    use crate::stats::player::{BattingLine, PitchingLine};

    fn normalizer() -> EraNormalizer {
        let mut table = LeagueTable::new();
        for (season, k, bb, velo) in [(1968u16, 0.158, 0.080, 89.0), (2019, 0.230, 0.085, 93.4)] {
            table.insert(StatCategory::StrikeoutRate, season, k);
            table.insert(StatCategory::WalkRate, season, bb);
            table.insert(StatCategory::HitByPitchRate, season, 0.008 + (season - 1968) as f64 * 0.0001);
            table.insert(StatCategory::Babip, season, 0.290);
            table.insert(StatCategory::IsolatedPower, season, 0.110 + (season - 1968) as f64 * 0.001);
            table.insert(StatCategory::HomeRunRate, season, 0.020 + (season - 1968) as f64 * 0.0002);
            table.insert(StatCategory::PitcherStrikeoutRate, season, k);
            table.insert(StatCategory::PitcherWalkRate, season, bb);
            table.insert(StatCategory::PitcherHitRate, season, 0.220);
            table.insert(StatCategory::PitcherHomeRunRate, season, 0.020);
            table.insert(StatCategory::PitchVelocity, season, velo);
            table.insert(StatCategory::PitchMovement, season, 10.0);
        }
        EraNormalizer::new(table, NormalizerConfig::default())
    }

    fn hurler(arsenal: Vec<PitchUsage>) -> PlayerSeasonStats {
        PlayerSeasonStats {
            id: PlayerId(7),
            name: "Walt Brennan".to_string(),
            season: 1968,
            bats: Hand::Right,
            throws: Hand::Right,
            capabilities: Capabilities::of(&[Capability::CanPitch]),
            batting: None,
            pitching: Some(PitchingLine {
                batters_faced: 1100,
                outs_recorded: 800,
                hits: 220,
                walks: 60,
                strikeouts: 190,
                home_runs: 14,
                arsenal,
            }),
        }
    }

    fn two_way() -> PlayerSeasonStats {
        let mut stats = hurler(Vec::new());
        stats.capabilities = Capabilities::of(&[Capability::CanBat, Capability::CanPitch]);
        stats.batting = Some(BattingLine {
            plate_appearances: 500,
            at_bats: 450,
            hits: 120,
            doubles: 20,
            triples: 2,
            home_runs: 25,
            walks: 40,
            strikeouts: 110,
            hit_by_pitch: 5,
            sac_flies: 5,
            ..Default::default()
        });
        stats
    }

    #[test]
    fn test_two_way_player_gets_both_profiles() {
        let line = build(&two_way(), ReferenceEra(2019), &normalizer());
        assert!(line.batting.is_some());
        assert!(line.pitching.is_some());
        assert!(!line.is_degraded());
    }

    #[test]
    fn test_capability_gates_profile() {
        let mut stats = two_way();
        stats.capabilities = Capabilities::of(&[Capability::CanPitch]);
        let line = build(&stats, ReferenceEra(2019), &normalizer());
        assert!(line.batting.is_none());
    }

    #[test]
    fn test_strikeouts_scale_up_into_modern_era() {
        let line = build(&two_way(), ReferenceEra(2019), &normalizer());
        let batting = line.batting.unwrap();
        let raw = 110.0 / 500.0;
        assert!((batting.strikeout_rate - raw * 0.230 / 0.158).abs() < 1e-9);
        assert!((batting.contact() - (1.0 - batting.strikeout_rate)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_arsenal_uses_default_mix() {
        let line = build(&hurler(Vec::new()), ReferenceEra(2019), &normalizer());
        let arsenal = &line.pitching.unwrap().arsenal;
        let types: Vec<_> = arsenal.iter().map(|e| e.pitch_type).collect();
        assert_eq!(types, [PitchType::FourSeam, PitchType::Slider, PitchType::Changeup]);
        assert!((arsenal[0].usage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_arsenal_velocity_scaled_and_usage_normalized() {
        let arsenal = vec![
            PitchUsage::new(PitchType::FourSeam, 62.0, 89.0),
            PitchUsage::new(PitchType::Curveball, 30.0, 76.0),
            PitchUsage::new(PitchType::Changeup, 8.0, 80.0),
        ];
        let line = build(&hurler(arsenal), ReferenceEra(2019), &normalizer());
        let pitching = line.pitching.unwrap();

        let total: f64 = pitching.arsenal.iter().map(|e| e.usage).sum();
        assert!((total - 1.0).abs() < 1e-12);

        let fastball = pitching.pitch(PitchType::FourSeam).unwrap();
        assert!((fastball.velocity_mean - 93.4).abs() < 1e-9);
        let curve = pitching.pitch(PitchType::Curveball).unwrap();
        assert!(curve.velocity_mean > 76.0);
    }

    #[test]
    fn test_small_sample_is_degraded() {
        let mut stats = two_way();
        if let Some(batting) = stats.batting.as_mut() {
            batting.plate_appearances = 40;
        }
        let line = build(&stats, ReferenceEra(2019), &normalizer());
        assert!(line.is_degraded());
        assert!(line
            .degradations
            .iter()
            .any(|d| matches!(d, Degradation::InsufficientSample { sample: 40, .. })));
    }

    #[test]
    fn test_cache_builds_once_per_key() {
        let normalizer = normalizer();
        let stats = two_way();
        let mut cache = ProfileCache::new();

        let a = cache.get_or_build(&stats, ReferenceEra(2019), &normalizer);
        let b = cache.get_or_build(&stats, ReferenceEra(2019), &normalizer);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.builds(), 1);

        cache.get_or_build(&stats, ReferenceEra(1968), &normalizer);
        assert_eq!(cache.builds(), 2);
        assert_eq!(cache.len(), 2);
    }
}
