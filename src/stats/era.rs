//! Era Normalization
//!
//! Rescales a raw season statistic onto a reference season's scale:
//!
//! ```text
//! normalized = clamp(raw × reference_average / source_average)
//! ```
//!
//! League averages come from a [`LeagueTable`] snapshot. When a season has no
//! average the nearest season with data is used instead, and small samples
//! are regressed toward the league average first. Both cases are recorded as
//! [`Degradation`] flags rather than errors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::provider::StatsProvider;

// =============================================================================
// STAT CATEGORY
// =============================================================================

/// Whose sample size governs a category's reliability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    /// Plate appearances
    Batting,
    /// Batters faced
    Pitching,
}

/// Every statistic the normalizer rescales.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    /// Batter strikeouts per plate appearance
    StrikeoutRate,
    /// Batter walks per plate appearance
    WalkRate,
    /// Batter hit-by-pitches per plate appearance
    HitByPitchRate,
    /// Batting average on balls in play
    Babip,
    /// Slugging minus batting average
    IsolatedPower,
    /// Batter home runs per plate appearance
    HomeRunRate,
    /// Pitcher strikeouts per batter faced
    PitcherStrikeoutRate,
    /// Pitcher walks per batter faced
    PitcherWalkRate,
    /// Pitcher hits allowed per batter faced
    PitcherHitRate,
    /// Pitcher home runs allowed per batter faced
    PitcherHomeRunRate,
    /// Mean pitch velocity (mph)
    PitchVelocity,
    /// Mean total break (inches)
    PitchMovement,
}

impl StatCategory {
    /// All categories in declaration order.
    pub const ALL: [StatCategory; 12] = [
        StatCategory::StrikeoutRate,
        StatCategory::WalkRate,
        StatCategory::HitByPitchRate,
        StatCategory::Babip,
        StatCategory::IsolatedPower,
        StatCategory::HomeRunRate,
        StatCategory::PitcherStrikeoutRate,
        StatCategory::PitcherWalkRate,
        StatCategory::PitcherHitRate,
        StatCategory::PitcherHomeRunRate,
        StatCategory::PitchVelocity,
        StatCategory::PitchMovement,
    ];

    /// Plausible range a normalized value is clamped into.
    pub fn plausible_range(self) -> (f64, f64) {
        match self {
            StatCategory::StrikeoutRate => (0.03, 0.45),
            StatCategory::WalkRate => (0.01, 0.25),
            StatCategory::HitByPitchRate => (0.0, 0.05),
            StatCategory::Babip => (0.20, 0.40),
            StatCategory::IsolatedPower => (0.0, 0.40),
            StatCategory::HomeRunRate => (0.0, 0.10),
            StatCategory::PitcherStrikeoutRate => (0.05, 0.45),
            StatCategory::PitcherWalkRate => (0.02, 0.20),
            StatCategory::PitcherHitRate => (0.10, 0.35),
            StatCategory::PitcherHomeRunRate => (0.0, 0.07),
            StatCategory::PitchVelocity => (60.0, 105.0),
            StatCategory::PitchMovement => (0.0, 25.0),
        }
    }

    /// Clamp a value into the plausible range.
    #[inline]
    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.plausible_range();
        value.clamp(lo, hi)
    }

    /// Sample that governs regression, if any.
    pub fn sample_kind(self) -> Option<SampleKind> {
        match self {
            StatCategory::StrikeoutRate
            | StatCategory::WalkRate
            | StatCategory::HitByPitchRate
            | StatCategory::Babip
            | StatCategory::IsolatedPower
            | StatCategory::HomeRunRate => Some(SampleKind::Batting),
            StatCategory::PitcherStrikeoutRate
            | StatCategory::PitcherWalkRate
            | StatCategory::PitcherHitRate
            | StatCategory::PitcherHomeRunRate => Some(SampleKind::Pitching),
            StatCategory::PitchVelocity | StatCategory::PitchMovement => None,
        }
    }
}

// =============================================================================
// PURE NORMALIZATION
// =============================================================================

/// Errors from [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NormalizeError {
    /// Source-season average was zero or not a number.
    #[error("source league average for {category:?} is zero or undefined")]
    ZeroSourceAverage {
        /// Category being normalized
        category: StatCategory,
    },

    /// Raw value or reference average was not finite.
    #[error("non-finite input for {category:?}")]
    NonFinite {
        /// Category being normalized
        category: StatCategory,
    },
}

/// Rescale `raw` from its source season onto the reference season.
pub fn normalize(
    raw: f64,
    category: StatCategory,
    source_average: f64,
    reference_average: f64,
) -> Result<f64, NormalizeError> {
    if source_average == 0.0 || !source_average.is_finite() {
        return Err(NormalizeError::ZeroSourceAverage { category });
    }
    if !raw.is_finite() || !reference_average.is_finite() {
        return Err(NormalizeError::NonFinite { category });
    }
    Ok(category.clamp(raw * reference_average / source_average))
}

/// Shrink a small-sample rate toward the league average.
///
/// `(raw·n + average·k) / (n + k)` where `k` is the regression weight.
pub fn regress_toward(raw: f64, sample: u32, average: f64, weight: f64) -> f64 {
    let n = sample as f64;
    let k = weight.max(0.0);
    if n + k <= 0.0 {
        return raw;
    }
    (raw * n + average * k) / (n + k)
}

// =============================================================================
// LEAGUE TABLE
// =============================================================================

/// A league average and the season it actually came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonAverage {
    /// Season the value comes from
    pub season: u16,
    /// League average
    pub value: f64,
}

/// Immutable snapshot of league averages for one simulation.
#[derive(Clone, Debug, Default)]
pub struct LeagueTable {
    averages: BTreeMap<(StatCategory, u16), f64>,
}

impl LeagueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an average. Zero and non-finite values are ignored since they
    /// cannot serve as a divisor.
    pub fn insert(&mut self, category: StatCategory, season: u16, value: f64) -> bool {
        if value == 0.0 || !value.is_finite() {
            return false;
        }
        self.averages.insert((category, season), value);
        true
    }

    /// Load the averages needed for the given seasons.
    ///
    /// For each season and category the exact season is tried first, then
    /// seasons at increasing distance up to `radius`, earlier before later.
    /// Missing data is not an error here; it surfaces as a degradation when
    /// the value is used.
    pub fn load<P>(provider: &P, seasons: &[u16], radius: u16) -> Self
    where
        P: StatsProvider + ?Sized,
    {
        let mut table = Self::new();
        for &season in seasons {
            for category in StatCategory::ALL {
                if table.exact(category, season).is_some() {
                    continue;
                }
                let candidates = std::iter::once(season).chain((1..=radius).flat_map(|d| {
                    [season.checked_sub(d), season.checked_add(d)].into_iter().flatten()
                }));
                for year in candidates {
                    if let Ok(value) = provider.league_average(category, year) {
                        if table.insert(category, year, value) {
                            break;
                        }
                    }
                }
            }
        }
        debug!(seasons = ?seasons, entries = table.len(), "Loaded league averages");
        table
    }

    /// Average for exactly this season.
    pub fn exact(&self, category: StatCategory, season: u16) -> Option<f64> {
        self.averages.get(&(category, season)).copied()
    }

    /// Average for the closest season with data. Ties go to the earlier
    /// season.
    pub fn nearest(&self, category: StatCategory, season: u16) -> Option<SeasonAverage> {
        self.averages
            .range((category, u16::MIN)..=(category, u16::MAX))
            .map(|(&(_, year), &value)| SeasonAverage { season: year, value })
            // range iterates ascending, so min_by_key keeps the earlier year on ties
            .min_by_key(|avg| avg.season.abs_diff(season))
    }

    /// Number of stored averages.
    pub fn len(&self) -> usize {
        self.averages.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

// =============================================================================
// NORMALIZER
// =============================================================================

/// Thresholds and search limits for normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Plate appearances below which batting rates are regressed.
    pub min_plate_appearances: u32,
    /// Batters faced below which pitching rates are regressed.
    pub min_batters_faced: u32,
    /// Regression weight `k`, in plate appearances or batters faced.
    pub regression_weight: f64,
    /// How many seasons away to search for a missing league average.
    pub fallback_radius: u16,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_plate_appearances: 100,
            min_batters_faced: 100,
            regression_weight: 200.0,
            fallback_radius: 25,
        }
    }
}

/// Reduced-accuracy condition noted while building a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Degradation {
    /// League average came from a different season.
    FallbackSeason {
        category: StatCategory,
        requested: u16,
        used: u16,
    },
    /// No league average anywhere in range; raw value was only clamped.
    MissingAverage {
        category: StatCategory,
        season: u16,
    },
    /// Sample too small; rates were regressed toward the league average.
    InsufficientSample {
        kind: SampleKind,
        sample: u32,
        threshold: u32,
    },
}

/// Applies [`normalize`] with league lookup, fallback and regression.
#[derive(Clone, Debug)]
pub struct EraNormalizer {
    table: LeagueTable,
    config: NormalizerConfig,
}

impl EraNormalizer {
    /// Normalizer over `table`.
    pub fn new(table: LeagueTable, config: NormalizerConfig) -> Self {
        Self { table, config }
    }

    /// League averages in use.
    pub fn table(&self) -> &LeagueTable {
        &self.table
    }

    /// Thresholds in use.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn threshold(&self, kind: SampleKind) -> u32 {
        match kind {
            SampleKind::Batting => self.config.min_plate_appearances,
            SampleKind::Pitching => self.config.min_batters_faced,
        }
    }

    fn lookup(
        &self,
        category: StatCategory,
        season: u16,
        notes: &mut BTreeSet<Degradation>,
    ) -> Option<SeasonAverage> {
        match self.table.nearest(category, season) {
            Some(avg) => {
                if avg.season != season {
                    notes.insert(Degradation::FallbackSeason {
                        category,
                        requested: season,
                        used: avg.season,
                    });
                }
                Some(avg)
            }
            None => {
                notes.insert(Degradation::MissingAverage { category, season });
                None
            }
        }
    }

    /// Rescale one statistic from `source_season` to `reference_season`.
    ///
    /// `sample` is the plate appearances or batters faced behind `raw`;
    /// pass `None` for categories that are not sample-dependent. Any
    /// degraded condition is added to `notes`.
    pub fn scale(
        &self,
        raw: f64,
        category: StatCategory,
        source_season: u16,
        reference_season: u16,
        sample: Option<u32>,
        notes: &mut BTreeSet<Degradation>,
    ) -> f64 {
        let raw = if raw.is_finite() { raw } else { 0.0 };

        let Some(source) = self.lookup(category, source_season, notes) else {
            return category.clamp(raw);
        };
        let Some(reference) = self.lookup(category, reference_season, notes) else {
            return category.clamp(raw);
        };

        let raw = match (category.sample_kind(), sample) {
            (Some(kind), Some(n)) if n < self.threshold(kind) => {
                notes.insert(Degradation::InsufficientSample {
                    kind,
                    sample: n,
                    threshold: self.threshold(kind),
                });
                regress_toward(raw, n, source.value, self.config.regression_weight)
            }
            _ => raw,
        };

        normalize(raw, category, source.value, reference.value)
            .unwrap_or_else(|_| category.clamp(raw))
    }
}

// =============================================================================
// TESTS
// =============================================================================
