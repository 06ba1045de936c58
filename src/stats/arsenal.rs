//! Pitch Types and Arsenals
//!
//! A pitcher's arsenal is the list of pitch types he throws with how often
//! and how hard. Raw usage comes from the provider as [`PitchUsage`]; the
//! profile builder turns it into era-scaled [`ArsenalEntry`] values whose
//! usage sums to exactly 1.

use serde::{Serialize, Deserialize};

/// Fastball velocity assumed when a pitcher has no arsenal data at all.
pub const DEFAULT_FASTBALL_VELOCITY: f64 = 92.0;

// =============================================================================
// PITCH TYPE
// =============================================================================

/// Broad family a pitch type belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PitchCategory {
    /// Four-seam, two-seam, sinker, cutter
    Fastball,
    /// Slider, sweeper, curveball, knuckle-curve
    Breaking,
    /// Changeup, splitter, knuckleball
    Offspeed,
}

/// Pitch type, serialized by its standard two-letter code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PitchType {
    #[serde(rename = "FF")]
    FourSeam,
    #[serde(rename = "FT")]
    TwoSeam,
    #[serde(rename = "SI")]
    Sinker,
    #[serde(rename = "FC")]
    Cutter,
    #[serde(rename = "SL")]
    Slider,
    #[serde(rename = "ST")]
    Sweeper,
    #[serde(rename = "CU")]
    Curveball,
    #[serde(rename = "KC")]
    KnuckleCurve,
    #[serde(rename = "CH")]
    Changeup,
    #[serde(rename = "FS", alias = "SF")]
    Splitter,
    #[serde(rename = "KN")]
    Knuckleball,
}

impl PitchType {
    /// Standard two-letter code.
    pub fn code(self) -> &'static str {
        match self {
            PitchType::FourSeam => "FF",
            PitchType::TwoSeam => "FT",
            PitchType::Sinker => "SI",
            PitchType::Cutter => "FC",
            PitchType::Slider => "SL",
            PitchType::Sweeper => "ST",
            PitchType::Curveball => "CU",
            PitchType::KnuckleCurve => "KC",
            PitchType::Changeup => "CH",
            PitchType::Splitter => "FS",
            PitchType::Knuckleball => "KN",
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            PitchType::FourSeam => "four-seam fastball",
            PitchType::TwoSeam => "two-seam fastball",
            PitchType::Sinker => "sinker",
            PitchType::Cutter => "cutter",
            PitchType::Slider => "slider",
            PitchType::Sweeper => "sweeper",
            PitchType::Curveball => "curveball",
            PitchType::KnuckleCurve => "knuckle-curve",
            PitchType::Changeup => "changeup",
            PitchType::Splitter => "splitter",
            PitchType::Knuckleball => "knuckleball",
        }
    }

    /// Fastball, breaking or off-speed.
    pub fn category(self) -> PitchCategory {
        match self {
            PitchType::FourSeam | PitchType::TwoSeam | PitchType::Sinker | PitchType::Cutter => {
                PitchCategory::Fastball
            }
            PitchType::Slider | PitchType::Sweeper | PitchType::Curveball | PitchType::KnuckleCurve => {
                PitchCategory::Breaking
            }
            PitchType::Changeup | PitchType::Splitter | PitchType::Knuckleball => {
                PitchCategory::Offspeed
            }
        }
    }

    /// Typical speed relative to the same pitcher's four-seamer (mph).
    pub fn speed_offset(self) -> f64 {
        match self {
            PitchType::FourSeam => 0.0,
            PitchType::TwoSeam => -0.5,
            PitchType::Sinker => -1.0,
            PitchType::Cutter => -4.0,
            PitchType::Slider => -8.0,
            PitchType::Sweeper => -10.0,
            PitchType::Curveball => -13.0,
            PitchType::KnuckleCurve => -12.0,
            PitchType::Changeup => -9.0,
            PitchType::Splitter => -8.0,
            PitchType::Knuckleball => -17.0,
        }
    }

    /// Typical pitch-to-pitch velocity spread (mph, one standard deviation).
    pub fn default_velocity_sd(self) -> f64 {
        match self.category() {
            PitchCategory::Fastball => 1.1,
            PitchCategory::Breaking => 1.5,
            PitchCategory::Offspeed => 1.4,
        }
    }

    /// Typical total break (inches).
    pub fn default_movement(self) -> f64 {
        match self {
            PitchType::FourSeam => 8.0,
            PitchType::TwoSeam => 14.0,
            PitchType::Sinker => 15.0,
            PitchType::Cutter => 6.0,
            PitchType::Slider => 8.0,
            PitchType::Sweeper => 15.0,
            PitchType::Curveball => 14.0,
            PitchType::KnuckleCurve => 13.0,
            PitchType::Changeup => 14.0,
            PitchType::Splitter => 10.0,
            PitchType::Knuckleball => 12.0,
        }
    }

    /// Plate location scatter around the target (feet).
    pub fn location_spread(self) -> f64 {
        match self.category() {
            PitchCategory::Fastball => 0.50,
            PitchCategory::Breaking => 0.60,
            PitchCategory::Offspeed => 0.58,
        }
    }
}

// =============================================================================
// USAGE
// =============================================================================

/// Raw per-pitch-type usage as reported for a season.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitchUsage {
    /// Pitch thrown
    pub pitch_type: PitchType,
    /// Share of pitches thrown; any positive scale (percent or fraction).
    pub usage: f64,
    /// Mean velocity (mph)
    pub velocity: f64,
    /// Pitch-to-pitch velocity spread; type default when missing
    #[serde(default)]
    pub velocity_sd: Option<f64>,
    /// Total break (inches)
    #[serde(default)]
    pub movement: Option<f64>,
}

impl PitchUsage {
    /// Usage entry with type-typical spread and movement.
    pub fn new(pitch_type: PitchType, usage: f64, velocity: f64) -> Self {
        Self {
            pitch_type,
            usage,
            velocity,
            velocity_sd: None,
            movement: None,
        }
    }
}

/// Fastball/slider/changeup mix used when a pitcher has no arsenal data.
pub fn default_arsenal(fastball_velocity: f64) -> Vec<PitchUsage> {
    [
        (PitchType::FourSeam, 50.0),
        (PitchType::Slider, 25.0),
        (PitchType::Changeup, 25.0),
    ]
    .into_iter()
    .map(|(pitch_type, usage)| {
        PitchUsage::new(pitch_type, usage, fastball_velocity + pitch_type.speed_offset())
    })
    .collect()
}

/// Era-scaled arsenal entry used by the pitch sequencer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArsenalEntry {
    /// Pitch thrown
    pub pitch_type: PitchType,
    /// Selection weight, in [0, 1]
    pub usage: f64,
    /// Mean velocity (mph)
    pub velocity_mean: f64,
    /// Velocity spread (mph)
    pub velocity_sd: f64,
    /// Mean total break (inches)
    pub movement: f64,
}

/// Rescale usage so the arsenal sums to 1.
///
/// Negative and non-finite shares count as zero. If nothing positive is
/// left, every pitch gets an equal share.
pub fn normalize_usage(entries: &mut [ArsenalEntry]) {
    if entries.is_empty() {
        return;
    }

    for entry in entries.iter_mut() {
        if !entry.usage.is_finite() || entry.usage < 0.0 {
            entry.usage = 0.0;
        }
    }

    let total: f64 = entries.iter().map(|e| e.usage).sum();
    if total > 0.0 {
        for entry in entries.iter_mut() {
            entry.usage /= total;
        }
    } else {
        let share = 1.0 / entries.len() as f64;
        for entry in entries.iter_mut() {
            entry.usage = share;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(pitch_type: PitchType, usage: f64) -> ArsenalEntry {
        ArsenalEntry {
            pitch_type,
            usage,
            velocity_mean: 90.0,
            velocity_sd: 1.0,
            movement: 10.0,
        }
    }

    #[test]
    fn test_default_arsenal() {
        let arsenal = default_arsenal(92.0);
        let codes: Vec<_> = arsenal.iter().map(|p| p.pitch_type.code()).collect();
        assert_eq!(codes, ["FF", "SL", "CH"]);
        assert_eq!(arsenal[1].velocity, 84.0);
        assert_eq!(arsenal[2].velocity, 83.0);
    }

    #[test]
    fn test_codes_round_trip() {
        let json = serde_json::to_string(&PitchType::KnuckleCurve).unwrap();
        assert_eq!(json, r#""KC""#);
        let split: PitchType = serde_json::from_str(r#""SF""#).unwrap();
        assert_eq!(split, PitchType::Splitter);
    }

    #[test]
    fn test_categories() {
        assert_eq!(PitchType::Sinker.category(), PitchCategory::Fastball);
        assert_eq!(PitchType::Sweeper.category(), PitchCategory::Breaking);
        assert_eq!(PitchType::Splitter.category(), PitchCategory::Offspeed);
    }

    #[test]
    fn test_zero_usage_becomes_equal_shares() {
        let mut arsenal = vec![entry(PitchType::FourSeam, 0.0), entry(PitchType::Curveball, -2.0)];
        normalize_usage(&mut arsenal);
        assert_eq!(arsenal[0].usage, 0.5);
        assert_eq!(arsenal[1].usage, 0.5);
    }

    proptest! {
        #[test]
        fn prop_usage_sums_to_one(shares in prop::collection::vec(-10.0f64..100.0, 1..8)) {
            let mut arsenal: Vec<_> = shares
                .iter()
                .map(|&s| entry(PitchType::Slider, s))
                .collect();
            normalize_usage(&mut arsenal);

            let total: f64 = arsenal.iter().map(|e| e.usage).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            prop_assert!(arsenal.iter().all(|e| (0.0..=1.0).contains(&e.usage)));
        }
    }
}
