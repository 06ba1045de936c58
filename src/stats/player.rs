//! Raw Player Season Records
//!
//! What the stats provider hands us for one player in one season. These are
//! raw counting totals; nothing here is era-adjusted.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::stats::arsenal::PitchUsage;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Player identifier as assigned by the stats provider.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create from a raw id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// HANDEDNESS
// =============================================================================

/// Batting or throwing hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Hand {
    /// Left-handed
    Left,
    /// Right-handed
    #[default]
    Right,
    /// Switch hitter (batting only)
    Switch,
}

impl Hand {
    /// Side of the plate a batter with this hand stands on against a pitcher.
    ///
    /// Switch hitters bat opposite the pitcher's throwing arm.
    pub fn batting_side_against(self, pitcher_throws: Hand) -> Hand {
        match self {
            Hand::Switch => match pitcher_throws {
                Hand::Left => Hand::Right,
                _ => Hand::Left,
            },
            side => side,
        }
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Something a player can do on the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Capability {
    /// Takes a turn in the batting order
    CanBat = 0,
    /// Can be used as a pitcher
    CanPitch = 1,
    /// Plays a defensive position
    CanField = 2,
}

impl Capability {
    const ALL: [Capability; 3] = [Capability::CanBat, Capability::CanPitch, Capability::CanField];

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of capabilities. A two-way player holds both `CanBat` and `CanPitch`.
///
/// Serialized as a list, e.g. `["CanBat", "CanField"]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Capabilities = Capabilities(0);

    /// Build a set from a list.
    pub fn of(caps: &[Capability]) -> Self {
        caps.iter().fold(Self::NONE, |set, &cap| set.with(cap))
    }

    /// Return the set with one more capability.
    #[inline]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Check membership.
    #[inline]
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Iterate members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |&cap| self.contains(cap))
    }
}

impl From<Vec<Capability>> for Capabilities {
    fn from(caps: Vec<Capability>) -> Self {
        Self::of(&caps)
    }
}

impl From<Capabilities> for Vec<Capability> {
    fn from(caps: Capabilities) -> Self {
        caps.iter().collect()
    }
}

// =============================================================================
// BATTED BALL TENDENCIES
// =============================================================================

/// Observed mean and bounds of a batted-ball metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    /// Season average
    pub avg: f64,
    /// Lowest observed value
    pub min: f64,
    /// Highest observed value
    pub max: f64,
}

impl MetricRange {
    /// Create a range.
    pub const fn new(avg: f64, min: f64, max: f64) -> Self {
        Self { avg, min, max }
    }

    /// League-typical exit velocity (mph).
    pub const fn default_launch_speed() -> Self {
        Self::new(88.0, 60.0, 115.0)
    }

    /// League-typical launch angle (degrees).
    pub const fn default_launch_angle() -> Self {
        Self::new(12.0, -30.0, 50.0)
    }
}

fn default_launch_speed() -> MetricRange {
    MetricRange::default_launch_speed()
}

fn default_launch_angle() -> MetricRange {
    MetricRange::default_launch_angle()
}

// =============================================================================
// SEASON LINES
// =============================================================================

/// Season batting totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattingLine {
    /// Plate appearances
    pub plate_appearances: u32,
    /// Official at-bats
    pub at_bats: u32,
    /// Hits
    pub hits: u32,
    /// Doubles
    pub doubles: u32,
    /// Triples
    pub triples: u32,
    /// Home runs
    pub home_runs: u32,
    /// Walks
    pub walks: u32,
    /// Strikeouts
    pub strikeouts: u32,
    /// Times hit by a pitch
    pub hit_by_pitch: u32,
    /// Sacrifice flies
    pub sac_flies: u32,
    /// Exit velocity tendency; older seasons use the league default.
    #[serde(default = "default_launch_speed")]
    pub launch_speed: MetricRange,
    /// Launch angle tendency; older seasons use the league default.
    #[serde(default = "default_launch_angle")]
    pub launch_angle: MetricRange,
}

impl Default for BattingLine {
    fn default() -> Self {
        Self {
            plate_appearances: 0,
            at_bats: 0,
            hits: 0,
            doubles: 0,
            triples: 0,
            home_runs: 0,
            walks: 0,
            strikeouts: 0,
            hit_by_pitch: 0,
            sac_flies: 0,
            launch_speed: MetricRange::default_launch_speed(),
            launch_angle: MetricRange::default_launch_angle(),
        }
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl BattingLine {
    /// Hits that were not extra-base hits.
    pub fn singles(&self) -> u32 {
        self.hits
            .saturating_sub(self.doubles + self.triples + self.home_runs)
    }

    /// Singles + 2·doubles + 3·triples + 4·home runs.
    pub fn total_bases(&self) -> u32 {
        self.singles() + 2 * self.doubles + 3 * self.triples + 4 * self.home_runs
    }

    /// Batting average; zero without an at-bat.
    pub fn avg(&self) -> f64 {
        ratio(self.hits, self.at_bats)
    }

    /// On-base percentage.
    pub fn obp(&self) -> f64 {
        ratio(
            self.hits + self.walks + self.hit_by_pitch,
            self.at_bats + self.walks + self.hit_by_pitch + self.sac_flies,
        )
    }

    /// Slugging percentage.
    pub fn slg(&self) -> f64 {
        ratio(self.total_bases(), self.at_bats)
    }

    /// On-base plus slugging.
    pub fn ops(&self) -> f64 {
        self.obp() + self.slg()
    }

    /// Strikeouts per plate appearance.
    pub fn strikeout_rate(&self) -> f64 {
        ratio(self.strikeouts, self.plate_appearances)
    }

    /// Walks per plate appearance.
    pub fn walk_rate(&self) -> f64 {
        ratio(self.walks, self.plate_appearances)
    }

    /// Hit-by-pitches per plate appearance.
    pub fn hit_by_pitch_rate(&self) -> f64 {
        ratio(self.hit_by_pitch, self.plate_appearances)
    }

    /// Home runs per plate appearance.
    pub fn home_run_rate(&self) -> f64 {
        ratio(self.home_runs, self.plate_appearances)
    }

    /// Slugging minus average.
    pub fn isolated_power(&self) -> f64 {
        ratio(self.total_bases().saturating_sub(self.hits), self.at_bats)
    }

    /// Batting average on balls in play.
    pub fn babip(&self) -> f64 {
        let in_play = (self.at_bats + self.sac_flies)
            .saturating_sub(self.strikeouts + self.home_runs);
        ratio(self.hits.saturating_sub(self.home_runs), in_play)
    }
}

/// Season pitching totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchingLine {
    /// Batters faced
    pub batters_faced: u32,
    /// Outs recorded
    pub outs_recorded: u32,
    /// Hits allowed
    pub hits: u32,
    /// Walks allowed
    pub walks: u32,
    /// Strikeouts
    pub strikeouts: u32,
    /// Home runs allowed
    pub home_runs: u32,
    /// Per-pitch-type usage. Empty means unknown.
    pub arsenal: Vec<PitchUsage>,
}

impl PitchingLine {
    /// Strikeouts per batter faced.
    pub fn strikeout_rate(&self) -> f64 {
        ratio(self.strikeouts, self.batters_faced)
    }

    /// Walks per batter faced.
    pub fn walk_rate(&self) -> f64 {
        ratio(self.walks, self.batters_faced)
    }

    /// Hits per batter faced.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.batters_faced)
    }

    /// Home runs per batter faced.
    pub fn home_run_rate(&self) -> f64 {
        ratio(self.home_runs, self.batters_faced)
    }
}

// =============================================================================
// PLAYER SEASON
// =============================================================================

/// One player's raw record for one season.
///
/// Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    /// Player id
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Season
    pub season: u16,
    /// Batting side
    #[serde(default)]
    pub bats: Hand,
    /// Throwing arm
    #[serde(default)]
    pub throws: Hand,
    /// What the player may do
    pub capabilities: Capabilities,
    /// Batting record, if they batted
    #[serde(default)]
    pub batting: Option<BattingLine>,
    /// Pitching record, if they pitched
    #[serde(default)]
    pub pitching: Option<PitchingLine>,
}

impl PlayerSeasonStats {
    /// Check a capability.
    #[inline]
    pub fn can(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Plate appearances behind the batting line, if any.
    pub fn batting_sample(&self) -> u32 {
        self.batting.as_ref().map_or(0, |b| b.plate_appearances)
    }

    /// Batters faced behind the pitching line, if any.
    pub fn pitching_sample(&self) -> u32 {
        self.pitching.as_ref().map_or(0, |p| p.batters_faced)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn slugger() -> BattingLine {
        BattingLine {
            plate_appearances: 650,
            at_bats: 560,
            hits: 168,
            doubles: 30,
            triples: 4,
            home_runs: 35,
            walks: 75,
            strikeouts: 120,
            hit_by_pitch: 10,
            sac_flies: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_slash_line() {
        let line = slugger();
        assert_eq!(line.singles(), 99);
        assert_eq!(line.total_bases(), 99 + 60 + 12 + 140);
        assert!((line.avg() - 0.300).abs() < 1e-9);
        assert!((line.obp() - 253.0 / 650.0).abs() < 1e-9);
        assert!((line.slg() - 311.0 / 560.0).abs() < 1e-9);
        assert!((line.ops() - (line.obp() + line.slg())).abs() < 1e-12);
        assert!((line.babip() - 133.0 / 410.0).abs() < 1e-9);
        assert!((line.isolated_power() - 143.0 / 560.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_line_rates_are_zero() {
        let line = BattingLine::default();
        assert_eq!(line.avg(), 0.0);
        assert_eq!(line.babip(), 0.0);
        assert_eq!(line.strikeout_rate(), 0.0);
        assert_eq!(PitchingLine::default().walk_rate(), 0.0);
    }

    #[test]
    fn test_capabilities() {
        let two_way = Capabilities::of(&[Capability::CanBat, Capability::CanPitch]);
        assert!(two_way.contains(Capability::CanBat));
        assert!(two_way.contains(Capability::CanPitch));
        assert!(!two_way.contains(Capability::CanField));
        assert_eq!(two_way.iter().count(), 2);
        assert!(!Capabilities::NONE.contains(Capability::CanBat));
    }

    #[test]
    fn test_capabilities_serialize_as_list() {
        let caps = Capabilities::of(&[Capability::CanField, Capability::CanBat]);
        let json = serde_json::to_string(&caps).unwrap();
        assert_eq!(json, r#"["CanBat","CanField"]"#);
        let back: Capabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(back, caps);
    }

    #[test]
    fn test_switch_hitter_bats_opposite() {
        assert_eq!(Hand::Switch.batting_side_against(Hand::Right), Hand::Left);
        assert_eq!(Hand::Switch.batting_side_against(Hand::Left), Hand::Right);
        assert_eq!(Hand::Left.batting_side_against(Hand::Left), Hand::Left);
    }

    #[test]
    fn test_missing_launch_data_uses_defaults() {
        let line: BattingLine = serde_json::from_str(r#"{ "plate_appearances": 10 }"#).unwrap();
        assert_eq!(line.launch_speed, MetricRange::default_launch_speed());
        assert_eq!(line.launch_angle, MetricRange::default_launch_angle());
    }
}
