//! Pitch Sequencer
//!
//! Picks each pitch's type, velocity and plate location from the pitcher's
//! normalized arsenal. Every draw comes from the supplied RNG, in a fixed
//! order, so the same inputs always produce the same pitch.
//!
//! Plate coordinates are in feet from the catcher's view: `x` is positive
//! toward the first-base side, `z` is height above the ground.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::error::StateViolation;
use crate::game::bases::BaseState;
use crate::stats::arsenal::{PitchCategory, PitchType};
use crate::stats::player::Hand;
use crate::stats::profile::PitcherProfile;

/// Half the plate width plus a ball's radius (feet).
pub const ZONE_HALF_WIDTH: f64 = 0.83;
/// Bottom of the strike zone (feet).
pub const ZONE_BOTTOM: f64 = 1.5;
/// Top of the strike zone (feet).
pub const ZONE_TOP: f64 = 3.5;

const ZONE_CENTER: PlateLocation = PlateLocation { x: 0.0, z: 2.5 };

/// Pitch-to-pitch spread of break, as a share of the pitch's mean.
const MOVEMENT_SD_SHARE: f64 = 0.12;

// =============================================================================
// COUNT
// =============================================================================

/// Balls and strikes within one plate appearance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Count {
    /// Balls, 0 to 3
    pub balls: u8,
    /// Strikes, 0 to 2
    pub strikes: u8,
}

impl Count {
    /// Count with no range check.
    pub const fn new(balls: u8, strikes: u8) -> Self {
        Self { balls, strikes }
    }

    /// Build a count, rejecting anything a live plate appearance can't hold.
    pub fn checked(balls: u8, strikes: u8) -> Result<Self, StateViolation> {
        if balls > 3 || strikes > 2 {
            return Err(StateViolation::InvalidCount { balls, strikes });
        }
        Ok(Self { balls, strikes })
    }

    /// Two strikes on the batter.
    #[inline]
    pub fn two_strikes(self) -> bool {
        self.strikes == 2
    }

    /// More balls than strikes.
    #[inline]
    pub fn pitcher_behind(self) -> bool {
        self.balls > self.strikes
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// Where a pitch crossed the plate relative to the zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneRegion {
    InZone,
    High,
    Low,
    /// Off the plate toward the batter
    Inside,
    /// Off the plate away from the batter
    Outside,
}

/// Point where a pitch crosses the front of the plate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateLocation {
    /// Feet from the middle of the plate, positive toward first base
    pub x: f64,
    /// Feet above the ground
    pub z: f64,
}

impl PlateLocation {
    /// Point at `x`, `z`.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Inside the strike zone.
    #[inline]
    pub fn in_zone(&self) -> bool {
        self.x.abs() <= ZONE_HALF_WIDTH && (ZONE_BOTTOM..=ZONE_TOP).contains(&self.z)
    }

    /// Distance to the nearest edge of the zone; zero inside it.
    pub fn distance_outside_zone(&self) -> f64 {
        let dx = (self.x.abs() - ZONE_HALF_WIDTH).max(0.0);
        let dz = (ZONE_BOTTOM - self.z).max(self.z - ZONE_TOP).max(0.0);
        dx.hypot(dz)
    }

    /// How far past the inside edge the pitch is, toward the batter.
    pub fn inside_depth(&self, batter_side: Hand) -> f64 {
        (self.x * inside_sign(batter_side) - ZONE_HALF_WIDTH).max(0.0)
    }

    /// Classify against the zone for a batter standing on `batter_side`.
    pub fn region(&self, batter_side: Hand) -> ZoneRegion {
        if self.in_zone() {
            return ZoneRegion::InZone;
        }
        let dx = (self.x.abs() - ZONE_HALF_WIDTH).max(0.0);
        let dz = (ZONE_BOTTOM - self.z).max(self.z - ZONE_TOP).max(0.0);
        if dz >= dx {
            if self.z > ZONE_TOP {
                ZoneRegion::High
            } else {
                ZoneRegion::Low
            }
        } else if self.x * inside_sign(batter_side) > 0.0 {
            ZoneRegion::Inside
        } else {
            ZoneRegion::Outside
        }
    }
}

/// Sign of `x` on the batter's side of the plate.
///
/// A right-handed batter stands on the third-base side, negative `x`.
#[inline]
fn inside_sign(batter_side: Hand) -> f64 {
    match batter_side {
        Hand::Left => 1.0,
        _ => -1.0,
    }
}

// =============================================================================
// PITCH
// =============================================================================

/// One thrown pitch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Pitch thrown
    pub pitch_type: PitchType,
    /// Release speed (mph, one decimal)
    pub velocity: f64,
    /// Total break (inches)
    pub movement: f64,
    /// Where it crossed the plate
    pub location: PlateLocation,
    /// Zone region for this batter
    pub region: ZoneRegion,
}

/// Probability the pitcher aims in the zone.
fn zone_intent(walk_rate: f64, count: Count) -> f64 {
    let mut rate = 0.57 - (walk_rate - 0.085) * 1.5;
    if count.balls == 3 {
        rate += 0.12;
    }
    if count.pitcher_behind() {
        rate += 0.05;
    }
    if count.two_strikes() && count.balls < 2 {
        rate -= 0.12;
    }
    rate.clamp(0.25, 0.85)
}

/// Situational multiplier on a pitch type's usage weight.
fn situational_weight(category: PitchCategory, count: Count, runners_on: bool) -> f64 {
    let mut weight = 1.0;
    match category {
        PitchCategory::Fastball => {
            if count.pitcher_behind() {
                weight *= 1.5;
            }
            if runners_on {
                weight *= 1.1;
            }
        }
        PitchCategory::Breaking | PitchCategory::Offspeed => {
            if count.two_strikes() {
                weight *= 1.35;
            }
        }
    }
    weight
}

/// Where a pitcher aims when working off the plate.
fn chase_target(category: PitchCategory, batter_side: Hand, rng: &mut DeterministicRng) -> PlateLocation {
    // High, Low, Inside, Outside
    let weights = match category {
        PitchCategory::Fastball => [0.35, 0.20, 0.20, 0.25],
        PitchCategory::Breaking => [0.05, 0.50, 0.15, 0.30],
        PitchCategory::Offspeed => [0.05, 0.55, 0.10, 0.30],
    };
    let side = inside_sign(batter_side);
    match rng.weighted_index(&weights) {
        Some(0) => PlateLocation::new(0.0, 3.9),
        Some(2) => PlateLocation::new(1.25 * side, 2.5),
        Some(3) => PlateLocation::new(-1.25 * side, 2.5),
        _ => PlateLocation::new(0.0, 1.05),
    }
}

/// Draw the next pitch.
///
/// Returns `None` only when the pitcher has an empty arsenal.
pub fn next_pitch(
    pitcher: &PitcherProfile,
    count: Count,
    batter_side: Hand,
    bases: &BaseState,
    rng: &mut DeterministicRng,
) -> Option<Pitch> {
    let runners_on = !bases.is_empty();
    let weights: Vec<f64> = pitcher
        .arsenal
        .iter()
        .map(|e| e.usage * situational_weight(e.pitch_type.category(), count, runners_on))
        .collect();
    let entry = &pitcher.arsenal[rng.weighted_index(&weights)?];
    let category = entry.pitch_type.category();

    let sd = entry.velocity_sd.max(0.0);
    let velocity = rng.next_normal_clamped(
        entry.velocity_mean,
        sd,
        entry.velocity_mean - 3.0 * sd,
        entry.velocity_mean + 3.0 * sd,
    );
    let velocity = (velocity * 10.0).round() / 10.0;

    let mean_break = entry.movement.max(0.0);
    let movement_sd = mean_break * MOVEMENT_SD_SHARE;
    let movement = rng.next_normal_clamped(
        mean_break,
        movement_sd,
        mean_break - 3.0 * movement_sd,
        mean_break + 3.0 * movement_sd,
    );

    let target = if rng.next_bool(zone_intent(pitcher.walk_rate, count)) {
        ZONE_CENTER
    } else {
        chase_target(category, batter_side, rng)
    };

    // Wilder pitchers scatter more
    let spread = entry.pitch_type.location_spread() * (1.0 + (pitcher.walk_rate - 0.085) * 3.0).clamp(0.8, 1.3);
    let location = PlateLocation::new(
        rng.next_normal(target.x, spread),
        rng.next_normal(target.z, spread).max(0.0),
    );

    Some(Pitch {
        pitch_type: entry.pitch_type,
        velocity,
        movement,
        location,
        region: location.region(batter_side),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::arsenal::ArsenalEntry;
    use crate::stats::player::PlayerId;
    use crate::game::bases::Base;

    fn pitcher() -> PitcherProfile {
        PitcherProfile {
            strikeout_rate: 0.22,
            walk_rate: 0.08,
            hit_rate: 0.22,
            home_run_rate: 0.03,
            arsenal: vec![
                ArsenalEntry {
                    pitch_type: PitchType::FourSeam,
                    usage: 0.5,
                    velocity_mean: 94.0,
                    velocity_sd: 1.1,
                    movement: 8.0,
                },
                ArsenalEntry {
                    pitch_type: PitchType::Slider,
                    usage: 0.3,
                    velocity_mean: 86.0,
                    velocity_sd: 1.5,
                    movement: 8.0,
                },
                ArsenalEntry {
                    pitch_type: PitchType::Changeup,
                    usage: 0.2,
                    velocity_mean: 85.0,
                    velocity_sd: 1.4,
                    movement: 14.0,
                },
            ],
        }
    }

    fn fastball_share(count: Count, bases: &BaseState, seed: u64) -> f64 {
        let p = pitcher();
        let mut rng = DeterministicRng::new(seed);
        let n = 4000;
        let fastballs = (0..n)
            .filter_map(|_| next_pitch(&p, count, Hand::Right, bases, &mut rng))
            .filter(|pitch| pitch.pitch_type == PitchType::FourSeam)
            .count();
        fastballs as f64 / n as f64
    }

    #[test]
    fn test_same_seed_same_pitches() {
        let p = pitcher();
        let bases = BaseState::empty();
        let mut a = DeterministicRng::new(99);
        let mut b = DeterministicRng::new(99);
        for _ in 0..200 {
            let x = next_pitch(&p, Count::new(1, 1), Hand::Left, &bases, &mut a);
            let y = next_pitch(&p, Count::new(1, 1), Hand::Left, &bases, &mut b);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_two_strikes_favors_breaking_stuff() {
        let empty = BaseState::empty();
        let neutral = fastball_share(Count::new(0, 0), &empty, 5);
        let two_strikes = fastball_share(Count::new(0, 2), &empty, 5);
        assert!(two_strikes < neutral - 0.03, "{two_strikes} vs {neutral}");
    }

    #[test]
    fn test_behind_favors_fastball() {
        let empty = BaseState::empty();
        let neutral = fastball_share(Count::new(0, 0), &empty, 6);
        let behind = fastball_share(Count::new(3, 1), &empty, 6);
        assert!(behind > neutral + 0.05, "{behind} vs {neutral}");
    }

    #[test]
    fn test_runners_on_nudge_fastball() {
        let mut bases = BaseState::empty();
        bases.place(Base::First, PlayerId(3)).unwrap();
        let empty = fastball_share(Count::new(1, 1), &BaseState::empty(), 8);
        let on = fastball_share(Count::new(1, 1), &bases, 8);
        assert!(on > empty);
    }

    #[test]
    fn test_velocity_stays_near_mean() {
        let p = pitcher();
        let mut rng = DeterministicRng::new(11);
        for _ in 0..1000 {
            let pitch = next_pitch(&p, Count::default(), Hand::Right, &BaseState::empty(), &mut rng).unwrap();
            let entry = p.pitch(pitch.pitch_type).unwrap();
            assert!((pitch.velocity - entry.velocity_mean).abs() <= 3.0 * entry.velocity_sd + 0.05);
            assert_eq!(pitch.region, pitch.location.region(Hand::Right));
        }
    }

    #[test]
    fn test_movement_varies_around_mean() {
        let p = pitcher();
        let mut rng = DeterministicRng::new(13);
        let changeups: Vec<f64> = (0..3000)
            .filter_map(|_| next_pitch(&p, Count::default(), Hand::Right, &BaseState::empty(), &mut rng))
            .filter(|pitch| pitch.pitch_type == PitchType::Changeup)
            .map(|pitch| pitch.movement)
            .collect();

        assert!(changeups.len() > 200);
        let mean = changeups.iter().sum::<f64>() / changeups.len() as f64;
        assert!((mean - 14.0).abs() < 0.3, "mean break {mean}");
        assert!(changeups.iter().all(|m| (m - 14.0).abs() <= 3.0 * 14.0 * MOVEMENT_SD_SHARE + 1e-9));
        assert!(changeups.iter().any(|m| (m - 14.0).abs() > 0.5));
    }

    #[test]
    fn test_zone_rate_is_realistic() {
        let p = pitcher();
        let mut rng = DeterministicRng::new(21);
        let n = 5000;
        let in_zone = (0..n)
            .filter_map(|_| next_pitch(&p, Count::new(1, 1), Hand::Right, &BaseState::empty(), &mut rng))
            .filter(|pitch| pitch.region == ZoneRegion::InZone)
            .count() as f64
            / n as f64;
        assert!((0.35..0.65).contains(&in_zone), "zone rate {in_zone}");
    }

    #[test]
    fn test_empty_arsenal_gives_none() {
        let mut p = pitcher();
        p.arsenal.clear();
        let mut rng = DeterministicRng::new(1);
        assert!(next_pitch(&p, Count::default(), Hand::Right, &BaseState::empty(), &mut rng).is_none());
    }

    #[test]
    fn test_region_classification() {
        assert_eq!(PlateLocation::new(0.0, 2.5).region(Hand::Right), ZoneRegion::InZone);
        assert_eq!(PlateLocation::new(0.1, 4.2).region(Hand::Right), ZoneRegion::High);
        assert_eq!(PlateLocation::new(0.1, 0.9).region(Hand::Left), ZoneRegion::Low);
        // Third-base side is inside for a right-handed batter
        assert_eq!(PlateLocation::new(-1.3, 2.5).region(Hand::Right), ZoneRegion::Inside);
        assert_eq!(PlateLocation::new(-1.3, 2.5).region(Hand::Left), ZoneRegion::Outside);
        assert!(PlateLocation::new(-1.5, 2.5).inside_depth(Hand::Right) > 0.6);
        assert_eq!(PlateLocation::new(1.5, 2.5).inside_depth(Hand::Right), 0.0);
    }

    #[test]
    fn test_checked_count() {
        assert!(Count::checked(3, 2).is_ok());
        assert_eq!(
            Count::checked(4, 0),
            Err(StateViolation::InvalidCount { balls: 4, strikes: 0 })
        );
    }
}
