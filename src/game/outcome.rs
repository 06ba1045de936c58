//! Outcome Resolver
//!
//! Resolves one pitch against the batter: swing or take, contact or miss,
//! fair or foul, and the quality of any ball put in play. Count bookkeeping
//! lives in [`Count::apply`].
//!
//! Batter and pitcher rates meet in a [`PlateMatchup`], which combines them
//! with the log5 method against the reference era's league rates.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::error::StateViolation;
use crate::game::pitch::{Count, Pitch, ZoneRegion};
use crate::stats::era::{LeagueTable, StatCategory};
use crate::stats::player::Hand;
use crate::stats::profile::{BatterProfile, PitcherProfile};

/// Batted-ball bucket before physics resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactQuality {
    GroundBall,
    LineDrive,
    FlyBall,
    PopUp,
}

/// Result of a single pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchResult {
    Ball,
    CalledStrike,
    SwingingStrike,
    Foul,
    /// Taken pitch that struck the batter
    HitByPitch,
    InPlay(ContactQuality),
}

impl PitchResult {
    /// Counts as a strike in a pitcher's line.
    pub fn is_strike(self) -> bool {
        matches!(
            self,
            PitchResult::CalledStrike | PitchResult::SwingingStrike | PitchResult::Foul | PitchResult::InPlay(_)
        )
    }

    /// Batter offered at the pitch.
    pub fn is_swing(self) -> bool {
        matches!(self, PitchResult::SwingingStrike | PitchResult::Foul | PitchResult::InPlay(_))
    }
}

/// What a pitch result does to the plate appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountOutcome {
    /// Plate appearance continues with this count.
    Continue(Count),
    /// Third strike. `looking` when it was taken.
    Strikeout { looking: bool },
    Walk,
    HitByPitch,
    InPlay(ContactQuality),
}

impl Count {
    /// Apply a pitch result.
    ///
    /// Fouls add a strike only with fewer than two strikes. A count outside
    /// 0-3 balls and 0-2 strikes is rejected.
    pub fn apply(self, result: PitchResult) -> Result<CountOutcome, StateViolation> {
        let count = Count::checked(self.balls, self.strikes)?;
        let outcome = match result {
            PitchResult::Ball if count.balls == 3 => CountOutcome::Walk,
            PitchResult::Ball => CountOutcome::Continue(Count::new(count.balls + 1, count.strikes)),
            PitchResult::CalledStrike | PitchResult::SwingingStrike if count.two_strikes() => {
                CountOutcome::Strikeout {
                    looking: result == PitchResult::CalledStrike,
                }
            }
            PitchResult::CalledStrike | PitchResult::SwingingStrike => {
                CountOutcome::Continue(Count::new(count.balls, count.strikes + 1))
            }
            PitchResult::Foul => CountOutcome::Continue(Count::new(count.balls, (count.strikes + 1).min(2))),
            PitchResult::HitByPitch => CountOutcome::HitByPitch,
            PitchResult::InPlay(quality) => CountOutcome::InPlay(quality),
        };
        Ok(outcome)
    }
}

// =============================================================================
// MATCHUP RATES
// =============================================================================

/// League rates the batter and pitcher are measured against.
///
/// Taken from the reference era so both players' normalized rates sit on
/// the same scale as the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueBaseline {
    /// Strikeouts per plate appearance
    pub strikeout_rate: f64,
    /// Walks per plate appearance
    pub walk_rate: f64,
    /// Hit-by-pitches per plate appearance
    pub hit_by_pitch_rate: f64,
    /// Hits allowed per batter faced
    pub hit_rate: f64,
    /// Home runs per plate appearance
    pub home_run_rate: f64,
    /// Slugging minus average
    pub isolated_power: f64,
    /// Average on balls in play
    pub babip: f64,
}

impl Default for LeagueBaseline {
    fn default() -> Self {
        Self {
            strikeout_rate: 0.22,
            walk_rate: 0.085,
            hit_by_pitch_rate: 0.010,
            hit_rate: 0.22,
            home_run_rate: 0.030,
            isolated_power: 0.160,
            babip: 0.300,
        }
    }
}

impl LeagueBaseline {
    /// Baseline for a season, using the nearest stored average per category
    /// and the default where a category has none.
    pub fn from_table(table: &LeagueTable, season: u16) -> Self {
        let base = Self::default();
        let rate = |category, fallback: f64| {
            table
                .nearest(category, season)
                .map(|avg| avg.value)
                .filter(|v| v.is_finite() && *v > 0.0 && *v < 1.0)
                .unwrap_or(fallback)
        };
        Self {
            strikeout_rate: rate(StatCategory::StrikeoutRate, base.strikeout_rate),
            walk_rate: rate(StatCategory::WalkRate, base.walk_rate),
            hit_by_pitch_rate: rate(StatCategory::HitByPitchRate, base.hit_by_pitch_rate),
            hit_rate: rate(StatCategory::PitcherHitRate, base.hit_rate),
            home_run_rate: rate(StatCategory::HomeRunRate, base.home_run_rate),
            isolated_power: rate(StatCategory::IsolatedPower, base.isolated_power),
            babip: rate(StatCategory::Babip, base.babip),
        }
    }
}

const RATE_FLOOR: f64 = 0.001;
const RATE_CEILING: f64 = 0.999;

/// Expected rate when a batter with rate `batter` faces a pitcher with rate
/// `pitcher` in a league where the rate is `league`.
pub fn log5(batter: f64, pitcher: f64, league: f64) -> f64 {
    let b = batter.clamp(RATE_FLOOR, RATE_CEILING);
    let p = pitcher.clamp(RATE_FLOOR, RATE_CEILING);
    let l = league.clamp(RATE_FLOOR, RATE_CEILING);
    let odds = b * p / l;
    odds / (odds + (1.0 - b) * (1.0 - p) / (1.0 - l))
}

/// Exit velocity gained per point of isolated power above league (mph).
const ISO_EXIT_VELOCITY: f64 = 25.0;
/// Exit velocity gained per point of home run rate above league (mph).
const HOME_RUN_EXIT_VELOCITY: f64 = 80.0;
const MAX_POWER_SHIFT: f64 = 9.0;

/// One batter against one pitcher, fixed for a plate appearance.
#[derive(Clone, Copy, Debug)]
pub struct PlateMatchup<'a> {
    /// Hitter
    pub batter: &'a BatterProfile,
    /// Pitcher
    pub pitcher: &'a PitcherProfile,
    /// League the rates are measured against
    pub league: LeagueBaseline,
    /// Combined strikeout rate
    pub strikeout_rate: f64,
    /// Combined walk rate
    pub walk_rate: f64,
    /// Batter's hit-by-pitch rate
    pub hit_by_pitch_rate: f64,
    /// Combined home run rate
    pub home_run_rate: f64,
    /// Combined average on balls in play
    pub babip: f64,
}

impl<'a> PlateMatchup<'a> {
    /// Combine a batter and pitcher for one plate appearance.
    pub fn new(batter: &'a BatterProfile, pitcher: &'a PitcherProfile, league: LeagueBaseline) -> Self {
        // Pitchers carry no BABIP; scale the league figure by hits allowed
        let pitcher_babip = league.babip * (pitcher.hit_rate / league.hit_rate).clamp(0.5, 1.6);
        Self {
            batter,
            pitcher,
            league,
            strikeout_rate: log5(batter.strikeout_rate, pitcher.strikeout_rate, league.strikeout_rate),
            walk_rate: log5(batter.walk_rate, pitcher.walk_rate, league.walk_rate),
            hit_by_pitch_rate: batter.hit_by_pitch_rate,
            home_run_rate: log5(batter.home_run_rate, pitcher.home_run_rate, league.home_run_rate),
            babip: log5(batter.babip, pitcher_babip, league.babip),
        }
    }

    /// Exit velocity shift for this matchup (mph).
    ///
    /// Isolated power and the combined home run rate above league add to
    /// the batter's average exit velocity; below league they take away.
    pub fn power_shift(&self) -> f64 {
        let iso = (self.batter.isolated_power - self.league.isolated_power) * ISO_EXIT_VELOCITY;
        let hr = (self.home_run_rate - self.league.home_run_rate) * HOME_RUN_EXIT_VELOCITY;
        (iso + hr).clamp(-MAX_POWER_SHIFT, MAX_POWER_SHIFT)
    }

    /// BABIP relative to league, for scaling hit chances on balls in play.
    pub fn babip_scale(&self) -> f64 {
        (self.babip / self.league.babip).clamp(0.6, 1.4)
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Past this depth inside, a taken pitch can hit the batter (feet).
const HIT_BY_PITCH_DEPTH: f64 = 0.5;
/// Chance a deep inside pitch hits a league-average batter.
const HIT_BY_PITCH_CHANCE: f64 = 0.07;

fn swing_probability(pitch: &Pitch, matchup: &PlateMatchup<'_>, count: Count) -> f64 {
    let discipline = matchup.walk_rate - matchup.league.walk_rate;
    if pitch.region == ZoneRegion::InZone {
        let mut p = 0.67 - discipline * 1.2;
        if count.two_strikes() {
            p += 0.15;
        }
        if count.balls == 3 && count.strikes == 0 {
            p -= 0.30;
        }
        p.clamp(0.30, 0.95)
    } else {
        let mut p = 0.33 - discipline * 2.0;
        if count.two_strikes() {
            p += 0.12;
        }
        // Chase rate falls off with distance from the zone
        (p * (-pitch.location.distance_outside_zone() / 0.6).exp()).clamp(0.02, 0.60)
    }
}

fn contact_probability(pitch: &Pitch, matchup: &PlateMatchup<'_>) -> f64 {
    let base = if pitch.region == ZoneRegion::InZone { 0.83 } else { 0.56 };
    let p = base + (matchup.league.strikeout_rate - matchup.strikeout_rate) * 1.3
        - (pitch.velocity - 93.0) * 0.006
        - (pitch.movement - 10.0) * 0.006;
    p.clamp(0.30, 0.98)
}

fn hit_by_pitch_chance(matchup: &PlateMatchup<'_>) -> f64 {
    HIT_BY_PITCH_CHANCE * (matchup.hit_by_pitch_rate / matchup.league.hit_by_pitch_rate).clamp(0.0, 4.0)
}

fn foul_share(pitch: &Pitch) -> f64 {
    if pitch.region == ZoneRegion::InZone {
        0.50
    } else {
        0.58
    }
}

/// Pick a contact quality.
///
/// Uppercut swings and home run power lift more balls. Hitters who beat the
/// league on balls in play square up more liners; hard stuff and stingy
/// pitchers induce more pop-ups.
pub fn contact_quality(matchup: &PlateMatchup<'_>, pitch_velocity: f64, rng: &mut DeterministicRng) -> ContactQuality {
    let lift = (matchup.batter.launch_angle.avg - 12.0) * 0.015
        + (matchup.home_run_rate - matchup.league.home_run_rate) * 1.5;
    let squared_up = matchup.babip - matchup.league.babip;
    let weights = [
        (0.43 - lift).max(0.05),
        (0.21 + squared_up * 0.6).max(0.05),
        (0.26 + lift).max(0.05),
        (0.10 + (pitch_velocity - 92.0) * 0.004 - squared_up * 0.3).max(0.02),
    ];
    match rng.weighted_index(&weights) {
        Some(0) => ContactQuality::GroundBall,
        Some(2) => ContactQuality::FlyBall,
        Some(3) => ContactQuality::PopUp,
        _ => ContactQuality::LineDrive,
    }
}

/// Resolve one pitch.
///
/// `batter_side` is the side of the plate the batter stands on for this
/// pitcher (see [`Hand::batting_side_against`]).
pub fn resolve(
    pitch: &Pitch,
    matchup: &PlateMatchup<'_>,
    batter_side: Hand,
    count: Count,
    rng: &mut DeterministicRng,
) -> PitchResult {
    if !rng.next_bool(swing_probability(pitch, matchup, count)) {
        if pitch.location.inside_depth(batter_side) > HIT_BY_PITCH_DEPTH && rng.next_bool(hit_by_pitch_chance(matchup)) {
            return PitchResult::HitByPitch;
        }
        return if pitch.region == ZoneRegion::InZone {
            PitchResult::CalledStrike
        } else {
            PitchResult::Ball
        };
    }

    if !rng.next_bool(contact_probability(pitch, matchup)) {
        return PitchResult::SwingingStrike;
    }

    if rng.next_bool(foul_share(pitch)) {
        return PitchResult::Foul;
    }

    PitchResult::InPlay(contact_quality(matchup, pitch.velocity, rng))
}

// =============================================================================
// TESTS
// =============================================================================
