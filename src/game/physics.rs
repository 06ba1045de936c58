//! Hit Physics
//!
//! Turns contact into a batted ball: exit velocity and launch angle are
//! drawn from the batter's tendencies and the matchup's power, the flight
//! is integrated with drag and backspin lift in air thinned by the park's
//! elevation, and the landing spot is checked against the wall at that spray angle. Balls that
//! reach the wall without clearing it play off the wall; the rest go through
//! the [`FieldingCurve`].
//!
//! Units are feet, seconds and mph at the API; the integrator works in ft/s.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::outcome::{ContactQuality, PlateMatchup};
use crate::game::park::ParkProfile;
use crate::stats::player::Hand;

// =============================================================================
// CONSTANTS
// =============================================================================

const MPH_TO_FPS: f64 = 1.466_67;
const GRAVITY_FPS2: f64 = 32.174;
/// Contact height above the ground (feet).
const CONTACT_HEIGHT: f64 = 3.0;
/// ½·ρ·A/m at sea level, per foot, for a regulation ball.
const AERO_K: f64 = 0.5 * 1.225 * 0.0042 / 0.145 / 3.281;
const DRAG_COEFFICIENT: f64 = 0.33;
const LIFT_COEFFICIENT: f64 = 0.19;
const TIME_STEP: f64 = 0.01;
const MAX_FLIGHT_SECONDS: f64 = 15.0;

const MIN_EXIT_VELOCITY: f64 = 45.0;
const MAX_EXIT_VELOCITY: f64 = 118.0;
const EXIT_VELOCITY_SD: f64 = 6.0;

/// Power shift (mph) per unit of extra launch angle spread.
const MAX_POWER_SPREAD_SHIFT: f64 = 18.0;

/// Spray angle spread around the pull side (degrees).
const SPRAY_SD: f64 = 20.0;
const PULL_ANGLE: f64 = 6.0;

// =============================================================================
// FLIGHT
// =============================================================================

/// Result of integrating one trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    /// Horizontal distance where the ball lands (feet)
    pub carry: f64,
    /// Height when crossing the wall line, if it got that far
    pub height_at_wall: Option<f64>,
    /// Seconds in the air
    pub hang_time: f64,
}

/// Integrate a batted ball's flight.
///
/// `density_ratio` is air density relative to sea level; thinner air means
/// less drag and less lift, and a longer carry overall.
pub fn simulate_flight(exit_velocity: f64, launch_angle: f64, density_ratio: f64, wall_distance: f64) -> Flight {
    let kd = AERO_K * DRAG_COEFFICIENT * density_ratio;
    let kl = AERO_K * LIFT_COEFFICIENT * density_ratio;

    let speed = exit_velocity.max(0.0) * MPH_TO_FPS;
    let angle = launch_angle.to_radians();
    let (mut x, mut y) = (0.0_f64, CONTACT_HEIGHT);
    let (mut vx, mut vy) = (speed * angle.cos(), speed * angle.sin());
    let mut t = 0.0;
    let mut height_at_wall = None;

    while t < MAX_FLIGHT_SECONDS {
        let v = vx.hypot(vy);
        let ax = -kd * v * vx - kl * v * vy;
        let ay = -GRAVITY_FPS2 - kd * v * vy + kl * v * vx;

        let (nx, ny) = (x + vx * TIME_STEP, y + vy * TIME_STEP);
        vx += ax * TIME_STEP;
        vy += ay * TIME_STEP;

        if height_at_wall.is_none() && x < wall_distance && nx >= wall_distance {
            let f = (wall_distance - x) / (nx - x);
            height_at_wall = Some(y + (ny - y) * f);
        }

        if ny <= 0.0 {
            let f = y / (y - ny);
            return Flight {
                carry: x + (nx - x) * f,
                height_at_wall,
                hang_time: t + TIME_STEP * f,
            };
        }

        x = nx;
        y = ny;
        t += TIME_STEP;
    }

    Flight { carry: x, height_at_wall, hang_time: t }
}

// =============================================================================
// BATTED BALL
// =============================================================================

/// How a ball in play was retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutKind {
    Groundout,
    Lineout,
    Flyout,
    Popout,
}

/// Classification of a ball in play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattedBallResult {
    Out(OutKind),
    Single,
    Double,
    Triple,
    HomeRun,
}

/// A resolved batted ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattedBall {
    /// Contact bucket the ball came from
    pub quality: ContactQuality,
    /// mph
    pub exit_velocity: f64,
    /// degrees
    pub launch_angle: f64,
    /// degrees, negative toward left field
    pub horizontal_angle: f64,
    /// Carry plus roll (feet)
    pub distance: f64,
    /// Wall distance at this spray angle
    pub wall_distance: f64,
    /// Wall height at this spray angle
    pub wall_height: f64,
    /// How the ball was scored
    pub result: BattedBallResult,
}

impl BattedBall {
    /// Reached the outfield grass.
    pub fn is_outfield(&self) -> bool {
        self.distance >= OUTFIELD_DEPTH
    }
}

/// Depth where the outfield starts (feet).
pub const OUTFIELD_DEPTH: f64 = 200.0;

// =============================================================================
// FIELDING CURVE
// =============================================================================

/// Chance a ball that stays in the park falls for a hit, and how far the
/// batter gets when it does.
///
/// Base probabilities by contact quality:
///
/// - grounder: `ground_ball_base + (ev − 88)·ground_ball_per_mph`, clamped
/// - liner: `line_drive_base + (ev − 88)·line_drive_per_mph`, clamped
/// - fly ball: `bloop_hit` short of `bloop_distance` (soft contact dropping
///   in front of the outfield), `routine_fly_hit` up to
///   `deep_fly_fraction` of the wall, `deep_fly_hit` beyond
/// - pop-up: `pop_up_hit`
///
/// The base is scaled by the matchup's BABIP against the league and by the
/// park's run factor. Balls that reach the wall without clearing it skip the
/// curve: they are doubles, or triples at `triple_chance` in the gaps and
/// center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldingCurve {
    /// Grounder hit chance at 88 mph
    pub ground_ball_base: f64,
    /// Change in grounder hit chance per mph
    pub ground_ball_per_mph: f64,
    /// Bounds on grounder hit chance
    pub ground_ball_range: (f64, f64),
    /// Liner hit chance at 88 mph
    pub line_drive_base: f64,
    /// Change in liner hit chance per mph
    pub line_drive_per_mph: f64,
    /// Bounds on liner hit chance
    pub line_drive_range: (f64, f64),
    /// Fly balls shorter than this are bloops (feet)
    pub bloop_distance: f64,
    /// Bloop hit chance
    pub bloop_hit: f64,
    /// Routine fly hit chance
    pub routine_fly_hit: f64,
    /// Fraction of wall distance where flies turn deep
    pub deep_fly_fraction: f64,
    /// Deep fly hit chance
    pub deep_fly_hit: f64,
    /// Pop-up hit chance
    pub pop_up_hit: f64,
    /// Fraction of wall distance a hit must reach to be a double.
    pub double_fraction: f64,
    /// Fraction of wall distance a hit must reach to be a triple candidate.
    pub triple_fraction: f64,
    /// Chance a triple candidate becomes a triple.
    pub triple_chance: f64,
    /// Triples only come from the gaps and center, within this angle.
    pub triple_max_angle: f64,
    /// Hard grounders hit beyond this angle go for two.
    pub line_double_angle: f64,
    /// Minimum exit velocity for a double down the line
    pub line_double_min_velocity: f64,
    /// Roll per mph of exit velocity on grounders (feet).
    pub ground_roll_per_mph: f64,
    /// Grounders stop here at the latest (feet)
    pub max_ground_ball_distance: f64,
}

impl Default for FieldingCurve {
    fn default() -> Self {
        Self {
            ground_ball_base: 0.22,
            ground_ball_per_mph: 0.008,
            ground_ball_range: (0.05, 0.50),
            line_drive_base: 0.62,
            line_drive_per_mph: 0.01,
            line_drive_range: (0.35, 0.85),
            bloop_distance: 180.0,
            bloop_hit: 0.30,
            routine_fly_hit: 0.06,
            deep_fly_fraction: 0.80,
            deep_fly_hit: 0.40,
            pop_up_hit: 0.02,
            double_fraction: 0.88,
            triple_fraction: 0.93,
            triple_chance: 0.15,
            triple_max_angle: 30.0,
            line_double_angle: 38.0,
            line_double_min_velocity: 100.0,
            ground_roll_per_mph: 0.9,
            max_ground_ball_distance: 150.0,
        }
    }
}

impl FieldingCurve {
    /// Base hit probability before batter and park scaling.
    pub fn hit_probability(&self, quality: ContactQuality, exit_velocity: f64, distance: f64, wall_distance: f64) -> f64 {
        match quality {
            ContactQuality::GroundBall => {
                let (lo, hi) = self.ground_ball_range;
                (self.ground_ball_base + (exit_velocity - 88.0) * self.ground_ball_per_mph).clamp(lo, hi)
            }
            ContactQuality::LineDrive => {
                let (lo, hi) = self.line_drive_range;
                (self.line_drive_base + (exit_velocity - 88.0) * self.line_drive_per_mph).clamp(lo, hi)
            }
            ContactQuality::FlyBall => {
                if distance < self.bloop_distance {
                    self.bloop_hit
                } else if distance < self.deep_fly_fraction * wall_distance {
                    self.routine_fly_hit
                } else {
                    self.deep_fly_hit
                }
            }
            ContactQuality::PopUp => self.pop_up_hit,
        }
    }

    fn out_kind(quality: ContactQuality) -> OutKind {
        match quality {
            ContactQuality::GroundBall => OutKind::Groundout,
            ContactQuality::LineDrive => OutKind::Lineout,
            ContactQuality::FlyBall => OutKind::Flyout,
            ContactQuality::PopUp => OutKind::Popout,
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Draw a spray angle with a pull tendency.
///
/// Right-handed batters pull toward left field (negative angles).
pub fn spray_angle(batter_side: Hand, rng: &mut DeterministicRng) -> f64 {
    let pull = match batter_side {
        Hand::Left => PULL_ANGLE,
        _ => -PULL_ANGLE,
    };
    rng.next_normal_clamped(pull, SPRAY_SD, -45.0, 45.0)
}

fn exit_velocity_offset(quality: ContactQuality) -> f64 {
    match quality {
        ContactQuality::GroundBall => -3.0,
        ContactQuality::LineDrive => 2.0,
        ContactQuality::FlyBall => 1.0,
        ContactQuality::PopUp => -12.0,
    }
}

/// Launch angle distribution per contact quality: mean, sd, min, max.
fn launch_angle_model(quality: ContactQuality) -> (f64, f64, f64, f64) {
    match quality {
        ContactQuality::GroundBall => (-4.0, 7.0, -30.0, 9.0),
        ContactQuality::LineDrive => (16.0, 4.0, 10.0, 24.0),
        ContactQuality::FlyBall => (33.0, 6.0, 25.0, 49.0),
        ContactQuality::PopUp => (58.0, 6.0, 50.0, 75.0),
    }
}

/// Resolve a ball put in play.
pub fn resolve_batted_ball(
    quality: ContactQuality,
    matchup: &PlateMatchup<'_>,
    pitch_velocity: f64,
    park: &ParkProfile,
    horizontal_angle: f64,
    curve: &FieldingCurve,
    rng: &mut DeterministicRng,
) -> BattedBall {
    let batter = matchup.batter;
    let power = matchup.power_shift();

    // Harder pitches come off the bat harder
    let ev_mean = batter.launch_speed.avg + power + (pitch_velocity - 90.0) * 0.3 + exit_velocity_offset(quality);
    let exit_velocity = rng.next_normal_clamped(ev_mean, EXIT_VELOCITY_SD, MIN_EXIT_VELOCITY, MAX_EXIT_VELOCITY);

    // Power hitters lift the ball more and with a wider spread
    let (mean, sd, lo, hi) = launch_angle_model(quality);
    let tilt = (batter.launch_angle.avg - 12.0) * 0.3 + power * 0.25;
    let spread = sd * (1.0 + power / MAX_POWER_SPREAD_SHIFT).clamp(0.8, 1.25);
    let launch_angle = rng.next_normal_clamped(mean + tilt, spread, lo, hi);

    let wall = park.wall_at(horizontal_angle);
    let flight = simulate_flight(exit_velocity, launch_angle, park.air_density_ratio(), wall.distance);

    let distance = if quality == ContactQuality::GroundBall {
        (flight.carry + exit_velocity * curve.ground_roll_per_mph * park.surface.roll_factor())
            .min(curve.max_ground_ball_distance)
    } else {
        flight.carry
    };

    let reached_wall = distance >= wall.distance;
    let cleared = flight.height_at_wall.is_some_and(|h| h > wall.height);
    let result = if reached_wall && cleared {
        BattedBallResult::HomeRun
    } else if reached_wall {
        off_the_wall(horizontal_angle, curve, rng)
    } else {
        let park_scale = park.run_factor.clamp(0.85, 1.15);
        let p = curve.hit_probability(quality, exit_velocity, distance, wall.distance)
            * matchup.babip_scale()
            * park_scale;

        if rng.next_bool(p) {
            classify_hit(quality, exit_velocity, distance, wall.distance, horizontal_angle, curve, rng)
        } else {
            BattedBallResult::Out(FieldingCurve::out_kind(quality))
        }
    };

    BattedBall {
        quality,
        exit_velocity,
        launch_angle,
        horizontal_angle,
        distance,
        wall_distance: wall.distance,
        wall_height: wall.height,
        result,
    }
}

/// A ball that hit the wall in the air.
fn off_the_wall(angle: f64, curve: &FieldingCurve, rng: &mut DeterministicRng) -> BattedBallResult {
    if angle.abs() < curve.triple_max_angle && rng.next_bool(curve.triple_chance) {
        BattedBallResult::Triple
    } else {
        BattedBallResult::Double
    }
}

fn classify_hit(
    quality: ContactQuality,
    exit_velocity: f64,
    distance: f64,
    wall_distance: f64,
    angle: f64,
    curve: &FieldingCurve,
    rng: &mut DeterministicRng,
) -> BattedBallResult {
    if quality == ContactQuality::GroundBall {
        return if angle.abs() >= curve.line_double_angle && exit_velocity >= curve.line_double_min_velocity {
            BattedBallResult::Double
        } else {
            BattedBallResult::Single
        };
    }

    if distance > curve.triple_fraction * wall_distance
        && angle.abs() < curve.triple_max_angle
        && rng.next_bool(curve.triple_chance)
    {
        BattedBallResult::Triple
    } else if distance > curve.double_fraction * wall_distance {
        BattedBallResult::Double
    } else {
        BattedBallResult::Single
    }
}

// =============================================================================
// TESTS
// =============================================================================
