//! Park Profiles
//!
//! Outfield walls are described by five spokes from the left-field line to
//! the right-field line. Angles are horizontal spray angles in degrees:
//! negative toward left field, zero at straight-away center, positive
//! toward right field.

use serde::{Serialize, Deserialize};

/// Spray angles of the five wall spokes (degrees).
pub const SPOKE_ANGLES: [f64; 5] = [-45.0, -22.5, 0.0, 22.5, 45.0];

/// Scale height over which air density falls by a factor of e (feet).
const DENSITY_SCALE_HEIGHT_FT: f64 = 27_000.0;

/// Playing surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    #[default]
    Grass,
    /// Turf; ground balls roll farther.
    Artificial,
}

impl Surface {
    /// Multiplier on ground-ball roll.
    pub fn roll_factor(self) -> f64 {
        match self {
            Surface::Grass => 1.0,
            Surface::Artificial => 1.1,
        }
    }
}

/// Wall distance and height along one direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallSpoke {
    /// Distance from home plate (feet)
    pub distance: f64,
    /// Height of the wall (feet)
    pub height: f64,
}

impl WallSpoke {
    /// Spoke at `distance` feet with a wall `height` feet tall.
    pub const fn new(distance: f64, height: f64) -> Self {
        Self { distance, height }
    }
}

/// A venue's dimensions and environment. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkProfile {
    /// Park name
    pub name: String,
    /// Feet above sea level
    #[serde(default)]
    pub elevation: f64,
    /// Offense multiplier; 1.0 is neutral.
    #[serde(default = "neutral_run_factor")]
    pub run_factor: f64,
    /// Playing surface
    #[serde(default)]
    pub surface: Surface,
    /// Left line, left-center, center, right-center, right line.
    pub walls: [WallSpoke; 5],
}

fn neutral_run_factor() -> f64 {
    1.0
}

impl Default for ParkProfile {
    fn default() -> Self {
        Self {
            name: "Neutral Park".to_string(),
            elevation: 600.0,
            run_factor: 1.0,
            surface: Surface::Grass,
            walls: [
                WallSpoke::new(332.0, 8.0),
                WallSpoke::new(375.0, 8.0),
                WallSpoke::new(405.0, 8.0),
                WallSpoke::new(375.0, 8.0),
                WallSpoke::new(329.0, 8.0),
            ],
        }
    }
}

impl ParkProfile {
    /// Wall at a spray angle, interpolated between the neighbouring spokes.
    ///
    /// Angles outside the foul lines are clamped onto the nearest line.
    pub fn wall_at(&self, angle: f64) -> WallSpoke {
        let angle = if angle.is_finite() { angle.clamp(SPOKE_ANGLES[0], SPOKE_ANGLES[4]) } else { 0.0 };

        let upper = SPOKE_ANGLES
            .iter()
            .position(|&a| a >= angle)
            .unwrap_or(SPOKE_ANGLES.len() - 1)
            .max(1);
        let lower = upper - 1;

        let t = (angle - SPOKE_ANGLES[lower]) / (SPOKE_ANGLES[upper] - SPOKE_ANGLES[lower]);
        let (a, b) = (self.walls[lower], self.walls[upper]);
        WallSpoke {
            distance: a.distance + (b.distance - a.distance) * t,
            height: a.height + (b.height - a.height) * t,
        }
    }

    /// Shortest fence distance anywhere in the park.
    pub fn shortest_fence(&self) -> f64 {
        self.walls.iter().map(|w| w.distance).fold(f64::INFINITY, f64::min)
    }

    /// Air density relative to sea level.
    pub fn air_density_ratio(&self) -> f64 {
        (-self.elevation.max(0.0) / DENSITY_SCALE_HEIGHT_FT).exp()
    }

    /// Check dimensions are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.walls.iter().any(|w| !(w.distance.is_finite() && w.distance > 0.0)) {
            return Err(format!("{}: wall distances must be positive", self.name));
        }
        if self.walls.iter().any(|w| !(w.height.is_finite() && w.height >= 0.0)) {
            return Err(format!("{}: wall heights must be non-negative", self.name));
        }
        if !(self.run_factor.is_finite() && self.run_factor > 0.0) {
            return Err(format!("{}: run factor must be positive", self.name));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
