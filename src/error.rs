//! Error types shared across the simulation.
//!
//! Provider, normalizer and narrative errors live next to their modules;
//! this file holds the ones the entry point surfaces to callers.

use thiserror::Error;

use crate::game::bases::Base;
use crate::game::state::{Half, TeamSide};
use crate::provider::ProviderError;

/// An internal invariant of the game state was about to be broken.
///
/// These never occur in correct operation. The machine aborts instead of
/// patching the state, so a violation always surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    /// A play would push the out counter past three.
    #[error("{outs} outs would be recorded in the {half:?} of inning {inning}")]
    FourthOut {
        /// Inning number
        inning: u16,
        /// Half of the inning
        half: Half,
        /// Outs the play would leave on the board
        outs: u8,
    },

    /// A runner was sent to a base that already holds one.
    #[error("{base} is already occupied")]
    BaseOccupied {
        /// The contested base
        base: Base,
    },

    /// A team has nobody to send to the plate.
    #[error("{side:?} lineup is empty")]
    EmptyLineup {
        /// Team with the empty lineup
        side: TeamSide,
    },

    /// A ball/strike count left the legal range.
    #[error("count {balls}-{strikes} is out of range")]
    InvalidCount {
        /// Balls in the count
        balls: u8,
        /// Strikes in the count
        strikes: u8,
    },

    /// A plate appearance ran longer than the pitch counter can record.
    #[error("plate appearance reached {pitches} pitches")]
    PitchLimit {
        /// Pitches thrown so far
        pitches: usize,
    },

    /// The machine was stepped after the game ended.
    #[error("game is already over")]
    GameOver,
}

/// Errors returned by the simulation entry points.
#[derive(Debug, Error)]
pub enum SimError {
    /// Team, season, park or player data could not be found.
    /// Raised before the first pitch; no partial game exists.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A roster cannot field a legal lineup or starting pitcher.
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    /// Internal consistency failure.
    #[error("invalid game state: {0}")]
    InvalidGameState(#[from] StateViolation),

    /// The caller asked the game to stop between plate appearances.
    #[error("simulation cancelled after {completed_plate_appearances} plate appearances")]
    Cancelled {
        /// Plate appearances fully applied before the stop
        completed_plate_appearances: u32,
    },
}

impl From<ProviderError> for SimError {
    fn from(err: ProviderError) -> Self {
        SimError::DataUnavailable(err.to_string())
    }
}

/// Errors loading a [`crate::config::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias for simulation results.
pub type Result<T> = std::result::Result<T, SimError>;
