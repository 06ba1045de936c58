//! Game Logic Module
//!
//! All game simulation code. Deterministic given a seed.
//!
//! ## Module Structure
//!
//! - `park`: Ballpark dimensions and environment
//! - `matchup`: Rosters resolved into per-game team contexts
//! - `lineup`: Batting order tracking and construction
//! - `pitch`: Count, pitch selection and location
//! - `outcome`: Swing decisions and per-pitch results
//! - `physics`: Batted-ball flight and fielding
//! - `bases`: Runner advancement
//! - `events`: Game events for replay/verification
//! - `state`: Inning, outs, score and the event log
//! - `machine`: Authoritative simulation loop
//! - `box_score`: Aggregation, highlights and MVP selection

pub mod park;
pub mod matchup;
pub mod lineup;
pub mod pitch;
pub mod outcome;
pub mod physics;
pub mod bases;
pub mod events;
pub mod state;
pub mod machine;
pub mod box_score;

// Re-export key types
pub use park::ParkProfile;
pub use matchup::{MatchupContext, TeamContext, TeamRoster};
pub use lineup::{BattingOrder, BattingOrderManager};
pub use pitch::{Count, Pitch};
pub use events::{GameEvent, GameEventData, PlayKind, PlayOutcome};
pub use state::{GameState, Half, Score, TeamSide};
pub use machine::{GameMachine, Phase};
pub use box_score::{summarize, BoxScore, MvpWeights};
