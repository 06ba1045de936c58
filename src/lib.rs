//! # Crossera
//!
//! Deterministic cross-era baseball simulation: two rosters from any two
//! seasons, rescaled onto one reference era, played pitch by pitch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         CROSSERA                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  stats/          - Statistical model                         │
//! │  ├── player.rs   - Raw season lines, hands, capabilities     │
//! │  ├── arsenal.rs  - Pitch types and usage                     │
//! │  ├── era.rs      - League tables and era normalization       │
//! │  └── profile.rs  - Normalized batter/pitcher profiles        │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── matchup.rs  - Rosters + park for one game               │
//! │  ├── pitch.rs    - Count and pitch sequencing                │
//! │  ├── outcome.rs  - Per-pitch outcome resolution              │
//! │  ├── physics.rs  - Batted-ball flight and fielding           │
//! │  ├── bases.rs    - Runner advancement                        │
//! │  ├── lineup.rs   - Batting order                             │
//! │  ├── state.rs    - Game state and event log                  │
//! │  ├── machine.rs  - Authoritative simulation loop             │
//! │  └── box_score.rs- Aggregation, highlights, MVP              │
//! │                                                              │
//! │  provider/       - Data and narrative seams                  │
//! │  feed.rs         - Event log, subscribers, paced stream      │
//! │  sim.rs          - Entry points                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same rosters, park, reference era and seed, [`simulate`]
//! produces a **byte-identical** event log:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time in game logic
//! - All randomness from one seeded Xorshift128+ per game
//! - Logging never draws from the RNG
//!
//! ## Example
//!
//! ```no_run
//! use crossera::{simulate, InMemoryProvider, ReferenceEra, SimulationRequest};
//!
//! let provider = InMemoryProvider::sample()?;
//! let output = simulate(&provider, &SimulationRequest {
//!     away_team: "Riverton Ironmen".into(),
//!     away_season: 1968,
//!     home_team: "Bay City Comets".into(),
//!     home_season: 2019,
//!     park: "Comets Yard".into(),
//!     reference_era: ReferenceEra(2019),
//!     seed: 42,
//! })?;
//! println!("{}", output.box_score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod config;
pub mod stats;
pub mod game;
pub mod provider;
pub mod feed;
pub mod sim;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::hash::StateHash;
pub use error::{SimError, StateViolation};
pub use config::SimConfig;
pub use stats::profile::ReferenceEra;
pub use game::box_score::BoxScore;
pub use game::events::{GameEvent, GameEventData};
pub use feed::{EventFeed, EventLog};
pub use provider::{InMemoryProvider, StatsProvider};
pub use sim::{simulate, simulate_many, simulate_with_config, SimulationOutput, SimulationRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
