//! Statistical model.
//!
//! Raw season records from the provider, the era normalizer, and the
//! immutable per-player profiles the simulation reads.

pub mod player;
pub mod arsenal;
pub mod era;
pub mod profile;

// Re-export common types
pub use player::{PlayerId, Hand, Capability, Capabilities, PlayerSeasonStats, BattingLine, PitchingLine, MetricRange};
pub use arsenal::{PitchType, PitchCategory, PitchUsage, ArsenalEntry};
pub use era::{StatCategory, LeagueTable, EraNormalizer, NormalizerConfig, Degradation, normalize};
pub use profile::{ReferenceEra, BatterProfile, PitcherProfile, NormalizedStatLine, ProfileCache, build};
