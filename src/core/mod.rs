//! Core deterministic primitives.
//!
//! Everything random or hashed in a simulated game goes through these types,
//! which is what makes an event log a pure function of its inputs.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_game_seed};
pub use hash::{Fingerprint, HashDomain, StateHash, StateHasher, compute_state_hash};
