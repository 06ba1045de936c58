//! Deterministic Random Number Generator
//!
//! xoroshiro128+ seeded through SplitMix64. The same seed gives the same
//! stream on every platform, and every draw in a simulated game (pitch
//! selection, swing decisions, batted-ball spread, baserunning) comes from a
//! single instance owned by the game.

use serde::{Serialize, Deserialize};

use super::hash::{HashDomain, StateHasher};

/// Per-game random source.
///
/// Draws are never skipped or made conditional on logging, so two games fed
/// the same seed stay in lockstep for their whole length.
///
/// ```
/// use crossera::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(1968);
/// let mut b = DeterministicRng::new(1968);
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    s: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Seed a new generator.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let s = [splitmix64(&mut sm), splitmix64(&mut sm)];
        // All-zero state is a fixed point
        if s == [0, 0] {
            return Self { s: [1, 1] };
        }
        Self { s }
    }

    /// Next raw 64-bit output.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [s0, mut s1] = self.s;
        let out = s0.wrapping_add(s1);
        s1 ^= s0;
        self.s = [s0.rotate_left(24) ^ s1 ^ (s1 << 16), s1.rotate_left(37)];
        out
    }

    /// Uniform in [0, 1), 53 bits of precision.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 * SCALE
    }

    /// Uniform integer in [0, bound). Zero when `bound` is zero.
    #[inline]
    pub fn next_below(&mut self, bound: u32) -> u32 {
        // Multiply-shift keeps the high bits
        ((u64::from(self.next_u64() as u32) * u64::from(bound)) >> 32) as u32
    }

    /// Uniform in [min, max); `min` when the range is empty.
    #[inline]
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        let u = self.next_f64();
        if max > min {
            min + (max - min) * u
        } else {
            min
        }
    }

    /// True with probability `p`. Always consumes one draw.
    #[inline]
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Normal sample via Box-Muller. Consumes two draws.
    pub fn next_normal(&mut self, mean: f64, sd: f64) -> f64 {
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + sd * z
    }

    /// Normal sample clamped to `[min, max]`.
    pub fn next_normal_clamped(&mut self, mean: f64, sd: f64, min: f64, max: f64) -> f64 {
        self.next_normal(mean, sd).clamp(min, max)
    }

    /// Index chosen with probability proportional to its weight.
    ///
    /// Negative and non-finite weights count as zero. `None` (and no draw)
    /// when nothing has positive weight.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let weight = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().map(|&w| weight(w)).sum();
        if total <= 0.0 {
            return None;
        }

        let mut remaining = self.next_f64() * total;
        let mut fallback = None;
        for (i, w) in weights.iter().map(|&w| weight(w)).enumerate().filter(|&(_, w)| w > 0.0) {
            if remaining < w {
                return Some(i);
            }
            remaining -= w;
            fallback = Some(i);
        }
        // Float rounding past the last bucket
        fallback
    }

    /// Uniform pick from a slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let bound = u32::try_from(items.len()).unwrap_or(u32::MAX);
        items.get(self.next_below(bound) as usize)
    }

    /// Raw generator state, for checkpointing a game mid-way.
    pub fn state(&self) -> [u64; 2] {
        self.s
    }

    /// Restore a checkpoint taken with `state`.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.s = state;
    }
}

#[inline]
fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stable per-matchup seed from a label such as `"Riverton 1968 @ Bay City 2019"`.
///
/// One base seed can drive a whole series while each matchup still gets its
/// own stream.
pub fn derive_game_seed(label: &str, base_seed: u64) -> u64 {
    let mut hasher = StateHasher::new(HashDomain::Seed);
    hasher.put(label).put(&base_seed);
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

// =============================================================================
// TESTS
// =============================================================================
