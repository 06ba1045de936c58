//! State Hashing for Verification
//!
//! Domain-separated SHA-256 used to fingerprint a game state, digest an
//! event log, derive game ids and derive per-matchup seeds. Two runs agree
//! on a digest exactly when they fed the same values in the same order.

use sha2::{Sha256, Digest};

/// 256-bit digest.
pub type StateHash = [u8; 32];

/// What a digest is computed over. Each domain prefixes its own tag, so
/// equal payloads in different domains never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashDomain {
    /// Snapshot of a `GameState`
    GameState,
    /// Canonical encoding of an event log
    EventLog,
    /// Game identifier derived from a request
    GameId,
    /// Per-matchup seed derivation
    Seed,
}

impl HashDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            HashDomain::GameState => b"CROSSERA_STATE_V1",
            HashDomain::EventLog => b"CROSSERA_EVENTLOG_V1",
            HashDomain::GameId => b"CROSSERA_GAME_ID_V1",
            HashDomain::Seed => b"CROSSERA_SEED_V1",
        }
    }
}

/// A value with a fixed, platform-independent byte encoding for hashing.
pub trait Fingerprint {
    fn fingerprint(&self, hasher: &mut StateHasher);
}

macro_rules! le_fingerprint {
    ($($t:ty),*) => {$(
        impl Fingerprint for $t {
            #[inline]
            fn fingerprint(&self, hasher: &mut StateHasher) {
                hasher.write(&self.to_le_bytes());
            }
        }
    )*};
}

le_fingerprint!(u8, u16, u32, u64);

impl Fingerprint for bool {
    #[inline]
    fn fingerprint(&self, hasher: &mut StateHasher) {
        hasher.write(&[u8::from(*self)]);
    }
}

/// Exact bit pattern; `0.0` and `-0.0` differ.
impl Fingerprint for f64 {
    #[inline]
    fn fingerprint(&self, hasher: &mut StateHasher) {
        self.to_bits().fingerprint(hasher);
    }
}

/// Length-prefixed so adjacent strings cannot run together.
impl Fingerprint for str {
    fn fingerprint(&self, hasher: &mut StateHasher) {
        (self.len() as u64).fingerprint(hasher);
        hasher.write(self.as_bytes());
    }
}

impl Fingerprint for String {
    fn fingerprint(&self, hasher: &mut StateHasher) {
        self.as_str().fingerprint(hasher);
    }
}

/// Incremental domain-separated SHA-256.
pub struct StateHasher {
    inner: Sha256,
}

impl StateHasher {
    /// Hasher seeded with the domain tag.
    pub fn new(domain: HashDomain) -> Self {
        let mut inner = Sha256::new();
        inner.update(domain.tag());
        Self { inner }
    }

    /// Append raw bytes with no framing.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(bytes);
        self
    }

    /// Append a value by its fingerprint.
    #[inline]
    pub fn put<T: Fingerprint + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.fingerprint(self);
        self
    }

    /// Consume the hasher and return the digest.
    pub fn finalize(self) -> StateHash {
        self.inner.finalize().into()
    }
}

/// One-shot digest of `data` in a domain.
pub fn hash_with_domain(domain: HashDomain, data: &[u8]) -> StateHash {
    let mut hasher = StateHasher::new(domain);
    hasher.write(data);
    hasher.finalize()
}

/// Fingerprint of a game state.
///
/// Seed and log length lead every state hash; `add_state` appends the rest.
pub fn compute_state_hash<F>(seed: u64, event_count: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::new(HashDomain::GameState);
    hasher.put(&seed).put(&event_count);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
