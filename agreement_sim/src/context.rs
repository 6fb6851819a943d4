//! Seed bookkeeping for deterministic runs.

/// Golden-ratio multiplier used for sub-seed derivation.
const SEED_MIX: u64 = 0x9e3779b97f4a7c15;

/// Second multiplier, keeps adversary and setup streams apart.
const STREAM_MIX: u64 = 0x517cc1b727220a95;

/// Master seed of one simulation plus the seeds derived from it.
///
/// Every source of randomness in a run is a pure function of the master
/// seed, so one `u64` in a failure report is enough to replay it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimContext {
    seed: u64,
}

impl SimContext {
    /// Creates a context for the given master seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for the adversary's message stream.
    pub fn adversary_seed(&self) -> u64 {
        self.seed.wrapping_mul(STREAM_MIX) ^ 0xa5a5_a5a5_a5a5_a5a5
    }

    /// Seed for drawing run setups (army size, traitors, orders).
    pub fn setup_seed(&self) -> u64 {
        self.seed.wrapping_mul(SEED_MIX)
    }

    /// Independent context for the `index`-th sub-run.
    pub fn derive(&self, index: u64) -> SimContext {
        let mixed = self.seed.wrapping_mul(SEED_MIX);
        SimContext::new(mixed.wrapping_add(index.wrapping_mul(STREAM_MIX)))
    }
}

/// Mixes message coordinates into a seed (splitmix64 finalizer).
pub(crate) fn mix(seed: u64, parts: impl IntoIterator<Item = u64>) -> u64 {
    let mut z = seed;
    for part in parts {
        z = z.wrapping_add(SEED_MIX) ^ part.wrapping_mul(STREAM_MIX);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^= z >> 31;
    }
    z
}
