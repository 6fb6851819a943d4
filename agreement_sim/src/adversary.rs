//! Seeded Byzantine behaviour.

use crate::context::mix;
use agreement_env::{FaultContext, FaultModel, Value};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fault model drawing every message from its own ChaCha8 stream.
///
/// The stream is seeded by `(seed, sender, recipient, round, relay chain)`,
/// so a message's value never depends on generation order and parallel
/// rounds replay bit for bit.
#[derive(Debug, Clone)]
pub struct SeededAdversary<V> {
    seed: u64,
    domain: Vec<V>,
    omission_rate: f64,
}

impl<V: Value> SeededAdversary<V> {
    /// Creates an adversary choosing uniformly from `domain`.
    pub fn new(seed: u64, domain: impl IntoIterator<Item = V>) -> Self {
        Self {
            seed,
            domain: domain.into_iter().collect(),
            omission_rate: 0.0,
        }
    }

    /// Sets the probability of withholding a message (clamped to `[0, 1]`).
    pub fn with_omission_rate(mut self, rate: f64) -> Self {
        self.omission_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn omission_rate(&self) -> f64 {
        self.omission_rate
    }

    fn stream(&self, ctx: &FaultContext<'_, V>) -> ChaCha8Rng {
        let coordinates = [
            ctx.sender.index() as u64,
            ctx.recipient.index() as u64,
            ctx.round.get() as u64,
        ]
        .into_iter()
        .chain(ctx.relay.iter().map(|id| id.index() as u64));

        ChaCha8Rng::seed_from_u64(mix(self.seed, coordinates))
    }
}

impl<V: Value> FaultModel<V> for SeededAdversary<V> {
    fn corrupt(&self, ctx: &FaultContext<'_, V>) -> Option<V> {
        let mut rng = self.stream(ctx);
        if rng.gen_bool(self.omission_rate) {
            return None;
        }
        self.domain.choose(&mut rng).cloned()
    }
}
