//! Fault models for Byzantine participants.
//!
//! A fault model decides, message by message, what a faulty participant
//! sends. It sees the value a loyal participant in the same position would
//! have sent and may return anything from the value domain, or `None` to
//! omit the message.
//!
//! Fault models are queried from parallel round generation, so they must be
//! pure with respect to the `FaultContext`: the same context always yields
//! the same answer.

use crate::types::{ParticipantId, Round, Value};

/// Everything a fault model may look at when corrupting one message.
#[derive(Debug, Clone, Copy)]
pub struct FaultContext<'a, V> {
    /// The faulty sender
    pub sender: ParticipantId,

    /// Who the message is addressed to
    pub recipient: ParticipantId,

    /// The round being generated
    pub round: Round,

    /// Relay chain the message is sent on behalf of (empty for flat relay)
    pub relay: &'a [ParticipantId],

    /// What a loyal participant would send (`None` if it holds nothing)
    pub honest: Option<&'a V>,
}

/// Behavior of faulty participants.
pub trait FaultModel<V>: Send + Sync {
    /// Returns the value the faulty sender emits, or `None` for omission.
    fn corrupt(&self, ctx: &FaultContext<'_, V>) -> Option<V>;
}

impl<V, F> FaultModel<V> for F
where
    F: Fn(&FaultContext<'_, V>) -> Option<V> + Send + Sync,
{
    fn corrupt(&self, ctx: &FaultContext<'_, V>) -> Option<V> {
        self(ctx)
    }
}

/// Faulty participants send nothing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Omission;

impl<V: Value> FaultModel<V> for Omission {
    fn corrupt(&self, _ctx: &FaultContext<'_, V>) -> Option<V> {
        None
    }
}

/// Faulty participants follow the protocol.
///
/// Useful to check that a faulty flag alone never changes the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Honest;

impl<V: Value> FaultModel<V> for Honest {
    fn corrupt(&self, ctx: &FaultContext<'_, V>) -> Option<V> {
        ctx.honest.cloned()
    }
}

/// Faulty participants tell different recipients different things.
///
/// The value sent to `recipient` in `round` is
/// `domain[(recipient + round) % domain.len()]`, so neighbouring recipients
/// always disagree on a domain of two. With an empty domain the fault model
/// has nothing to invent and falls back to the honest value.
#[derive(Debug, Clone)]
pub struct Equivocate<V> {
    domain: Vec<V>,
}

impl<V: Value> Equivocate<V> {
    /// Creates an equivocating fault model over `domain`.
    pub fn new(domain: impl IntoIterator<Item = V>) -> Self {
        Self {
            domain: domain.into_iter().collect(),
        }
    }

    /// Returns the value domain.
    pub fn domain(&self) -> &[V] {
        &self.domain
    }
}

impl<V: Value> FaultModel<V> for Equivocate<V> {
    fn corrupt(&self, ctx: &FaultContext<'_, V>) -> Option<V> {
        if self.domain.is_empty() {
            return ctx.honest.cloned();
        }
        let slot = (ctx.recipient.index() + ctx.round.get() as usize) % self.domain.len();
        Some(self.domain[slot].clone())
    }
}
