//! The Participant Model - one general in the agreement protocol.

use agreement_env::{
    AgreementError, Decision, Delivery, FaultContext, FaultModel, ParticipantId, Round, Value,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// One process of the protocol.
///
/// Holds identity, loyalty and the per-round inboxes. Participants are
/// mutated only by the coordinator that owns them, one round at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant<V> {
    id: ParticipantId,
    is_faulty: bool,
    initial_value: Option<V>,
    received: BTreeMap<Round, Vec<Delivery<V>>>,
    current: Option<V>,
    decision: Option<Decision<V>>,
}

impl<V: Value> Participant<V> {
    /// Creates a participant for a run of `n` participants.
    ///
    /// Only the commander is given an `initial_value`.
    ///
    /// # Errors
    /// `InvalidConfig` when `id` is outside `[0, n)`.
    pub fn initialize(
        id: ParticipantId,
        n: usize,
        is_faulty: bool,
        initial_value: Option<V>,
    ) -> Result<Self, AgreementError> {
        if !id.is_within(n) {
            return Err(AgreementError::invalid_config(format!(
                "participant id {} outside [0, {})",
                id, n
            )));
        }

        Ok(Self {
            id,
            is_faulty,
            current: initial_value.clone(),
            initial_value,
            received: BTreeMap::new(),
            decision: None,
        })
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn is_faulty(&self) -> bool {
        self.is_faulty
    }

    pub fn is_loyal(&self) -> bool {
        !self.is_faulty
    }

    /// The value this participant was asked to propagate (commander only).
    pub fn initial_value(&self) -> Option<&V> {
        self.initial_value.as_ref()
    }

    /// Best-known value after the latest completed round.
    pub fn current(&self) -> Option<&V> {
        self.current.as_ref()
    }

    /// Everything delivered in `round` (empty if nothing arrived).
    pub fn received(&self, round: Round) -> &[Delivery<V>] {
        self.received.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The resolved decision, `None` until the resolve phase.
    pub fn decision(&self) -> Option<&Decision<V>> {
        self.decision.as_ref()
    }

    /// The message this participant sends to `recipient` in `round`.
    ///
    /// A loyal participant sends its current best-known value: the
    /// commander's initial value in round 1, afterwards the majority of what
    /// it received. A faulty participant asks `faults`, which may return a
    /// different value for every recipient or `None` (omission).
    pub fn value_to_send(
        &self,
        round: Round,
        recipient: ParticipantId,
        faults: &dyn FaultModel<V>,
    ) -> Option<V> {
        self.emit(round, recipient, &[], self.current.as_ref(), faults)
    }

    /// The message relayed to `recipient` on behalf of `relay`, where `held`
    /// is what this participant received along that chain.
    pub(crate) fn relay_value(
        &self,
        round: Round,
        recipient: ParticipantId,
        relay: &[ParticipantId],
        held: Option<&V>,
        faults: &dyn FaultModel<V>,
    ) -> Option<V> {
        self.emit(round, recipient, relay, held, faults)
    }

    fn emit(
        &self,
        round: Round,
        recipient: ParticipantId,
        relay: &[ParticipantId],
        honest: Option<&V>,
        faults: &dyn FaultModel<V>,
    ) -> Option<V> {
        if !self.is_faulty {
            return honest.cloned();
        }

        faults.corrupt(&FaultContext {
            sender: self.id,
            recipient,
            round,
            relay,
            honest,
        })
    }

    pub(crate) fn receive(&mut self, round: Round, inbox: Vec<Delivery<V>>) {
        self.received.insert(round, inbox);
    }

    pub(crate) fn set_current(&mut self, value: Option<V>) {
        self.current = value;
    }

    pub(crate) fn decide(&mut self, decision: Decision<V>) {
        self.current = decision.as_value().cloned();
        self.decision = Some(decision);
    }
}
