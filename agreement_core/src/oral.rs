//! Oral-messages relay: the recursive OM(f) exchange over sender chains.
//!
//! Every value a lieutenant holds is keyed by the chain of senders it came
//! through, commander first. In round `k` each lieutenant relays every
//! chain of length `k - 1` that does not already contain it, to every
//! lieutenant not on the chain. Resolution walks the resulting tree bottom
//! up:
//!
//! ```text
//! resolve(σ) = val(σ)                                     if |σ| = f + 1
//!            = majority(val(σ), resolve(σ·j) for j ∉ σ)   otherwise
//! ```
//!
//! An entry that never arrived is an explicit absent ballot, so a loyal
//! relayer holding nothing is outvoted exactly like one holding a value.
//! The tree has `Σ (n-1)(n-2)...` entries per participant, which is why the
//! plan is sized up front against `max_relay_paths`.

use crate::context::SimulationContext;
use crate::resolver::DecisionResolver;
use agreement_env::{
    AgreementError, Decision, Delivery, FaultModel, Message, ParticipantId, Round, Value,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tree sizes above this get a warning.
const LARGE_TREE: usize = 100_000;

/// Number of tree entries all `n` participants hold for fault bound `f`.
pub fn relay_tree_size(n: usize, f: usize) -> usize {
    let mut level = 1usize;
    let mut total = 1usize;
    for length in 1..=f {
        level = level.saturating_mul(n.saturating_sub(length));
        total = total.saturating_add(level);
    }
    total.saturating_mul(n)
}

/// Renders a chain as `0->2->5`.
pub(crate) fn format_chain(chain: &[ParticipantId]) -> String {
    chain
        .iter()
        .map(ParticipantId::to_string)
        .collect::<Vec<_>>()
        .join("->")
}

/// Relay chains of one run plus what every lieutenant holds for them.
pub(crate) struct OralPlan<V> {
    n: usize,
    f: usize,
    commander: ParticipantId,

    /// `levels[l - 1]` holds every relayable chain of length `l`
    levels: Vec<Vec<Vec<ParticipantId>>>,

    /// Per participant: chain -> value received along it
    trees: Vec<BTreeMap<Vec<ParticipantId>, V>>,
}

impl<V: Value> OralPlan<V> {
    /// Sizes and builds the chain levels.
    ///
    /// # Errors
    /// `InvalidConfig` if the tree exceeds `max_relay_paths`.
    pub fn new(
        n: usize,
        f: usize,
        commander: ParticipantId,
        max_relay_paths: usize,
    ) -> Result<Self, AgreementError> {
        let required = relay_tree_size(n, f);
        if required > max_relay_paths {
            return Err(AgreementError::invalid_config(format!(
                "oral-messages relay for n={} f={} needs {} tree entries, above max_relay_paths {}",
                n, f, required, max_relay_paths
            )));
        }
        if required > LARGE_TREE {
            warn!("oral-messages relay tree has {} entries (n={}, f={})", required, n, f);
        }

        let mut levels: Vec<Vec<Vec<ParticipantId>>> = Vec::with_capacity(f);
        if f > 0 {
            levels.push(vec![vec![commander]]);
        }
        for _ in 1..f {
            let next: Vec<Vec<ParticipantId>> = levels
                .last()
                .map(|chains| {
                    chains
                        .iter()
                        .flat_map(|chain| {
                            (0..n)
                                .map(ParticipantId)
                                .filter(move |id| !chain.contains(id))
                                .map(move |id| {
                                    let mut extended = chain.clone();
                                    extended.push(id);
                                    extended
                                })
                        })
                        .collect()
                })
                .unwrap_or_default();
            levels.push(next);
        }

        debug!("oral-messages plan: {} levels, {} tree entries", levels.len(), required);

        Ok(Self {
            n,
            f,
            commander,
            levels,
            trees: (0..n).map(|_| BTreeMap::new()).collect(),
        })
    }

    fn lieutenants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        (0..self.n)
            .map(ParticipantId)
            .filter(move |id| *id != self.commander)
    }

    fn chains(&self, length: usize) -> &[Vec<ParticipantId>] {
        length
            .checked_sub(1)
            .and_then(|index| self.levels.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Value `id` holds for `chain`.
    pub fn held(&self, id: ParticipantId, chain: &[ParticipantId]) -> Option<&V> {
        self.trees[id.index()].get(chain)
    }

    /// Relay messages `sender` emits in `round` (rounds 2..=f+1).
    pub fn messages_from(
        &self,
        ctx: &SimulationContext<V>,
        sender: ParticipantId,
        round: Round,
        faults: &dyn FaultModel<V>,
    ) -> Vec<Message<V>> {
        let participant = ctx.participant(sender);
        let mut messages = Vec::new();

        let chains = self.chains(round.get() as usize - 1);
        for chain in chains.iter().filter(|chain| !chain.contains(&sender)) {
            let held = self.held(sender, chain);

            for recipient in self.lieutenants() {
                if recipient == sender || chain.contains(&recipient) {
                    continue;
                }
                let relayed = participant.relay_value(round, recipient, chain, held, faults);
                if let Some(value) = relayed {
                    messages.push(Message {
                        round,
                        sender,
                        recipient,
                        value,
                        relay: chain.clone(),
                    });
                }
            }
        }

        messages
    }

    /// Checks a scripted delivery and appends the tree entries it stands for.
    ///
    /// A relay-round delivery without a chain covers every chain `sender`
    /// relays to `recipient` this round.
    pub fn expand(
        &self,
        round: Round,
        recipient: ParticipantId,
        delivery: Delivery<V>,
        accepted: &mut Vec<Delivery<V>>,
    ) -> Result<(), String> {
        if round.is_broadcast() {
            if delivery.sender != self.commander {
                return Err(format!(
                    "only the commander sends in round 1, got sender {}",
                    delivery.sender
                ));
            }
            if !delivery.relay.is_empty() {
                return Err("round 1 deliveries cannot carry a relay chain".to_string());
            }
            accepted.push(delivery);
            return Ok(());
        }

        if delivery.sender == self.commander {
            return Err("the commander does not relay".to_string());
        }

        let length = round.get() as usize - 1;
        if delivery.relay.is_empty() {
            for chain in self
                .chains(length)
                .iter()
                .filter(|chain| !chain.contains(&delivery.sender) && !chain.contains(&recipient))
            {
                accepted.push(Delivery::relayed(
                    delivery.sender,
                    delivery.value.clone(),
                    chain.clone(),
                ));
            }
            return Ok(());
        }

        let chain = &delivery.relay;
        if chain.len() != length {
            return Err(format!(
                "chain {} has length {}, round {} relays chains of length {}",
                format_chain(chain),
                chain.len(),
                round,
                length
            ));
        }
        if chain[0] != self.commander {
            return Err(format!("chain {} does not start at the commander", format_chain(chain)));
        }
        let repeats = chain
            .iter()
            .enumerate()
            .any(|(i, id)| chain[..i].contains(id));
        if repeats || chain.contains(&delivery.sender) || chain.contains(&recipient) {
            return Err(format!(
                "chain {} cannot be relayed by {} to {}",
                format_chain(chain),
                delivery.sender,
                recipient
            ));
        }

        accepted.push(delivery);
        Ok(())
    }

    /// Stores what `recipient` received this round in its tree.
    pub fn record(&mut self, recipient: ParticipantId, inbox: &[Delivery<V>]) {
        if recipient == self.commander {
            return;
        }
        let tree = &mut self.trees[recipient.index()];
        for delivery in inbox {
            tree.insert(delivery.chain(), delivery.value.clone());
        }
    }

    /// Final decision of lieutenant `id`.
    pub fn resolve(&self, id: ParticipantId, resolver: &DecisionResolver<V>) -> Decision<V> {
        let mut chain = vec![self.commander];
        Decision::from(self.resolve_chain(id, &mut chain, resolver))
    }

    fn resolve_chain(
        &self,
        id: ParticipantId,
        chain: &mut Vec<ParticipantId>,
        resolver: &DecisionResolver<V>,
    ) -> Option<V> {
        let own = self.held(id, chain).cloned();
        if chain.len() == self.f + 1 {
            return own;
        }

        let mut ballots = Vec::with_capacity(self.n);
        ballots.push(own);
        for other in self.lieutenants() {
            if other == id || chain.contains(&other) {
                continue;
            }
            chain.push(other);
            ballots.push(self.resolve_chain(id, chain, resolver));
            chain.pop();
        }

        resolver.tally(ballots.iter().map(Option::as_ref)).into_value()
    }
}
