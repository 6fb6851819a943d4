//! The Round Coordinator - drives the `f + 1` rounds of message exchange.
//!
//! Each round runs in three steps:
//! 1. **Generate**: every sender computes its outgoing messages from an
//!    immutable snapshot of the previous round (fanned out over rayon once
//!    `n` reaches `parallel_threshold`)
//! 2. **Assemble**: messages are grouped per recipient and caller overrides
//!    replace whole inboxes after validation
//! 3. **Deliver**: inboxes are handed to participants and logged; flat relay
//!    then updates every lieutenant's best-known value
//!
//! Round `k + 1` never starts before round `k` is fully delivered.

use crate::config::{EngineConfig, RelayStrategy};
use crate::context::{Phase, RoundLog, SimulationContext};
use crate::oral::{format_chain, OralPlan};
use crate::resolver::DecisionResolver;
use agreement_env::{
    AgreementError, Decision, Delivery, FaultModel, Message, MessageSupplier, ParticipantId,
    Round, Value,
};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Runs the message exchange of one run.
pub struct RoundCoordinator<'a, V> {
    config: &'a EngineConfig,
    faults: &'a dyn FaultModel<V>,
    resolver: &'a DecisionResolver<V>,
    oral: Option<OralPlan<V>>,
}

impl<'a, V: Value> RoundCoordinator<'a, V> {
    /// Creates a coordinator for `ctx`.
    ///
    /// # Errors
    /// `InvalidConfig` if pinned oral-messages relay would exceed
    /// `max_relay_paths`.
    pub fn new(
        config: &'a EngineConfig,
        faults: &'a dyn FaultModel<V>,
        resolver: &'a DecisionResolver<V>,
        ctx: &SimulationContext<V>,
    ) -> Result<Self, AgreementError> {
        let oral = match config.relay_for(ctx.n, ctx.f) {
            RelayStrategy::Flat => None,
            RelayStrategy::OralMessages => Some(OralPlan::new(
                ctx.n,
                ctx.f,
                ctx.commander,
                config.max_relay_paths,
            )?),
        };

        Ok(Self {
            config,
            faults,
            resolver,
            oral,
        })
    }

    /// Executes rounds `1..=f+1` and resolves every participant.
    ///
    /// Leaves `ctx` in the `Resolve` phase with all decisions set.
    pub fn run(
        &mut self,
        ctx: &mut SimulationContext<V>,
        supplier: &dyn MessageSupplier<V>,
    ) -> Result<(), AgreementError> {
        for round in Round::up_to(ctx.total_rounds()) {
            ctx.enter(if round.is_broadcast() {
                Phase::Broadcast
            } else {
                Phase::Relay(round)
            });

            let generated = self.generate(ctx, round);
            let (inboxes, overridden) = self.assemble(ctx, round, generated, supplier)?;
            self.deliver(ctx, round, inboxes, overridden);
        }

        ctx.enter(Phase::Resolve);
        self.resolve(ctx);
        Ok(())
    }

    fn generate(&self, ctx: &SimulationContext<V>, round: Round) -> Vec<Message<V>> {
        let senders: Vec<ParticipantId> = if round.is_broadcast() {
            vec![ctx.commander]
        } else {
            ctx.lieutenants().collect()
        };

        let emit = |sender: &ParticipantId| self.messages_from(ctx, *sender, round);

        if ctx.n >= self.config.parallel_threshold {
            senders.par_iter().flat_map_iter(emit).collect()
        } else {
            senders.iter().flat_map(emit).collect()
        }
    }

    fn messages_from(
        &self,
        ctx: &SimulationContext<V>,
        sender: ParticipantId,
        round: Round,
    ) -> Vec<Message<V>> {
        if let (Some(plan), false) = (&self.oral, round.is_broadcast()) {
            return plan.messages_from(ctx, sender, round, self.faults);
        }

        let participant = ctx.participant(sender);
        ctx.lieutenants()
            .filter(|recipient| *recipient != sender)
            .filter_map(|recipient| {
                participant
                    .value_to_send(round, recipient, self.faults)
                    .map(|value| Message {
                        round,
                        sender,
                        recipient,
                        value,
                        relay: Vec::new(),
                    })
            })
            .collect()
    }

    fn assemble(
        &self,
        ctx: &SimulationContext<V>,
        round: Round,
        generated: Vec<Message<V>>,
        supplier: &dyn MessageSupplier<V>,
    ) -> Result<(Vec<Vec<Delivery<V>>>, usize), AgreementError> {
        let mut inboxes: Vec<Vec<Delivery<V>>> = (0..ctx.n).map(|_| Vec::new()).collect();
        for message in generated {
            inboxes[message.recipient.index()].push(Delivery::relayed(
                message.sender,
                message.value,
                message.relay,
            ));
        }

        let mut overridden = 0;
        for recipient in (0..ctx.n).map(ParticipantId) {
            if let Some(scripted) = supplier.deliveries(recipient, round) {
                inboxes[recipient.index()] = self.validate(ctx, round, recipient, scripted)?;
                overridden += 1;
            }
        }

        Ok((inboxes, overridden))
    }

    /// Checks a scripted inbox before it replaces the generated one.
    fn validate(
        &self,
        ctx: &SimulationContext<V>,
        round: Round,
        recipient: ParticipantId,
        scripted: Vec<Delivery<V>>,
    ) -> Result<Vec<Delivery<V>>, AgreementError> {
        let malformed = |reason: String| AgreementError::malformed(round, recipient, reason);

        let mut accepted = Vec::with_capacity(scripted.len());
        for delivery in scripted {
            if !delivery.sender.is_within(ctx.n) {
                return Err(malformed(format!(
                    "sender {} outside [0, {})",
                    delivery.sender, ctx.n
                )));
            }
            if delivery.sender == recipient {
                return Err(malformed("participant cannot deliver to itself".to_string()));
            }
            if let Some(outsider) = delivery.relay.iter().find(|id| !id.is_within(ctx.n)) {
                return Err(malformed(format!(
                    "relay member {} outside [0, {})",
                    outsider, ctx.n
                )));
            }

            match &self.oral {
                None if !delivery.relay.is_empty() => {
                    return Err(malformed(
                        "relay chains require oral-messages relay".to_string(),
                    ));
                }
                None => accepted.push(delivery),
                Some(plan) => plan
                    .expand(round, recipient, delivery, &mut accepted)
                    .map_err(malformed)?,
            }
        }

        let mut seen = BTreeSet::new();
        for delivery in &accepted {
            let chain = delivery.chain();
            if !seen.insert(chain.clone()) {
                return Err(malformed(format!(
                    "duplicate delivery on chain {}",
                    format_chain(&chain)
                )));
            }
        }

        Ok(accepted)
    }

    fn deliver(
        &mut self,
        ctx: &mut SimulationContext<V>,
        round: Round,
        inboxes: Vec<Vec<Delivery<V>>>,
        overridden: usize,
    ) {
        let delivered: usize = inboxes.iter().map(Vec::len).sum();
        let messages = if self.config.record_messages {
            inboxes
                .iter()
                .enumerate()
                .flat_map(|(index, inbox)| {
                    inbox.iter().map(move |delivery| {
                        Message::from_delivery(round, ParticipantId(index), delivery)
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        for (index, inbox) in inboxes.into_iter().enumerate() {
            if let Some(plan) = self.oral.as_mut() {
                plan.record(ParticipantId(index), &inbox);
            }
            ctx.participants[index].receive(round, inbox);
        }

        // Flat relay carries the majority forward every round; oral-messages
        // relay only needs the commander's direct value as a best guess.
        let last = round.get() == ctx.total_rounds();
        if !last && (self.oral.is_none() || round.is_broadcast()) {
            let lieutenants: Vec<ParticipantId> = ctx.lieutenants().collect();
            for id in lieutenants {
                let participant = ctx.participant(id);
                let values = participant.received(round).iter().map(|d| &d.value);
                let next = self.resolver.resolve(participant, values).into_value();
                ctx.participants[id.index()].set_current(next);
            }
        }

        debug!(
            "round {} delivered {} messages ({} inboxes overridden)",
            round, delivered, overridden
        );

        ctx.rounds.push(RoundLog {
            number: round,
            messages,
            delivered,
            overridden,
        });
    }

    fn resolve(&self, ctx: &mut SimulationContext<V>) {
        let last = Round(ctx.total_rounds());

        let decisions: Vec<Decision<V>> = (0..ctx.n)
            .map(ParticipantId)
            .map(|id| {
                let participant = ctx.participant(id);
                if id == ctx.commander {
                    return Decision::from(participant.initial_value().cloned());
                }
                match &self.oral {
                    Some(plan) => plan.resolve(id, self.resolver),
                    None => {
                        let values = participant.received(last).iter().map(|d| &d.value);
                        self.resolver.resolve(participant, values)
                    }
                }
            })
            .collect();

        for (participant, decision) in ctx.participants.iter_mut().zip(decisions) {
            participant.decide(decision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TieBreak;
    use agreement_env::{Equivocate, MessageTable, NoOverrides, Omission};

    fn context(n: usize, f: usize, faulty: &[usize]) -> SimulationContext<&'static str> {
        let faulty: Vec<ParticipantId> = faulty.iter().copied().map(ParticipantId).collect();
        SimulationContext::new(n, f, ParticipantId(0), &"Attack", |id| faulty.contains(&id))
            .unwrap()
    }

    fn flat() -> EngineConfig {
        EngineConfig::default().with_strategy(RelayStrategy::Flat)
    }

    fn run(
        config: &EngineConfig,
        faults: &dyn FaultModel<&'static str>,
        ctx: &mut SimulationContext<&'static str>,
        supplier: &dyn MessageSupplier<&'static str>,
    ) -> Result<(), AgreementError> {
        let feasible = crate::resolver::check_feasibility(ctx.n, ctx.f);
        let resolver = DecisionResolver::new(config.tie_break, Some("Attack"), feasible);
        let mut coordinator = RoundCoordinator::new(config, faults, &resolver, ctx)?;
        coordinator.run(ctx, supplier)
    }

    #[test]
    fn test_runs_exactly_f_plus_one_rounds() {
        let config = EngineConfig::default();
        let mut ctx = context(7, 2, &[]);
        run(&config, &Omission, &mut ctx, &NoOverrides).unwrap();

        assert_eq!(ctx.rounds.len(), 3);
        assert_eq!(
            ctx.phases(),
            &[
                Phase::Init,
                Phase::Broadcast,
                Phase::Relay(Round(2)),
                Phase::Relay(Round(3)),
                Phase::Resolve
            ]
        );
    }

    #[test]
    fn test_round_message_counts() {
        let config = flat();
        let mut ctx = context(4, 1, &[]);
        run(&config, &Omission, &mut ctx, &NoOverrides).unwrap();

        // Commander to 3 lieutenants, then 3 x 2 relays
        assert_eq!(ctx.rounds[0].delivered, 3);
        assert_eq!(ctx.rounds[1].delivered, 6);
        assert_eq!(ctx.rounds[1].messages.len(), 6);
        assert!(ctx.rounds[1].messages.iter().all(|m| m.sender != ParticipantId(0)));
    }

    #[test]
    fn test_omitting_traitor_leaves_gaps() {
        let config = flat();
        let mut ctx = context(4, 1, &[3]);
        run(&config, &Omission, &mut ctx, &NoOverrides).unwrap();

        let inbox = ctx.participant(ParticipantId(1)).received(Round(2));
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender, ParticipantId(2));
        assert_eq!(
            ctx.participant(ParticipantId(1)).decision(),
            Some(&Decision::Value("Attack"))
        );
    }

    #[test]
    fn test_message_log_can_be_disabled() {
        let config = flat().with_message_log(false);
        let mut ctx = context(4, 1, &[]);
        run(&config, &Omission, &mut ctx, &NoOverrides).unwrap();

        assert!(ctx.rounds.iter().all(|round| round.messages.is_empty()));
        assert_eq!(ctx.rounds[1].delivered, 6);
    }

    #[test]
    fn test_override_replaces_inbox() {
        let config = flat().with_tie_break(TieBreak::Strict);
        let table = MessageTable::new().with(
            ParticipantId(1),
            Round(2),
            vec![
                Delivery::new(ParticipantId(2), "Retreat"),
                Delivery::new(ParticipantId(3), "Retreat"),
            ],
        );
        let mut ctx = context(4, 1, &[]);
        run(&config, &Omission, &mut ctx, &table).unwrap();

        assert_eq!(ctx.rounds[1].overridden, 1);
        assert_eq!(
            ctx.participant(ParticipantId(1)).decision(),
            Some(&Decision::Value("Retreat"))
        );
        assert_eq!(
            ctx.participant(ParticipantId(2)).decision(),
            Some(&Decision::Value("Attack"))
        );
    }

    #[test]
    fn test_malformed_overrides() {
        let config = flat();
        let cases: Vec<Vec<Delivery<&'static str>>> = vec![
            vec![Delivery::new(ParticipantId(9), "Attack")],
            vec![Delivery::new(ParticipantId(1), "Attack")],
            vec![
                Delivery::new(ParticipantId(2), "Attack"),
                Delivery::new(ParticipantId(2), "Retreat"),
            ],
            vec![Delivery::relayed(ParticipantId(2), "Attack", vec![ParticipantId(0)])],
        ];

        for deliveries in cases {
            let table = MessageTable::new().with(ParticipantId(1), Round(2), deliveries);
            let mut ctx = context(4, 1, &[]);
            let err = run(&config, &Omission, &mut ctx, &table).unwrap_err();
            assert!(err.is_malformed(), "expected malformed, got {:?}", err);
        }
    }

    #[test]
    fn test_parallel_generation_matches_serial() {
        let equivocate = Equivocate::new(["Attack", "Retreat", "Hold"]);

        let serial = EngineConfig::default().with_parallel_threshold(usize::MAX);
        let mut serial_ctx = context(10, 3, &[0, 4, 7]);
        run(&serial, &equivocate, &mut serial_ctx, &NoOverrides).unwrap();

        let parallel = EngineConfig::default().with_parallel_threshold(1);
        let mut parallel_ctx = context(10, 3, &[0, 4, 7]);
        run(&parallel, &equivocate, &mut parallel_ctx, &NoOverrides).unwrap();

        assert_eq!(serial_ctx.rounds, parallel_ctx.rounds);
        assert_eq!(serial_ctx.participants, parallel_ctx.participants);
    }

    #[test]
    fn test_unpinned_strategy_relays_chains_when_tree_fits() {
        let mut ctx = context(7, 2, &[]);
        run(&EngineConfig::default(), &Omission, &mut ctx, &NoOverrides).unwrap();
        assert_eq!(ctx.rounds[2].delivered, 6 * 5 * 4);

        let tight = EngineConfig::default().with_max_relay_paths(100);
        let mut ctx = context(7, 2, &[]);
        run(&tight, &Omission, &mut ctx, &NoOverrides).unwrap();
        assert_eq!(ctx.rounds[2].delivered, 30);
    }

    #[test]
    fn test_oral_messages_chains_in_log() {
        let config = EngineConfig::default().with_strategy(RelayStrategy::OralMessages);
        let mut ctx = context(7, 2, &[]);
        run(&config, &Omission, &mut ctx, &NoOverrides).unwrap();

        // Round 2: 6 lieutenants relay [0] to 5 others
        assert_eq!(ctx.rounds[1].delivered, 30);
        // Round 3: 30 chains [0, x], each relayed by 5 lieutenants... to 4 others
        assert_eq!(ctx.rounds[2].delivered, 6 * 5 * 4);
        assert!(ctx.rounds[2].messages.iter().all(|m| m.relay.len() == 2));
        assert!(ctx
            .participants
            .iter()
            .all(|p| p.decision() == Some(&Decision::Value("Attack"))));
    }
}
