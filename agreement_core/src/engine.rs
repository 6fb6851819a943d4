//! The Agreement Engine - public entry point for one run.

use crate::config::{EngineConfig, RelayStrategy};
use crate::context::{Phase, RoundLog, SimulationContext};
use crate::coordinator::RoundCoordinator;
use crate::oral::relay_tree_size;
use crate::participant::Participant;
use crate::resolver::{check_feasibility, consensus, DecisionResolver};
use agreement_env::{
    AgreementError, Decision, FaultModel, MessageSupplier, NoOverrides, Omission, ParticipantId,
    Value,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Who takes part in a run and what the commander proposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementSetup<V> {
    /// Number of participants
    pub n: usize,

    /// Fault bound; the protocol runs `f + 1` rounds
    pub f: usize,

    /// Id of the commander
    pub commander: ParticipantId,

    /// Value the commander is asked to propagate
    pub commander_value: V,

    /// Ids of the Byzantine participants
    #[serde(default)]
    pub faulty: BTreeSet<ParticipantId>,
}

impl<V: Value> AgreementSetup<V> {
    /// A fault-free setup with participant 0 as commander.
    pub fn new(n: usize, f: usize, commander_value: V) -> Self {
        Self {
            n,
            f,
            commander: ParticipantId(0),
            commander_value,
            faulty: BTreeSet::new(),
        }
    }

    pub fn with_commander(mut self, commander: ParticipantId) -> Self {
        self.commander = commander;
        self
    }

    pub fn with_faulty(mut self, faulty: impl IntoIterator<Item = ParticipantId>) -> Self {
        self.faulty.extend(faulty);
        self
    }

    pub fn is_faulty(&self, id: ParticipantId) -> bool {
        self.faulty.contains(&id)
    }

    /// Whether `n >= 3f + 1`.
    pub fn feasible(&self) -> bool {
        check_feasibility(self.n, self.f)
    }

    /// Checks the run parameters.
    ///
    /// # Errors
    /// `InvalidConfig` naming the first violated parameter.
    pub fn validate(&self) -> Result<(), AgreementError> {
        if self.n < 1 {
            return Err(AgreementError::invalid_config("n must be at least 1"));
        }
        if self.f >= self.n {
            return Err(AgreementError::invalid_config(format!(
                "f={} must be below n={}",
                self.f, self.n
            )));
        }
        if !self.commander.is_within(self.n) {
            return Err(AgreementError::invalid_config(format!(
                "commander {} outside [0, {})",
                self.commander, self.n
            )));
        }
        if let Some(outsider) = self.faulty.iter().find(|id| !id.is_within(self.n)) {
            return Err(AgreementError::invalid_config(format!(
                "faulty participant {} outside [0, {})",
                outsider, self.n
            )));
        }
        if self.faulty.len() > self.f {
            return Err(AgreementError::invalid_config(format!(
                "{} faulty participants exceed f={}",
                self.faulty.len(),
                self.f
            )));
        }
        Ok(())
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<V> {
    participants: Vec<Participant<V>>,
    rounds: Vec<RoundLog<V>>,
    phases: Vec<Phase>,
    feasible: bool,
    agreement_guaranteed: bool,
    consensus: Decision<V>,
    strategy: RelayStrategy,
}

impl<V: Value> Outcome<V> {
    /// Final decision of every participant.
    pub fn decisions(&self) -> BTreeMap<ParticipantId, Decision<V>> {
        self.participants
            .iter()
            .map(|p| (p.id(), p.decision().cloned().unwrap_or(Decision::Undecided)))
            .collect()
    }

    /// Decisions of loyal participants only.
    pub fn loyal_decisions(&self) -> BTreeMap<ParticipantId, Decision<V>> {
        self.participants
            .iter()
            .filter(|p| p.is_loyal())
            .map(|p| (p.id(), p.decision().cloned().unwrap_or(Decision::Undecided)))
            .collect()
    }

    pub fn decision(&self, id: ParticipantId) -> Option<&Decision<V>> {
        self.participants.get(id.index()).and_then(Participant::decision)
    }

    /// The common loyal decision, `Undecided` if loyal participants disagree.
    pub fn consensus(&self) -> &Decision<V> {
        &self.consensus
    }

    pub fn feasible(&self) -> bool {
        self.feasible
    }

    /// Whether loyal participants are guaranteed to agree.
    ///
    /// Requires a feasible setup, and flat relay only guarantees it for
    /// `f <= 1`.
    pub fn agreement_guaranteed(&self) -> bool {
        self.agreement_guaranteed
    }

    /// The relay strategy the run actually used.
    pub fn strategy(&self) -> RelayStrategy {
        self.strategy
    }

    pub fn rounds(&self) -> &[RoundLog<V>] {
        &self.rounds
    }

    pub fn participants(&self) -> &[Participant<V>] {
        &self.participants
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Total messages delivered over all rounds.
    pub fn messages_delivered(&self) -> usize {
        self.rounds.iter().map(|round| round.delivered).sum()
    }
}

/// Runs Byzantine agreement.
///
/// The engine holds no per-run state, so one engine can serve any number
/// of runs, also from several threads.
#[derive(Clone)]
pub struct AgreementEngine<V> {
    config: EngineConfig,
    faults: Arc<dyn FaultModel<V>>,
}

impl<V: Value> AgreementEngine<V> {
    /// Creates an engine whose faulty participants stay silent.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            faults: Arc::new(Omission),
        }
    }

    /// Replaces the behaviour of faulty participants.
    pub fn with_fault_model(mut self, faults: impl FaultModel<V> + 'static) -> Self {
        self.faults = Arc::new(faults);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the protocol with generated messages only.
    pub fn run(&self, setup: &AgreementSetup<V>) -> Result<Outcome<V>, AgreementError> {
        self.run_with_supplier(setup, &NoOverrides)
    }

    /// Runs the protocol, letting `supplier` replace any inbox.
    ///
    /// # Errors
    /// - `InvalidConfig` if `setup` is invalid or pinned oral-messages relay
    ///   is too large for `max_relay_paths`
    /// - `MalformedMessage` if `supplier` returns an unusable inbox
    pub fn run_with_supplier(
        &self,
        setup: &AgreementSetup<V>,
        supplier: &dyn MessageSupplier<V>,
    ) -> Result<Outcome<V>, AgreementError> {
        setup.validate()?;

        let feasible = setup.feasible();
        let strategy = self.config.relay_for(setup.n, setup.f);
        let guaranteed = feasible && (strategy == RelayStrategy::OralMessages || setup.f <= 1);
        if !feasible {
            warn!(
                "n={} cannot tolerate f={} faults (needs n >= {}), ties stay undecided",
                setup.n,
                setup.f,
                3 * setup.f + 1
            );
        } else if !guaranteed {
            warn!(
                "flat relay with n={} f={} does not guarantee agreement (relay tree: {} entries)",
                setup.n,
                setup.f,
                relay_tree_size(setup.n, setup.f)
            );
        }

        let mut ctx = SimulationContext::new(
            setup.n,
            setup.f,
            setup.commander,
            &setup.commander_value,
            |id| setup.is_faulty(id),
        )?;

        if setup.n == 1 {
            ctx.enter(Phase::Done);
            ctx.participants[0].decide(Decision::Value(setup.commander_value.clone()));
            return Ok(Self::finish(ctx, feasible, guaranteed, strategy));
        }

        let resolver = DecisionResolver::new(
            self.config.tie_break,
            Some(setup.commander_value.clone()),
            feasible,
        );
        let mut coordinator =
            RoundCoordinator::new(&self.config, self.faults.as_ref(), &resolver, &ctx)?;
        coordinator.run(&mut ctx, supplier)?;
        ctx.enter(Phase::Done);

        let outcome = Self::finish(ctx, feasible, guaranteed, strategy);
        info!(
            "agreement n={} f={} strategy={}: consensus {:?} after {} messages",
            setup.n,
            setup.f,
            strategy,
            outcome.consensus(),
            outcome.messages_delivered()
        );
        Ok(outcome)
    }

    fn finish(
        ctx: SimulationContext<V>,
        feasible: bool,
        agreement_guaranteed: bool,
        strategy: RelayStrategy,
    ) -> Outcome<V> {
        let (participants, rounds, phases) = ctx.into_parts();
        let consensus = consensus(&participants);
        Outcome {
            participants,
            rounds,
            phases,
            feasible,
            agreement_guaranteed,
            consensus,
            strategy,
        }
    }
}

impl<V: Value> Default for AgreementEngine<V> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TieBreak;
    use agreement_env::{Delivery, Equivocate, FaultContext, MessageTable, Round};
    use proptest::prelude::*;

    const ATTACK: &str = "Attack";
    const RETREAT: &str = "Retreat";

    fn equivocating() -> AgreementEngine<&'static str> {
        AgreementEngine::default().with_fault_model(Equivocate::new([ATTACK, RETREAT]))
    }

    fn flat() -> EngineConfig {
        EngineConfig::default().with_strategy(RelayStrategy::Flat)
    }

    /// Traitors tell participants 0..=2 to attack and everyone else to retreat.
    fn split_brain(ctx: &FaultContext<'_, &'static str>) -> Option<&'static str> {
        Some(if ctx.recipient.index() <= 2 { ATTACK } else { RETREAT })
    }

    #[test]
    fn test_loyal_army_attacks() {
        let outcome = equivocating().run(&AgreementSetup::new(4, 1, ATTACK)).unwrap();

        assert!(outcome.feasible());
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
        assert!(outcome.decisions().values().all(|d| d == &Decision::Value(ATTACK)));
        assert_eq!(outcome.rounds().len(), 2);
    }

    #[test]
    fn test_traitor_lieutenant_is_outvoted() {
        let setup = AgreementSetup::new(4, 1, ATTACK).with_faulty([ParticipantId(3)]);
        let outcome = equivocating().run(&setup).unwrap();

        let loyal = outcome.loyal_decisions();
        assert_eq!(loyal.len(), 3);
        assert!(loyal.values().all(|d| d == &Decision::Value(ATTACK)));
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
    }

    #[test]
    fn test_traitor_commander_with_three_participants() {
        let setup = AgreementSetup::new(3, 1, ATTACK).with_faulty([ParticipantId(0)]);
        let outcome = equivocating().run(&setup).unwrap();

        assert!(!outcome.feasible());
        assert_eq!(outcome.consensus(), &Decision::Undecided);
        assert_eq!(outcome.decision(ParticipantId(1)), Some(&Decision::Undecided));
        assert_eq!(outcome.decision(ParticipantId(2)), Some(&Decision::Undecided));
    }

    #[test]
    fn test_large_army_with_two_traitors() {
        let setup = AgreementSetup::new(1000, 2, RETREAT)
            .with_faulty([ParticipantId(17), ParticipantId(503)]);
        let engine = AgreementEngine::new(EngineConfig::default().with_message_log(false))
            .with_fault_model(Equivocate::new([ATTACK, RETREAT]));
        let outcome = engine.run(&setup).unwrap();

        // The oral-messages tree would not fit, so the run falls back to flat
        assert_eq!(outcome.strategy(), RelayStrategy::Flat);
        assert!(outcome.feasible());
        assert!(!outcome.agreement_guaranteed());
        assert_eq!(outcome.rounds().len(), 3);
        assert!(outcome.rounds().iter().all(|round| round.messages.is_empty()));
        assert_eq!(outcome.loyal_decisions().len(), 998);
        assert_eq!(outcome.consensus(), &Decision::Value(RETREAT));
        // Traitors lie when sending but still tally honestly what they hear
        assert!(outcome.decisions().values().all(|d| d == &Decision::Value(RETREAT)));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let setup = AgreementSetup::new(10, 3, 1u8)
            .with_commander(ParticipantId(4))
            .with_faulty([ParticipantId(4), ParticipantId(6)]);
        let engine = AgreementEngine::new(EngineConfig::default().with_parallel_threshold(2))
            .with_fault_model(seeded(7));

        let first = engine.run(&setup).unwrap();
        let second = engine.run(&setup).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_participant_decides_immediately() {
        let outcome = equivocating().run(&AgreementSetup::new(1, 0, ATTACK)).unwrap();

        assert_eq!(outcome.phases(), &[Phase::Init, Phase::Done]);
        assert!(outcome.rounds().is_empty());
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
    }

    #[test]
    fn test_phase_sequence() {
        let outcome = equivocating().run(&AgreementSetup::new(7, 2, ATTACK)).unwrap();
        let names: Vec<String> = outcome.phases().iter().map(Phase::to_string).collect();
        assert_eq!(names, ["INIT", "ROUND_1", "ROUND_2", "ROUND_3", "RESOLVE", "DONE"]);
    }

    #[test]
    fn test_invalid_setups() {
        let engine = equivocating();
        let cases = vec![
            AgreementSetup::new(0, 0, ATTACK),
            AgreementSetup::new(3, 3, ATTACK),
            AgreementSetup::new(4, 1, ATTACK).with_commander(ParticipantId(4)),
            AgreementSetup::new(4, 1, ATTACK).with_faulty([ParticipantId(7)]),
            AgreementSetup::new(4, 1, ATTACK).with_faulty([ParticipantId(1), ParticipantId(2)]),
        ];

        for setup in cases {
            let err = engine.run(&setup).unwrap_err();
            assert!(err.is_invalid_config(), "expected invalid config for {:?}", setup);
        }
    }

    #[test]
    fn test_oral_messages_too_large() {
        let config = EngineConfig::default()
            .with_strategy(RelayStrategy::OralMessages)
            .with_max_relay_paths(100);
        let engine = AgreementEngine::<&str>::new(config);

        let err = engine.run(&AgreementSetup::new(7, 2, ATTACK)).unwrap_err();
        assert!(err.is_invalid_config());

        let unpinned =
            AgreementEngine::<&str>::new(EngineConfig::default().with_max_relay_paths(100));
        let outcome = unpinned.run(&AgreementSetup::new(7, 2, ATTACK)).unwrap();
        assert_eq!(outcome.strategy(), RelayStrategy::Flat);
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
    }

    #[test]
    fn test_split_brain_traitors_cannot_divide_the_army() {
        let setup =
            AgreementSetup::new(7, 2, ATTACK).with_faulty([ParticipantId(0), ParticipantId(6)]);

        let outcome = AgreementEngine::default()
            .with_fault_model(split_brain)
            .run(&setup)
            .unwrap();
        assert_eq!(outcome.strategy(), RelayStrategy::OralMessages);
        assert!(outcome.agreement_guaranteed());
        assert_eq!(outcome.loyal_decisions().len(), 5);
        assert_eq!(outcome.consensus(), &Decision::Value(RETREAT));

        // Flat relay keeps 1 and 2 attacking while 3, 4 and 5 retreat
        let outcome = AgreementEngine::new(flat())
            .with_fault_model(split_brain)
            .run(&setup)
            .unwrap();
        assert!(outcome.feasible());
        assert!(!outcome.agreement_guaranteed());
        assert_eq!(outcome.decision(ParticipantId(1)), Some(&Decision::Value(ATTACK)));
        assert_eq!(outcome.decision(ParticipantId(3)), Some(&Decision::Value(RETREAT)));
        assert_eq!(outcome.consensus(), &Decision::Undecided);
    }

    #[test]
    fn test_single_fault_flat_relay_still_guarantees_agreement() {
        let setup = AgreementSetup::new(4, 1, ATTACK).with_faulty([ParticipantId(0)]);
        let outcome = AgreementEngine::new(flat())
            .with_fault_model(split_brain)
            .run(&setup)
            .unwrap();

        assert!(outcome.agreement_guaranteed());
        assert!(!outcome.consensus().is_undecided());
    }

    #[test]
    fn test_malformed_override_aborts_run() {
        let table = MessageTable::new().with(
            ParticipantId(2),
            Round(1),
            vec![Delivery::new(ParticipantId(12), RETREAT)],
        );
        let err = equivocating()
            .run_with_supplier(&AgreementSetup::new(4, 1, ATTACK), &table)
            .unwrap_err();

        assert_eq!(
            err,
            AgreementError::malformed(Round(1), ParticipantId(2), "sender 12 outside [0, 4)")
        );
    }

    #[test]
    fn test_relay_chain_member_out_of_range() {
        let table = MessageTable::new().with(
            ParticipantId(1),
            Round(2),
            vec![Delivery::relayed(ParticipantId(2), ATTACK, vec![ParticipantId(9)])],
        );
        let engine = AgreementEngine::new(
            EngineConfig::default().with_strategy(RelayStrategy::OralMessages),
        );
        let err = engine
            .run_with_supplier(&AgreementSetup::new(4, 1, ATTACK), &table)
            .unwrap_err();

        assert_eq!(
            err,
            AgreementError::malformed(Round(2), ParticipantId(1), "relay member 9 outside [0, 4)")
        );
    }

    #[test]
    fn test_scripted_traitor_commander() {
        // The traitor commander tells each lieutenant something different;
        // the relay round still brings the loyal lieutenants together.
        let table = MessageTable::new()
            .with(ParticipantId(1), Round(1), vec![Delivery::new(ParticipantId(0), ATTACK)])
            .with(ParticipantId(2), Round(1), vec![Delivery::new(ParticipantId(0), RETREAT)])
            .with(ParticipantId(3), Round(1), vec![Delivery::new(ParticipantId(0), ATTACK)]);
        let setup = AgreementSetup::new(4, 1, ATTACK).with_faulty([ParticipantId(0)]);

        let outcome = AgreementEngine::default().run_with_supplier(&setup, &table).unwrap();

        assert_eq!(outcome.rounds()[0].overridden, 3);
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
    }

    #[test]
    fn test_closure_supplier() {
        let silence_round_two = |_: ParticipantId, round: Round| {
            (round == Round(2)).then(Vec::<Delivery<&'static str>>::new)
        };
        let outcome = AgreementEngine::new(flat())
            .with_fault_model(Equivocate::new([ATTACK, RETREAT]))
            .run_with_supplier(&AgreementSetup::new(4, 1, ATTACK), &silence_round_two)
            .unwrap();

        assert_eq!(outcome.rounds()[1].delivered, 0);
        assert_eq!(outcome.consensus(), &Decision::Value(ATTACK));
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = equivocating().run(&AgreementSetup::new(4, 1, ATTACK)).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["consensus"], serde_json::json!({ "value": "Attack" }));
        assert_eq!(json["strategy"], "oral_messages");
        assert_eq!(json["agreement_guaranteed"], true);
        assert_eq!(json["rounds"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_setup_from_json() {
        let setup: AgreementSetup<String> = serde_json::from_str(
            r#"{ "n": 4, "f": 1, "commander": 0, "commander_value": "Attack", "faulty": [2] }"#,
        )
        .unwrap();

        assert!(setup.is_faulty(ParticipantId(2)));
        assert!(setup.validate().is_ok());
    }

    /// Adversary whose choices are a pure function of the seed and message.
    fn seeded(seed: u64) -> impl Fn(&FaultContext<'_, u8>) -> Option<u8> + Send + Sync {
        move |ctx| {
            let mut z = seed
                ^ (ctx.sender.index() as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
                ^ (ctx.recipient.index() as u64).wrapping_mul(0x517c_c1b7_2722_0a95)
                ^ (ctx.round.get() as u64).rotate_left(32);
            for id in ctx.relay {
                z = z.rotate_left(7) ^ id.index() as u64;
            }
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^= z >> 31;
            match z % 4 {
                3 => None,
                choice => Some(choice as u8),
            }
        }
    }

    fn setup_strategy(
        n: std::ops::RangeInclusive<usize>,
        max_f: usize,
    ) -> impl Strategy<Value = AgreementSetup<u8>> {
        n.prop_flat_map(move |n| {
            let f_bound = ((n - 1) / 3).min(max_f);
            (Just(n), 0..=f_bound, 0..n, 0u8..3)
        })
        .prop_flat_map(|(n, f, commander, value)| {
            (
                Just(AgreementSetup::new(n, f, value).with_commander(ParticipantId(commander))),
                proptest::sample::subsequence((0..n).collect::<Vec<_>>(), 0..=f),
            )
        })
        .prop_map(|(setup, faulty)| setup.with_faulty(faulty.into_iter().map(ParticipantId)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_flat_validity_with_loyal_commander(
            setup in setup_strategy(4..=16, 4),
            seed in any::<u64>(),
        ) {
            prop_assume!(!setup.is_faulty(setup.commander));
            let engine = AgreementEngine::new(flat()).with_fault_model(seeded(seed));
            let outcome = engine.run(&setup).unwrap();

            for decision in outcome.loyal_decisions().values() {
                prop_assert_eq!(decision, &Decision::Value(setup.commander_value));
            }
        }

        #[test]
        fn prop_flat_agreement_single_fault(
            setup in setup_strategy(4..=16, 1),
            seed in any::<u64>(),
        ) {
            let engine = AgreementEngine::new(flat()).with_fault_model(seeded(seed));
            let outcome = engine.run(&setup).unwrap();

            let loyal = outcome.loyal_decisions();
            let first = loyal.values().next().cloned();
            prop_assert!(loyal.values().all(|d| Some(d) == first.as_ref()));
            if !setup.is_faulty(setup.commander) {
                prop_assert!(!outcome.consensus().is_undecided());
            }
        }

        #[test]
        fn prop_oral_messages_agreement_and_validity(
            setup in setup_strategy(4..=10, 3),
            seed in any::<u64>(),
        ) {
            let config = EngineConfig::default()
                .with_strategy(RelayStrategy::OralMessages)
                .with_tie_break(TieBreak::Smallest);
            let engine = AgreementEngine::new(config).with_fault_model(seeded(seed));
            let outcome = engine.run(&setup).unwrap();

            let loyal = outcome.loyal_decisions();
            let first = loyal.values().next().cloned();
            prop_assert!(loyal.values().all(|d| Some(d) == first.as_ref()));

            if !setup.is_faulty(setup.commander) {
                prop_assert_eq!(outcome.consensus(), &Decision::Value(setup.commander_value));
            }
        }

        #[test]
        fn prop_default_engine_agreement_and_validity(
            setup in setup_strategy(4..=10, 3),
            seed in any::<u64>(),
        ) {
            let engine = AgreementEngine::default().with_fault_model(seeded(seed));
            let outcome = engine.run(&setup).unwrap();

            prop_assert_eq!(outcome.strategy(), RelayStrategy::OralMessages);
            prop_assert!(outcome.agreement_guaranteed());

            let loyal = outcome.loyal_decisions();
            let first = loyal.values().next().cloned();
            prop_assert!(loyal.values().all(|d| Some(d) == first.as_ref()));

            if !setup.is_faulty(setup.commander) {
                prop_assert_eq!(outcome.consensus(), &Decision::Value(setup.commander_value));
            }
        }

        #[test]
        fn prop_rounds_and_decisions_complete(
            setup in setup_strategy(2..=12, 3),
            seed in any::<u64>(),
        ) {
            let engine = AgreementEngine::default().with_fault_model(seeded(seed));
            let outcome = engine.run(&setup).unwrap();

            prop_assert_eq!(outcome.rounds().len(), setup.f + 1);
            prop_assert_eq!(outcome.decisions().len(), setup.n);
            prop_assert!(outcome.participants().iter().all(|p| p.decision().is_some()));
        }
    }
}
