//! Scenario runner - executes agreement scenarios against the oracle.

use crate::adversary::SeededAdversary;
use crate::context::SimContext;
use crate::exporter::RunExport;
use crate::oracle::{PropertyOracle, Violation};
use crate::order::Order;
use crate::scenarios::ScenarioId;

use agreement_core::{
    relay_tree_size, AgreementEngine, AgreementSetup, EngineConfig, Outcome, RelayStrategy,
};
use agreement_env::{Decision, Equivocate, Omission, ParticipantId};
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Armies from this size on run without a message log.
const LOG_LIMIT: usize = 100;

/// Largest oral-messages tree the sweep will pick.
const SWEEP_TREE_LIMIT: usize = 20_000;

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether every run met its expectation
    pub passed: bool,

    /// Consensus of the last run
    pub consensus: Option<Decision<Order>>,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Guaranteed properties that were broken
    pub violations: Vec<Violation>,

    /// Metrics collected during the scenario
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioMetrics {
    /// Engine runs executed
    pub runs: usize,

    /// Messages delivered
    pub delivered: usize,

    /// Messages withheld by traitors
    pub omitted: usize,

    /// Loyal participants left undecided
    pub undecided: usize,

    /// Loyal participants
    pub loyal: usize,

    /// Faulty participants
    pub faulty: usize,
}

impl ScenarioMetrics {
    fn record(&mut self, setup: &AgreementSetup<Order>, outcome: &Outcome<Order>) {
        let loyal = outcome.loyal_decisions();
        let delivered = outcome.messages_delivered();
        let expected = expected_messages(setup.n, setup.f, outcome.strategy());

        self.runs += 1;
        self.delivered += delivered;
        self.omitted += expected.saturating_sub(delivered);
        self.undecided += loyal.values().filter(|d| d.is_undecided()).count();
        self.loyal += loyal.len();
        self.faulty += setup.faulty.len();
    }
}

/// Messages a run sends when nobody withholds anything.
fn expected_messages(n: usize, f: usize, strategy: RelayStrategy) -> usize {
    if n < 2 {
        return 0;
    }
    let lieutenants = n - 1;
    let mut total = lieutenants;
    let mut chains = 1usize;

    for round in 2..=f + 1 {
        match strategy {
            RelayStrategy::Flat => {
                total = total.saturating_add(lieutenants * (lieutenants - 1));
            }
            RelayStrategy::OralMessages => {
                let senders = n.saturating_sub(round - 1);
                let sent = chains
                    .saturating_mul(senders)
                    .saturating_mul(senders.saturating_sub(1));
                total = total.saturating_add(sent);
                chains = chains.saturating_mul(senders);
            }
        }
    }
    total
}

/// How faulty participants behave in a trial.
#[derive(Debug, Clone, Copy)]
enum Adversary {
    /// Domain value picked by recipient and round
    Equivocate,

    /// Seeded random values, withholding at the given rate
    Seeded { omission_rate: f64 },

    /// Never send
    Silent,
}

/// What a trial must produce to pass.
#[derive(Debug, Clone)]
enum Expectation {
    /// This exact consensus
    Consensus(Decision<Order>),

    /// Loyal participants agree on a definite value
    Decided,

    /// Only the guaranteed properties hold
    Guarantees,
}

/// One engine run of a scenario.
#[derive(Debug, Clone)]
struct Trial {
    ctx: SimContext,
    setup: AgreementSetup<Order>,
    /// Pinned relay strategy, `None` leaves the choice to the engine
    strategy: Option<RelayStrategy>,
    adversary: Adversary,
    expectation: Expectation,
}

/// Runs agreement scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Army size for the scalable scenarios
    army: usize,

    /// Engine runs in a sweep
    sweep_runs: usize,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            army: 10,
            sweep_runs: 16,
        }
    }

    /// Sets the army size (at least 4).
    pub fn with_army(mut self, army: usize) -> Self {
        self.army = army.max(4);
        self
    }

    /// Sets the number of runs of a sweep.
    pub fn with_sweep_runs(mut self, runs: usize) -> Self {
        self.sweep_runs = runs.max(1);
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_recorded(scenario).0
    }

    /// Runs a scenario and also captures its last engine run.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, Option<RunExport<Order>>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        let ctx = SimContext::new(self.seed);

        let trials = match scenario {
            ScenarioId::LoyalArmy => self.loyal_army(ctx),
            ScenarioId::TraitorLieutenant => self.traitor_lieutenant(ctx),
            ScenarioId::TraitorCommander => self.traitor_commander(ctx),
            ScenarioId::SplitCommander => self.split_commander(ctx),
            ScenarioId::LargeArmy => self.large_army(ctx),
            ScenarioId::SilentTraitors => self.silent_traitors(ctx),
            ScenarioId::OralMessages => self.oral_messages(ctx),
            ScenarioId::RandomSweep => self.random_sweep(ctx),
        };

        self.execute(scenario, trials)
    }

    /// BA-001: LoyalArmy - no traitors, everyone follows the commander.
    fn loyal_army(&self, ctx: SimContext) -> Vec<Trial> {
        vec![Trial {
            ctx,
            setup: AgreementSetup::new(4, 1, Order::Attack),
            strategy: None,
            adversary: Adversary::Equivocate,
            expectation: Expectation::Consensus(Decision::Value(Order::Attack)),
        }]
    }

    /// BA-002: TraitorLieutenant - the lone traitor is outvoted.
    fn traitor_lieutenant(&self, ctx: SimContext) -> Vec<Trial> {
        vec![Trial {
            ctx,
            setup: AgreementSetup::new(4, 1, Order::Attack).with_faulty([ParticipantId(3)]),
            strategy: None,
            adversary: Adversary::Equivocate,
            expectation: Expectation::Consensus(Decision::Value(Order::Attack)),
        }]
    }

    /// BA-003: TraitorCommander - three generals cannot beat one traitor.
    fn traitor_commander(&self, ctx: SimContext) -> Vec<Trial> {
        vec![Trial {
            ctx,
            setup: AgreementSetup::new(3, 1, Order::Attack).with_faulty([ParticipantId(0)]),
            strategy: None,
            adversary: Adversary::Equivocate,
            expectation: Expectation::Consensus(Decision::Undecided),
        }]
    }

    /// BA-004: SplitCommander - four generals reconcile a lying commander.
    fn split_commander(&self, ctx: SimContext) -> Vec<Trial> {
        vec![Trial {
            ctx,
            setup: AgreementSetup::new(4, 1, Order::Attack).with_faulty([ParticipantId(0)]),
            strategy: None,
            adversary: Adversary::Seeded { omission_rate: 0.0 },
            expectation: Expectation::Decided,
        }]
    }

    /// BA-005: LargeArmy - 1000 generals, two traitors among the lieutenants.
    fn large_army(&self, ctx: SimContext) -> Vec<Trial> {
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.setup_seed());
        let order = random_order(&mut rng);
        let traitors = index::sample(&mut rng, 999, 2)
            .into_iter()
            .map(|i| ParticipantId(i + 1));

        vec![Trial {
            ctx,
            setup: AgreementSetup::new(1000, 2, order).with_faulty(traitors),
            strategy: None,
            adversary: Adversary::Seeded { omission_rate: 0.2 },
            expectation: Expectation::Consensus(Decision::Value(order)),
        }]
    }

    /// BA-006: SilentTraitors - as many traitors as tolerated, none of them talk.
    fn silent_traitors(&self, ctx: SimContext) -> Vec<Trial> {
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.setup_seed());
        let n = self.army;
        let f = (n - 1) / 3;
        let order = random_order(&mut rng);
        let traitors = index::sample(&mut rng, n - 1, f)
            .into_iter()
            .map(|i| ParticipantId(i + 1));

        vec![Trial {
            ctx,
            setup: AgreementSetup::new(n, f, order).with_faulty(traitors),
            strategy: None,
            adversary: Adversary::Silent,
            expectation: Expectation::Consensus(Decision::Value(order)),
        }]
    }

    /// BA-007: OralMessages - OM(2) with a traitor commander and lieutenant.
    fn oral_messages(&self, ctx: SimContext) -> Vec<Trial> {
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.setup_seed());
        let lieutenant = ParticipantId(rng.gen_range(1..7));

        vec![Trial {
            ctx,
            setup: AgreementSetup::new(7, 2, Order::Attack)
                .with_faulty([ParticipantId(0), lieutenant]),
            strategy: Some(RelayStrategy::OralMessages),
            adversary: Adversary::Seeded { omission_rate: 0.1 },
            expectation: Expectation::Guarantees,
        }]
    }

    /// BA-008: RandomSweep - random setups, only the guarantees are checked.
    fn random_sweep(&self, ctx: SimContext) -> Vec<Trial> {
        (0..self.sweep_runs as u64)
            .map(|i| {
                let ctx = ctx.derive(i);
                let mut rng = ChaCha8Rng::seed_from_u64(ctx.setup_seed());

                let n = rng.gen_range(4..=self.army);
                // Mostly feasible, sometimes past the 3f + 1 bound
                let f_max = if rng.gen_bool(0.2) { (n - 1) / 2 } else { (n - 1) / 3 };
                let f = rng.gen_range(0..=f_max);
                let commander = ParticipantId(rng.gen_range(0..n));
                let traitors = rng.gen_range(0..=f);
                let faulty = index::sample(&mut rng, n, traitors).into_iter().map(ParticipantId);

                // Pin flat relay for some runs, leave the choice to the engine otherwise
                let strategy = if relay_tree_size(n, f) <= SWEEP_TREE_LIMIT && rng.gen_bool(0.5) {
                    None
                } else {
                    Some(RelayStrategy::Flat)
                };

                Trial {
                    ctx,
                    setup: AgreementSetup::new(n, f, random_order(&mut rng))
                        .with_commander(commander)
                        .with_faulty(faulty),
                    strategy,
                    adversary: Adversary::Seeded {
                        omission_rate: rng.gen_range(0.0..0.5),
                    },
                    expectation: Expectation::Guarantees,
                }
            })
            .collect()
    }

    fn execute(
        &self,
        scenario: ScenarioId,
        trials: Vec<Trial>,
    ) -> (ScenarioResult, Option<RunExport<Order>>) {
        let mut result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed: true,
            consensus: None,
            failure_reason: None,
            violations: Vec::new(),
            metrics: ScenarioMetrics::default(),
        };
        let mut export = None;

        for trial in trials {
            let outcome = match trial.engine().run(&trial.setup) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        "{}: engine rejected n={} f={}: {}",
                        scenario.name(),
                        trial.setup.n,
                        trial.setup.f,
                        e
                    );
                    result.passed = false;
                    result.failure_reason = Some(e.to_string());
                    return (result, export);
                }
            };

            result.metrics.record(&trial.setup, &outcome);
            debug!(
                "{}: n={} f={} commander={} faulty={:?} strategy={} -> {:?}",
                scenario.name(),
                trial.setup.n,
                trial.setup.f,
                trial.setup.commander,
                trial.setup.faulty,
                outcome.strategy(),
                outcome.consensus()
            );

            let violations = PropertyOracle::new(&trial.setup).check_guaranteed(&outcome);
            let failure = trial.judge(&outcome, &violations);

            let mut run =
                RunExport::capture(scenario.name(), trial.ctx.seed(), &trial.setup, &outcome);
            run.finalize(failure.is_none(), violations.clone());
            export = Some(run);

            result.consensus = Some(outcome.consensus().clone());
            result.violations.extend(violations);
            if let Some(reason) = failure {
                result.passed = false;
                result.failure_reason.get_or_insert(reason);
            }
        }

        info!(
            "{}: {} runs, {} messages delivered, {} omitted, {} loyal undecided",
            scenario.name(),
            result.metrics.runs,
            result.metrics.delivered,
            result.metrics.omitted,
            result.metrics.undecided
        );

        (result, export)
    }
}

impl Trial {
    fn engine(&self) -> AgreementEngine<Order> {
        let mut config = EngineConfig::default().with_message_log(self.setup.n < LOG_LIMIT);
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        let engine = AgreementEngine::new(config);

        match self.adversary {
            Adversary::Equivocate => engine.with_fault_model(Equivocate::new(Order::ALL)),
            Adversary::Seeded { omission_rate } => engine.with_fault_model(
                SeededAdversary::new(self.ctx.adversary_seed(), Order::ALL)
                    .with_omission_rate(omission_rate),
            ),
            Adversary::Silent => engine.with_fault_model(Omission),
        }
    }

    /// Failure reason, `None` if the run met its expectation.
    fn judge(&self, outcome: &Outcome<Order>, violations: &[Violation]) -> Option<String> {
        if let Some(violation) = violations.first() {
            return Some(violation.to_string());
        }

        match &self.expectation {
            Expectation::Consensus(expected) if outcome.consensus() != expected => Some(format!(
                "consensus {} (expected {})",
                outcome.consensus(),
                expected
            )),
            Expectation::Decided if outcome.consensus().is_undecided() => {
                Some("loyal participants did not reach a decision".to_string())
            }
            _ => None,
        }
    }
}

fn random_order(rng: &mut ChaCha8Rng) -> Order {
    Order::ALL.choose(rng).copied().unwrap_or(Order::Attack)
}
