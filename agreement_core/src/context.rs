//! Per-run simulation state.

use crate::participant::Participant;
use agreement_env::{AgreementError, Message, ParticipantId, Round, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle phase of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    /// Round 1: the commander's broadcast
    Broadcast,
    /// Rounds 2..=f+1
    Relay(Round),
    Resolve,
    Done,
}

impl Phase {
    /// Returns true if `self` may directly follow `previous`.
    ///
    /// No transition skips a round. `Init -> Done` is the single-participant
    /// short circuit.
    pub fn can_follow(&self, previous: Phase) -> bool {
        match (previous, *self) {
            (Phase::Init, Phase::Broadcast | Phase::Done) => true,
            (Phase::Broadcast, Phase::Relay(round)) => round == Round(2),
            (Phase::Relay(last), Phase::Relay(round)) => round == last.next(),
            (Phase::Broadcast | Phase::Relay(_), Phase::Resolve) => true,
            (Phase::Resolve, Phase::Done) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Init => write!(f, "INIT"),
            Phase::Broadcast => write!(f, "ROUND_1"),
            Phase::Relay(round) => write!(f, "ROUND_{}", round),
            Phase::Resolve => write!(f, "RESOLVE"),
            Phase::Done => write!(f, "DONE"),
        }
    }
}

/// What was delivered in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundLog<V> {
    /// Round number
    pub number: Round,

    /// Messages actually delivered (empty when message logging is off)
    pub messages: Vec<Message<V>>,

    /// Number of delivered messages
    pub delivered: usize,

    /// Inboxes replaced by the caller's supplier
    pub overridden: usize,
}

/// Everything one `run` call owns.
///
/// Created at the start of a run and consumed into its `Outcome`; nothing
/// is shared between runs.
pub struct SimulationContext<V> {
    pub(crate) n: usize,
    pub(crate) f: usize,
    pub(crate) commander: ParticipantId,
    pub(crate) participants: Vec<Participant<V>>,
    pub(crate) rounds: Vec<RoundLog<V>>,
    phases: Vec<Phase>,
}

impl<V: Value> SimulationContext<V> {
    /// Creates the context and its participants.
    pub fn new(
        n: usize,
        f: usize,
        commander: ParticipantId,
        commander_value: &V,
        is_faulty: impl Fn(ParticipantId) -> bool,
    ) -> Result<Self, AgreementError> {
        let participants = (0..n)
            .map(ParticipantId)
            .map(|id| {
                let initial = (id == commander).then(|| commander_value.clone());
                Participant::initialize(id, n, is_faulty(id), initial)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            n,
            f,
            commander,
            participants,
            rounds: Vec::with_capacity(f + 1),
            phases: vec![Phase::Init],
        })
    }

    /// Moves to `phase`.
    pub fn enter(&mut self, phase: Phase) {
        let previous = self.phase();
        debug_assert!(
            phase.can_follow(previous),
            "illegal phase transition {} -> {}",
            previous,
            phase
        );
        debug!("phase {} -> {}", previous, phase);
        self.phases.push(phase);
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phases.last().copied().unwrap_or(Phase::Init)
    }

    /// Phases visited so far, in order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Ids of every participant but the commander.
    pub fn lieutenants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        (0..self.n).map(ParticipantId).filter(move |id| *id != self.commander)
    }

    /// Number of rounds the protocol runs.
    pub fn total_rounds(&self) -> u32 {
        self.f as u32 + 1
    }

    pub fn participant(&self, id: ParticipantId) -> &Participant<V> {
        &self.participants[id.index()]
    }

    pub(crate) fn into_parts(self) -> (Vec<Participant<V>>, Vec<RoundLog<V>>, Vec<Phase>) {
        (self.participants, self.rounds, self.phases)
    }
}
