//! Property oracle - the ground truth a run is judged against.
//!
//! The oracle knows which participants are loyal and what the commander
//! was asked to send, and checks an `Outcome` for:
//! - **Agreement**: all loyal participants decide the same value
//! - **Validity**: with a loyal commander, loyal participants decide the
//!   commander's value
//! - **Completeness**: every participant reached a decision

use agreement_core::{AgreementSetup, Outcome};
use agreement_env::{Decision, ParticipantId, Value};
use serde::Serialize;

/// One broken property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum Violation {
    /// Two loyal participants decided differently
    Agreement {
        first: ParticipantId,
        second: ParticipantId,
        detail: String,
    },

    /// A loyal participant did not follow the loyal commander
    Validity {
        participant: ParticipantId,
        detail: String,
    },

    /// A participant finished without a decision
    Incomplete { participant: ParticipantId },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Agreement {
                first,
                second,
                detail,
            } => write!(f, "agreement broken between {} and {}: {}", first, second, detail),
            Violation::Validity {
                participant,
                detail,
            } => write!(f, "validity broken at {}: {}", participant, detail),
            Violation::Incomplete { participant } => {
                write!(f, "participant {} has no decision", participant)
            }
        }
    }
}

/// Which properties a configuration is expected to guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guarantees {
    pub agreement: bool,
    pub validity: bool,
}

impl Guarantees {
    /// What the engine claimed for the run behind `outcome`.
    ///
    /// Nothing is promised when `n < 3f + 1`. Validity holds for every
    /// feasible run; agreement holds wherever the outcome says so.
    pub fn claimed<V: Value>(outcome: &Outcome<V>) -> Self {
        Self {
            agreement: outcome.agreement_guaranteed(),
            validity: outcome.feasible(),
        }
    }
}

/// Checks outcomes against the setup that produced them.
pub struct PropertyOracle<'a, V> {
    setup: &'a AgreementSetup<V>,
}

impl<'a, V: Value> PropertyOracle<'a, V> {
    pub fn new(setup: &'a AgreementSetup<V>) -> Self {
        Self { setup }
    }

    /// Returns every violation found in `outcome`.
    pub fn check(&self, outcome: &Outcome<V>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for participant in outcome.participants() {
            if participant.decision().is_none() {
                violations.push(Violation::Incomplete {
                    participant: participant.id(),
                });
            }
        }

        violations.extend(self.check_agreement(outcome));
        violations.extend(self.check_validity(outcome));
        violations
    }

    /// First pair of loyal participants that disagree, if any.
    pub fn check_agreement(&self, outcome: &Outcome<V>) -> Option<Violation> {
        let loyal = outcome.loyal_decisions();
        let mut decisions = loyal.iter();
        let (first, expected) = decisions.next()?;

        decisions
            .find(|(_, decision)| *decision != expected)
            .map(|(second, decision)| Violation::Agreement {
                first: *first,
                second: *second,
                detail: format!("{:?} vs {:?}", expected, decision),
            })
    }

    /// Loyal participants that did not decide the loyal commander's value.
    pub fn check_validity(&self, outcome: &Outcome<V>) -> Vec<Violation> {
        if self.setup.is_faulty(self.setup.commander) {
            return Vec::new();
        }
        let expected = Decision::Value(self.setup.commander_value.clone());

        outcome
            .loyal_decisions()
            .into_iter()
            .filter(|(_, decision)| *decision != expected)
            .map(|(participant, decision)| Violation::Validity {
                participant,
                detail: format!("decided {:?}, commander sent {:?}", decision, expected),
            })
            .collect()
    }

    /// Violations of the properties the engine guarantees for this setup.
    pub fn check_guaranteed(&self, outcome: &Outcome<V>) -> Vec<Violation> {
        let guarantees = Guarantees::claimed(outcome);

        self.check(outcome)
            .into_iter()
            .filter(|violation| match violation {
                Violation::Agreement { .. } => guarantees.agreement,
                Violation::Validity { .. } => guarantees.validity,
                Violation::Incomplete { .. } => true,
            })
            .collect()
    }
}
