//! JSON export of finished runs.
//!
//! One file per run: the setup, every participant's decision, per-round
//! counts and (when message logging was on) every delivered message.

use crate::error::SimError;
use crate::oracle::Violation;
use agreement_core::{AgreementSetup, Outcome, RelayStrategy};
use agreement_env::{Decision, Message, ParticipantId, Round, Value};
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// Decision of one participant.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantDecision<V> {
    pub id: ParticipantId,
    pub faulty: bool,
    pub decision: Decision<V>,
}

/// Counts of one round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: Round,
    pub delivered: usize,
    pub overridden: usize,
}

/// Complete run export.
#[derive(Debug, Clone, Serialize)]
pub struct RunExport<V> {
    /// Scenario name (or schedule file)
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    pub n: usize,
    pub f: usize,
    pub commander: ParticipantId,
    pub commander_value: V,
    pub strategy: RelayStrategy,
    pub feasible: bool,
    pub agreement_guaranteed: bool,

    /// Common loyal decision
    pub consensus: Decision<V>,

    pub decisions: Vec<ParticipantDecision<V>>,
    pub rounds: Vec<RoundSummary>,

    /// Delivered messages, in round order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message<V>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,

    /// Whether the run met its expectation
    pub passed: bool,
}

impl<V: Value + Serialize> RunExport<V> {
    /// Captures `outcome` of a run of `setup`.
    pub fn capture(
        scenario: &str,
        seed: u64,
        setup: &AgreementSetup<V>,
        outcome: &Outcome<V>,
    ) -> Self {
        let decisions = outcome
            .participants()
            .iter()
            .map(|p| ParticipantDecision {
                id: p.id(),
                faulty: p.is_faulty(),
                decision: p.decision().cloned().unwrap_or(Decision::Undecided),
            })
            .collect();

        let rounds = outcome
            .rounds()
            .iter()
            .map(|log| RoundSummary {
                round: log.number,
                delivered: log.delivered,
                overridden: log.overridden,
            })
            .collect();

        let messages = outcome
            .rounds()
            .iter()
            .flat_map(|log| log.messages.iter().cloned())
            .collect();

        Self {
            scenario: scenario.to_string(),
            seed,
            n: setup.n,
            f: setup.f,
            commander: setup.commander,
            commander_value: setup.commander_value.clone(),
            strategy: outcome.strategy(),
            feasible: outcome.feasible(),
            agreement_guaranteed: outcome.agreement_guaranteed(),
            consensus: outcome.consensus().clone(),
            decisions,
            rounds,
            messages,
            violations: Vec::new(),
            passed: false,
        }
    }

    /// Records the verdict.
    pub fn finalize(&mut self, passed: bool, violations: Vec<Violation>) {
        self.passed = passed;
        self.violations = violations;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path).map_err(|e| SimError::io(path, e))?;
        file.write_all(json.as_bytes()).map_err(|e| SimError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use agreement_core::AgreementEngine;

    #[test]
    fn test_capture_run() {
        let setup = AgreementSetup::new(4, 1, Order::Attack).with_faulty([ParticipantId(3)]);
        let outcome = AgreementEngine::default().run(&setup).unwrap();

        let mut export = RunExport::capture("traitor_lieutenant", 42, &setup, &outcome);
        export.finalize(true, Vec::new());

        assert_eq!(export.decisions.len(), 4);
        assert!(export.decisions[3].faulty);
        assert_eq!(export.rounds.len(), 2);
        // Silent traitor: 3 broadcast messages, 2 loyal lieutenants x 2 relays
        assert_eq!(export.rounds[1].delivered, 4);
        assert_eq!(export.messages.len(), 7);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["consensus"], serde_json::json!({ "value": "Attack" }));
        assert_eq!(json["decisions"][0]["id"], 0);
        assert_eq!(json["strategy"], "oral_messages");
        assert_eq!(json["agreement_guaranteed"], true);
        assert!(json.get("violations").is_none());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let setup = AgreementSetup::new(1, 0, Order::Retreat);
        let outcome = AgreementEngine::default().run(&setup).unwrap();
        let export = RunExport::capture("single", 1, &setup, &outcome);

        let err = export.write_to_file("/nonexistent/dir/run.json").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
