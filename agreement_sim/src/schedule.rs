//! Scripted runs loaded from JSON.
//!
//! ```json
//! {
//!   "n": 4, "f": 1, "commander": 0, "commander_value": "Attack",
//!   "faulty": [0],
//!   "config": { "tie_break": "strict" },
//!   "deliveries": [
//!     { "round": 1, "recipient": 1, "deliveries": [{ "sender": 0, "value": "Retreat" }] }
//!   ]
//! }
//! ```

use crate::error::SimError;
use crate::order::Order;
use agreement_core::{AgreementSetup, EngineConfig};
use agreement_env::{MessageTable, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;

/// A run whose inboxes are partly or fully scripted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleFile {
    pub n: usize,
    pub f: usize,

    #[serde(default)]
    pub commander: ParticipantId,

    pub commander_value: Order,

    #[serde(default)]
    pub faulty: BTreeSet<ParticipantId>,

    /// Engine configuration, defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,

    /// Inboxes that replace the generated ones
    #[serde(default)]
    pub deliveries: MessageTable<Order>,
}

impl ScheduleFile {
    /// Loads a schedule from `path`.
    pub fn load(path: &str) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Parses a schedule from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn setup(&self) -> AgreementSetup<Order> {
        AgreementSetup::new(self.n, self.f, self.commander_value)
            .with_commander(self.commander)
            .with_faulty(self.faulty.iter().copied())
    }

    pub fn config(&self) -> EngineConfig {
        self.config.clone().unwrap_or_default()
    }
}
