//! Engine configuration.

use crate::oral::relay_tree_size;
use serde::{Deserialize, Serialize};

/// How lieutenants relay values in rounds `2..=f+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayStrategy {
    /// Single-hop relay of the value each lieutenant currently holds.
    /// Agrees only for `f <= 1`.
    Flat,

    /// Full oral-messages OM(f) relay over sender chains
    OralMessages,
}

impl RelayStrategy {
    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            RelayStrategy::Flat => "flat",
            RelayStrategy::OralMessages => "oral_messages",
        }
    }
}

impl std::fmt::Display for RelayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for RelayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(RelayStrategy::Flat),
            "oral_messages" | "oralmessages" | "om" | "recursive" => {
                Ok(RelayStrategy::OralMessages)
            }
            _ => Err(format!("Unknown relay strategy: {}", s)),
        }
    }
}

/// What the resolver does when several values share the top count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The commander's announced value if tied, else the smallest tied value
    #[default]
    PreferCommander,

    /// The smallest tied value
    Smallest,

    /// Ties are `Undecided`
    Strict,
}

impl TieBreak {
    /// Returns the tie-break name.
    pub fn name(&self) -> &'static str {
        match self {
            TieBreak::PreferCommander => "prefer_commander",
            TieBreak::Smallest => "smallest",
            TieBreak::Strict => "strict",
        }
    }
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefer_commander" | "prefercommander" | "commander" => Ok(TieBreak::PreferCommander),
            "smallest" => Ok(TieBreak::Smallest),
            "strict" | "none" => Ok(TieBreak::Strict),
            _ => Err(format!("Unknown tie-break: {}", s)),
        }
    }
}

/// Configuration for an [`AgreementEngine`](crate::AgreementEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relay strategy for rounds after the broadcast; `None` picks
    /// oral-messages whenever its tree fits `max_relay_paths`
    pub strategy: Option<RelayStrategy>,

    /// Tie-break rule of the decision resolver
    pub tie_break: TieBreak,

    /// Participant count from which round generation fans out over rayon
    pub parallel_threshold: usize,

    /// Upper bound on oral-messages tree entries across all participants
    pub max_relay_paths: usize,

    /// Keep every delivered message in the round log
    pub record_messages: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            tie_break: TieBreak::PreferCommander,
            parallel_threshold: 100,
            max_relay_paths: 1_000_000,
            record_messages: true,
        }
    }
}

impl EngineConfig {
    /// Pins the relay strategy.
    pub fn with_strategy(mut self, strategy: RelayStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// The relay strategy a run with `n` participants and bound `f` uses.
    ///
    /// Without a pinned strategy this is oral-messages unless the relay
    /// tree outgrows `max_relay_paths`, in which case it falls back to flat.
    pub fn relay_for(&self, n: usize, f: usize) -> RelayStrategy {
        match self.strategy {
            Some(strategy) => strategy,
            None if relay_tree_size(n, f) <= self.max_relay_paths => RelayStrategy::OralMessages,
            None => RelayStrategy::Flat,
        }
    }

    /// Sets the tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Sets the parallel fan-out threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Sets the oral-messages tree budget.
    pub fn with_max_relay_paths(mut self, max: usize) -> Self {
        self.max_relay_paths = max;
        self
    }

    /// Enables or disables per-message logging.
    pub fn with_message_log(mut self, record: bool) -> Self {
        self.record_messages = record;
        self
    }
}
