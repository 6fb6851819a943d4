//! Common types shared by the engine and the simulation harness.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// A value participants can agree on.
///
/// Equality drives the vote, the total order drives deterministic
/// tie-breaks. Implemented for every type meeting the bounds.
pub trait Value: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

/// Identifier of one participant (general, node) in a run.
///
/// Valid ids are `0..n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub usize);

impl ParticipantId {
    /// Returns the index into an `n`-sized participant table.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Returns true if this id is valid for a run of `n` participants.
    pub fn is_within(&self, n: usize) -> bool {
        self.0 < n
    }
}

impl From<usize> for ParticipantId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-indexed round counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round(pub u32);

impl Round {
    /// The commander's broadcast round.
    pub const FIRST: Round = Round(1);

    /// Returns the raw round number.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the following round.
    pub fn next(&self) -> Round {
        Round(self.0 + 1)
    }

    /// Returns true for the commander's broadcast round.
    pub fn is_broadcast(&self) -> bool {
        self.0 == 1
    }

    /// Iterates rounds `1..=last`.
    pub fn up_to(last: u32) -> impl Iterator<Item = Round> {
        (1..=last).map(Round)
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value as it arrived at one recipient.
///
/// `relay` lists the senders the value passed through before `sender`,
/// starting with the commander. It is empty for round 1 and for flat relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delivery<V> {
    pub sender: ParticipantId,
    pub value: V,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relay: Vec<ParticipantId>,
}

impl<V> Delivery<V> {
    /// Creates a direct (unrelayed) delivery.
    pub fn new(sender: ParticipantId, value: V) -> Self {
        Self {
            sender,
            value,
            relay: Vec::new(),
        }
    }

    /// Creates a delivery relayed along `relay`.
    pub fn relayed(sender: ParticipantId, value: V, relay: Vec<ParticipantId>) -> Self {
        Self {
            sender,
            value,
            relay,
        }
    }

    /// Returns the full chain `relay ++ [sender]`.
    pub fn chain(&self) -> Vec<ParticipantId> {
        let mut chain = Vec::with_capacity(self.relay.len() + 1);
        chain.extend_from_slice(&self.relay);
        chain.push(self.sender);
        chain
    }
}

/// A message actually delivered in some round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message<V> {
    pub round: Round,
    pub sender: ParticipantId,
    pub recipient: ParticipantId,
    pub value: V,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relay: Vec<ParticipantId>,
}

impl<V: Clone> Message<V> {
    /// Rebuilds a log entry from what `recipient` received.
    pub fn from_delivery(round: Round, recipient: ParticipantId, delivery: &Delivery<V>) -> Self {
        Self {
            round,
            sender: delivery.sender,
            recipient,
            value: delivery.value.clone(),
            relay: delivery.relay.clone(),
        }
    }
}

/// Outcome of resolving one participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision<V> {
    /// A definitive value
    Value(V),

    /// No definitive value could be derived
    Undecided,
}

impl<V> Decision<V> {
    /// Returns the decided value, if any.
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Decision::Value(v) => Some(v),
            Decision::Undecided => None,
        }
    }

    /// Consumes the decision, returning the value if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            Decision::Value(v) => Some(v),
            Decision::Undecided => None,
        }
    }

    pub fn is_undecided(&self) -> bool {
        matches!(self, Decision::Undecided)
    }
}

impl<V> From<Option<V>> for Decision<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(v) => Decision::Value(v),
            None => Decision::Undecided,
        }
    }
}

impl<V: std::fmt::Display> std::fmt::Display for Decision<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Value(v) => write!(f, "{}", v),
            Decision::Undecided => write!(f, "Undecided"),
        }
    }
}
