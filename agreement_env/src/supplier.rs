//! Caller-controlled message delivery.

use crate::types::{Delivery, ParticipantId, Round};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Abstraction over what participants receive in a round.
///
/// The engine asks the supplier once per `(recipient, round)`. Returning
/// `Some(deliveries)` replaces everything the engine generated for that
/// recipient in that round, verbatim; returning `None` keeps the generated
/// messages.
///
/// # Flow
///
/// ```text
/// Round Coordinator              Supplier                 Participant
///   |-- generate(round) --------->|                          |
///   |<-- override? ---------------|                          |
///   |-- deliver(inbox) ----------------------------------------->|
/// ```
pub trait MessageSupplier<V> {
    /// Returns the deliveries `recipient` receives in `round`, if overridden.
    fn deliveries(&self, recipient: ParticipantId, round: Round) -> Option<Vec<Delivery<V>>>;
}

impl<V, F> MessageSupplier<V> for F
where
    F: Fn(ParticipantId, Round) -> Option<Vec<Delivery<V>>>,
{
    fn deliveries(&self, recipient: ParticipantId, round: Round) -> Option<Vec<Delivery<V>>> {
        self(recipient, round)
    }
}

/// Supplier that never overrides anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl<V> MessageSupplier<V> for NoOverrides {
    fn deliveries(&self, _recipient: ParticipantId, _round: Round) -> Option<Vec<Delivery<V>>> {
        None
    }
}

/// One row of a scripted schedule: what `recipient` hears in `round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDeliveries<V> {
    pub round: Round,
    pub recipient: ParticipantId,
    pub deliveries: Vec<Delivery<V>>,
}

/// A deterministic, serializable message schedule.
///
/// Serialized as a flat list of `ScheduledDeliveries` rows. Rows naming the
/// same `(recipient, round)` are concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<ScheduledDeliveries<V>>",
    into = "Vec<ScheduledDeliveries<V>>",
    bound(serialize = "V: Serialize + Clone", deserialize = "V: Deserialize<'de>")
)]
pub struct MessageTable<V> {
    entries: BTreeMap<(ParticipantId, Round), Vec<Delivery<V>>>,
}

impl<V> MessageTable<V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Scripts the full inbox of `recipient` for `round`.
    pub fn set(&mut self, recipient: ParticipantId, round: Round, deliveries: Vec<Delivery<V>>) {
        self.entries.insert((recipient, round), deliveries);
    }

    /// Builder form of [`MessageTable::set`].
    pub fn with(
        mut self,
        recipient: ParticipantId,
        round: Round,
        deliveries: Vec<Delivery<V>>,
    ) -> Self {
        self.set(recipient, round, deliveries);
        self
    }

    /// Number of scripted inboxes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MessageTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> MessageSupplier<V> for MessageTable<V> {
    fn deliveries(&self, recipient: ParticipantId, round: Round) -> Option<Vec<Delivery<V>>> {
        self.entries.get(&(recipient, round)).cloned()
    }
}

impl<V> From<Vec<ScheduledDeliveries<V>>> for MessageTable<V> {
    fn from(rows: Vec<ScheduledDeliveries<V>>) -> Self {
        let mut table = MessageTable::new();
        for row in rows {
            table
                .entries
                .entry((row.recipient, row.round))
                .or_default()
                .extend(row.deliveries);
        }
        table
    }
}

impl<V> From<MessageTable<V>> for Vec<ScheduledDeliveries<V>> {
    fn from(table: MessageTable<V>) -> Self {
        table
            .entries
            .into_iter()
            .map(|((recipient, round), deliveries)| ScheduledDeliveries {
                round,
                recipient,
                deliveries,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_overrides_only_scripted_inboxes() {
        let table = MessageTable::new().with(
            ParticipantId(1),
            Round(1),
            vec![Delivery::new(ParticipantId(0), "Retreat")],
        );

        let scripted = table.deliveries(ParticipantId(1), Round(1)).unwrap();
        assert_eq!(scripted, vec![Delivery::new(ParticipantId(0), "Retreat")]);

        assert!(table.deliveries(ParticipantId(2), Round(1)).is_none());
        assert!(table.deliveries(ParticipantId(1), Round(2)).is_none());
    }

    #[test]
    fn test_table_from_json_merges_rows() {
        let json = r#"[
            {"round": 2, "recipient": 1, "deliveries": [{"sender": 2, "value": "Attack"}]},
            {"round": 2, "recipient": 1, "deliveries": [{"sender": 3, "value": "Retreat"}]},
            {"round": 1, "recipient": 3, "deliveries": []}
        ]"#;

        let table: MessageTable<String> = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);

        let inbox = table.deliveries(ParticipantId(1), Round(2)).unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[1].sender, ParticipantId(3));

        // An empty scripted inbox is still an override (total omission)
        assert_eq!(table.deliveries(ParticipantId(3), Round(1)), Some(vec![]));
    }

    #[test]
    fn test_closure_supplier() {
        let supplier = |recipient: ParticipantId, round: Round| -> Option<Vec<Delivery<u8>>> {
            (recipient == ParticipantId(2) && round == Round(1))
                .then(|| vec![Delivery::new(ParticipantId(0), 1)])
        };

        assert!(supplier.deliveries(ParticipantId(2), Round(1)).is_some());
        assert!(supplier.deliveries(ParticipantId(1), Round(1)).is_none());
        let untouched = MessageSupplier::<u8>::deliveries(&NoOverrides, ParticipantId(1), Round(1));
        assert!(untouched.is_none());
    }
}
