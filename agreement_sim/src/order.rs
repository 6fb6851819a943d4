//! Battle orders used by the scenarios.

use serde::{Deserialize, Serialize};

/// The value generals agree on in every built-in scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Order {
    Attack,
    Retreat,
}

impl Order {
    /// Both orders, in tie-break order.
    pub const ALL: [Order; 2] = [Order::Attack, Order::Retreat];
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Attack => write!(f, "Attack"),
            Order::Retreat => write!(f, "Retreat"),
        }
    }
}

impl std::str::FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attack" => Ok(Order::Attack),
            "retreat" => Ok(Order::Retreat),
            _ => Err(format!("Unknown order: {}", s)),
        }
    }
}
