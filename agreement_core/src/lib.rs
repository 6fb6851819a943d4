//! Agreement Core - Byzantine agreement among `n` participants
//!
//! One commander proposes a value; up to `f` participants (the commander
//! included) may be Byzantine. The engine runs `f + 1` synchronous rounds:
//! 1. **Participant Model**: identity, loyalty, inboxes and what each
//!    participant sends
//! 2. **Round Coordinator**: message generation, caller overrides and
//!    delivery, round by round
//! 3. **Decision Resolver**: majority vote, tie-breaks and the `n >= 3f + 1`
//!    feasibility check
//!
//! ```
//! use agreement_core::{AgreementEngine, AgreementSetup, Decision};
//!
//! let engine = AgreementEngine::default();
//! let outcome = engine.run(&AgreementSetup::new(4, 1, "Attack")).unwrap();
//! assert_eq!(outcome.consensus(), &Decision::Value("Attack"));
//! ```

pub mod config;
pub mod context;
pub mod coordinator;
pub mod engine;
mod oral;
pub mod participant;
pub mod resolver;

pub use config::{EngineConfig, RelayStrategy, TieBreak};
pub use context::{Phase, RoundLog, SimulationContext};
pub use coordinator::RoundCoordinator;
pub use engine::{AgreementEngine, AgreementSetup, Outcome};
pub use oral::relay_tree_size;
pub use participant::Participant;
pub use resolver::{check_feasibility, consensus, DecisionResolver};

pub use agreement_env::{
    AgreementError, Decision, Delivery, Equivocate, FaultContext, FaultModel, Honest, Message,
    MessageSupplier, MessageTable, NoOverrides, Omission, ParticipantId, Round, Value,
};
