//! Agreement Engine Environment Layer
//!
//! This crate holds everything the agreement protocol treats as "outside
//! world" so that the engine can run against a scripted schedule, a seeded
//! adversary or plain loyal participants without changing a line.
//!
//! # Core Concept: Injected Non-determinism
//!
//! A Byzantine simulation has two sources of behavior the protocol does not
//! control:
//! - **Delivery**: what a participant actually receives in a round
//!   (`MessageSupplier`)
//! - **Faults**: what a faulty participant chooses to send (`FaultModel`)
//!
//! Both are plain traits with closure impls, so a test can pin an exact
//! adversarial schedule and reproduce it bit for bit.
//!
//! # Example
//!
//! ```
//! use agreement_env::{Delivery, MessageSupplier, ParticipantId, Round};
//!
//! // Lieutenant 1 hears "Retreat" from the commander, everybody else
//! // gets whatever the engine generates.
//! let supplier = |recipient: ParticipantId, round: Round| {
//!     (recipient.index() == 1 && round == Round::FIRST)
//!         .then(|| vec![Delivery::new(ParticipantId(0), "Retreat")])
//! };
//!
//! assert!(supplier.deliveries(ParticipantId(1), Round::FIRST).is_some());
//! assert!(supplier.deliveries(ParticipantId(2), Round::FIRST).is_none());
//! ```

mod error;
pub mod fault;
mod supplier;
mod types;

pub use error::AgreementError;
pub use fault::{Equivocate, FaultContext, FaultModel, Honest, Omission};
pub use supplier::{MessageSupplier, MessageTable, NoOverrides, ScheduledDeliveries};
pub use types::{Decision, Delivery, Message, ParticipantId, Round, Value};
