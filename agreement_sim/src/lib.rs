//! Agreement Simulation Harness
//!
//! Deterministic scenarios for the agreement engine. Every source of
//! randomness is derived from a single 64-bit seed:
//! - **Adversary**: each faulty message draws from its own ChaCha8 stream
//! - **Setups**: army size, traitors and orders of a sweep
//! - **Oracle**: checks Agreement and Validity against the setup
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                    │
//! │  ┌──────────┐   ┌──────────────────┐   ┌──────────┐  │
//! │  │SimContext│──►│ AgreementEngine  │──►│  Oracle  │  │
//! │  │  (seed)  │   │ + SeededAdversary│   │(Agreement│  │
//! │  └──────────┘   └──────────────────┘   │ Validity)│  │
//! │                          │             └──────────┘  │
//! │                          ▼                           │
//! │                      RunExport (JSON)                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use agreement_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::TraitorLieutenant);
//! assert!(result.passed);
//! ```

mod adversary;
mod context;
mod error;
mod exporter;
mod oracle;
mod order;
mod runner;
mod schedule;
pub mod scenarios;

pub use adversary::SeededAdversary;
pub use context::SimContext;
pub use error::SimError;
pub use exporter::{ParticipantDecision, RoundSummary, RunExport};
pub use oracle::{Guarantees, PropertyOracle, Violation};
pub use order::Order;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use schedule::ScheduleFile;
