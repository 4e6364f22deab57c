#![deny(missing_docs)]
//! Turn-taking strategies for troupe conversations.
//!
//! Two [`Conductor`] implementations:
//!
//! - [`RoundRobinConductor`] rotates through the active roster in order
//!   and stops when a message ends with the termination marker. Zero
//!   external calls, fully deterministic.
//! - [`ModelConductor`] asks a completion service to pick each next
//!   speaker, optionally (re)composing the roster on first use through a
//!   [`CompositionGenerator`](troupe_core::CompositionGenerator).
//!
//! [`Conductor`]: troupe_core::Conductor

mod model;
mod round_robin;

pub use model::ModelConductor;
pub use round_robin::RoundRobinConductor;
