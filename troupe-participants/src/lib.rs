#![deny(missing_docs)]
//! Participant implementations.
//!
//! Everything that can hold a seat in a conversation:
//!
//! - [`ModelParticipant`] answers through a completion service, with a
//!   role, a personal mission, and optional tool definitions.
//! - [`UserParticipant`] relays a human, reading through a pluggable
//!   [`UserInput`] source (stdin by default, a scripted queue in tests).
//! - [`GroupParticipant`] wraps an entire nested conversation behind the
//!   single-participant surface, which is what makes teams of teams
//!   compose.
//! - [`OutputParser`] coerces the conversation's last message into a
//!   typed value and requests termination once it has one.
//!
//! [`request_response`] is the one-shot convenience on top: pose a query
//! to any active participant inside a throwaway two-message chat.

mod group;
mod model;
mod output_parser;
mod request_response;
mod user;

pub use group::GroupParticipant;
pub use model::ModelParticipant;
pub use output_parser::OutputParser;
pub use request_response::request_response;
pub use user::{QueuedInput, StdinInput, UserInput, UserParticipant};
