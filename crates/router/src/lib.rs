//! Event routing and command processing.
//!
//! The [`Router`] classifies normalized events into commands, flows and
//! button presses, and drives the [`Processor`] which implements the actual
//! operations over the stores and the conversation state engine. Outbound
//! delivery goes through the [`Outbound`] seam so everything here is testable
//! without a network.

pub mod admin;
pub mod answers;
pub mod outbound;
pub mod parse;
pub mod processor;
pub mod router;

pub use {outbound::Outbound, processor::Processor, router::Router};
