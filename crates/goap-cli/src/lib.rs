//! Scenario loading for the `goap-sim` demo binary.

#![forbid(unsafe_code)]

pub mod scenario;

pub use scenario::{ActionTemplate, AgentSpec, Scenario, Session, TimedAction};
