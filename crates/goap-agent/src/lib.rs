//! Agent think/act cycle and the multi-agent scheduler.
//!
//! An [`Agent`] selects a goal, asks the planner for a plan and drives it through the
//! executor. The [`Orchestrator`] owns many agents and keeps their combined think time
//! within a per-tick budget.

#![forbid(unsafe_code)]

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use agent::{Agent, AgentState, ThinkOutcome};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{EngineConfig, OrchestratorConfig};
pub use error::{ConfigError, OrchestratorError};
pub use orchestrator::{Orchestrator, TickReport};
