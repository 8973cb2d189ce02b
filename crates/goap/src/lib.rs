//! Umbrella crate that re-exports the `goap-*` building blocks.
//!
//! ```
//! use goap::core::{ActionDef, FactSet};
//! use goap::planner::Planner;
//!
//! let actions = [
//!     ActionDef::new("SelectTarget", 1.0).with_effect("has_target", true),
//!     ActionDef::new("MoveTo", 1.0)
//!         .with_precondition("has_target", true)
//!         .with_effect("at_target", true),
//! ];
//! let goal = FactSet::new().with("at_target", true);
//! let plan = Planner::new().plan(&FactSet::new(), &goal, &actions).unwrap();
//! assert_eq!(plan.names(), ["SelectTarget", "MoveTo"]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use goap_core as core;

#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub use goap_planner as planner;

#[cfg(feature = "agent")]
#[cfg_attr(docsrs, doc(cfg(feature = "agent")))]
pub use goap_agent as agent;

/// The types most hosts need, in one import.
#[cfg(feature = "agent")]
#[cfg_attr(docsrs, doc(cfg(feature = "agent")))]
pub mod prelude {
    pub use goap_agent::{
        Agent, AgentState, EngineConfig, ManualClock, MonotonicClock, Orchestrator,
        OrchestratorConfig, ThinkOutcome, TickReport,
    };
    pub use goap_core::{
        Action, ActionDef, ActionStatus, AgentEvent, AgentId, BeliefStore, EventLog, FactSet,
        FactValue, Goal, GoalDef, MirrorSensor, Sensor, SharedBeliefs, TickContext,
    };
    pub use goap_planner::{Planner, PlannerConfig};
}
