//! Beliefs, action/goal contracts and plan execution for goal-oriented action planning.
//!
//! This crate holds everything an agent needs except the search itself (see `goap-planner`)
//! and the think/act state machine (see `goap-agent`).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod beliefs;
pub mod event;
pub mod fact;
pub mod goal;
pub mod plan;
pub mod sensor;
pub mod tick;

pub use action::{Action, ActionDef, ActionOperator, ActionStatus, Operator};
pub use agent::AgentId;
pub use beliefs::{BeliefChange, BeliefStore, SharedBeliefs, SubscriptionId};
pub use event::{
    ActionEndReason, AgentEvent, EventBus, EventLog, EventSink, NullEventSink, PlanFailure,
    TracingEventSink,
};
pub use fact::{FactKey, FactSet, FactValue};
pub use goal::{Goal, GoalDef};
pub use plan::{Executor, ExecutorStatus, Plan, PlanStep};
pub use sensor::{MirrorSensor, Sensor};
pub use tick::TickContext;
