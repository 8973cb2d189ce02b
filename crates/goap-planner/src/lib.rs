//! Regressive (backward) A* planner producing `goap-core` plans.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod planner;

pub use planner::{Planner, PlannerConfig, SearchReport, UNREACHABLE};
