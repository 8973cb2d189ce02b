use std::borrow::Cow;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AgentId, BeliefStore, FactKey, FactSet, FactValue};

/// A desired symbolic state plus the hooks an agent uses to choose between goals.
///
/// Goals hold no per-agent mutable state: anything dynamic (urgency, cooldowns) is
/// derived from, or written to, the querying agent's beliefs.
pub trait Goal: 'static {
    fn name(&self) -> &str;

    fn desired_state(&self, beliefs: &BeliefStore) -> Cow<'_, FactSet>;

    fn is_achieved(&self, beliefs: &BeliefStore) -> bool {
        beliefs.matches(&self.desired_state(beliefs))
    }

    /// Gate evaluated before selection.
    fn is_relevant(&self, _beliefs: &BeliefStore) -> bool {
        true
    }

    /// Constant part of the priority.
    fn base_priority(&self) -> f32 {
        0.0
    }

    /// Override to make the priority depend on beliefs.
    fn priority(&self, _beliefs: &BeliefStore) -> f32 {
        self.base_priority()
    }

    /// Fired once when a plan pursuing this goal finishes successfully.
    fn on_plan_complete(&self, _agent: AgentId, _beliefs: &mut BeliefStore) {}
}

/// Static goal: fixed priority and desired state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GoalDef {
    pub name: Arc<str>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: f32,
    pub desired_state: FactSet,
}

impl GoalDef {
    pub fn new(name: impl Into<Arc<str>>, priority: f32) -> Self {
        Self {
            name: name.into(),
            priority,
            desired_state: FactSet::new(),
        }
    }

    pub fn with_desired(mut self, key: impl Into<FactKey>, value: impl Into<FactValue>) -> Self {
        self.desired_state.insert(key, value);
        self
    }
}

impl Goal for GoalDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn desired_state(&self, _beliefs: &BeliefStore) -> Cow<'_, FactSet> {
        Cow::Borrowed(&self.desired_state)
    }

    fn base_priority(&self) -> f32 {
        self.priority
    }
}
