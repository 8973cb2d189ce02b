use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AgentId, BeliefStore, FactKey, FactSet, FactValue, TickContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionStatus {
    Running,
    Success,
    Failure,
}

/// Symbolic view of an action: what the planner searches over.
pub trait Operator {
    fn name(&self) -> &str;

    /// Non-negative, finite cost.
    fn cost(&self) -> f32;

    fn preconditions(&self) -> &FactSet;

    fn effects(&self) -> &FactSet;

    fn matches_preconditions(&self, beliefs: &FactSet) -> bool {
        beliefs.matches(self.preconditions())
    }

    /// True if at least one effect equals an unsatisfied fact.
    fn satisfies_any(&self, unsatisfied: &FactSet) -> bool {
        self.effects()
            .iter()
            .any(|(k, v)| unsatisfied.contains(k, v))
    }

    /// True if an effect would overwrite an unsatisfied fact with a different value.
    fn conflicts(&self, unsatisfied: &FactSet) -> bool {
        self.effects()
            .iter()
            .any(|(k, v)| unsatisfied.get(k).is_some_and(|wanted| wanted != v))
    }

    /// Push `unsatisfied` backwards through this action.
    ///
    /// Facts the effects cover are dropped, preconditions are added, and anything already
    /// true in `beliefs` is removed. Returns `None` when a precondition contradicts a
    /// requirement the action leaves untouched.
    fn regress(&self, unsatisfied: &FactSet, beliefs: &FactSet) -> Option<FactSet> {
        let effects = self.effects();
        let mut next = unsatisfied.clone();
        next.retain(|k, v| !effects.contains(k, v));

        for (k, v) in self.preconditions() {
            if next.get(k).is_some_and(|wanted| wanted != v) {
                return None;
            }
            next.insert(k.clone(), v.clone());
        }

        next.retain(|k, v| !beliefs.contains(k, v));
        Some(next)
    }

    fn apply_effects(&self, snapshot: &FactSet) -> FactSet {
        snapshot.applied(self.effects())
    }
}

impl<O: Operator + ?Sized> Operator for &O {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn cost(&self) -> f32 {
        (**self).cost()
    }

    fn preconditions(&self) -> &FactSet {
        (**self).preconditions()
    }

    fn effects(&self) -> &FactSet {
        (**self).effects()
    }

    fn matches_preconditions(&self, beliefs: &FactSet) -> bool {
        (**self).matches_preconditions(beliefs)
    }

    fn satisfies_any(&self, unsatisfied: &FactSet) -> bool {
        (**self).satisfies_any(unsatisfied)
    }

    fn conflicts(&self, unsatisfied: &FactSet) -> bool {
        (**self).conflicts(unsatisfied)
    }

    fn regress(&self, unsatisfied: &FactSet, beliefs: &FactSet) -> Option<FactSet> {
        (**self).regress(unsatisfied, beliefs)
    }
}

/// Immutable action template shared by every agent that can perform it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionDef {
    pub name: Arc<str>,
    pub cost: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub preconditions: FactSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: FactSet,
}

impl ActionDef {
    pub fn new(name: impl Into<Arc<str>>, cost: f32) -> Self {
        Self {
            name: name.into(),
            cost,
            preconditions: FactSet::new(),
            effects: FactSet::new(),
        }
    }

    pub fn with_precondition(
        mut self,
        key: impl Into<FactKey>,
        value: impl Into<FactValue>,
    ) -> Self {
        self.preconditions.insert(key, value);
        self
    }

    pub fn with_effect(mut self, key: impl Into<FactKey>, value: impl Into<FactValue>) -> Self {
        self.effects.insert(key, value);
        self
    }
}

impl Operator for ActionDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> f32 {
        if self.cost.is_finite() && self.cost > 0.0 {
            self.cost
        } else {
            0.0
        }
    }

    fn preconditions(&self) -> &FactSet {
        &self.preconditions
    }

    fn effects(&self) -> &FactSet {
        &self.effects
    }
}

/// Runtime action: symbolic contract plus the per-tick execution protocol.
///
/// `W` is the host world an action may touch while it runs (movement, reservations).
/// Each agent owns its own boxed instances, so progress fields live on `self` and are
/// reset in [`Action::enter`].
///
/// Protocol: `enter` once per activation, `step` every tick while active, `exit` exactly
/// once when the action stops being current, whatever the reason. Beliefs change on
/// `Success` only.
pub trait Action<W = ()>: 'static {
    fn def(&self) -> &ActionDef;

    fn name(&self) -> &str {
        &self.def().name
    }

    fn cost(&self) -> f32 {
        Operator::cost(self.def())
    }

    fn matches_preconditions(&self, beliefs: &FactSet) -> bool {
        self.def().matches_preconditions(beliefs)
    }

    fn satisfies_any(&self, unsatisfied: &FactSet) -> bool {
        self.def().satisfies_any(unsatisfied)
    }

    fn conflicts(&self, unsatisfied: &FactSet) -> bool {
        self.def().conflicts(unsatisfied)
    }

    fn regress(&self, unsatisfied: &FactSet, beliefs: &FactSet) -> Option<FactSet> {
        self.def().regress(unsatisfied, beliefs)
    }

    /// Execution-time gate, separate from the symbolic preconditions.
    fn runtime_ready(&self, _agent: AgentId, _beliefs: &BeliefStore, _world: &W) -> bool {
        true
    }

    fn enter(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentId,
        _beliefs: &mut BeliefStore,
        _world: &mut W,
    ) {
    }

    fn step(
        &mut self,
        ctx: &TickContext,
        agent: AgentId,
        beliefs: &mut BeliefStore,
        world: &mut W,
    ) -> ActionStatus;

    fn exit(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentId,
        _beliefs: &mut BeliefStore,
        _world: &mut W,
    ) {
    }
}

/// Borrowed [`Operator`] view of a runtime action, so the planner can search over an
/// agent's boxed actions (including overridden regression) without knowing `W`.
pub struct ActionOperator<'a, W: 'static>(pub &'a dyn Action<W>);

impl<W: 'static> Operator for ActionOperator<'_, W> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn cost(&self) -> f32 {
        self.0.cost()
    }

    fn preconditions(&self) -> &FactSet {
        &self.0.def().preconditions
    }

    fn effects(&self) -> &FactSet {
        &self.0.def().effects
    }

    fn matches_preconditions(&self, beliefs: &FactSet) -> bool {
        self.0.matches_preconditions(beliefs)
    }

    fn satisfies_any(&self, unsatisfied: &FactSet) -> bool {
        self.0.satisfies_any(unsatisfied)
    }

    fn conflicts(&self, unsatisfied: &FactSet) -> bool {
        self.0.conflicts(unsatisfied)
    }

    fn regress(&self, unsatisfied: &FactSet, beliefs: &FactSet) -> Option<FactSet> {
        self.0.regress(unsatisfied, beliefs)
    }
}
