use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::event::{ActionEndReason, AgentEvent, EventBus};
use crate::{Action, ActionStatus, AgentId, BeliefStore, TickContext};

/// One entry of a plan: an index into the owning agent's action list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanStep {
    pub action: usize,
    pub name: Arc<str>,
}

/// Ordered action sequence produced by one planning call.
///
/// An empty plan means the goal already held when planning started.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plan {
    steps: Vec<PlanStep>,
    cost: f32,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>, cost: f32) -> Self {
        Self { steps, cost }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| &*s.name).collect()
    }

    /// Rewrite step indices, e.g. from a filtered candidate list back to the full action list.
    pub fn map_actions(mut self, mut f: impl FnMut(usize) -> usize) -> Self {
        for step in &mut self.steps {
            step.action = f(step.action);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorStatus {
    /// No plan loaded.
    Idle,
    Running,
    Completed,
    Failed { index: usize, action: Arc<str> },
}

/// Drives a fixed plan one action at a time.
///
/// The executor never loops internally: each `tick` steps the current action once and
/// hands control back. `exit` is always paired with a prior `enter`.
#[derive(Debug, Default)]
pub struct Executor {
    plan: Option<Plan>,
    index: usize,
    entered: bool,
    events: EventBus,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.plan.is_some()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The action that has been entered and not yet exited, if any.
    pub fn current_action(&self) -> Option<&str> {
        if !self.entered {
            return None;
        }
        self.plan
            .as_ref()
            .and_then(|p| p.steps.get(self.index))
            .map(|s| &*s.name)
    }

    /// Load `plan`, aborting whatever was running. An empty plan completes at once.
    pub fn start<W: 'static>(
        &mut self,
        plan: Plan,
        actions: &mut [Box<dyn Action<W>>],
        ctx: &TickContext,
        agent: AgentId,
        beliefs: &mut BeliefStore,
        world: &mut W,
    ) -> ExecutorStatus {
        self.abort(actions, ctx, agent, beliefs, world);
        if plan.is_empty() {
            return ExecutorStatus::Completed;
        }
        tracing::trace!(%agent, steps = plan.len(), "executor start");
        self.plan = Some(plan);
        self.index = 0;
        self.entered = false;
        ExecutorStatus::Running
    }

    pub fn tick<W: 'static>(
        &mut self,
        actions: &mut [Box<dyn Action<W>>],
        ctx: &TickContext,
        agent: AgentId,
        beliefs: &mut BeliefStore,
        world: &mut W,
    ) -> ExecutorStatus {
        let Some(plan) = self.plan.as_ref() else {
            return ExecutorStatus::Idle;
        };
        let len = plan.len();
        let Some(step) = plan.steps.get(self.index).cloned() else {
            self.reset();
            return ExecutorStatus::Completed;
        };

        let Some(action) = actions.get_mut(step.action) else {
            tracing::warn!(%agent, action = %step.name, index = step.action, "plan step out of range");
            return self.fail(step);
        };

        if !self.entered {
            if !action.runtime_ready(agent, beliefs, world) {
                tracing::debug!(%agent, action = %step.name, "runtime gate closed");
                return self.fail(step);
            }
            tracing::trace!(%agent, action = %step.name, "enter");
            action.enter(ctx, agent, beliefs, world);
            self.entered = true;
            self.events.emit(AgentEvent::ActionStarted {
                agent,
                action: step.name.clone(),
            });
        }

        match action.step(ctx, agent, beliefs, world) {
            ActionStatus::Running => ExecutorStatus::Running,
            ActionStatus::Success => {
                tracing::trace!(%agent, action = %step.name, "exit (success)");
                action.exit(ctx, agent, beliefs, world);
                self.entered = false;
                self.events.emit(AgentEvent::ActionEnded {
                    agent,
                    action: step.name,
                    reason: ActionEndReason::Success,
                });
                self.index += 1;
                if self.index >= len {
                    self.reset();
                    ExecutorStatus::Completed
                } else {
                    ExecutorStatus::Running
                }
            }
            ActionStatus::Failure => {
                tracing::trace!(%agent, action = %step.name, "exit (failure)");
                action.exit(ctx, agent, beliefs, world);
                self.entered = false;
                self.events.emit(AgentEvent::ActionEnded {
                    agent,
                    action: step.name.clone(),
                    reason: ActionEndReason::Failure,
                });
                self.fail(step)
            }
        }
    }

    /// Stop the plan without completing it. Returns whether an entered action was exited.
    pub fn abort<W: 'static>(
        &mut self,
        actions: &mut [Box<dyn Action<W>>],
        ctx: &TickContext,
        agent: AgentId,
        beliefs: &mut BeliefStore,
        world: &mut W,
    ) -> bool {
        let mut exited = false;
        if self.entered {
            let step = self
                .plan
                .as_ref()
                .and_then(|p| p.steps.get(self.index))
                .cloned();
            if let Some(step) = step {
                if let Some(action) = actions.get_mut(step.action) {
                    tracing::trace!(%agent, action = %step.name, "exit (aborted)");
                    action.exit(ctx, agent, beliefs, world);
                    exited = true;
                    self.events.emit(AgentEvent::ActionEnded {
                        agent,
                        action: step.name,
                        reason: ActionEndReason::Aborted,
                    });
                }
            }
        }
        self.reset();
        exited
    }

    fn fail(&mut self, step: PlanStep) -> ExecutorStatus {
        let index = self.index;
        self.reset();
        ExecutorStatus::Failed {
            index,
            action: step.name,
        }
    }

    fn reset(&mut self) {
        self.plan = None;
        self.index = 0;
        self.entered = false;
    }
}
