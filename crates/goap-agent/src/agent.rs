use std::fmt;
use std::sync::Arc;

use goap_core::{
    Action, ActionOperator, AgentEvent, AgentId, BeliefStore, EventBus, EventSink, Executor,
    ExecutorStatus, Goal, Plan, PlanFailure, Sensor, TickContext,
};
use goap_planner::{Planner, PlannerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    Idle,
    Planning,
    Performing,
}

/// What a single [`Agent::think`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ThinkOutcome {
    /// The agent was not idle; nothing happened.
    Busy,
    /// No goal was both relevant and unachieved.
    NoGoal,
    /// The selected goal could not be planned for.
    NoPlan,
    /// The selected goal already held; the completion hook has run.
    Satisfied,
    /// A plan was handed to the executor and the agent is now performing.
    Planned { steps: usize, cost: f32 },
}

/// A planning agent: private beliefs, goals, actions and sensors, plus the executor
/// that drives the current plan.
///
/// `think` chooses a goal and plans for it; `update` advances the plan one tick. Both
/// are meant to be called by an [`crate::Orchestrator`], but hosts with a single agent
/// can drive them directly.
pub struct Agent<W: 'static = ()> {
    id: AgentId,
    beliefs: BeliefStore,
    goals: Vec<Box<dyn Goal>>,
    actions: Vec<Box<dyn Action<W>>>,
    sensors: Vec<Box<dyn Sensor<W>>>,
    planner: Planner,
    executor: Executor,
    state: AgentState,
    active_goal: Option<usize>,
    events: EventBus,
    priority_factor: f32,
}

impl<W: 'static> Agent<W> {
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self::with_beliefs(id, BeliefStore::new())
    }

    pub fn with_beliefs(id: impl Into<AgentId>, mut beliefs: BeliefStore) -> Self {
        let id = id.into();
        let events = EventBus::new();
        let bus = events.clone();
        beliefs.subscribe(move |change| {
            bus.emit(AgentEvent::BeliefChanged {
                agent: id,
                change: change.clone(),
            });
        });
        Self {
            id,
            beliefs,
            goals: Vec::new(),
            actions: Vec::new(),
            sensors: Vec::new(),
            planner: Planner::new(),
            executor: Executor::new().with_events(events.clone()),
            state: AgentState::Idle,
            active_goal: None,
            events,
            priority_factor: 1.0,
        }
    }

    pub fn with_goal(mut self, goal: impl Goal) -> Self {
        self.add_goal(goal);
        self
    }

    pub fn with_action(mut self, action: impl Action<W>) -> Self {
        self.add_action(action);
        self
    }

    pub fn with_sensor(mut self, sensor: impl Sensor<W>) -> Self {
        self.add_sensor(sensor);
        self
    }

    pub fn with_planner_config(mut self, config: PlannerConfig) -> Self {
        self.planner = Planner::new().with_config(config);
        self
    }

    pub fn with_priority_factor(mut self, factor: f32) -> Self {
        self.set_priority_factor(factor);
        self
    }

    pub fn add_goal(&mut self, goal: impl Goal) {
        self.goals.push(Box::new(goal));
    }

    pub fn add_action(&mut self, action: impl Action<W>) {
        self.actions.push(Box::new(action));
    }

    pub fn add_boxed_action(&mut self, action: Box<dyn Action<W>>) {
        self.actions.push(action);
    }

    pub fn add_sensor(&mut self, sensor: impl Sensor<W>) {
        self.sensors.push(Box::new(sensor));
    }

    pub fn subscribe(&self, sink: impl EventSink + 'static) {
        self.events.subscribe(sink);
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn beliefs(&self) -> &BeliefStore {
        &self.beliefs
    }

    pub fn beliefs_mut(&mut self) -> &mut BeliefStore {
        &mut self.beliefs
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn active_goal(&self) -> Option<&str> {
        self.active_goal.map(|i| self.goals[i].name())
    }

    pub fn current_plan(&self) -> Option<&Plan> {
        self.executor.plan()
    }

    pub fn priority_factor(&self) -> f32 {
        self.priority_factor
    }

    /// Non-positive or non-finite factors are ignored.
    pub fn set_priority_factor(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.priority_factor = factor;
        } else {
            tracing::warn!(agent = %self.id, factor, "ignoring invalid priority factor");
        }
    }

    /// Choose a goal and plan for it. Only does anything while idle.
    pub fn think(&mut self, ctx: &TickContext, world: &mut W) -> ThinkOutcome {
        if self.state != AgentState::Idle {
            return ThinkOutcome::Busy;
        }
        self.sense(ctx, world);

        let Some((goal_idx, priority)) = self.select_goal() else {
            tracing::trace!(agent = %self.id, "no relevant goal");
            return ThinkOutcome::NoGoal;
        };
        let goal: Arc<str> = self.goals[goal_idx].name().into();
        tracing::debug!(agent = %self.id, goal = %goal, priority, "goal selected");
        self.active_goal = Some(goal_idx);
        self.state = AgentState::Planning;
        self.events.emit(AgentEvent::GoalSelected {
            agent: self.id,
            goal: goal.clone(),
            priority,
        });

        match self.make_plan(goal_idx, world) {
            None => {
                tracing::debug!(agent = %self.id, goal = %goal, "no plan");
                self.events.emit(AgentEvent::PlanFailed {
                    agent: self.id,
                    goal,
                    reason: PlanFailure::NoPlan,
                });
                self.finish();
                ThinkOutcome::NoPlan
            }
            Some(plan) if plan.is_empty() => {
                tracing::debug!(agent = %self.id, goal = %goal, "goal already satisfied");
                self.complete(goal_idx);
                ThinkOutcome::Satisfied
            }
            Some(plan) => {
                let steps = plan.len();
                let cost = plan.cost();
                tracing::debug!(
                    agent = %self.id,
                    goal = %goal,
                    steps,
                    cost,
                    plan = ?plan.names(),
                    "plan created"
                );
                self.events.emit(AgentEvent::PlanCreated {
                    agent: self.id,
                    goal,
                    actions: plan.steps().iter().map(|s| s.name.clone()).collect(),
                    cost,
                });
                self.executor
                    .start(plan, &mut self.actions, ctx, self.id, &mut self.beliefs, world);
                self.state = AgentState::Performing;
                ThinkOutcome::Planned { steps, cost }
            }
        }
    }

    /// Advance the current plan by one tick. Returns [`ExecutorStatus::Idle`] when the
    /// agent is not performing.
    pub fn update(&mut self, ctx: &TickContext, world: &mut W) -> ExecutorStatus {
        if self.state != AgentState::Performing {
            return ExecutorStatus::Idle;
        }
        let Some(goal_idx) = self.active_goal else {
            self.finish();
            return ExecutorStatus::Idle;
        };
        self.sense(ctx, world);

        if self.goals[goal_idx].is_achieved(&self.beliefs) {
            tracing::debug!(agent = %self.id, goal = self.goals[goal_idx].name(), "goal achieved mid-plan");
            self.executor
                .abort(&mut self.actions, ctx, self.id, &mut self.beliefs, world);
            self.complete(goal_idx);
            return ExecutorStatus::Completed;
        }

        let status = self
            .executor
            .tick(&mut self.actions, ctx, self.id, &mut self.beliefs, world);
        match &status {
            ExecutorStatus::Running => {}
            ExecutorStatus::Completed => self.complete(goal_idx),
            ExecutorStatus::Failed { action, .. } => {
                let goal: Arc<str> = self.goals[goal_idx].name().into();
                tracing::debug!(agent = %self.id, goal = %goal, action = %action, "plan failed");
                self.events.emit(AgentEvent::PlanFailed {
                    agent: self.id,
                    goal,
                    reason: PlanFailure::ActionFailed {
                        action: action.clone(),
                    },
                });
                self.finish();
            }
            ExecutorStatus::Idle => self.finish(),
        }
        status
    }

    /// Drop the current plan without completing it. Returns whether a plan was running.
    pub fn abort(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if self.state != AgentState::Performing {
            return false;
        }
        self.executor
            .abort(&mut self.actions, ctx, self.id, &mut self.beliefs, world);
        let goal = self.active_goal.map(|i| Arc::from(self.goals[i].name()));
        tracing::debug!(agent = %self.id, goal = ?goal, "plan aborted");
        self.events.emit(AgentEvent::PlanAborted {
            agent: self.id,
            goal,
        });
        self.finish();
        true
    }

    fn sense(&mut self, ctx: &TickContext, world: &W) {
        for sensor in &mut self.sensors {
            sensor.sense(ctx, self.id, &mut self.beliefs, world);
        }
    }

    /// Highest priority among relevant, unachieved goals. Ties keep the earlier goal.
    fn select_goal(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, goal) in self.goals.iter().enumerate() {
            if !goal.is_relevant(&self.beliefs) || goal.is_achieved(&self.beliefs) {
                continue;
            }
            let priority = goal.priority(&self.beliefs);
            if priority.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, p)| priority > p) {
                best = Some((i, priority));
            }
        }
        best
    }

    fn make_plan(&self, goal_idx: usize, world: &W) -> Option<Plan> {
        let desired = self.goals[goal_idx].desired_state(&self.beliefs);
        let candidates: Vec<usize> = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.runtime_ready(self.id, &self.beliefs, world))
            .map(|(i, _)| i)
            .collect();
        let operators: Vec<ActionOperator<'_, W>> = candidates
            .iter()
            .map(|&i| ActionOperator(self.actions[i].as_ref()))
            .collect();

        let report = self
            .planner
            .search(self.beliefs.facts(), &desired, &operators);
        tracing::trace!(
            agent = %self.id,
            candidates = candidates.len(),
            expansions = report.expansions,
            exhausted = report.exhausted,
            "search finished"
        );
        report.plan.map(|plan| plan.map_actions(|i| candidates[i]))
    }

    fn complete(&mut self, goal_idx: usize) {
        let goal = &self.goals[goal_idx];
        goal.on_plan_complete(self.id, &mut self.beliefs);
        tracing::debug!(agent = %self.id, goal = goal.name(), "plan completed");
        self.events.emit(AgentEvent::PlanCompleted {
            agent: self.id,
            goal: goal.name().into(),
        });
        self.finish();
    }

    fn finish(&mut self) {
        self.active_goal = None;
        self.state = AgentState::Idle;
    }
}

impl<W: 'static> fmt::Debug for Agent<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("active_goal", &self.active_goal())
            .field("goals", &self.goals.len())
            .field("actions", &self.actions.len())
            .field("sensors", &self.sensors.len())
            .field("priority_factor", &self.priority_factor)
            .field("beliefs", &self.beliefs)
            .finish()
    }
}
