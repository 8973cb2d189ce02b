//! YAML scenarios: a shared world, action and goal templates, and the agents using them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use goap_agent::{Agent, EngineConfig, Orchestrator};
use goap_core::{
    Action, ActionDef, ActionStatus, AgentId, BeliefStore, EventLog, FactSet, GoalDef,
    MirrorSensor, SharedBeliefs, TickContext, TracingEventSink,
};
use serde::Deserialize;

/// Action template plus the timing and world coupling the demo needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionTemplate {
    #[serde(flatten)]
    pub def: ActionDef,

    /// Simulated seconds before the action succeeds.
    #[serde(default)]
    pub duration: f32,

    /// Also write the effects into the shared world on success.
    #[serde(default)]
    pub shared: bool,

    /// World facts that must hold for the action to start.
    #[serde(default)]
    pub world_requires: FactSet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub beliefs: FactSet,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default = "default_priority_factor")]
    pub priority_factor: f32,
    /// World keys mirrored into the agent's beliefs every think and update.
    #[serde(default)]
    pub mirror: Vec<String>,
}

fn default_priority_factor() -> f32 {
    1.0
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub engine: EngineConfig,
    pub world: FactSet,
    pub actions: Vec<ActionTemplate>,
    pub goals: Vec<GoalDef>,
    pub agents: Vec<AgentSpec>,
}

/// A built scenario, ready to tick.
pub struct Session {
    pub world: SharedBeliefs,
    pub orchestrator: Orchestrator<SharedBeliefs>,
    pub events: EventLog,
    names: BTreeMap<AgentId, String>,
}

impl Session {
    pub fn agent_id(&self, name: &str) -> Option<AgentId> {
        self.names
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }

    pub fn agent_name(&self, id: AgentId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to load scenario {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content).context("invalid scenario YAML")?;
        scenario.engine.validate()?;
        Ok(scenario)
    }

    pub fn build(&self) -> Result<Session> {
        let world = SharedBeliefs::new(BeliefStore::from_facts(self.world.clone()));
        let events = EventLog::new();

        let actions: HashMap<&str, Arc<ActionTemplate>> = self
            .actions
            .iter()
            .map(|t| (&*t.def.name, Arc::new(t.clone())))
            .collect();
        let goals: HashMap<&str, &GoalDef> = self.goals.iter().map(|g| (&*g.name, g)).collect();

        let mut orchestrator = Orchestrator::new(self.engine.orchestrator.clone());
        let mut names: BTreeMap<AgentId, String> = BTreeMap::new();

        for (index, spec) in self.agents.iter().enumerate() {
            let id = AgentId(index as u64 + 1);
            if names.values().any(|n| n == &spec.name) {
                bail!("agent name {:?} is used twice", spec.name);
            }

            let mut agent = Agent::with_beliefs(id, BeliefStore::from_facts(spec.beliefs.clone()))
                .with_planner_config(self.engine.planner)
                .with_priority_factor(spec.priority_factor);
            for goal in &spec.goals {
                let Some(def) = goals.get(goal.as_str()) else {
                    bail!("agent {:?} references unknown goal {:?}", spec.name, goal);
                };
                agent.add_goal((*def).clone());
            }
            for action in &spec.actions {
                let Some(template) = actions.get(action.as_str()) else {
                    bail!("agent {:?} references unknown action {:?}", spec.name, action);
                };
                agent.add_action(TimedAction::new(template.clone()));
            }
            if !spec.mirror.is_empty() {
                let keys = spec.mirror.iter().map(String::as_str);
                agent.add_sensor(MirrorSensor::new(world.clone(), keys));
            }
            agent.subscribe(events.clone());
            agent.subscribe(TracingEventSink);

            orchestrator.register(agent)?;
            names.insert(id, spec.name.clone());
        }

        tracing::info!(
            agents = names.len(),
            actions = self.actions.len(),
            goals = self.goals.len(),
            "scenario built"
        );
        Ok(Session {
            world,
            orchestrator,
            events,
            names,
        })
    }
}

/// Runs for the template's duration, then applies its effects.
pub struct TimedAction {
    template: Arc<ActionTemplate>,
    elapsed: f32,
}

impl TimedAction {
    pub fn new(template: Arc<ActionTemplate>) -> Self {
        Self {
            template,
            elapsed: 0.0,
        }
    }
}

impl Action<SharedBeliefs> for TimedAction {
    fn def(&self) -> &ActionDef {
        &self.template.def
    }

    fn runtime_ready(&self, _agent: AgentId, _beliefs: &BeliefStore, world: &SharedBeliefs) -> bool {
        world.borrow().matches(&self.template.world_requires)
    }

    fn enter(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentId,
        _beliefs: &mut BeliefStore,
        _world: &mut SharedBeliefs,
    ) {
        self.elapsed = 0.0;
    }

    fn step(
        &mut self,
        ctx: &TickContext,
        agent: AgentId,
        beliefs: &mut BeliefStore,
        world: &mut SharedBeliefs,
    ) -> ActionStatus {
        self.elapsed += ctx.dt_seconds;
        if self.elapsed < self.template.duration {
            return ActionStatus::Running;
        }
        let effects = &self.template.def.effects;
        beliefs.apply(effects);
        if self.template.shared {
            world.borrow_mut().apply(effects);
        }
        tracing::trace!(%agent, action = %self.template.def.name, "timed action done");
        ActionStatus::Success
    }
}
