use std::time::Duration;

use goap_core::{AgentId, TickContext};

use crate::{Agent, AgentState, Clock, MonotonicClock, OrchestratorConfig, OrchestratorError};

/// Per-tick scheduling summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Agents whose `think` ran.
    pub thought: usize,
    /// Agents visited but not thinking (busy, or their think interval has not elapsed).
    pub skipped: usize,
    /// Agents the think pass did not reach before the budget ran out.
    pub deferred: usize,
    /// Performing agents updated after the think pass.
    pub performed: usize,
    pub think_time: Duration,
}

struct Slot<W: 'static> {
    agent: Agent<W>,
    /// Simulated time of the last think, in seconds.
    last_think: Option<f64>,
}

/// Holds the live agents and grants them a bounded think budget each tick.
///
/// Idle agents think in round-robin order starting at a cursor that persists across
/// ticks; the pass stops once measured think time reaches the budget and resumes from
/// the first agent it did not reach. Performing agents are updated every tick
/// regardless of budget.
pub struct Orchestrator<W: 'static = ()> {
    config: OrchestratorConfig,
    clock: Box<dyn Clock>,
    slots: Vec<Slot<W>>,
    cursor: usize,
    tick: u64,
    sim_time: f64,
}

impl<W: 'static> Orchestrator<W> {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            clock: Box::new(MonotonicClock::new()),
            slots: Vec::new(),
            cursor: 0,
            tick: 0,
            sim_time: 0.0,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn register(&mut self, agent: Agent<W>) -> Result<AgentId, OrchestratorError> {
        let id = agent.id();
        if self.position(id).is_some() {
            return Err(OrchestratorError::DuplicateAgent(id));
        }
        tracing::debug!(agent = %id, "agent registered");
        self.slots.push(Slot {
            agent,
            last_think: None,
        });
        Ok(id)
    }

    /// Abort the agent's plan and remove it from the schedule.
    pub fn unregister(&mut self, id: AgentId, world: &mut W) -> Option<Agent<W>> {
        let idx = self.position(id)?;
        let mut slot = self.slots.remove(idx);
        slot.agent.abort(&self.context(0.0), world);

        if idx < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }
        tracing::debug!(agent = %id, "agent unregistered");
        Some(slot.agent)
    }

    /// Abort one agent's current plan.
    pub fn abort(&mut self, id: AgentId, world: &mut W) -> Result<bool, OrchestratorError> {
        let ctx = self.context(0.0);
        let idx = self
            .position(id)
            .ok_or(OrchestratorError::UnknownAgent(id))?;
        Ok(self.slots[idx].agent.abort(&ctx, world))
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent<W>> {
        self.position(id).map(|i| &self.slots[i].agent)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent<W>> {
        self.position(id).map(|i| &mut self.slots[i].agent)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.slots.iter().map(|s| s.agent.id()).collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent<W>> {
        self.slots.iter().map(|s| &s.agent)
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds accumulated from `dt`.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Index of the agent the next think pass starts from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tick(&mut self, dt: f32, world: &mut W) -> TickReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.tick += 1;
        self.sim_time += f64::from(dt);
        let ctx = self.context(dt);

        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let budget = self.config.think_budget();
        let min_interval = f64::from(self.config.min_think_interval);
        let count = self.slots.len();
        let start = self.clock.now();

        for visited in 0..count {
            let idx = (self.cursor + visited) % count;
            let slot = &mut self.slots[idx];

            let interval = min_interval / f64::from(slot.agent.priority_factor());
            let due = slot
                .last_think
                .map_or(true, |last| self.sim_time - last >= interval);
            if slot.agent.state() != AgentState::Idle || !due {
                report.skipped += 1;
                continue;
            }

            // The first think of a pass always runs.
            if report.thought > 0 && self.clock.now().saturating_sub(start) >= budget {
                report.deferred = count - visited;
                self.cursor = idx;
                break;
            }

            let outcome = slot.agent.think(&ctx, world);
            slot.last_think = Some(self.sim_time);
            report.thought += 1;
            tracing::trace!(agent = %slot.agent.id(), ?outcome, "think");
        }
        report.think_time = self.clock.now().saturating_sub(start);

        for slot in &mut self.slots {
            if slot.agent.state() == AgentState::Performing {
                slot.agent.update(&ctx, world);
                report.performed += 1;
            }
        }

        if report.deferred > 0 {
            tracing::debug!(
                tick = self.tick,
                thought = report.thought,
                deferred = report.deferred,
                think_us = report.think_time.as_micros() as u64,
                "think budget exhausted"
            );
        }
        report
    }

    fn position(&self, id: AgentId) -> Option<usize> {
        self.slots.iter().position(|s| s.agent.id() == id)
    }

    fn context(&self, dt: f32) -> TickContext {
        TickContext::new(self.tick, dt)
    }
}

impl<W: 'static> Default for Orchestrator<W> {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}
