use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use goap_agent::{
    Agent, AgentState, ManualClock, Orchestrator, OrchestratorConfig, OrchestratorError,
};
use goap_core::{Action, ActionDef, ActionStatus, AgentId, BeliefStore, GoalDef, TickContext};
use proptest::prelude::*;

/// Shared record of which agent thought, in order.
type Thinks = Rc<RefCell<Vec<AgentId>>>;

/// Agent with no goals whose sensor costs `cost` of clock time per think.
fn costly_thinker(id: u64, clock: &ManualClock, cost: Duration, thinks: &Thinks) -> Agent {
    let clock = clock.clone();
    let thinks = thinks.clone();
    Agent::new(AgentId(id)).with_sensor(
        move |_ctx: &TickContext, agent: AgentId, _beliefs: &mut BeliefStore, _world: &()| {
            clock.advance(cost);
            thinks.borrow_mut().push(agent);
        },
    )
}

fn config(budget_us: u64, interval: f32) -> OrchestratorConfig {
    OrchestratorConfig {
        think_budget_us: budget_us,
        min_think_interval: interval,
    }
}

/// Succeeds after `ticks` steps; counts exits.
struct Hold {
    def: ActionDef,
    ticks: u32,
    left: u32,
    exits: Rc<RefCell<u32>>,
}

impl Action for Hold {
    fn def(&self) -> &ActionDef {
        &self.def
    }

    fn enter(&mut self, _ctx: &TickContext, _agent: AgentId, _beliefs: &mut BeliefStore, _world: &mut ()) {
        self.left = self.ticks;
    }

    fn step(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentId,
        beliefs: &mut BeliefStore,
        _world: &mut (),
    ) -> ActionStatus {
        if self.left > 1 {
            self.left -= 1;
            return ActionStatus::Running;
        }
        beliefs.apply(&self.def.effects);
        ActionStatus::Success
    }

    fn exit(&mut self, _ctx: &TickContext, _agent: AgentId, _beliefs: &mut BeliefStore, _world: &mut ()) {
        *self.exits.borrow_mut() += 1;
    }
}

fn worker(id: u64, ticks: u32, exits: &Rc<RefCell<u32>>) -> Agent {
    Agent::new(AgentId(id))
        .with_goal(GoalDef::new("Guard", 1.0).with_desired("guarded", true))
        .with_action(Hold {
            def: ActionDef::new("StandWatch", 1.0).with_effect("guarded", true),
            ticks,
            left: 0,
            exits: exits.clone(),
        })
}

#[test]
fn budget_bounds_thinks_per_tick_without_starvation() {
    let clock = ManualClock::new();
    let thinks = Thinks::default();
    let mut orch = Orchestrator::new(config(1_000, 0.0)).with_clock(clock.clone());
    for id in 0..100 {
        orch.register(costly_thinker(id, &clock, Duration::from_micros(100), &thinks))
            .expect("register");
    }

    let first = orch.tick(0.016, &mut ());
    assert_eq!(first.thought, 10);
    assert_eq!(first.deferred, 90);
    assert_eq!(first.think_time, Duration::from_millis(1));
    assert_eq!(orch.cursor(), 10);

    for _ in 1..10 {
        let report = orch.tick(0.016, &mut ());
        assert!(report.thought <= 10);
        assert!(report.think_time <= Duration::from_millis(1));
    }

    let thinks = thinks.borrow();
    let mut seen: Vec<u64> = thinks.iter().map(|id| id.0).collect();
    assert_eq!(seen.len(), 100);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
}

#[test]
fn round_robin_resumes_at_first_deferred_agent() {
    let clock = ManualClock::new();
    let thinks = Thinks::default();
    // Three thinks fit per tick.
    let mut orch = Orchestrator::new(config(300, 0.0)).with_clock(clock.clone());
    for id in 0..5 {
        orch.register(costly_thinker(id, &clock, Duration::from_micros(100), &thinks))
            .expect("register");
    }

    for _ in 0..3 {
        orch.tick(0.1, &mut ());
    }

    let order: Vec<u64> = thinks.borrow().iter().map(|id| id.0).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 0, 1, 2, 3]);
}

#[test]
fn single_pass_never_revisits_an_agent() {
    let clock = ManualClock::new();
    let thinks = Thinks::default();
    let mut orch = Orchestrator::new(config(1_000_000, 0.0)).with_clock(clock.clone());
    for id in 0..4 {
        orch.register(costly_thinker(id, &clock, Duration::from_micros(1), &thinks))
            .expect("register");
    }

    let report = orch.tick(0.1, &mut ());
    assert_eq!(report.thought, 4);
    assert_eq!(report.deferred, 0);
    assert_eq!(thinks.borrow().len(), 4);
}

#[test]
fn priority_factor_shortens_think_interval() {
    let clock = ManualClock::new();
    let thinks = Thinks::default();
    let mut orch = Orchestrator::new(config(1_000_000, 1.0)).with_clock(clock.clone());
    orch.register(costly_thinker(1, &clock, Duration::ZERO, &thinks))
        .expect("register");
    orch.register(costly_thinker(2, &clock, Duration::ZERO, &thinks).with_priority_factor(2.0))
        .expect("register");

    for _ in 0..8 {
        orch.tick(0.25, &mut ());
    }

    let thinks = thinks.borrow();
    let normal = thinks.iter().filter(|id| id.0 == 1).count();
    let urgent = thinks.iter().filter(|id| id.0 == 2).count();
    assert_eq!(normal, 2);
    assert_eq!(urgent, 4);
}

#[test]
fn performing_agents_update_every_tick_outside_the_budget() {
    let exits = Rc::new(RefCell::new(0));
    let mut orch = Orchestrator::new(config(1_000, 0.0)).with_clock(ManualClock::new());
    let id = orch.register(worker(1, 3, &exits)).expect("register");

    let report = orch.tick(0.1, &mut ());
    assert_eq!((report.thought, report.performed), (1, 1));
    assert_eq!(orch.get(id).map(Agent::state), Some(AgentState::Performing));

    let report = orch.tick(0.1, &mut ());
    assert_eq!((report.thought, report.skipped, report.performed), (0, 1, 1));

    orch.tick(0.1, &mut ());
    assert_eq!(orch.get(id).map(Agent::state), Some(AgentState::Idle));
    assert_eq!(*exits.borrow(), 1);
    assert!(orch
        .get(id)
        .is_some_and(|agent| agent.beliefs().has("guarded")));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut orch: Orchestrator = Orchestrator::default();
    assert_eq!(orch.register(Agent::new(AgentId(7))), Ok(AgentId(7)));
    assert_eq!(
        orch.register(Agent::new(AgentId(7))),
        Err(OrchestratorError::DuplicateAgent(AgentId(7)))
    );
    assert_eq!(orch.len(), 1);
}

#[test]
fn unregister_aborts_and_removes_synchronously() {
    let exits = Rc::new(RefCell::new(0));
    let mut orch = Orchestrator::new(config(1_000, 0.0)).with_clock(ManualClock::new());
    orch.register(worker(1, 10, &exits)).expect("register");
    orch.register(worker(2, 10, &exits)).expect("register");
    orch.tick(0.1, &mut ());

    let removed = orch.unregister(AgentId(1), &mut ()).expect("registered");
    assert_eq!(removed.state(), AgentState::Idle);
    assert_eq!(*exits.borrow(), 1);
    assert_eq!(orch.ids(), vec![AgentId(2)]);
    assert!(orch.get(AgentId(1)).is_none());
    assert!(orch.unregister(AgentId(1), &mut ()).is_none());

    let report = orch.tick(0.1, &mut ());
    assert_eq!(report.performed, 1);
}

#[test]
fn unregister_keeps_cursor_on_the_same_agent() {
    let clock = ManualClock::new();
    let thinks = Thinks::default();
    let mut orch = Orchestrator::new(config(200, 0.0)).with_clock(clock.clone());
    for id in 0..5 {
        orch.register(costly_thinker(id, &clock, Duration::from_micros(100), &thinks))
            .expect("register");
    }
    orch.tick(0.1, &mut ());
    assert_eq!(orch.cursor(), 2);

    orch.unregister(AgentId(0), &mut ());
    assert_eq!(orch.cursor(), 1);

    thinks.borrow_mut().clear();
    orch.tick(0.1, &mut ());
    let order: Vec<u64> = thinks.borrow().iter().map(|id| id.0).collect();
    assert_eq!(order, vec![2, 3]);
}

#[test]
fn abort_by_id() {
    let exits = Rc::new(RefCell::new(0));
    let mut orch = Orchestrator::new(config(1_000, 0.0)).with_clock(ManualClock::new());
    orch.register(worker(1, 10, &exits)).expect("register");
    orch.tick(0.1, &mut ());

    assert_eq!(orch.abort(AgentId(1), &mut ()), Ok(true));
    assert_eq!(orch.abort(AgentId(1), &mut ()), Ok(false));
    assert_eq!(
        orch.abort(AgentId(99), &mut ()),
        Err(OrchestratorError::UnknownAgent(AgentId(99)))
    );
    assert_eq!(*exits.borrow(), 1);
}

#[test]
fn ticks_and_sim_time_advance() {
    let mut orch: Orchestrator = Orchestrator::default().with_clock(ManualClock::new());
    assert!(orch.is_empty());
    let report = orch.tick(0.5, &mut ());
    assert_eq!(report.tick, 1);
    orch.tick(-3.0, &mut ());
    assert_eq!(orch.current_tick(), 2);
    assert_eq!(orch.sim_time(), 0.5);
}

proptest! {
    #[test]
    fn every_agent_thinks_within_a_bounded_number_of_ticks(
        agents in 1u64..60,
        cost_us in 1u64..500,
        budget_us in 100u64..5_000,
    ) {
        let clock = ManualClock::new();
        let thinks = Thinks::default();
        let mut orch = Orchestrator::new(config(budget_us, 0.0)).with_clock(clock.clone());
        for id in 0..agents {
            orch.register(costly_thinker(id, &clock, Duration::from_micros(cost_us), &thinks))
                .expect("register");
        }

        let per_tick = budget_us.div_ceil(cost_us).max(1);
        let ticks = agents.div_ceil(per_tick.min(agents));
        for _ in 0..ticks {
            let report = orch.tick(0.1, &mut ());
            prop_assert!(report.thought as u64 <= per_tick);
            prop_assert!(report.think_time < Duration::from_micros(budget_us + cost_us));
        }

        let mut seen: Vec<u64> = thinks.borrow().iter().map(|id| id.0).collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len() as u64, agents);
    }
}
