use std::cell::RefCell;
use std::rc::Rc;

use goap_core::{
    Action, ActionDef, ActionEndReason, ActionStatus, AgentEvent, AgentId, BeliefStore, EventBus,
    EventLog, Executor, ExecutorStatus, Plan, PlanStep, TickContext,
};

const AGENT: AgentId = AgentId(7);

type Log = Rc<RefCell<Vec<String>>>;

/// Replays a fixed status script; repeats the last status once exhausted.
struct ScriptedAction {
    def: ActionDef,
    script: Vec<ActionStatus>,
    cursor: usize,
    ready: bool,
    log: Log,
}

impl ScriptedAction {
    fn new(name: &str, script: Vec<ActionStatus>, log: &Log) -> Self {
        Self {
            def: ActionDef::new(name, 1.0).with_effect(format!("{name}_done"), true),
            script,
            cursor: 0,
            ready: true,
            log: log.clone(),
        }
    }

    fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }
}

impl Action for ScriptedAction {
    fn def(&self) -> &ActionDef {
        &self.def
    }

    fn runtime_ready(&self, _agent: AgentId, _beliefs: &BeliefStore, _world: &()) -> bool {
        self.ready
    }

    fn enter(&mut self, _ctx: &TickContext, _agent: AgentId, _beliefs: &mut BeliefStore, _world: &mut ()) {
        self.cursor = 0;
        self.log.borrow_mut().push(format!("enter:{}", self.def.name));
    }

    fn step(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentId,
        beliefs: &mut BeliefStore,
        _world: &mut (),
    ) -> ActionStatus {
        self.log.borrow_mut().push(format!("step:{}", self.def.name));
        let status = self.script[self.cursor.min(self.script.len() - 1)];
        self.cursor += 1;
        if status == ActionStatus::Success {
            beliefs.apply(&self.def.effects);
        }
        status
    }

    fn exit(&mut self, _ctx: &TickContext, _agent: AgentId, _beliefs: &mut BeliefStore, _world: &mut ()) {
        self.log.borrow_mut().push(format!("exit:{}", self.def.name));
    }
}

fn plan_of(names: &[&str]) -> Plan {
    let steps = names
        .iter()
        .enumerate()
        .map(|(i, n)| PlanStep {
            action: i,
            name: (*n).into(),
        })
        .collect();
    Plan::new(steps, names.len() as f32)
}

fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

#[test]
fn two_step_plan_completes_on_fourth_tick() {
    use ActionStatus::*;
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![
        Box::new(ScriptedAction::new("a", vec![Running, Running, Success], &log)),
        Box::new(ScriptedAction::new("b", vec![Success], &log)),
    ];
    let mut beliefs = BeliefStore::new();
    let mut exec = Executor::new();

    let ctx = TickContext::new(0, 0.1);
    let status = exec.start(plan_of(&["a", "b"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    assert_eq!(status, ExecutorStatus::Running);

    let mut statuses = Vec::new();
    for tick in 1..=4 {
        let ctx = TickContext::new(tick, 0.1);
        statuses.push(exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()));
    }

    assert_eq!(
        statuses,
        vec![
            ExecutorStatus::Running,
            ExecutorStatus::Running,
            ExecutorStatus::Running,
            ExecutorStatus::Completed,
        ]
    );
    assert_eq!(count(&log, "enter:a"), 1);
    assert_eq!(count(&log, "exit:a"), 1);
    assert_eq!(count(&log, "enter:b"), 1);
    assert_eq!(count(&log, "exit:b"), 1);
    assert_eq!(
        *log.borrow(),
        vec![
            "enter:a", "step:a", "step:a", "step:a", "exit:a", "enter:b", "step:b", "exit:b"
        ]
    );
    assert!(beliefs.has("a_done") && beliefs.has("b_done"));
    assert!(!exec.is_active());
    assert_eq!(
        exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()),
        ExecutorStatus::Idle
    );
}

#[test]
fn empty_plan_completes_without_entering() {
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![Box::new(ScriptedAction::new(
        "a",
        vec![ActionStatus::Success],
        &log,
    ))];
    let mut exec = Executor::new();
    let status = exec.start(
        Plan::empty(),
        &mut actions,
        &TickContext::new(0, 0.1),
        AGENT,
        &mut BeliefStore::new(),
        &mut (),
    );
    assert_eq!(status, ExecutorStatus::Completed);
    assert!(!exec.is_active());
    assert!(log.borrow().is_empty());
}

#[test]
fn failure_exits_once_and_names_the_action() {
    use ActionStatus::*;
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![
        Box::new(ScriptedAction::new("a", vec![Success], &log)),
        Box::new(ScriptedAction::new("b", vec![Running, Failure], &log)),
        Box::new(ScriptedAction::new("c", vec![Success], &log)),
    ];
    let mut beliefs = BeliefStore::new();
    let mut exec = Executor::new();
    let ctx = TickContext::new(0, 0.1);
    exec.start(plan_of(&["a", "b", "c"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());

    let mut last = ExecutorStatus::Running;
    for _ in 0..3 {
        last = exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    }

    assert_eq!(
        last,
        ExecutorStatus::Failed {
            index: 1,
            action: "b".into()
        }
    );
    assert_eq!(count(&log, "exit:b"), 1);
    assert_eq!(count(&log, "enter:c"), 0);
    assert!(!beliefs.has("b_done"));
    assert!(!exec.is_active());
}

#[test]
fn abort_exits_entered_action_exactly_once() {
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![Box::new(ScriptedAction::new(
        "work",
        vec![ActionStatus::Running],
        &log,
    ))];
    let mut beliefs = BeliefStore::new();
    let mut exec = Executor::new();
    let ctx = TickContext::new(0, 0.1);
    exec.start(plan_of(&["work"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    assert_eq!(exec.current_action(), Some("work"));

    assert!(exec.abort(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()));
    assert!(!exec.abort(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()));

    assert_eq!(count(&log, "exit:work"), 1);
    assert!(!exec.is_active());
}

#[test]
fn abort_before_first_tick_does_not_exit() {
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![Box::new(ScriptedAction::new(
        "work",
        vec![ActionStatus::Running],
        &log,
    ))];
    let mut exec = Executor::new();
    let ctx = TickContext::new(0, 0.1);
    let mut beliefs = BeliefStore::new();
    exec.start(plan_of(&["work"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    assert!(!exec.abort(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()));
    assert!(log.borrow().is_empty());
}

#[test]
fn starting_a_new_plan_aborts_the_running_one() {
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![
        Box::new(ScriptedAction::new("slow", vec![ActionStatus::Running], &log)),
        Box::new(ScriptedAction::new("fast", vec![ActionStatus::Success], &log)),
    ];
    let mut beliefs = BeliefStore::new();
    let mut exec = Executor::new();
    let ctx = TickContext::new(0, 0.1);
    exec.start(plan_of(&["slow"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());

    let plan = Plan::new(
        vec![PlanStep {
            action: 1,
            name: "fast".into(),
        }],
        1.0,
    );
    exec.start(plan, &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    assert_eq!(count(&log, "exit:slow"), 1);
    assert_eq!(
        exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ()),
        ExecutorStatus::Completed
    );
}

#[test]
fn closed_runtime_gate_fails_without_entering() {
    let log = Log::default();
    let mut actions: Vec<Box<dyn Action>> = vec![Box::new(
        ScriptedAction::new("strike", vec![ActionStatus::Success], &log).not_ready(),
    )];
    let mut exec = Executor::new();
    let ctx = TickContext::new(0, 0.1);
    let mut beliefs = BeliefStore::new();
    exec.start(plan_of(&["strike"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    let status = exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    assert_eq!(
        status,
        ExecutorStatus::Failed {
            index: 0,
            action: "strike".into()
        }
    );
    assert!(log.borrow().is_empty());
}

#[test]
fn lifecycle_events_pair_start_and_end() {
    use ActionStatus::*;
    let log = Log::default();
    let events = EventLog::new();
    let bus = EventBus::new();
    bus.subscribe(events.clone());

    let mut actions: Vec<Box<dyn Action>> = vec![
        Box::new(ScriptedAction::new("a", vec![Success], &log)),
        Box::new(ScriptedAction::new("b", vec![Running], &log)),
    ];
    let mut beliefs = BeliefStore::new();
    let mut exec = Executor::new().with_events(bus);
    let ctx = TickContext::new(0, 0.1);
    exec.start(plan_of(&["a", "b"]), &mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    exec.tick(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());
    exec.abort(&mut actions, &ctx, AGENT, &mut beliefs, &mut ());

    let ends: Vec<ActionEndReason> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AgentEvent::ActionEnded { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(events.count("action.started"), 2);
    assert_eq!(ends, vec![ActionEndReason::Success, ActionEndReason::Aborted]);
}
