use std::sync::Arc;

use goap_core::{AgentEvent, AgentId, EventBus, EventLog, EventSink};

fn completed(goal: &str) -> AgentEvent {
    AgentEvent::PlanCompleted {
        agent: AgentId(1),
        goal: Arc::from(goal),
    }
}

/// Re-emits each `plan.completed` as a `plan.aborted` through its own bus handle.
struct Echo {
    bus: EventBus,
}

impl EventSink for Echo {
    fn emit(&mut self, event: &AgentEvent) {
        if let AgentEvent::PlanCompleted { agent, goal } = event {
            self.bus.emit(AgentEvent::PlanAborted {
                agent: *agent,
                goal: Some(goal.clone()),
            });
        }
    }
}

/// Subscribes `late` on the first event it sees.
struct Recruiter {
    bus: EventBus,
    late: Option<EventLog>,
}

impl EventSink for Recruiter {
    fn emit(&mut self, _event: &AgentEvent) {
        if let Some(late) = self.late.take() {
            self.bus.subscribe(late);
        }
    }
}

#[test]
fn every_sink_sees_every_event_in_order() {
    let bus = EventBus::new();
    assert!(!bus.has_subscribers());
    let first = EventLog::new();
    let second = EventLog::new();
    bus.subscribe(first.clone());
    bus.subscribe(second.clone());

    bus.emit(completed("a"));
    bus.emit(completed("b"));

    assert!(bus.has_subscribers());
    assert_eq!(first.events(), vec![completed("a"), completed("b")]);
    assert_eq!(second.events(), first.events());
}

#[test]
fn sink_may_emit_through_the_bus() {
    let bus = EventBus::new();
    let log = EventLog::new();
    bus.subscribe(Echo { bus: bus.clone() });
    bus.subscribe(log.clone());

    bus.emit(completed("chop"));

    // The nested event waits until the outer one reached every sink.
    assert_eq!(log.tags(), vec!["plan.completed", "plan.aborted"]);
}

#[test]
fn sink_may_subscribe_while_dispatching() {
    let bus = EventBus::new();
    let late = EventLog::new();
    bus.subscribe(Recruiter {
        bus: bus.clone(),
        late: Some(late.clone()),
    });

    bus.emit(completed("a"));
    assert!(late.is_empty());

    bus.emit(completed("b"));
    assert_eq!(late.events(), vec![completed("b")]);
}
