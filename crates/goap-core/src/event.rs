use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AgentId, BeliefChange};

/// Why a plan did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanFailure {
    /// The planner found no action sequence within its limits.
    NoPlan,
    /// An action reported `Failure`, or its runtime gate closed before it started.
    ActionFailed { action: Arc<str> },
}

/// How an action stopped being the executor's current action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionEndReason {
    Success,
    Failure,
    Aborted,
}

/// Lifecycle events surfaced to the host.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AgentEvent {
    GoalSelected {
        agent: AgentId,
        goal: Arc<str>,
        priority: f32,
    },
    PlanCreated {
        agent: AgentId,
        goal: Arc<str>,
        actions: Vec<Arc<str>>,
        cost: f32,
    },
    PlanFailed {
        agent: AgentId,
        goal: Arc<str>,
        reason: PlanFailure,
    },
    PlanCompleted {
        agent: AgentId,
        goal: Arc<str>,
    },
    PlanAborted {
        agent: AgentId,
        goal: Option<Arc<str>>,
    },
    ActionStarted {
        agent: AgentId,
        action: Arc<str>,
    },
    ActionEnded {
        agent: AgentId,
        action: Arc<str>,
        reason: ActionEndReason,
    },
    BeliefChanged {
        agent: AgentId,
        change: BeliefChange,
    },
}

impl AgentEvent {
    pub fn agent(&self) -> AgentId {
        match self {
            AgentEvent::GoalSelected { agent, .. }
            | AgentEvent::PlanCreated { agent, .. }
            | AgentEvent::PlanFailed { agent, .. }
            | AgentEvent::PlanCompleted { agent, .. }
            | AgentEvent::PlanAborted { agent, .. }
            | AgentEvent::ActionStarted { agent, .. }
            | AgentEvent::ActionEnded { agent, .. }
            | AgentEvent::BeliefChanged { agent, .. } => *agent,
        }
    }

    /// Short stable tag, handy for filtering logs and assertions.
    pub fn tag(&self) -> &'static str {
        match self {
            AgentEvent::GoalSelected { .. } => "goal.selected",
            AgentEvent::PlanCreated { .. } => "plan.created",
            AgentEvent::PlanFailed { .. } => "plan.failed",
            AgentEvent::PlanCompleted { .. } => "plan.completed",
            AgentEvent::PlanAborted { .. } => "plan.aborted",
            AgentEvent::ActionStarted { .. } => "action.started",
            AgentEvent::ActionEnded { .. } => "action.ended",
            AgentEvent::BeliefChanged { .. } => "belief.changed",
        }
    }
}

pub trait EventSink {
    fn emit(&mut self, event: &AgentEvent);
}

#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &AgentEvent) {}
}

/// In-memory event log. Clones share the same storage, so the host can keep one
/// handle and subscribe another.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<AgentEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<AgentEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn count(&self, tag: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.tag() == tag)
            .count()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(AgentEvent::tag).collect()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AgentEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Forwards every event to `tracing` at debug level.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: &AgentEvent) {
        tracing::debug!(agent = %event.agent(), tag = event.tag(), ?event, "agent event");
    }
}

/// Fan-out of agent events to every subscribed sink, delivered synchronously.
///
/// Cheap to clone; clones share the subscriber list. A sink may emit or subscribe
/// through a clone while it is being called: nested events are queued and delivered
/// in order once the current event has reached every sink, and new sinks receive
/// events from the next one on.
#[derive(Clone, Default)]
pub struct EventBus {
    sinks: Rc<RefCell<Vec<Box<dyn EventSink>>>>,
    joining: Rc<RefCell<Vec<Box<dyn EventSink>>>>,
    queue: Rc<RefCell<VecDeque<AgentEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: impl EventSink + 'static) {
        match self.sinks.try_borrow_mut() {
            Ok(mut sinks) => sinks.push(Box::new(sink)),
            Err(_) => self.joining.borrow_mut().push(Box::new(sink)),
        }
    }

    pub fn has_subscribers(&self) -> bool {
        self.sinks.try_borrow().map_or(true, |sinks| !sinks.is_empty())
            || !self.joining.borrow().is_empty()
    }

    pub fn emit(&self, event: AgentEvent) {
        self.queue.borrow_mut().push_back(event);
        // Already dispatching further up the stack; that loop drains the queue.
        let Ok(mut sinks) = self.sinks.try_borrow_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            for sink in sinks.iter_mut() {
                sink.emit(&event);
            }
            sinks.append(&mut self.joining.borrow_mut());
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.try_borrow().map(|s| s.len()).ok())
            .finish()
    }
}
