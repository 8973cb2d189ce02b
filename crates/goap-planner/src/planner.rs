use core::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use goap_core::{FactKey, FactSet, FactValue, Operator, Plan, PlanStep};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Heuristic reported for a set holding a fact no operator can produce.
pub const UNREACHABLE: f32 = f32::INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PlannerConfig {
    /// Max node expansions before giving up (loop protection).
    pub max_expansions: usize,
    /// Optional wall-clock ceiling per planning call, in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 4096,
            time_limit_ms: None,
        }
    }
}

impl PlannerConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Result of one search, with bookkeeping for logs and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// `Some(empty)` when the goal already holds, `None` when no plan was found.
    pub plan: Option<Plan>,
    pub expansions: usize,
    /// True when the search stopped on a ceiling rather than running out of nodes.
    pub exhausted: bool,
}

/// Backward A* over unsatisfied-condition sets.
///
/// Search starts from the desired facts the beliefs do not already satisfy and
/// regresses through operators whose effects produce at least one of them, until
/// nothing is left unsatisfied. Reading the terminal node's parent chain yields the
/// actions in execution order.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

#[derive(Debug)]
struct Node {
    unsatisfied: FactSet,
    action: Option<usize>,
    parent: Option<usize>,
    g: f32,
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f32,
    g: f32,
    node: usize,
    tie: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lowest f first, then highest g, then insertion order.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

fn step_cost<O: Operator>(op: &O) -> f32 {
    let cost = op.cost();
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}

/// Per-call memo of the cheapest producer of each fact.
struct FactCosts<'o, O> {
    operators: &'o [O],
    cache: HashMap<(FactKey, FactValue), Option<f32>>,
}

impl<'o, O: Operator> FactCosts<'o, O> {
    fn new(operators: &'o [O]) -> Self {
        Self {
            operators,
            cache: HashMap::new(),
        }
    }

    /// `None` when no operator produces the fact.
    fn cheapest_producer(&mut self, key: &FactKey, value: &FactValue) -> Option<f32> {
        let operators = self.operators;
        match self.cache.entry((key.clone(), value.clone())) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let cost = operators
                    .iter()
                    .filter(|op| op.effects().contains(key, value))
                    .map(step_cost)
                    .reduce(f32::min);
                *e.insert(cost)
            }
        }
    }

    /// Max over facts, not the sum: one action may resolve several facts at once.
    /// `None` when some fact has no producer.
    fn estimate(&mut self, unsatisfied: &FactSet) -> Option<f32> {
        unsatisfied
            .iter()
            .try_fold(0.0, |h: f32, (k, v)| Some(h.max(self.cheapest_producer(k, v)?)))
    }
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Admissible estimate of the cost left to resolve `unsatisfied` with `operators`.
    ///
    /// Returns [`UNREACHABLE`] when some fact has no producer.
    pub fn heuristic<O: Operator>(unsatisfied: &FactSet, operators: &[O]) -> f32 {
        FactCosts::new(operators)
            .estimate(unsatisfied)
            .unwrap_or(UNREACHABLE)
    }

    /// Plan from `beliefs` to `desired`.
    ///
    /// `Some(plan)` with zero steps means the goal already holds; `None` means no plan
    /// exists within the configured limits. Step indices refer to `operators`.
    pub fn plan<O: Operator>(
        &self,
        beliefs: &FactSet,
        desired: &FactSet,
        operators: &[O],
    ) -> Option<Plan> {
        self.search(beliefs, desired, operators).plan
    }

    pub fn search<O: Operator>(
        &self,
        beliefs: &FactSet,
        desired: &FactSet,
        operators: &[O],
    ) -> SearchReport {
        let root = beliefs.unsatisfied(desired);
        if root.is_empty() {
            return SearchReport {
                plan: Some(Plan::empty()),
                expansions: 0,
                exhausted: false,
            };
        }

        let mut costs = FactCosts::new(operators);
        let Some(h0) = costs.estimate(&root) else {
            tracing::debug!(goal = %root, "goal has a fact no action produces");
            return SearchReport {
                plan: None,
                expansions: 0,
                exhausted: false,
            };
        };

        let deadline = self.config.time_limit().map(|limit| Instant::now() + limit);
        let mut nodes: Vec<Node> = Vec::new();
        let mut best_g: HashMap<FactSet, f32> = HashMap::new();
        let mut open = BinaryHeap::<OpenNode>::new();
        let mut tie: u64 = 0;

        best_g.insert(root.clone(), 0.0);
        nodes.push(Node {
            unsatisfied: root,
            action: None,
            parent: None,
            g: 0.0,
        });
        open.push(OpenNode {
            f: h0,
            g: 0.0,
            node: 0,
            tie,
        });
        tie += 1;

        let mut expansions: usize = 0;

        while let Some(entry) = open.pop() {
            let node = &nodes[entry.node];
            if best_g
                .get(&node.unsatisfied)
                .is_some_and(|&best| entry.g > best)
            {
                continue; // stale heap entry
            }

            if node.unsatisfied.is_empty() {
                let plan = reconstruct(&nodes, entry.node, operators);
                tracing::debug!(
                    steps = plan.len(),
                    cost = plan.cost(),
                    expansions,
                    "plan found"
                );
                return SearchReport {
                    plan: Some(plan),
                    expansions,
                    exhausted: false,
                };
            }

            expansions += 1;
            if expansions > self.config.max_expansions {
                tracing::warn!(expansions, "planner hit expansion ceiling");
                return SearchReport {
                    plan: None,
                    expansions,
                    exhausted: true,
                };
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(expansions, "planner hit time ceiling");
                return SearchReport {
                    plan: None,
                    expansions,
                    exhausted: true,
                };
            }

            let unsatisfied = node.unsatisfied.clone();
            let g = node.g;
            tracing::trace!(node = %unsatisfied, g, "expand");

            for (action_idx, op) in operators.iter().enumerate() {
                if !op.satisfies_any(&unsatisfied) || op.conflicts(&unsatisfied) {
                    continue;
                }
                let Some(next) = op.regress(&unsatisfied, beliefs) else {
                    continue;
                };

                let next_g = g + step_cost(op);
                if best_g.get(&next).is_some_and(|&best| next_g >= best) {
                    continue;
                }

                let Some(h) = costs.estimate(&next) else {
                    continue;
                };

                best_g.insert(next.clone(), next_g);
                nodes.push(Node {
                    unsatisfied: next,
                    action: Some(action_idx),
                    parent: Some(entry.node),
                    g: next_g,
                });
                open.push(OpenNode {
                    f: next_g + h,
                    g: next_g,
                    node: nodes.len() - 1,
                    tie,
                });
                tie += 1;
            }
        }

        tracing::debug!(expansions, "search space exhausted without a plan");
        SearchReport {
            plan: None,
            expansions,
            exhausted: false,
        }
    }
}

/// Walk parent links from the terminal node. Backward expansion means this walk already
/// visits actions in forward execution order.
fn reconstruct<O: Operator>(nodes: &[Node], terminal: usize, operators: &[O]) -> Plan {
    let mut steps = Vec::new();
    let mut cursor = Some(terminal);
    while let Some(idx) = cursor {
        let node = &nodes[idx];
        if let Some(action) = node.action {
            steps.push(PlanStep {
                action,
                name: operators[action].name().into(),
            });
        }
        cursor = node.parent;
    }
    Plan::new(steps, nodes[terminal].g)
}
