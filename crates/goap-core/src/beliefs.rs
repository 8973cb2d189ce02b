use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{FactKey, FactSet, FactValue};

/// A single write observed by a belief store.
///
/// `old == None` means the key was inserted; `new == None` means it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeliefChange {
    pub key: FactKey,
    pub old: Option<FactValue>,
    pub new: Option<FactValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&BeliefChange)>;

/// Mutable fact storage with synchronous change notification.
///
/// Used as an agent's private blackboard, and (behind [`SharedBeliefs`]) as the
/// simulation-wide world store that sensors mirror from.
#[derive(Default)]
pub struct BeliefStore {
    facts: FactSet,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl BeliefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_facts(facts: FactSet) -> Self {
        Self {
            facts,
            ..Self::default()
        }
    }

    /// Write `value` under `key`.
    ///
    /// Returns `false`, and notifies nobody, when the stored value is already equal.
    pub fn set(&mut self, key: impl Into<FactKey>, value: impl Into<FactValue>) -> bool {
        let key = key.into();
        let value = value.into();
        if self.facts.contains(key.as_str(), &value) {
            return false;
        }
        let old = self.facts.insert(key.clone(), value.clone());
        self.notify(BeliefChange {
            key,
            old,
            new: Some(value),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    pub fn get_or(&self, key: &str, default: impl Into<FactValue>) -> FactValue {
        self.facts.get(key).cloned().unwrap_or_else(|| default.into())
    }

    pub fn has(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let Some(old) = self.facts.remove(key) else {
            return false;
        };
        self.notify(BeliefChange {
            key: FactKey::from(key),
            old: Some(old),
            new: None,
        });
        true
    }

    pub fn clear(&mut self) {
        let keys: Vec<FactKey> = self.facts.keys().cloned().collect();
        for key in keys {
            self.remove(key.as_str());
        }
    }

    /// Set every pair in `effects`. Each actual change is notified.
    pub fn apply(&mut self, effects: &FactSet) {
        for (k, v) in effects {
            self.set(k, v.clone());
        }
    }

    pub fn matches(&self, conditions: &FactSet) -> bool {
        self.facts.matches(conditions)
    }

    pub fn unsatisfied(&self, conditions: &FactSet) -> FactSet {
        self.facts.unsatisfied(conditions)
    }

    /// Owned copy of the current facts, safe to hand to a planner.
    pub fn snapshot(&self) -> FactSet {
        self.facts.clone()
    }

    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&BeliefChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn notify(&mut self, change: BeliefChange) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&change);
        }
    }
}

impl From<FactSet> for BeliefStore {
    fn from(value: FactSet) -> Self {
        Self::from_facts(value)
    }
}

impl fmt::Debug for BeliefStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeliefStore")
            .field("facts", &self.facts)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Cloneable handle to a belief store shared across a simulation session.
///
/// The host constructs one per session and passes it to whatever needs it
/// (sensors, the driver loop, scripted actions). Single-threaded by design.
#[derive(Clone, Default)]
pub struct SharedBeliefs(Rc<RefCell<BeliefStore>>);

impl SharedBeliefs {
    pub fn new(store: BeliefStore) -> Self {
        Self(Rc::new(RefCell::new(store)))
    }

    pub fn borrow(&self) -> Ref<'_, BeliefStore> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, BeliefStore> {
        self.0.borrow_mut()
    }

    pub fn set(&self, key: impl Into<FactKey>, value: impl Into<FactValue>) -> bool {
        self.0.borrow_mut().set(key, value)
    }

    pub fn get(&self, key: &str) -> Option<FactValue> {
        self.0.borrow().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.0.borrow_mut().remove(key)
    }

    pub fn snapshot(&self) -> FactSet {
        self.0.borrow().snapshot()
    }
}

impl fmt::Debug for SharedBeliefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedBeliefs").field(&*self.0.borrow()).finish()
    }
}
