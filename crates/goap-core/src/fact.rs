use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of a symbolic fact. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FactKey(Arc<str>);

impl FactKey {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for FactKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FactKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactKey {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for FactKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&FactKey> for FactKey {
    fn from(value: &FactKey) -> Self {
        value.clone()
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value half of a fact.
///
/// Values are compared for equality only. Floats compare by bit pattern with
/// `-0.0` folded into `0.0`, which makes every value `Eq + Hash` so fact sets
/// can be used as canonical search keys.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum FactValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Symbol(Arc<str>),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

fn f64_bits(x: f64) -> u64 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

fn f32_bits(x: f32) -> u32 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

impl FactValue {
    pub fn symbol(value: impl Into<Arc<str>>) -> Self {
        FactValue::Symbol(value.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FactValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FactValue::Float(x) => Some(*x),
            FactValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            FactValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            FactValue::Vec3(v) => Some(*v),
            FactValue::Vec2([x, y]) => Some([*x, *y, 0.0]),
            _ => None,
        }
    }
}

impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FactValue::Bool(a), FactValue::Bool(b)) => a == b,
            (FactValue::Int(a), FactValue::Int(b)) => a == b,
            (FactValue::Float(a), FactValue::Float(b)) => f64_bits(*a) == f64_bits(*b),
            (FactValue::Symbol(a), FactValue::Symbol(b)) => a == b,
            (FactValue::Vec2(a), FactValue::Vec2(b)) => {
                a.iter().zip(b).all(|(x, y)| f32_bits(*x) == f32_bits(*y))
            }
            (FactValue::Vec3(a), FactValue::Vec3(b)) => {
                a.iter().zip(b).all(|(x, y)| f32_bits(*x) == f32_bits(*y))
            }
            _ => false,
        }
    }
}

impl Eq for FactValue {}

impl Hash for FactValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            FactValue::Bool(b) => b.hash(state),
            FactValue::Int(i) => i.hash(state),
            FactValue::Float(x) => f64_bits(*x).hash(state),
            FactValue::Symbol(s) => s.hash(state),
            FactValue::Vec2(v) => v.iter().for_each(|x| f32_bits(*x).hash(state)),
            FactValue::Vec3(v) => v.iter().for_each(|x| f32_bits(*x).hash(state)),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Bool(b) => write!(f, "{b}"),
            FactValue::Int(i) => write!(f, "{i}"),
            FactValue::Float(x) => write!(f, "{x}"),
            FactValue::Symbol(s) => write!(f, "{s:?}"),
            FactValue::Vec2([x, y]) => write!(f, "({x}, {y})"),
            FactValue::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Int(value)
    }
}

impl From<i32> for FactValue {
    fn from(value: i32) -> Self {
        FactValue::Int(value as i64)
    }
}

impl From<u32> for FactValue {
    fn from(value: u32) -> Self {
        FactValue::Int(value as i64)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Float(value)
    }
}

impl From<f32> for FactValue {
    fn from(value: f32) -> Self {
        FactValue::Float(value as f64)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Symbol(Arc::from(value))
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Symbol(Arc::from(value))
    }
}

impl From<[f32; 2]> for FactValue {
    fn from(value: [f32; 2]) -> Self {
        FactValue::Vec2(value)
    }
}

impl From<[f32; 3]> for FactValue {
    fn from(value: [f32; 3]) -> Self {
        FactValue::Vec3(value)
    }
}

/// An ordered set of `(name, value)` facts with unique names.
///
/// The same type carries preconditions, effects, desired states, belief
/// snapshots and the planner's unsatisfied-condition sets. Ordering by key
/// keeps iteration and `Display` output deterministic, and `Hash` makes a set
/// usable as a canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FactSet {
    facts: BTreeMap<FactKey, FactValue>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<FactKey>, value: impl Into<FactValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<FactKey>,
        value: impl Into<FactValue>,
    ) -> Option<FactValue> {
        self.facts.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    /// True iff `key` is present with exactly `value`.
    pub fn contains(&self, key: &str, value: &FactValue) -> bool {
        self.facts.get(key) == Some(value)
    }

    pub fn remove(&mut self, key: &str) -> Option<FactValue> {
        self.facts.remove(key)
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FactKey, FactValue> {
        self.facts.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FactKey> {
        self.facts.keys()
    }

    /// True iff every condition key is present here with an equal value.
    pub fn matches(&self, conditions: &FactSet) -> bool {
        conditions.iter().all(|(k, v)| self.contains(k, v))
    }

    /// The conditions that this set does not currently satisfy.
    pub fn unsatisfied(&self, conditions: &FactSet) -> FactSet {
        conditions
            .iter()
            .filter(|(k, v)| !self.contains(k, v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Overwrite every `(key, value)` pair from `effects`.
    pub fn apply(&mut self, effects: &FactSet) {
        for (k, v) in effects.iter() {
            self.facts.insert(k.clone(), v.clone());
        }
    }

    /// A copy of this set with `effects` applied.
    pub fn applied(&self, effects: &FactSet) -> FactSet {
        let mut next = self.clone();
        next.apply(effects);
        next
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&FactKey, &FactValue) -> bool) {
        self.facts.retain(|k, v| keep(k, v));
    }
}

impl<K, V> FromIterator<(K, V)> for FactSet
where
    K: Into<FactKey>,
    V: Into<FactValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FactSet::new();
        set.extend(iter);
        set
    }
}

impl<K, V> Extend<(K, V)> for FactSet
where
    K: Into<FactKey>,
    V: Into<FactValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a FactSet {
    type Item = (&'a FactKey, &'a FactValue);
    type IntoIter = btree_map::Iter<'a, FactKey, FactValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.facts.iter()
    }
}

impl fmt::Display for FactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.facts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}
