use crate::{AgentId, BeliefStore, FactKey, SharedBeliefs, TickContext};

/// Writes facts derived from ground truth into an agent's beliefs.
///
/// Agents run their sensors before thinking and before each performing update.
pub trait Sensor<W = ()>: 'static {
    fn sense(&mut self, ctx: &TickContext, agent: AgentId, beliefs: &mut BeliefStore, world: &W);
}

impl<W, F> Sensor<W> for F
where
    F: FnMut(&TickContext, AgentId, &mut BeliefStore, &W) + 'static,
{
    fn sense(&mut self, ctx: &TickContext, agent: AgentId, beliefs: &mut BeliefStore, world: &W) {
        self(ctx, agent, beliefs, world)
    }
}

/// Mirrors a fixed set of keys from a shared world store into the blackboard.
///
/// Keys missing from the world are removed from the blackboard.
#[derive(Debug, Clone)]
pub struct MirrorSensor {
    source: SharedBeliefs,
    keys: Vec<FactKey>,
}

impl MirrorSensor {
    pub fn new<K: Into<FactKey>>(source: SharedBeliefs, keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            source,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[FactKey] {
        &self.keys
    }
}

impl<W> Sensor<W> for MirrorSensor {
    fn sense(&mut self, _ctx: &TickContext, _agent: AgentId, beliefs: &mut BeliefStore, _world: &W) {
        let world = self.source.borrow();
        for key in &self.keys {
            match world.get(key.as_str()) {
                Some(value) => {
                    beliefs.set(key, value.clone());
                }
                None => {
                    beliefs.remove(key.as_str());
                }
            }
        }
    }
}
