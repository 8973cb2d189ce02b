//! Engine configuration, loadable from YAML.

use std::path::Path;
use std::time::Duration;

use goap_planner::PlannerConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Scheduling knobs for the [`crate::Orchestrator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Total think time allowed per tick, in microseconds.
    #[serde(default = "default_think_budget_us")]
    pub think_budget_us: u64,

    /// Simulated seconds an agent waits between thinks, divided by its priority factor.
    #[serde(default = "default_min_think_interval")]
    pub min_think_interval: f32,
}

fn default_think_budget_us() -> u64 {
    2_000
}

fn default_min_think_interval() -> f32 {
    0.25
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            think_budget_us: default_think_budget_us(),
            min_think_interval: default_min_think_interval(),
        }
    }
}

impl OrchestratorConfig {
    pub fn think_budget(&self) -> Duration {
        Duration::from_micros(self.think_budget_us)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.think_budget_us == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.think_budget_us must be greater than zero".into(),
            ));
        }
        if !self.min_think_interval.is_finite() || self.min_think_interval < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.min_think_interval must be a non-negative number of seconds, got {}",
                self.min_think_interval
            )));
        }
        Ok(())
    }
}

/// Top-level configuration: planner limits plus scheduling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub planner: PlannerConfig,
    pub orchestrator: OrchestratorConfig,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.planner.max_expansions == 0 {
            return Err(ConfigError::Invalid(
                "planner.max_expansions must be greater than zero".into(),
            ));
        }
        if self.planner.time_limit_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "planner.time_limit_ms must be greater than zero when set".into(),
            ));
        }
        self.orchestrator.validate()
    }
}
