use std::path::PathBuf;

use goap_core::AgentId;
use thiserror::Error;

/// Errors raised by the orchestrator's registration surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),

    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),
}

/// Errors while loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
