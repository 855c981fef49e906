//! Flow engine configuration

use serde::{Deserialize, Serialize};

/// How residual state is recorded in each history step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotMode {
    /// Complete residual table after every augmentation
    #[default]
    Full,

    /// Only the residual entries touched by each augmentation; earlier
    /// states are rebuilt by replaying diffs in order
    Delta,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Residual recording strategy for the history
    pub snapshot_mode: SnapshotMode,

    /// Emit a `log::debug!` record per augmentation
    pub log_steps: bool,

    /// Stop with an incomplete outcome once this many augmentations have
    /// been applied and another augmenting path still exists
    pub max_augmentations: Option<usize>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            snapshot_mode: SnapshotMode::Full,
            log_steps: true,
            max_augmentations: None,
        }
    }
}

impl FlowConfig {
    pub fn with_snapshot_mode(mut self, mode: SnapshotMode) -> Self {
        self.snapshot_mode = mode;
        self
    }

    pub fn with_max_augmentations(mut self, limit: usize) -> Self {
        self.max_augmentations = Some(limit);
        self
    }

    pub fn with_step_logging(mut self, enabled: bool) -> Self {
        self.log_steps = enabled;
        self
    }

    /// Parses a configuration document; missing fields take their defaults.
    pub fn from_json(document: &str) -> serde_json::Result<Self> {
        serde_json::from_str(document)
    }
}
