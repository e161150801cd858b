//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::OrderingPolicy;

/// Tunables of a [`ModelReconstructor`](crate::ModelReconstructor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// How strictly consecutive event ids must be (default: monotonic).
    #[serde(default = "default_ordering")]
    pub ordering: OrderingPolicy,
    /// Log a status summary at debug level after every change (default: false).
    #[serde(default = "default_log_status")]
    pub log_status: bool,
}

fn default_ordering() -> OrderingPolicy {
    OrderingPolicy::Monotonic
}

fn default_log_status() -> bool {
    false
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ordering: default_ordering(),
            log_status: default_log_status(),
        }
    }
}

impl ModelConfig {
    /// Set the ordering policy.
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Enable or disable the status summary.
    pub fn with_status_logging(mut self, enabled: bool) -> Self {
        self.log_status = enabled;
        self
    }
}
