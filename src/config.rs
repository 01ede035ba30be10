//! Tunable constants for the delivery pipeline

use serde::Deserialize;

const fn default_max_events() -> usize {
    100
}

const fn default_max_ephemeral() -> usize {
    100
}

const fn default_initial_backoff_exponent() -> u32 {
    1 // first retry after 2^1 = 2 seconds
}

const fn default_max_backoff_exponent() -> u32 {
    9 // delay caps at 2^9 = 512 seconds
}

/// Configuration for batching and retry behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum number of persistent events per transaction
    #[serde(default = "default_max_events")]
    pub max_events_per_transaction: usize,

    /// Maximum number of ephemeral items per transaction
    #[serde(default = "default_max_ephemeral")]
    pub max_ephemeral_per_transaction: usize,

    /// Backoff exponent a recoverer starts from (delay = `2^exponent` seconds)
    #[serde(default = "default_initial_backoff_exponent")]
    pub initial_backoff_exponent: u32,

    /// Cap on the backoff exponent
    #[serde(default = "default_max_backoff_exponent")]
    pub max_backoff_exponent: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_events_per_transaction: default_max_events(),
            max_ephemeral_per_transaction: default_max_ephemeral(),
            initial_backoff_exponent: default_initial_backoff_exponent(),
            max_backoff_exponent: default_max_backoff_exponent(),
        }
    }
}
