//! Board geometry, fleet composition and agent tuning.

use alloc::string::{String, ToString};
use core::time::Duration;

pub const BOARD_SIZE: usize = 4;
pub const BOARD_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// Segment lengths placed once per game: a destroyer and a submarine.
pub const SHIP_LENGTHS: [usize; 2] = [2, 3];

/// Total number of ship segments in the standard fleet.
pub const TOTAL_SHIP_CELLS: usize = total_cells(&SHIP_LENGTHS);

const fn total_cells(lengths: &[usize]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < lengths.len() {
        total += lengths[i];
        i += 1;
    }
    total
}

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Padding applied to a ledger resource estimate before a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FeePolicy {
    /// Resource limit as a percentage of the estimated units.
    pub limit_pct: u64,
    /// Unit price as a percentage of the quoted price.
    pub price_pct: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            limit_pct: 150,
            price_pct: 120,
        }
    }
}

/// Runtime knobs for one agent process. Every field has a default so partial
/// config files are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct AgentConfig {
    pub poll_interval_ms: u64,
    pub oracle_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Consecutive duplicate suggestions tolerated before a random unfired
    /// cell is substituted.
    pub max_duplicate_skips: u32,
    pub model: String,
    pub fees: FeePolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            oracle_timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_duplicate_skips: 1,
            model: DEFAULT_MODEL.to_string(),
            fees: FeePolicy::default(),
        }
    }
}

impl AgentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Load a config from a JSON file; missing fields keep their defaults.
    #[cfg(feature = "std")]
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))
    }
}
