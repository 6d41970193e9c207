//! Settle-delay configuration for deferred bank actions

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Reference delay between a page scroll and selecting the newly visible item
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 75;

/// What happens to a deferred action when another of the same kind is issued
/// before it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlePolicy {
    /// Every action runs, in issue order
    #[default]
    Queue,
    /// Only the most recent pending action runs
    Coalesce,
}

impl FromStr for SettlePolicy {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "coalesce" => Ok(Self::Coalesce),
            _ => Err(BankError::UnknownSettlePolicy(s.to_string())),
        }
    }
}

/// Settle delay is a best-effort heuristic for host update latency, not a
/// synchronization point. Tune it against the host being controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub delay_ms: u64,
    pub policy: SettlePolicy,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_SETTLE_DELAY_MS,
            policy: SettlePolicy::Queue,
        }
    }
}

impl SettleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
