use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AUTOMATION_INTERVAL_SECS;
use crate::types::{Balance, Timestamp};

/// Persistent price-feed state.
///
/// `latest_answer` is a fixed-point price scaled by 1e6; 0 means "no valid
/// price yet". It is only overwritten when the associated request's consensus
/// check succeeded and the decoded value is non-zero — a failed or
/// inconclusive resolution leaves prior state untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceFeedState {
    pub latest_answer: Balance,
    /// Timestamp of the last *applied* price (distinct from last requested).
    pub last_update_time: Timestamp,
    /// Timestamp of the last automation-trigger evaluation.
    pub last_automation_check: Timestamp,
    pub automation_enabled: bool,
    pub paused: bool,
    /// Minimum elapsed seconds between automated requests.
    pub interval_secs: i64,
}

impl Default for PriceFeedState {
    fn default() -> Self {
        Self {
            latest_answer: 0,
            last_update_time: 0,
            last_automation_check: 0,
            automation_enabled: true,
            paused: false,
            interval_secs: DEFAULT_AUTOMATION_INTERVAL_SECS,
        }
    }
}

impl PriceFeedState {
    /// Automation only fires when enabled, not paused, and the interval has
    /// fully elapsed since the last trigger evaluation.
    pub fn check_eligible(&self, now: Timestamp) -> bool {
        !self.paused
            && self.automation_enabled
            && now - self.last_automation_check >= self.interval_secs
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
