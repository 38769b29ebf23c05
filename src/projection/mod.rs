//! Projection Engine - the compounding roadmap
//!
//! Simulates one day at a time from the initial balance until the target is
//! reached or the day cap is hit. Each day grows the *start* balance of that
//! day by `daily_percentage`.

pub mod locator;

pub use locator::locate;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::{PlanConfig, ProjectionEntry};

/// Upper bound on simulated days (5 years of daily compounding)
pub const DAY_CAP: u32 = 365 * 5;

/// Ordered day-by-day projection for one configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    entries: Vec<ProjectionEntry>,
    initial_balance: f64,
    target_balance: f64,
    /// Day cap reached before the target
    truncated: bool,
}

impl Roadmap {
    pub fn entries(&self) -> &[ProjectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectionEntry> {
        self.entries.iter()
    }

    /// Entry for a 1-based plan day
    pub fn entry(&self, day: u32) -> Option<&ProjectionEntry> {
        if day == 0 {
            return None;
        }
        self.entries.get(day as usize - 1)
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn target_balance(&self) -> f64 {
        self.target_balance
    }

    /// End balance of the last simulated day
    pub fn final_balance(&self) -> Option<f64> {
        self.entries.last().map(|e| e.end_balance)
    }

    /// True when the cap stopped the simulation short of the target
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Plan day this balance corresponds to, anchored on the roadmap's initial balance
    pub fn locate(&self, balance: f64) -> u32 {
        locate(balance, &self.entries, self.initial_balance)
    }
}

impl<'a> IntoIterator for &'a Roadmap {
    type Item = &'a ProjectionEntry;
    type IntoIter = std::slice::Iter<'a, ProjectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build the compounding roadmap for `config`.
///
/// Never fails: a non-positive initial balance or win amount, a non-finite
/// input, or a target at or below the initial balance yields an empty roadmap.
/// An unreachable target (including a zero or negative daily percentage) runs
/// to `DAY_CAP` days and is flagged as truncated.
pub fn project(config: &PlanConfig) -> Roadmap {
    let mut roadmap = Roadmap {
        entries: Vec::new(),
        initial_balance: config.initial_balance,
        target_balance: config.target_balance,
        truncated: false,
    };

    if !config.is_projectable() {
        debug!(
            initial = config.initial_balance,
            target = config.target_balance,
            pct = config.daily_percentage,
            "Configuration cannot be projected, returning empty roadmap"
        );
        return roadmap;
    }

    let rate = config.daily_percentage / 100.0;
    let mut balance = config.initial_balance;
    let mut day = 1u32;

    while balance < config.target_balance && day <= DAY_CAP {
        let daily_target_value = balance * rate;
        let end_balance = balance + daily_target_value;

        roadmap.entries.push(ProjectionEntry {
            day,
            start_balance: balance,
            daily_target_value,
            end_balance,
            trades_needed: daily_target_value / config.win_amount,
            accumulated_profit: end_balance - config.initial_balance,
        });

        balance = end_balance;
        day += 1;
    }

    roadmap.truncated = balance < config.target_balance;
    if roadmap.truncated {
        debug!(
            days = DAY_CAP,
            reached = balance,
            target = config.target_balance,
            "Roadmap truncated at day cap"
        );
    } else {
        trace!(days = roadmap.entries.len(), "Roadmap projected");
    }

    roadmap
}
