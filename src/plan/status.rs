//! Plan status - where the current balance sits on the roadmap

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::projection::Roadmap;
use crate::risk;
use crate::types::{PlanConfig, RiskAnalysis, TradeRecord};

/// Direction of the last closed day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Advanced,
    Regressed,
    Neutral,
}

impl Trend {
    pub fn from_shift(day_shift: i64) -> Self {
        match day_shift {
            s if s > 0 => Trend::Advanced,
            s if s < 0 => Trend::Regressed,
            _ => Trend::Neutral,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Advanced => write!(f, "ADVANCED"),
            Trend::Regressed => write!(f, "REGRESSED"),
            Trend::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Snapshot of plan progress for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatus {
    pub current_balance: f64,
    pub current_plan_day: u32,
    pub total_days: u32,
    pub days_remaining: u32,
    /// 0..=100
    pub progress_pct: f64,
    /// Balance that closes the current plan day
    pub exit_target: Option<f64>,
    pub remaining_to_target: f64,
    /// Today's growth goal at the configured rate
    pub daily_goal: f64,
    pub wins_needed_today: u64,
    /// Wins needed today exceed `max_trades_per_day`
    pub over_trade_budget: bool,
    pub last_day_shift: Option<i64>,
    pub last_trend: Option<Trend>,
    pub roadmap_truncated: bool,
    pub risk: RiskAnalysis,
}

/// Summarize the plan for `current_balance`
pub fn summarize(
    config: &PlanConfig,
    roadmap: &Roadmap,
    current_balance: f64,
    last_trade: Option<&TradeRecord>,
) -> PlanStatus {
    let current_plan_day = roadmap.locate(current_balance);
    let total_days = roadmap.len() as u32;

    let progress_pct = if total_days > 0 {
        (current_plan_day as f64 / total_days as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    let exit_target = roadmap
        .entry(current_plan_day)
        .or_else(|| roadmap.entries().first())
        .map(|e| e.end_balance);

    let daily_goal = current_balance * (config.daily_percentage / 100.0);
    let wins_needed_today = if config.win_amount > 0.0 && daily_goal > 0.0 {
        (daily_goal / config.win_amount).ceil() as u64
    } else {
        0
    };
    let over_trade_budget = config
        .max_trades_per_day
        .map(|cap| wins_needed_today > u64::from(cap))
        .unwrap_or(false);

    let last_day_shift = last_trade.map(|t| t.day_shift);

    PlanStatus {
        current_balance,
        current_plan_day,
        total_days,
        days_remaining: total_days.saturating_sub(current_plan_day),
        progress_pct,
        exit_target,
        remaining_to_target: config.target_balance - current_balance,
        daily_goal,
        wins_needed_today,
        over_trade_budget,
        last_day_shift,
        last_trend: last_day_shift.map(Trend::from_shift),
        roadmap_truncated: roadmap.is_truncated(),
        risk: risk::assess(current_balance, config.loss_amount),
    }
}
