//! Core types used throughout TraderPlan
//!
//! Defines the plan configuration, roadmap entries, trade records and risk metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compounding plan parameters. Replaced wholesale on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Balance at day 0
    pub initial_balance: f64,
    /// Compounding stops once the balance reaches this value
    pub target_balance: f64,
    /// Nominal value of one winning trade
    pub win_amount: f64,
    /// Nominal loss of one losing trade
    pub loss_amount: f64,
    /// Daily growth rate in percent, applied to the day's start balance
    pub daily_percentage: f64,
    /// Advisory cap on trades per day
    #[serde(default)]
    pub max_trades_per_day: Option<u32>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            initial_balance: 150.0,
            target_balance: 10_000.0,
            win_amount: 3.0,
            loss_amount: 20.0,
            daily_percentage: 3.0,
            max_trades_per_day: Some(5),
        }
    }
}

/// A violated configuration invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    NonFiniteValue,
    NonFiniteLossAmount,
    NonPositiveInitialBalance,
    NonPositiveWinAmount,
    NegativeLossAmount,
    NonPositiveDailyPercentage,
    DailyPercentageAbove100,
    TargetNotAboveInitial,
    ZeroTradeCap,
}

impl ConfigIssue {
    /// Whether this issue leaves the roadmap empty
    pub fn blocks_projection(&self) -> bool {
        matches!(
            self,
            ConfigIssue::NonFiniteValue
                | ConfigIssue::NonPositiveInitialBalance
                | ConfigIssue::NonPositiveWinAmount
                | ConfigIssue::TargetNotAboveInitial
        )
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::NonFiniteValue => {
                write!(f, "balances, win amount and daily percentage must be finite")
            }
            ConfigIssue::NonFiniteLossAmount => write!(f, "loss amount must be finite"),
            ConfigIssue::NonPositiveInitialBalance => {
                write!(f, "initial balance must be positive")
            }
            ConfigIssue::NonPositiveWinAmount => write!(f, "win amount must be positive"),
            ConfigIssue::NegativeLossAmount => write!(f, "loss amount must not be negative"),
            ConfigIssue::NonPositiveDailyPercentage => {
                write!(f, "daily percentage must be positive")
            }
            ConfigIssue::DailyPercentageAbove100 => {
                write!(f, "daily percentage must not exceed 100")
            }
            ConfigIssue::TargetNotAboveInitial => {
                write!(f, "target balance must exceed initial balance")
            }
            ConfigIssue::ZeroTradeCap => write!(f, "max trades per day must be at least 1"),
        }
    }
}

impl PlanConfig {
    /// List every violated invariant. An empty list means the config is valid.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // Fields the projection reads
        let fields = [
            self.initial_balance,
            self.target_balance,
            self.win_amount,
            self.daily_percentage,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            issues.push(ConfigIssue::NonFiniteValue);
        }
        if !self.loss_amount.is_finite() {
            issues.push(ConfigIssue::NonFiniteLossAmount);
        }
        if !(self.initial_balance > 0.0) {
            issues.push(ConfigIssue::NonPositiveInitialBalance);
        }
        if !(self.win_amount > 0.0) {
            issues.push(ConfigIssue::NonPositiveWinAmount);
        }
        if self.loss_amount < 0.0 {
            issues.push(ConfigIssue::NegativeLossAmount);
        }
        if !(self.daily_percentage > 0.0) {
            issues.push(ConfigIssue::NonPositiveDailyPercentage);
        } else if self.daily_percentage > 100.0 {
            issues.push(ConfigIssue::DailyPercentageAbove100);
        }
        if !(self.target_balance > self.initial_balance) {
            issues.push(ConfigIssue::TargetNotAboveInitial);
        }
        if self.max_trades_per_day == Some(0) {
            issues.push(ConfigIssue::ZeroTradeCap);
        }

        issues
    }

    /// True when `project` can produce a non-empty roadmap
    pub fn is_projectable(&self) -> bool {
        !self.issues().iter().any(ConfigIssue::blocks_projection)
    }

    /// Same plan, re-anchored on a different starting balance
    pub fn with_initial_balance(&self, initial_balance: f64) -> Self {
        Self {
            initial_balance,
            ..self.clone()
        }
    }
}

/// One simulated day of the compounding roadmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionEntry {
    /// 1-based day index, no gaps
    pub day: u32,
    pub start_balance: f64,
    /// Growth required on this day (end - start)
    pub daily_target_value: f64,
    pub end_balance: f64,
    /// Daily target expressed in winning trades, unrounded
    pub trades_needed: f64,
    /// end_balance - initial_balance
    pub accumulated_profit: f64,
}

/// One confirmed trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    /// Chain ordering key, oldest first
    pub timestamp: DateTime<Utc>,
    /// Signed day result: positive = win, negative = loss
    pub result_value: f64,
    // Derived fields below are only written by the reconciler.
    pub start_balance: f64,
    pub end_balance: f64,
    pub start_plan_day: u32,
    pub end_plan_day: u32,
    /// end_plan_day - start_plan_day
    pub day_shift: i64,
    #[serde(default)]
    pub note: Option<String>,
}

impl TradeRecord {
    /// New record stamped now, derived fields zeroed until the next reconciliation
    pub fn new(result_value: f64, note: Option<String>) -> Self {
        Self::at(Utc::now(), result_value, note)
    }

    /// New record with an explicit timestamp
    pub fn at(timestamp: DateTime<Utc>, result_value: f64, note: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            result_value,
            start_balance: 0.0,
            end_balance: 0.0,
            start_plan_day: 0,
            end_plan_day: 0,
            day_shift: 0,
            note,
        }
    }

    pub fn is_win(&self) -> bool {
        self.result_value > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.result_value < 0.0
    }
}

/// Per-balance risk metrics. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// loss_amount / balance, in percent
    pub risk_percentage: f64,
    pub is_high_risk: bool,
    /// Losses in a row before the balance is gone
    pub max_consecutive_losses: u64,
    pub recommended_stop_loss: f64,
}
