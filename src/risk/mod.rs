//! Risk Advisor - per-trade risk against the current balance
//!
//! Implements:
//! - Risk per losing trade as a share of the balance
//! - High-risk flag above 5%
//! - Consecutive losses the balance can absorb
//! - Recommended stop loss (3% of balance)

use crate::types::RiskAnalysis;

/// Risk per trade above this percentage is flagged
pub const HIGH_RISK_THRESHOLD_PCT: f64 = 5.0;

/// Share of the balance suggested as a daily stop loss
pub const RECOMMENDED_STOP_LOSS_FRACTION: f64 = 0.03;

/// Assess the risk of trading `loss_amount` per loss on `balance`
pub fn assess(balance: f64, loss_amount: f64) -> RiskAnalysis {
    let risk_percentage = if balance > 0.0 {
        (loss_amount / balance) * 100.0
    } else {
        0.0
    };

    let max_consecutive_losses = if loss_amount > 0.0 {
        // `as` saturates: negative and NaN become 0
        (balance / loss_amount).floor() as u64
    } else {
        0
    };

    RiskAnalysis {
        risk_percentage,
        is_high_risk: risk_percentage > HIGH_RISK_THRESHOLD_PCT,
        max_consecutive_losses,
        recommended_stop_loss: balance * RECOMMENDED_STOP_LOSS_FRACTION,
    }
}
