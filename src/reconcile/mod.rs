//! History Reconciler - full replay of the trade chain
//!
//! Every insert, edit or delete replays the whole chain from the starting
//! balance. Derived fields (start/end balance, plan days, day shift) are
//! recomputed from scratch, so running it twice gives the same output.

use tracing::debug;

use crate::error::{PlanError, PlanResult};
use crate::projection::{locate, project, Roadmap};
use crate::types::{PlanConfig, TradeRecord};

/// Output of one chain replay
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Trades in chain order with every derived field filled in
    pub trades: Vec<TradeRecord>,
    /// Balance after the last trade (the starting balance when there are none)
    pub final_balance: f64,
    /// Roadmap anchored on the starting balance
    pub roadmap: Roadmap,
}

/// Replay `trades` from `starting_balance` against the roadmap of `config`.
///
/// The roadmap is re-anchored on `starting_balance`, so the chain can be
/// replayed from any starting point regardless of the config's own
/// `initial_balance`. Trades are ordered by timestamp; ties keep their input order.
pub fn reconcile(
    trades: &[TradeRecord],
    starting_balance: f64,
    config: &PlanConfig,
) -> PlanResult<Reconciliation> {
    if !starting_balance.is_finite() {
        return Err(PlanError::NonFiniteBalance(starting_balance));
    }
    if let Some(bad) = trades.iter().find(|t| !t.result_value.is_finite()) {
        return Err(PlanError::NonFiniteResult {
            id: bad.id.clone(),
            value: bad.result_value,
        });
    }

    let roadmap = project(&config.with_initial_balance(starting_balance));
    let entries = roadmap.entries();

    let mut ordered = trades.to_vec();
    ordered.sort_by_key(|t| t.timestamp);

    let mut running_balance = starting_balance;
    for trade in ordered.iter_mut() {
        let start_balance = running_balance;
        let end_balance = start_balance + trade.result_value;

        let start_plan_day = locate(start_balance, entries, starting_balance);
        let end_plan_day = locate(end_balance, entries, starting_balance);

        trade.start_balance = start_balance;
        trade.end_balance = end_balance;
        trade.start_plan_day = start_plan_day;
        trade.end_plan_day = end_plan_day;
        trade.day_shift = i64::from(end_plan_day) - i64::from(start_plan_day);

        running_balance = end_balance;
    }

    debug!(
        trades = ordered.len(),
        starting_balance,
        final_balance = running_balance,
        roadmap_days = roadmap.len(),
        "Trade chain reconciled"
    );

    Ok(Reconciliation {
        trades: ordered,
        final_balance: running_balance,
        roadmap,
    })
}
