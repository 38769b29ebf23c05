//! Plan Day Locator
//!
//! Maps a balance onto the roadmap day that is currently being worked on.

use crate::types::ProjectionEntry;

/// Plan day for `balance`.
///
/// - `0` when the balance is below `initial_balance` (not yet at day 1) or the roadmap is empty
/// - otherwise the day of the last entry whose `start_balance <= balance`
///
/// A balance equal to a day's end balance belongs to the following day, the one
/// not yet completed. Growing roadmaps have increasing start balances, so this
/// is a binary search; a shrinking one (negative daily rate) is scanned.
pub fn locate(balance: f64, roadmap: &[ProjectionEntry], initial_balance: f64) -> u32 {
    if balance.is_nan() || balance < initial_balance {
        return 0;
    }
    if roadmap.is_empty() {
        return 0;
    }

    let first = roadmap[0].start_balance;
    let last = roadmap[roadmap.len() - 1].start_balance;
    let idx = if last >= first {
        roadmap.partition_point(|entry| entry.start_balance <= balance)
    } else {
        roadmap
            .iter()
            .rposition(|entry| entry.start_balance <= balance)
            .map_or(0, |i| i + 1)
    };
    if idx == 0 {
        return 1;
    }
    roadmap[idx - 1].day
}
