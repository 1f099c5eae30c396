//! Time window arithmetic. Pure functions, no state.

use sluice_core::types::Timestamp;

/// The time up to which accrual applies: `min(now, round_end)`.
///
/// # Examples
///
/// ```
/// use sluice_ledger::window::effective_time;
/// assert_eq!(effective_time(50, 100), 50);
/// assert_eq!(effective_time(150, 100), 100);
/// ```
pub fn effective_time(now: Timestamp, round_end: Timestamp) -> Timestamp {
    now.min(round_end)
}

/// Seconds of the current round still ahead of `now` (0 once it has ended).
pub fn remaining(now: Timestamp, round_end: Timestamp) -> u64 {
    round_end.saturating_sub(now)
}

/// Whether a round ending at `round_end` is still emitting at `now`.
pub fn is_active(now: Timestamp, round_end: Timestamp) -> bool {
    now < round_end
}
