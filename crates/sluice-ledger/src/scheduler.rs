//! Reward round scheduling.
//!
//! A deposit of `A` over `D` seconds blends with whatever the running round
//! has not yet emitted:
//!
//! ```text
//! leftover = rate * (round_end - now)      if now < round_end, else 0
//! rate'    = (A * PRECISION + leftover) / D
//! round_end' = now + D
//! ```
//!
//! The ledger is flushed first so that accrual up to `now` uses the old rate.
//! The division remainder is routed to the undistributed balance.

use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::fixed;
use sluice_core::types::{Amount, Timestamp};
use tracing::debug;

use crate::accumulator::Ledger;
use crate::window;

/// Outcome of scheduling a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundUpdate {
    /// Unspent emission carried over from the previous round, scaled.
    pub leftover: U256,
    /// New emission per second, scaled.
    pub rate: U256,
    pub round_end: Timestamp,
    /// Division remainder sent to undistributed, scaled.
    pub dust: U256,
}

/// Apply a reward deposit of `amount` spread over `duration_secs`.
///
/// Counts `amount` toward the ledger's notified total.
pub fn notify(
    ledger: &mut Ledger,
    now: Timestamp,
    amount: Amount,
    duration_secs: u64,
) -> Result<RoundUpdate, LedgerError> {
    if duration_secs == 0 {
        return Err(LedgerError::InvalidDuration);
    }
    ledger.flush(now)?;

    let leftover = if window::is_active(now, ledger.round_end) {
        fixed::mul(
            ledger.reward_rate,
            U256::from(window::remaining(now, ledger.round_end)),
        )?
    } else {
        U256::zero()
    };

    let update = open_round(ledger, now, fixed::scale(amount)?, leftover, duration_secs)?;
    ledger.record_notified(amount)?;
    Ok(update)
}

/// Start a round from a budget that was already counted as notified.
///
/// Used when a headcount pool opens on its first registration. Any
/// in-flight emission is still blended in.
pub fn start(
    ledger: &mut Ledger,
    now: Timestamp,
    budget: Amount,
    duration_secs: u64,
) -> Result<RoundUpdate, LedgerError> {
    if duration_secs == 0 {
        return Err(LedgerError::InvalidDuration);
    }
    ledger.flush(now)?;
    let leftover = fixed::mul(
        ledger.reward_rate,
        U256::from(window::remaining(now, ledger.round_end)),
    )?;
    open_round(ledger, now, fixed::scale(budget)?, leftover, duration_secs)
}

fn open_round(
    ledger: &mut Ledger,
    now: Timestamp,
    fresh: U256,
    leftover: U256,
    duration_secs: u64,
) -> Result<RoundUpdate, LedgerError> {
    let round_end = now
        .checked_add(duration_secs)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let total = fixed::add(fresh, leftover)?;
    let (rate, dust) = total.div_mod(U256::from(duration_secs));

    ledger.add_undistributed(dust)?;
    ledger.reward_rate = rate;
    ledger.round_end = round_end;
    ledger.last_update = now;

    debug!(%rate, %leftover, round_end, "scheduler: round opened");
    Ok(RoundUpdate {
        leftover,
        rate,
        round_end,
        dust,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sluice_core::fixed::precision;

    #[test]
    fn first_deposit_sets_rate() {
        let mut l = Ledger::new();
        let u = notify(&mut l, 1_000, 700, 7).unwrap();
        assert_eq!(u.rate, precision() * 100);
        assert_eq!(u.leftover, U256::zero());
        assert_eq!(l.round_end(), 1_007);
        assert_eq!(l.last_update(), 1_000);
        assert_eq!(l.total_notified(), 700);
    }

    #[test]
    fn zero_duration_rejected() {
        let mut l = Ledger::new();
        assert_eq!(notify(&mut l, 0, 1, 0), Err(LedgerError::InvalidDuration));
        assert_eq!(l, Ledger::new());
    }

    #[test]
    fn overlapping_deposit_blends_leftover() {
        let mut l = Ledger::new();
        notify(&mut l, 0, 1_000, 100).unwrap(); // 10/s until 100
        let u = notify(&mut l, 40, 600, 100).unwrap();
        // leftover = 10 * 60 = 600; rate = (600 + 600) / 100 = 12
        assert_eq!(u.leftover, precision() * 600);
        assert_eq!(u.rate, precision() * 12);
        assert_eq!(l.round_end(), 140);
        assert_eq!(l.total_notified(), 1_600);
    }

    #[test]
    fn deposit_after_round_end_has_no_leftover() {
        let mut l = Ledger::new();
        notify(&mut l, 0, 1_000, 100).unwrap();
        let u = notify(&mut l, 250, 500, 50).unwrap();
        assert!(u.leftover.is_zero());
        assert_eq!(u.rate, precision() * 10);
        assert_eq!(l.round_end(), 300);
    }

    #[test]
    fn deposit_into_empty_pool_accrues_undistributed() {
        let mut l = Ledger::new();
        notify(&mut l, 0, 100, 10).unwrap();
        l.flush(4).unwrap();
        assert_eq!(l.undistributed(), precision() * 40);
    }

    #[test]
    fn rate_dust_goes_undistributed() {
        let mut l = Ledger::new();
        let u = notify(&mut l, 0, 1, 3).unwrap();
        assert_eq!(u.rate * U256::from(3u64) + u.dust, precision());
        assert_eq!(l.undistributed(), u.dust);
    }

    #[test]
    fn start_does_not_count_notified() {
        let mut l = Ledger::new();
        start(&mut l, 10, 500, 50).unwrap();
        assert_eq!(l.total_notified(), 0);
        assert_eq!(l.reward_rate(), precision() * 10);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn blended_rate_matches_formula(
            a1 in 1u128..1_000_000_000_000_000_000_000u128,
            d1 in 1u64..10_000_000,
            a2 in 1u128..1_000_000_000_000_000_000_000u128,
            d2 in 1u64..10_000_000,
            elapsed in 0u64..20_000_000,
        ) {
            let mut l = Ledger::new();
            notify(&mut l, 0, a1, d1).unwrap();
            let r1 = l.reward_rate();
            let t = d1.saturating_sub(elapsed);
            let u = notify(&mut l, elapsed, a2, d2).unwrap();
            let expected = (r1 * U256::from(t) + precision() * U256::from(a2)) / U256::from(d2);
            prop_assert_eq!(u.rate, expected);
        }
    }
}
