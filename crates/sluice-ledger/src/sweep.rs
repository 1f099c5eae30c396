//! Settlement sweep of the undistributed balance.
//!
//! Undistributed mass accumulates from empty-pool emission, forfeited
//! accrual, and truncation dust. Once a round is over, anyone may move the
//! whole-unit part of it to a collector. The sub-unit remainder stays behind.

use sluice_core::error::LedgerError;
use sluice_core::fixed;
use sluice_core::types::{Amount, Timestamp};
use tracing::debug;

use crate::accumulator::Ledger;

/// Drain the undistributed balance as of `now`. Returns the whole units taken.
///
/// Fails with [`LedgerError::NotFinished`] if no round was ever scheduled or
/// `now` has not passed `round_end`.
pub fn sweep(ledger: &mut Ledger, now: Timestamp) -> Result<Amount, LedgerError> {
    if ledger.round_end == 0 || now <= ledger.round_end {
        return Err(LedgerError::NotFinished {
            now,
            round_end: ledger.round_end,
        });
    }
    ledger.flush(now)?;

    let (units, remainder) = fixed::downscale(ledger.undistributed)?;
    let swept = ledger
        .total_swept
        .checked_add(units)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    ledger.undistributed = remainder;
    ledger.total_swept = swept;

    debug!(units, %remainder, "sweep: drained");
    Ok(units)
}
