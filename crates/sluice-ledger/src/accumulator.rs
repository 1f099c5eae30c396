//! The per-pool ledger aggregate and its accrual step.
//!
//! [`Ledger::flush`] is the single place where time turns into reward. It
//! must run before any read or write of the total weight, any rate change,
//! and any participant checkpoint. Accrual is lazy: nothing happens between
//! calls, and a call after a long gap pays for the whole gap at once in O(1).
//!
//! All reward quantities other than whole-unit counters live in the scaled
//! domain (`value * PRECISION`) as `U256`. Truncated remainders are moved
//! into `undistributed` so that no scaled unit is ever lost.

use serde::{Deserialize, Serialize};
use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::fixed;
use sluice_core::types::{Amount, Timestamp, Weight};
use tracing::debug;

use crate::window;

/// Pool-wide accrual state.
///
/// # Invariants
///
/// * `total_weight` equals the sum of all participant weights
/// * `accumulator` and `undistributed` never decrease, except that a sweep
///   drains `undistributed`
/// * `last_update <= round_end` once a round has been scheduled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub(crate) total_weight: Weight,
    /// Emission per second, scaled.
    pub(crate) reward_rate: U256,
    /// Cumulative reward per weight unit since genesis, scaled.
    pub(crate) accumulator: U256,
    pub(crate) last_update: Timestamp,
    pub(crate) round_end: Timestamp,
    /// Reward mass no participant will receive, scaled.
    pub(crate) undistributed: U256,
    pub(crate) total_notified: Amount,
    pub(crate) total_claimed: Amount,
    pub(crate) total_swept: Amount,
}

/// What a single flush did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flush {
    /// Seconds of emission accounted for.
    pub elapsed: u64,
    /// Scaled mass emitted over those seconds.
    pub emitted: U256,
    /// Scaled mass routed to `undistributed` (empty pool or division dust).
    pub undistributed: U256,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the accumulator up to `min(now, round_end)`.
    ///
    /// With weight present, `elapsed * rate / total_weight` is added to the
    /// accumulator and the division remainder goes to `undistributed`. With
    /// no weight, the whole emission goes to `undistributed`. Calling twice
    /// at the same `now` is a no-op.
    pub fn flush(&mut self, now: Timestamp) -> Result<Flush, LedgerError> {
        let effective = window::effective_time(now, self.round_end);
        let elapsed = effective.saturating_sub(self.last_update);
        let mut out = Flush {
            elapsed,
            ..Flush::default()
        };

        if elapsed > 0 && !self.reward_rate.is_zero() {
            let emitted = fixed::mul(U256::from(elapsed), self.reward_rate)?;
            out.emitted = emitted;
            if self.total_weight == 0 {
                self.undistributed = fixed::add(self.undistributed, emitted)?;
                out.undistributed = emitted;
            } else {
                let (delta, dust) = emitted.div_mod(U256::from(self.total_weight));
                self.accumulator = fixed::add(self.accumulator, delta)?;
                self.undistributed = fixed::add(self.undistributed, dust)?;
                out.undistributed = dust;
            }
            debug!(
                elapsed,
                total_weight = self.total_weight,
                accumulator = %self.accumulator,
                "ledger: flushed"
            );
        }

        self.last_update = self.last_update.max(effective);
        Ok(out)
    }

    /// A flushed copy of this ledger; `self` is untouched.
    pub fn projected(&self, now: Timestamp) -> Result<Ledger, LedgerError> {
        let mut copy = self.clone();
        copy.flush(now)?;
        Ok(copy)
    }

    /// Scaled emission still ahead of `last_update` in the current round.
    pub fn unemitted(&self) -> Result<U256, LedgerError> {
        let secs = window::remaining(self.last_update, self.round_end);
        fixed::mul(U256::from(secs), self.reward_rate)
    }

    pub(crate) fn add_weight(&mut self, weight: Weight) -> Result<(), LedgerError> {
        self.total_weight = self
            .total_weight
            .checked_add(weight)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    pub(crate) fn remove_weight(&mut self, weight: Weight) -> Result<(), LedgerError> {
        self.total_weight = self
            .total_weight
            .checked_sub(weight)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    pub(crate) fn add_undistributed(&mut self, scaled: U256) -> Result<(), LedgerError> {
        self.undistributed = fixed::add(self.undistributed, scaled)?;
        Ok(())
    }

    pub(crate) fn record_claim(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.total_claimed = self
            .total_claimed
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    pub(crate) fn record_notified(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.total_notified = self
            .total_notified
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    pub fn reward_rate(&self) -> U256 {
        self.reward_rate
    }

    pub fn accumulator(&self) -> U256 {
        self.accumulator
    }

    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    pub fn round_end(&self) -> Timestamp {
        self.round_end
    }

    pub fn undistributed(&self) -> U256 {
        self.undistributed
    }

    pub fn total_notified(&self) -> Amount {
        self.total_notified
    }

    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    pub fn total_swept(&self) -> Amount {
        self.total_swept
    }
}
