//! Per-participant snapshots of the accumulator.
//!
//! A checkpoint converts everything a participant earned since their last
//! checkpoint into whole reward units in `settled_unclaimed`, then pins
//! `accumulator_paid` to the current accumulator. Downscaling always rounds
//! down; the sub-unit remainder is handed to the ledger's undistributed
//! balance so the pool never promises more than it was given.

use serde::{Deserialize, Serialize};
use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::fixed;
use sluice_core::types::{Amount, Timestamp, Weight};

use crate::accumulator::Ledger;

/// Liveness report counters (headcount pools only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessStats {
    pub compliant_reports: u64,
    pub noncompliant_reports: u64,
    /// Compliant reports that arrived after the reporting window closed.
    pub late_reports: u64,
    /// Outcome of the most recent report, `None` before the first one.
    pub last_compliant: Option<bool>,
}

/// Accounting state for one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub(crate) weight: Weight,
    /// Accumulator value at the last checkpoint, scaled.
    pub(crate) accumulator_paid: U256,
    pub(crate) settled_unclaimed: Amount,
    pub(crate) last_activity: Timestamp,
    /// When pending accrual was last settled (checkpoint or late settlement).
    pub(crate) settled_at: Timestamp,
    pub(crate) liveness: LivenessStats,
}

impl ParticipantRecord {
    /// A fresh record that starts earning from the ledger's current accumulator.
    ///
    /// The ledger must already be flushed to `now`.
    pub fn joining(ledger: &Ledger, now: Timestamp) -> Self {
        Self {
            accumulator_paid: ledger.accumulator(),
            last_activity: now,
            settled_at: now,
            ..Self::default()
        }
    }

    /// Scaled reward earned since the last checkpoint.
    pub fn pending(&self, ledger: &Ledger) -> Result<U256, LedgerError> {
        let growth = fixed::sub(ledger.accumulator(), self.accumulator_paid)?;
        fixed::mul(U256::from(self.weight), growth)
    }

    /// Settle pending accrual into `settled_unclaimed`. Returns the units credited.
    pub fn checkpoint(&mut self, ledger: &mut Ledger) -> Result<Amount, LedgerError> {
        let (units, dust) = fixed::downscale(self.pending(ledger)?)?;
        let settled = self
            .settled_unclaimed
            .checked_add(units)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        ledger.add_undistributed(dust)?;
        self.settled_unclaimed = settled;
        self.accumulator_paid = ledger.accumulator();
        Ok(units)
    }

    /// Settle pending accrual that covers `accrued` seconds of which only
    /// `creditable` fall inside the reporting window.
    ///
    /// The creditable share is taken pro rata by time and rounded down; the
    /// rest goes to the ledger's undistributed balance. Returns the units
    /// credited and the scaled mass forfeited.
    pub fn settle_late(
        &mut self,
        ledger: &mut Ledger,
        creditable: u64,
        accrued: u64,
    ) -> Result<(Amount, U256), LedgerError> {
        if accrued == 0 || creditable >= accrued {
            return Ok((self.checkpoint(ledger)?, U256::zero()));
        }
        let pending = self.pending(ledger)?;
        let (kept, _) = fixed::mul_div(pending, U256::from(creditable), U256::from(accrued))?;
        let forfeited = fixed::sub(pending, kept)?;
        let (units, dust) = fixed::downscale(kept)?;
        let settled = self
            .settled_unclaimed
            .checked_add(units)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        ledger.add_undistributed(fixed::add(forfeited, dust)?)?;
        self.settled_unclaimed = settled;
        self.accumulator_paid = ledger.accumulator();
        Ok((units, forfeited))
    }

    /// What `settled_unclaimed` would become after a checkpoint against `ledger`.
    pub fn projected_earned(&self, ledger: &Ledger) -> Result<Amount, LedgerError> {
        let (units, _) = fixed::downscale(self.pending(ledger)?)?;
        self.settled_unclaimed
            .checked_add(units)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Zero the claimable balance, returning what it held.
    pub(crate) fn take_settled(&mut self) -> Amount {
        std::mem::take(&mut self.settled_unclaimed)
    }

    /// A record with no weight and nothing claimable carries no information.
    pub fn is_empty(&self) -> bool {
        self.weight == 0 && self.settled_unclaimed == 0
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn accumulator_paid(&self) -> U256 {
        self.accumulator_paid
    }

    pub fn settled_unclaimed(&self) -> Amount {
        self.settled_unclaimed
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    pub fn settled_at(&self) -> Timestamp {
        self.settled_at
    }

    pub fn liveness(&self) -> &LivenessStats {
        &self.liveness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::fixed::precision;

    fn ledger_with_acc(acc: U256) -> Ledger {
        Ledger {
            accumulator: acc,
            ..Ledger::default()
        }
    }

    #[test]
    fn joining_starts_at_current_accumulator() {
        let l = ledger_with_acc(precision() * 9);
        let r = ParticipantRecord::joining(&l, 42);
        assert_eq!(r.accumulator_paid, precision() * 9);
        assert_eq!(r.last_activity, 42);
        assert_eq!(r.pending(&l).unwrap(), U256::zero());
    }

    #[test]
    fn checkpoint_credits_whole_units() {
        let mut l = ledger_with_acc(precision() * 3);
        let mut r = ParticipantRecord {
            weight: 4,
            ..ParticipantRecord::default()
        };
        let credited = r.checkpoint(&mut l).unwrap();
        assert_eq!(credited, 12);
        assert_eq!(r.settled_unclaimed, 12);
        assert_eq!(r.accumulator_paid, l.accumulator());
        assert!(l.undistributed().is_zero());
    }

    #[test]
    fn checkpoint_rounds_down_and_keeps_dust() {
        // acc = 0.5 per unit, weight 3 -> 1.5 units
        let mut l = ledger_with_acc(precision() / 2);
        let mut r = ParticipantRecord {
            weight: 3,
            ..ParticipantRecord::default()
        };
        assert_eq!(r.checkpoint(&mut l).unwrap(), 1);
        assert_eq!(l.undistributed(), precision() / 2);
    }

    #[test]
    fn checkpoint_twice_credits_once() {
        let mut l = ledger_with_acc(precision());
        let mut r = ParticipantRecord {
            weight: 2,
            ..ParticipantRecord::default()
        };
        r.checkpoint(&mut l).unwrap();
        assert_eq!(r.checkpoint(&mut l).unwrap(), 0);
        assert_eq!(r.settled_unclaimed, 2);
    }

    #[test]
    fn settle_late_splits_by_time() {
        // 30 units pending over 3 seconds, 1 second of it creditable
        let mut l = ledger_with_acc(precision() * 30);
        let mut r = ParticipantRecord {
            weight: 1,
            settled_unclaimed: 5,
            ..ParticipantRecord::default()
        };
        let (credited, lost) = r.settle_late(&mut l, 1, 3).unwrap();
        assert_eq!(credited, 10);
        assert_eq!(lost, precision() * 20);
        assert_eq!(l.undistributed(), precision() * 20);
        assert_eq!(r.settled_unclaimed, 15);
        assert_eq!(r.pending(&l).unwrap(), U256::zero());
    }

    #[test]
    fn settle_late_nothing_creditable_forfeits_all() {
        let mut l = ledger_with_acc(precision() * 2);
        let mut r = ParticipantRecord {
            weight: 1,
            ..ParticipantRecord::default()
        };
        assert_eq!(r.settle_late(&mut l, 0, 7).unwrap(), (0, precision() * 2));
        assert_eq!(l.undistributed(), precision() * 2);
    }

    #[test]
    fn settle_late_rounding_dust_is_not_lost() {
        // 1 unit over 3 seconds, 1 creditable: 1/3 kept rounds down to 0 units
        let mut l = ledger_with_acc(precision());
        let mut r = ParticipantRecord {
            weight: 1,
            ..ParticipantRecord::default()
        };
        let (credited, lost) = r.settle_late(&mut l, 1, 3).unwrap();
        assert_eq!(credited, 0);
        // forfeited share plus the sub-unit credited share
        assert_eq!(l.undistributed(), precision());
        assert!(lost < precision());
    }

    #[test]
    fn projected_earned_does_not_mutate() {
        let l = ledger_with_acc(precision() * 7);
        let r = ParticipantRecord {
            weight: 1,
            settled_unclaimed: 1,
            ..ParticipantRecord::default()
        };
        assert_eq!(r.projected_earned(&l).unwrap(), 8);
        assert_eq!(r.settled_unclaimed, 1);
    }

    #[test]
    fn paid_above_accumulator_is_error() {
        let l = ledger_with_acc(U256::zero());
        let r = ParticipantRecord {
            weight: 1,
            accumulator_paid: U256::one(),
            ..ParticipantRecord::default()
        };
        assert_eq!(r.pending(&l), Err(LedgerError::ArithmeticOverflow));
    }

    #[test]
    fn empty_record() {
        assert!(ParticipantRecord::default().is_empty());
        let r = ParticipantRecord {
            settled_unclaimed: 1,
            ..ParticipantRecord::default()
        };
        assert!(!r.is_empty());
    }
}
