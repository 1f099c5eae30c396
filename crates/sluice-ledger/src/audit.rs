//! Conservation audit.
//!
//! Every notified unit is, at any instant, in exactly one place: paid out,
//! swept, settled but unclaimed, pending in some participant's accrual,
//! undistributed, still ahead in the round, or held before a round opens.
//! [`AuditReport`] collects those terms so callers and tests can check the
//! balance without reaching into pool internals.

use serde::Serialize;
use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::fixed;
use sluice_core::types::{Amount, Timestamp, Weight};

/// Every term of the conservation law at one instant.
///
/// Scaled fields are `value * PRECISION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub at: Timestamp,
    pub total_notified: Amount,
    pub total_claimed: Amount,
    pub total_swept: Amount,
    pub settled_unclaimed: Amount,
    /// Accrued but not yet checkpointed, scaled.
    pub pending: U256,
    /// Scaled.
    pub undistributed: U256,
    /// Emission still ahead in the current round, scaled.
    pub unemitted: U256,
    /// Deposits waiting for a round to open.
    pub held_budget: Amount,
    pub total_weight: Weight,
    /// Sum of participant weights, which must equal `total_weight`.
    pub weight_sum: Weight,
}

impl AuditReport {
    /// Scaled sum of every place notified reward can be.
    pub fn accounted(&self) -> Result<U256, LedgerError> {
        let mut whole = U256::zero();
        for part in [
            self.total_claimed,
            self.total_swept,
            self.settled_unclaimed,
            self.held_budget,
        ] {
            whole = fixed::add(whole, U256::from(part))?;
        }
        let mut sum = fixed::mul(whole, fixed::precision())?;
        for part in [self.pending, self.undistributed, self.unemitted] {
            sum = fixed::add(sum, part)?;
        }
        Ok(sum)
    }

    /// Whether notified reward is fully accounted for and weights agree.
    pub fn is_balanced(&self) -> Result<bool, LedgerError> {
        Ok(self.accounted()? == fixed::scale(self.total_notified)?
            && self.total_weight == self.weight_sum)
    }
}
