//! Weighting strategies.
//!
//! A pool is generic over a [`WeightSource`]: the accrual core (flush,
//! checkpoint, scheduling, sweep) is shared, and each strategy contributes
//! only its own state and the operations that change weight.
//!
//! - [`StakeWeighted`]: weight is the staked balance (stake / withdraw)
//! - [`HeadcountWeighted`]: weight is 1 per registered participant
//!   (register / exit), with liveness reporting and a round that opens on the
//!   first registration

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sluice_core::error::LedgerError;
use sluice_core::types::{Amount, PoolKind, Weight};

/// Strategy-specific state carried by a pool.
pub trait WeightSource:
    Clone + fmt::Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned
{
    const KIND: PoolKind;

    /// Offer a deposit to the strategy before it is scheduled.
    ///
    /// Returns `Some(total_held)` if the strategy keeps the deposit back
    /// (it will enter a round later), `None` if the deposit should be
    /// scheduled immediately. Default: never hold.
    fn hold_deposit(&mut self, _amount: Amount) -> Result<Option<Amount>, LedgerError> {
        Ok(None)
    }

    /// Deposits currently held back from scheduling.
    fn held_budget(&self) -> Amount {
        0
    }

    /// Whether a single participant may carry `weight`.
    fn weight_is_valid(_weight: Weight) -> bool {
        true
    }
}

/// Weight equals staked balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeWeighted;

impl WeightSource for StakeWeighted {
    const KIND: PoolKind = PoolKind::Stake;
}

/// Weight is 1 while registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountWeighted {
    /// Longest allowed gap between liveness reports, in seconds.
    pub(crate) max_report_span: u64,
    /// Deposits received before the first registration.
    pub(crate) pending_budget: Amount,
    /// Set once the first registration opened the round clock.
    pub(crate) started: bool,
}

impl HeadcountWeighted {
    pub fn new(max_report_span: u64) -> Self {
        Self {
            max_report_span,
            ..Self::default()
        }
    }

    pub fn max_report_span(&self) -> u64 {
        self.max_report_span
    }

    pub fn started(&self) -> bool {
        self.started
    }
}

impl WeightSource for HeadcountWeighted {
    const KIND: PoolKind = PoolKind::Headcount;

    fn hold_deposit(&mut self, amount: Amount) -> Result<Option<Amount>, LedgerError> {
        if self.started {
            return Ok(None);
        }
        self.pending_budget = self
            .pending_budget
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(Some(self.pending_budget))
    }

    fn held_budget(&self) -> Amount {
        self.pending_budget
    }

    fn weight_is_valid(weight: Weight) -> bool {
        weight <= 1
    }
}
