//! Kind-erased pool handle.

use std::sync::Arc;

use parking_lot::Mutex;
use sluice_core::error::{LedgerError, RegistryError};
use sluice_core::types::{Amount, ParticipantId, PoolKind};
use sluice_ledger::{AuditReport, Deposit, HeadcountPool, PoolConfig, PoolContext, StakePool};

/// A pool of either weighting kind.
#[derive(Debug)]
pub enum AnyPool {
    Stake(StakePool),
    Headcount(HeadcountPool),
}

/// A pool shared between callers; every operation takes the lock.
pub type SharedPool = Arc<Mutex<AnyPool>>;

impl AnyPool {
    /// Build an empty pool of the kind named in `config`.
    pub fn from_config(config: &PoolConfig, ctx: PoolContext) -> Result<Self, LedgerError> {
        Ok(match config.kind {
            PoolKind::Stake => Self::Stake(StakePool::new(config, ctx)?),
            PoolKind::Headcount => Self::Headcount(HeadcountPool::new(config, ctx)?),
        })
    }

    pub fn kind(&self) -> PoolKind {
        match self {
            Self::Stake(_) => PoolKind::Stake,
            Self::Headcount(_) => PoolKind::Headcount,
        }
    }

    pub fn notify_reward(
        &mut self,
        caller: &ParticipantId,
        amount: Amount,
        units: u64,
    ) -> Result<Deposit, LedgerError> {
        match self {
            Self::Stake(p) => p.notify_reward(caller, amount, units),
            Self::Headcount(p) => p.notify_reward(caller, amount, units),
        }
    }

    pub fn earned(&self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        match self {
            Self::Stake(p) => p.earned(who),
            Self::Headcount(p) => p.earned(who),
        }
    }

    pub fn settlement_sweep(
        &mut self,
        caller: &ParticipantId,
        collector: &ParticipantId,
    ) -> Result<Amount, LedgerError> {
        match self {
            Self::Stake(p) => p.settlement_sweep(caller, collector),
            Self::Headcount(p) => p.settlement_sweep(caller, collector),
        }
    }

    pub fn total_reward_notified(&self) -> Amount {
        match self {
            Self::Stake(p) => p.total_reward_notified(),
            Self::Headcount(p) => p.total_reward_notified(),
        }
    }

    pub fn audit(&self) -> Result<AuditReport, LedgerError> {
        match self {
            Self::Stake(p) => p.audit(),
            Self::Headcount(p) => p.audit(),
        }
    }

    pub fn as_stake_mut(&mut self, key: &str) -> Result<&mut StakePool, RegistryError> {
        match self {
            Self::Stake(p) => Ok(p),
            Self::Headcount(_) => Err(wrong_kind(key, PoolKind::Headcount)),
        }
    }

    pub fn as_headcount_mut(&mut self, key: &str) -> Result<&mut HeadcountPool, RegistryError> {
        match self {
            Self::Headcount(p) => Ok(p),
            Self::Stake(_) => Err(wrong_kind(key, PoolKind::Stake)),
        }
    }
}

fn wrong_kind(key: &str, actual: PoolKind) -> RegistryError {
    RegistryError::WrongPoolKind {
        key: key.to_string(),
        actual: actual.to_string(),
    }
}
