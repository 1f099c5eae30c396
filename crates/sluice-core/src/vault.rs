//! In-memory value custody implementing [`AssetTransfer`].
//!
//! Tracks holder balances and the pool's custody balance in a single map
//! behind a mutex, so every transfer is all-or-nothing. Suitable for tests,
//! simulation, and embedding; production deployments plug in a real asset
//! service through the same trait.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransferError;
use crate::traits::AssetTransfer;
use crate::types::{Amount, ParticipantId};

#[derive(Debug, Default)]
struct VaultState {
    balances: HashMap<ParticipantId, Amount>,
    custody: Amount,
    frozen: bool,
}

/// Single-asset in-memory vault.
#[derive(Debug, Default)]
pub struct MemoryVault {
    state: Mutex<VaultState>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `holder` out of thin air (test funding).
    pub fn mint(&self, holder: &ParticipantId, amount: Amount) {
        let mut s = self.state.lock();
        let bal = s.balances.entry(*holder).or_insert(0);
        *bal = bal.saturating_add(amount);
    }

    pub fn balance_of(&self, holder: &ParticipantId) -> Amount {
        self.state.lock().balances.get(holder).copied().unwrap_or(0)
    }

    /// Amount currently held by the pool.
    pub fn custody(&self) -> Amount {
        self.state.lock().custody
    }

    /// While frozen every transfer is rejected. Used to exercise rollback paths.
    pub fn set_frozen(&self, frozen: bool) {
        self.state.lock().frozen = frozen;
    }
}

impl AssetTransfer for MemoryVault {
    fn pull(&self, from: &ParticipantId, amount: Amount) -> Result<(), TransferError> {
        let mut s = self.state.lock();
        if s.frozen {
            return Err(TransferError::Rejected("vault frozen".into()));
        }
        let have = s.balances.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(TransferError::InsufficientFunds { have, need: amount });
        }
        let custody = s
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("custody overflow".into()))?;
        s.balances.insert(*from, have - amount);
        s.custody = custody;
        debug!(from = %from.short(), amount, "vault: pulled");
        Ok(())
    }

    fn push(&self, to: &ParticipantId, amount: Amount) -> Result<(), TransferError> {
        let mut s = self.state.lock();
        if s.frozen {
            return Err(TransferError::Rejected("vault frozen".into()));
        }
        if s.custody < amount {
            return Err(TransferError::InsufficientFunds {
                have: s.custody,
                need: amount,
            });
        }
        s.custody -= amount;
        let bal = s.balances.entry(*to).or_insert(0);
        *bal = bal.saturating_add(amount);
        debug!(to = %to.short(), amount, "vault: pushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> ParticipantId {
        ParticipantId([b; 32])
    }

    #[test]
    fn pull_moves_into_custody() {
        let v = MemoryVault::new();
        v.mint(&id(1), 100);
        v.pull(&id(1), 60).unwrap();
        assert_eq!(v.balance_of(&id(1)), 40);
        assert_eq!(v.custody(), 60);
    }

    #[test]
    fn pull_insufficient_leaves_state() {
        let v = MemoryVault::new();
        v.mint(&id(1), 10);
        let err = v.pull(&id(1), 11).unwrap_err();
        assert_eq!(err, TransferError::InsufficientFunds { have: 10, need: 11 });
        assert_eq!(v.balance_of(&id(1)), 10);
        assert_eq!(v.custody(), 0);
    }

    #[test]
    fn push_requires_custody() {
        let v = MemoryVault::new();
        assert!(v.push(&id(2), 1).is_err());
        v.mint(&id(1), 5);
        v.pull(&id(1), 5).unwrap();
        v.push(&id(2), 5).unwrap();
        assert_eq!(v.balance_of(&id(2)), 5);
        assert_eq!(v.custody(), 0);
    }

    #[test]
    fn frozen_vault_rejects_everything() {
        let v = MemoryVault::new();
        v.mint(&id(1), 5);
        v.set_frozen(true);
        assert!(matches!(v.pull(&id(1), 1), Err(TransferError::Rejected(_))));
        assert!(matches!(v.push(&id(1), 0), Err(TransferError::Rejected(_))));
        v.set_frozen(false);
        assert!(v.pull(&id(1), 1).is_ok());
    }
}
