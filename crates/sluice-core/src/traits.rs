//! Trait interfaces for the collaborators a pool depends on.
//!
//! These traits define the contracts between the ledger and the outside world:
//! - [`Clock`]: monotonic wall-clock reads
//! - [`AssetTransfer`]: atomic custody of the staked and reward assets
//! - [`Authority`]: owner / rewarder capability checks
//! - [`EventSink`]: delivery of committed [`LedgerEvent`]s

use crate::error::{LedgerError, Role, TransferError};
use crate::event::LedgerEvent;
use crate::types::{Amount, ParticipantId, Timestamp};

/// Source of the current time.
///
/// Implementations must be non-decreasing between observations. The ledger
/// never runs a timer; it reads the clock once at the start of each call.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Atomic value transfer between holders and the pool's custody.
///
/// Each call either moves the full amount or fails without side effects.
pub trait AssetTransfer: Send + Sync {
    /// Move `amount` from `from` into pool custody.
    fn pull(&self, from: &ParticipantId, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` from pool custody to `to`.
    fn push(&self, to: &ParticipantId, amount: Amount) -> Result<(), TransferError>;
}

/// Capability checks for privileged operations.
pub trait Authority: Send + Sync {
    /// Whether `caller` holds `role`.
    fn has_role(&self, caller: &ParticipantId, role: Role) -> bool;

    /// Fail with [`LedgerError::NotAuthorized`] unless `caller` is the owner.
    ///
    /// Default implementation delegates to [`has_role`](Self::has_role).
    fn require_owner(&self, caller: &ParticipantId) -> Result<(), LedgerError> {
        self.require(caller, Role::Owner)
    }

    /// Fail with [`LedgerError::NotAuthorized`] unless `caller` may deposit rewards.
    fn require_rewarder(&self, caller: &ParticipantId) -> Result<(), LedgerError> {
        self.require(caller, Role::Rewarder)
    }

    fn require(&self, caller: &ParticipantId, role: Role) -> Result<(), LedgerError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized {
                caller: *caller,
                role,
            })
        }
    }
}

/// Receiver of committed audit events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}
