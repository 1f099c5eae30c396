//! Role table implementing [`Authority`].

use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{LedgerError, Role};
use crate::traits::Authority;
use crate::types::ParticipantId;

/// A single owner plus a mutable set of rewarders.
///
/// The owner is fixed at construction. Only the owner may grant or revoke
/// the rewarder role; holding the owner role does not imply rewarder.
#[derive(Debug)]
pub struct RoleTable {
    owner: ParticipantId,
    rewarders: RwLock<HashSet<ParticipantId>>,
}

impl RoleTable {
    pub fn new(owner: ParticipantId) -> Self {
        Self {
            owner,
            rewarders: RwLock::new(HashSet::new()),
        }
    }

    /// Owner plus an initial rewarder.
    pub fn with_rewarder(owner: ParticipantId, rewarder: ParticipantId) -> Self {
        let table = Self::new(owner);
        table.rewarders.write().insert(rewarder);
        table
    }

    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    pub fn grant_rewarder(
        &self,
        caller: &ParticipantId,
        who: ParticipantId,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if who.is_zero() {
            return Err(LedgerError::ZeroParticipant);
        }
        self.rewarders.write().insert(who);
        info!(rewarder = %who.short(), "auth: rewarder granted");
        Ok(())
    }

    pub fn revoke_rewarder(
        &self,
        caller: &ParticipantId,
        who: &ParticipantId,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if self.rewarders.write().remove(who) {
            info!(rewarder = %who.short(), "auth: rewarder revoked");
        }
        Ok(())
    }
}

impl Authority for RoleTable {
    fn has_role(&self, caller: &ParticipantId, role: Role) -> bool {
        match role {
            Role::Owner => *caller == self.owner,
            Role::Rewarder => self.rewarders.read().contains(caller),
        }
    }
}
