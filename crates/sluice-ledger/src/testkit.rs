//! Shared fixtures for in-crate pool tests.

use std::sync::Arc;

use sluice_core::auth::RoleTable;
use sluice_core::clock::ManualClock;
use sluice_core::sink::RecordingSink;
use sluice_core::types::{Amount, ParticipantId, Timestamp};
use sluice_core::vault::MemoryVault;

use crate::pool::PoolContext;

pub const T0: Timestamp = 1_700_000_000;
pub const FUNDS: Amount = 1_000_000_000_000;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub vault: Arc<MemoryVault>,
    pub events: Arc<RecordingSink>,
    pub owner: ParticipantId,
    pub rewarder: ParticipantId,
    pub ctx: PoolContext,
}

pub fn id(name: &str) -> ParticipantId {
    ParticipantId::from_name(name)
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let vault = Arc::new(MemoryVault::new());
        let events = Arc::new(RecordingSink::new());
        let owner = id("owner");
        let rewarder = id("rewarder");
        for who in ["rewarder", "alice", "bob", "carol"] {
            vault.mint(&id(who), FUNDS);
        }
        let ctx = PoolContext::new(
            clock.clone(),
            vault.clone(),
            Arc::new(RoleTable::with_rewarder(owner, rewarder)),
        )
        .with_events(events.clone());
        Self {
            clock,
            vault,
            events,
            owner,
            rewarder,
            ctx,
        }
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }
}
