//! Shared fixtures for scenario and property tests.

use std::sync::Arc;

use sluice_core::auth::RoleTable;
use sluice_core::clock::ManualClock;
use sluice_core::sink::RecordingSink;
use sluice_core::types::{Amount, DurationUnit, ParticipantId, PoolKind, Timestamp};
use sluice_core::vault::MemoryVault;
use sluice_ledger::{HeadcountPool, PoolConfig, PoolContext, StakePool};

pub const T0: Timestamp = 1_700_000_000;
pub const MINUTE: u64 = 60;
pub const HOUR: u64 = 3_600;
pub const DAY: u64 = 86_400;

/// Balance minted to every named participant.
pub const FUNDS: Amount = 1_000_000_000_000_000_000;

/// Deterministic identity from a name.
pub fn id(name: &str) -> ParticipantId {
    ParticipantId::from_name(name)
}

/// Identity for the `i`th generated participant.
pub fn nth(i: usize) -> ParticipantId {
    id(&format!("participant-{i}"))
}

/// Clock, vault, roles, and event journal shared by one test pool.
pub struct Bench {
    pub clock: Arc<ManualClock>,
    pub vault: Arc<MemoryVault>,
    pub events: Arc<RecordingSink>,
    pub owner: ParticipantId,
    pub rewarder: ParticipantId,
    pub ctx: PoolContext,
}

impl Bench {
    /// A bench with `participants` generated identities funded with [`FUNDS`].
    pub fn new(participants: usize) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let vault = Arc::new(MemoryVault::new());
        let events = Arc::new(RecordingSink::new());
        let owner = id("owner");
        let rewarder = id("rewarder");
        vault.mint(&rewarder, FUNDS);
        for name in ["alice", "bob", "carol"] {
            vault.mint(&id(name), FUNDS);
        }
        for i in 0..participants {
            vault.mint(&nth(i), FUNDS);
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

    /// Stake pool with default configuration (7-day rounds).
    pub fn stake_pool(&self) -> StakePool {
        StakePool::new(&PoolConfig::new(PoolKind::Stake), self.ctx.clone())
            .expect("default stake config is valid")
    }

    /// Headcount pool with rounds of `round_secs` and the given report span.
    pub fn headcount_pool(&self, round_secs: u64, span_secs: u64) -> HeadcountPool {
        let mut cfg = PoolConfig::new(PoolKind::Headcount);
        cfg.duration_unit = DurationUnit::Seconds;
        cfg.rewards_duration = round_secs;
        cfg.max_report_span_secs = span_secs;
        HeadcountPool::new(&cfg, self.ctx.clone()).expect("headcount config is valid")
    }
}

/// `|actual - expected| <= expected * ppm / 1_000_000`.
pub fn within_ppm(actual: Amount, expected: Amount, ppm: u128) -> bool {
    actual.abs_diff(expected) <= expected / 1_000_000 * ppm + 1
}
