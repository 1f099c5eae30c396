//! # sluice-ledger: Reward accrual ledger and pools.
//!
//! All reward arithmetic is integer-only: amounts are `u128` base units and
//! the accumulator, rate, and undistributed balance are `U256` values scaled
//! by 10^18. Rounding always favors the pool and every truncated remainder
//! is kept in the undistributed balance.
//!
//! This crate implements lazy reward-per-weight accrual:
//! - **Accumulator**: a monotonic per-weight-unit counter advanced by
//!   [`Ledger::flush`] before every weight, rate, or checkpoint change.
//! - **Checkpoints**: each participant pins the accumulator value they were
//!   last settled at, so joiners never earn retroactively.
//! - **Round scheduling**: deposits blend with the unspent tail of a running
//!   round into a single new rate.
//! - **Weighting**: stake-weighted and headcount-weighted pools share the
//!   same core through [`WeightSource`]. Headcount pools add liveness
//!   reporting with forfeiture of stale accrual.
//! - **Settlement**: undistributed reward is swept to a collector after the
//!   round ends.

pub mod accumulator;
pub mod audit;
pub mod checkpoint;
pub mod config;
pub mod headcount;
pub mod pool;
pub mod scheduler;
pub mod snapshot;
pub mod stake;
pub mod sweep;
pub mod weight;
pub mod window;

#[cfg(test)]
mod testkit;

pub use accumulator::Ledger;
pub use audit::AuditReport;
pub use checkpoint::{LivenessStats, ParticipantRecord};
pub use config::PoolConfig;
pub use headcount::{HeadcountPool, LivenessOutcome};
pub use pool::{Deposit, PoolContext, RewardPool};
pub use scheduler::RoundUpdate;
pub use snapshot::PoolSnapshot;
pub use stake::StakePool;
pub use weight::{HeadcountWeighted, StakeWeighted, WeightSource};
