//! Seeded random workloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sluice_core::types::{DurationUnit, PoolKind};
use sluice_ledger::PoolConfig;

use crate::scenario::Step;

/// Balance minted to each random participant.
pub const PARTICIPANT_FUNDS: u128 = 1_000_000_000_000;

/// Parameters for [`generate`].
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub kind: PoolKind,
    pub participants: usize,
    pub steps: usize,
    pub seed: u64,
}

pub fn participant_name(i: usize) -> String {
    format!("p{i}")
}

/// Pool configuration used for random runs: one-day rounds in seconds.
pub fn pool_config(kind: PoolKind) -> PoolConfig {
    let mut cfg = PoolConfig::new(kind);
    cfg.duration_unit = DurationUnit::Seconds;
    cfg.rewards_duration = 86_400;
    cfg.max_report_span_secs = 3_600;
    cfg.label = Some(format!("random-{kind}"));
    cfg
}

/// Generate a reproducible step list. Invalid steps (withdrawing more than
/// staked, reporting while unregistered) are left in on purpose: they must be
/// rejected without disturbing the books.
pub fn generate(w: &Workload) -> Vec<Step> {
    let mut rng = StdRng::seed_from_u64(w.seed);
    let n = w.participants.max(1);
    let mut steps = Vec::with_capacity(w.steps + 1);
    steps.push(Step::Notify {
        amount: rng.gen_range(1_000..1_000_000_000),
        units: None,
    });

    for _ in 0..w.steps {
        let who = participant_name(rng.gen_range(0..n));
        let roll = rng.gen_range(0..100u32);
        let step = match (w.kind, roll) {
            (_, 0..=24) => Step::Advance {
                secs: rng.gen_range(1..7_200),
            },
            (_, 25..=29) => Step::Notify {
                amount: rng.gen_range(0..1_000_000_000),
                units: Some(rng.gen_range(1..172_800)),
            },
            (_, 30..=32) => Step::Sweep {
                collector: "treasury".to_string(),
            },
            (PoolKind::Stake, 33..=59) => Step::Stake {
                who,
                amount: rng.gen_range(1..1_000_000),
            },
            (PoolKind::Stake, 60..=74) => Step::Withdraw {
                who,
                amount: rng.gen_range(1..1_000_000),
            },
            (PoolKind::Stake, 75..=92) => Step::GetReward { who },
            (PoolKind::Stake, _) => Step::Exit { who },
            (PoolKind::Headcount, 33..=49) => Step::Register { who },
            (PoolKind::Headcount, 50..=79) => Step::Report {
                who,
                compliant: rng.gen_bool(0.8),
            },
            (PoolKind::Headcount, 80..=92) => Step::Claim { who },
            (PoolKind::Headcount, _) => Step::Exit { who },
        };
        steps.push(step);
    }
    steps
}
