//! Several pools behind one directory, sharing a clock and a vault.

use std::sync::Arc;
use std::thread;

use sluice_core::auth::RoleTable;
use sluice_core::error::RegistryError;
use sluice_core::types::{DurationUnit, PoolKind};
use sluice_ledger::{Deposit, PoolConfig};
use sluice_registry::directory::PoolDirectory;
use sluice_tests::helpers::*;

fn directory(b: &Bench) -> PoolDirectory {
    PoolDirectory::new(Arc::new(RoleTable::with_rewarder(b.owner, b.rewarder)))
}

#[test]
fn pools_accrue_independently() {
    let b = Bench::new(0);
    let dir = directory(&b);
    dir.deploy(&b.owner, "apes", &PoolConfig::new(PoolKind::Stake), b.ctx.clone())
        .unwrap();
    let mut fleet = PoolConfig::new(PoolKind::Headcount);
    fleet.duration_unit = DurationUnit::Seconds;
    fleet.rewards_duration = DAY;
    fleet.max_report_span_secs = DAY;
    dir.deploy(&b.owner, "fleet", &fleet, b.ctx.clone()).unwrap();

    let (alice, bob) = (id("alice"), id("bob"));
    dir.with_stake("apes", |p| p.stake(&alice, 10)).unwrap();
    dir.with_headcount("fleet", |p| p.register(&bob)).unwrap();
    assert!(matches!(
        dir.notify_reward("apes", &b.rewarder, 7_000, 7).unwrap(),
        Deposit::Scheduled(_)
    ));
    // the fleet round is already open after the first registration
    assert!(matches!(
        dir.notify_reward("fleet", &b.rewarder, 2_400, DAY).unwrap(),
        Deposit::Scheduled(_)
    ));
    b.advance(DAY);

    let apes = dir.pool("apes").unwrap();
    let fleet = dir.pool("fleet").unwrap();
    assert!(apes.lock().earned(&alice).unwrap().abs_diff(1_000) <= 1);
    assert!(fleet.lock().earned(&bob).unwrap().abs_diff(2_400) <= 1);
    assert_eq!(apes.lock().earned(&bob).unwrap(), 0);
    assert_eq!(dir.total_notified("apes"), 7_000);
    assert_eq!(dir.total_notified("fleet"), 2_400);
    for pool in [apes, fleet] {
        assert!(pool.lock().audit().unwrap().is_balanced().unwrap());
    }
}

#[test]
fn wrong_kind_is_reported() {
    let b = Bench::new(0);
    let dir = directory(&b);
    dir.deploy(&b.owner, "apes", &PoolConfig::new(PoolKind::Stake), b.ctx.clone())
        .unwrap();
    let err = dir
        .with_headcount("apes", |p| p.register(&id("alice")))
        .unwrap_err();
    assert!(matches!(err, RegistryError::WrongPoolKind { .. }));
    assert!(matches!(
        dir.notify_reward("nope", &b.rewarder, 1, 7),
        Err(RegistryError::UnknownPool(_))
    ));
}

#[test]
fn concurrent_stakers_across_pools() {
    let b = Bench::new(8);
    let dir = directory(&b);
    for key in ["left", "right"] {
        dir.deploy(&b.owner, key, &PoolConfig::new(PoolKind::Stake), b.ctx.clone())
            .unwrap();
        dir.notify_reward(key, &b.rewarder, 70_000, 7).unwrap();
    }

    thread::scope(|s| {
        for i in 0..8 {
            let dir = &dir;
            s.spawn(move || {
                let key = if i % 2 == 0 { "left" } else { "right" };
                for _ in 0..10 {
                    dir.with_stake(key, |p| p.stake(&nth(i), 1)).unwrap();
                }
            });
        }
    });

    for key in ["left", "right"] {
        let total = dir.with_stake(key, |p| Ok(p.total_supply())).unwrap();
        assert_eq!(total, 40);
        let pool = dir.pool(key).unwrap();
        assert!(pool.lock().audit().unwrap().is_balanced().unwrap());
    }
}
