//! Collection key → pool directory.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use sluice_core::error::{LedgerError, RegistryError, SluiceError};
use sluice_core::traits::Authority;
use sluice_core::types::{Amount, ParticipantId};
use sluice_ledger::{Deposit, HeadcountPool, PoolConfig, PoolContext, StakePool};
use tracing::{info, warn};

use crate::pool::{AnyPool, SharedPool};

/// Registry of deployed pools.
pub struct PoolDirectory {
    authority: Arc<dyn Authority>,
    pools: DashMap<String, SharedPool>,
    /// Reward notified through the directory, per key.
    notified: DashMap<String, Amount>,
}

impl std::fmt::Debug for PoolDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolDirectory")
            .field("pools", &self.pools.len())
            .finish_non_exhaustive()
    }
}

impl PoolDirectory {
    /// Empty directory whose deployments are gated by `authority`'s owner role.
    pub fn new(authority: Arc<dyn Authority>) -> Self {
        Self {
            authority,
            pools: DashMap::new(),
            notified: DashMap::new(),
        }
    }

    /// Deploy a new pool under `key`. Owner only; each key deploys once.
    pub fn deploy(
        &self,
        caller: &ParticipantId,
        key: &str,
        config: &PoolConfig,
        ctx: PoolContext,
    ) -> Result<SharedPool, RegistryError> {
        self.authority.require_owner(caller)?;
        match self.pools.entry(key.to_string()) {
            Entry::Occupied(_) => {
                warn!(key, "directory: deploy rejected, key in use");
                Err(RegistryError::AlreadyDeployed(key.to_string()))
            }
            Entry::Vacant(slot) => {
                let pool = Arc::new(Mutex::new(AnyPool::from_config(config, ctx)?));
                slot.insert(pool.clone());
                info!(key, kind = %config.kind, "directory: pool deployed");
                Ok(pool)
            }
        }
    }

    /// Load a pool configuration file (with `SLUICE_*` overrides) and deploy it.
    pub fn deploy_from_file(
        &self,
        caller: &ParticipantId,
        key: &str,
        path: &Path,
        ctx: PoolContext,
    ) -> Result<SharedPool, SluiceError> {
        let config = PoolConfig::load(path)?;
        Ok(self.deploy(caller, key, &config, ctx)?)
    }

    pub fn pool(&self, key: &str) -> Result<SharedPool, RegistryError> {
        self.pools
            .get(key)
            .map(|p| p.value().clone())
            .ok_or_else(|| RegistryError::UnknownPool(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    /// Deployed keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Route a reward deposit to the pool under `key`.
    pub fn notify_reward(
        &self,
        key: &str,
        caller: &ParticipantId,
        amount: Amount,
        units: u64,
    ) -> Result<Deposit, RegistryError> {
        let pool = self.pool(key)?;
        let deposit = pool.lock().notify_reward(caller, amount, units)?;
        if deposit != Deposit::Skipped {
            let mut total = self.notified.entry(key.to_string()).or_insert(0);
            *total = total
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        Ok(deposit)
    }

    /// Reward notified through [`notify_reward`](Self::notify_reward) for `key`.
    pub fn total_notified(&self, key: &str) -> Amount {
        self.notified.get(key).map_or(0, |t| *t.value())
    }

    /// Run `f` against the stake pool under `key`.
    pub fn with_stake<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut StakePool) -> Result<R, LedgerError>,
    ) -> Result<R, RegistryError> {
        let pool = self.pool(key)?;
        let mut guard = pool.lock();
        Ok(f(guard.as_stake_mut(key)?)?)
    }

    /// Run `f` against the headcount pool under `key`.
    pub fn with_headcount<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HeadcountPool) -> Result<R, LedgerError>,
    ) -> Result<R, RegistryError> {
        let pool = self.pool(key)?;
        let mut guard = pool.lock();
        Ok(f(guard.as_headcount_mut(key)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::auth::RoleTable;
    use sluice_core::clock::ManualClock;
    use sluice_core::error::ErrorKind;
    use sluice_core::types::PoolKind;
    use sluice_core::vault::MemoryVault;
    use std::io::Write;

    struct Fixture {
        dir: PoolDirectory,
        ctx: PoolContext,
        owner: ParticipantId,
        rewarder: ParticipantId,
    }

    fn fixture() -> Fixture {
        let owner = ParticipantId::from_name("owner");
        let rewarder = ParticipantId::from_name("rewarder");
        let roles: Arc<RoleTable> = Arc::new(RoleTable::with_rewarder(owner, rewarder));
        let vault = Arc::new(MemoryVault::new());
        vault.mint(&rewarder, 1_000_000);
        vault.mint(&ParticipantId::from_name("alice"), 1_000_000);
        let ctx = PoolContext::new(Arc::new(ManualClock::new(1_000)), vault, roles.clone());
        Fixture {
            dir: PoolDirectory::new(roles),
            ctx,
            owner,
            rewarder,
        }
    }

    // ------------------------------------------------------------------
    // deploy
    // ------------------------------------------------------------------

    #[test]
    fn deploy_once_per_key() {
        let f = fixture();
        let cfg = PoolConfig::new(PoolKind::Stake);
        f.dir.deploy(&f.owner, "apes", &cfg, f.ctx.clone()).unwrap();
        let err = f.dir.deploy(&f.owner, "apes", &cfg, f.ctx.clone()).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyDeployed("apes".into()));
        assert_eq!(f.dir.keys(), vec!["apes".to_string()]);
    }

    #[test]
    fn deploy_is_owner_only() {
        let f = fixture();
        let cfg = PoolConfig::new(PoolKind::Headcount);
        match f.dir.deploy(&f.rewarder, "fleet", &cfg, f.ctx.clone()) {
            Err(RegistryError::Ledger(e)) => assert_eq!(e.kind(), ErrorKind::NotAuthorized),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!f.dir.contains("fleet"));
    }

    #[test]
    fn invalid_config_deploys_nothing() {
        let f = fixture();
        let mut cfg = PoolConfig::new(PoolKind::Stake);
        cfg.rewards_duration = 0;
        assert!(f.dir.deploy(&f.owner, "bad", &cfg, f.ctx.clone()).is_err());
        assert!(!f.dir.contains("bad"));
    }

    #[test]
    fn deploy_from_file_reports_taken_key() {
        let f = fixture();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "kind = \"stake\"").unwrap();
        f.dir
            .deploy_from_file(&f.owner, "apes", file.path(), f.ctx.clone())
            .unwrap();
        match f.dir.deploy_from_file(&f.owner, "apes", file.path(), f.ctx.clone()) {
            Err(SluiceError::Registry(RegistryError::AlreadyDeployed(key))) => assert_eq!(key, "apes"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn deploy_from_config_file() {
        let f = fixture();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "kind = \"headcount\"\nmax_report_span_secs = 600").unwrap();
        let pool = f
            .dir
            .deploy_from_file(&f.owner, "fleet", file.path(), f.ctx.clone())
            .unwrap();
        assert_eq!(pool.lock().kind(), PoolKind::Headcount);
        let span = f.dir.with_headcount("fleet", |p| Ok(p.max_report_span())).unwrap();
        assert_eq!(span, 600);
    }

    // ------------------------------------------------------------------
    // routing
    // ------------------------------------------------------------------

    #[test]
    fn notify_routes_and_tracks_totals() {
        let f = fixture();
        let cfg = PoolConfig::new(PoolKind::Stake);
        f.dir.deploy(&f.owner, "a", &cfg, f.ctx.clone()).unwrap();
        f.dir.deploy(&f.owner, "b", &cfg, f.ctx.clone()).unwrap();
        f.dir.notify_reward("a", &f.rewarder, 700, 7).unwrap();
        f.dir.notify_reward("a", &f.rewarder, 300, 7).unwrap();
        f.dir.notify_reward("a", &f.rewarder, 0, 7).unwrap();
        assert_eq!(f.dir.total_notified("a"), 1_000);
        assert_eq!(f.dir.total_notified("b"), 0);
        assert_eq!(f.dir.pool("a").unwrap().lock().total_reward_notified(), 1_000);
    }

    #[test]
    fn failed_notify_is_not_counted() {
        let f = fixture();
        f.dir
            .deploy(&f.owner, "a", &PoolConfig::new(PoolKind::Stake), f.ctx.clone())
            .unwrap();
        assert!(f.dir.notify_reward("a", &f.owner, 10, 7).is_err());
        assert_eq!(f.dir.total_notified("a"), 0);
    }

    #[test]
    fn unknown_key() {
        let f = fixture();
        assert_eq!(
            f.dir.notify_reward("nope", &f.rewarder, 1, 1).unwrap_err(),
            RegistryError::UnknownPool("nope".into())
        );
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let f = fixture();
        f.dir
            .deploy(&f.owner, "a", &PoolConfig::new(PoolKind::Stake), f.ctx.clone())
            .unwrap();
        let err = f.dir.with_headcount("a", |p| Ok(p.total_workers())).unwrap_err();
        assert!(matches!(err, RegistryError::WrongPoolKind { .. }));
        let alice = ParticipantId::from_name("alice");
        let balance = f.dir.with_stake("a", |p| p.stake(&alice, 25)).unwrap();
        assert_eq!(balance, 25);
    }
}
