//! Drives a single pool through a sequence of [`Step`]s.
//!
//! The pool is deployed into a [`PoolDirectory`] backed by a manual clock,
//! an in-memory vault, and a recording event sink. Rejected steps are kept
//! in the report rather than aborting the run, unless running strictly.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use sluice_core::auth::RoleTable;
use sluice_core::clock::ManualClock;
use sluice_core::error::RegistryError;
use sluice_core::event::LedgerEvent;
use sluice_core::sink::RecordingSink;
use sluice_core::types::{Amount, ParticipantId, PoolKind, Timestamp};
use sluice_core::vault::MemoryVault;
use sluice_ledger::{AuditReport, PoolConfig, PoolContext};
use sluice_registry::PoolDirectory;
use tracing::{debug, warn};

use crate::scenario::Step;

pub const OWNER: &str = "owner";
pub const REWARDER: &str = "rewarder";
/// Balance minted to the rewarder at start.
pub const REWARDER_FUNDS: Amount = 1_000_000_000_000_000_000_000_000_000;

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub step: usize,
    pub action: &'static str,
    pub error: String,
}

/// Final state of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub pool: String,
    pub kind: PoolKind,
    pub steps: usize,
    pub finished_at: Timestamp,
    pub events: usize,
    pub rejected: Vec<Rejection>,
    /// Claimable reward per named actor at the end of the run.
    pub earned: BTreeMap<String, Amount>,
    /// Vault balance per named actor at the end of the run.
    pub balances: BTreeMap<String, Amount>,
    pub audit: AuditReport,
    pub balanced: bool,
}

pub struct Simulation {
    key: String,
    kind: PoolKind,
    clock: Arc<ManualClock>,
    vault: Arc<MemoryVault>,
    events: Arc<RecordingSink>,
    directory: PoolDirectory,
    rewarder: ParticipantId,
    default_units: u64,
    actors: BTreeMap<String, ParticipantId>,
    rejected: Vec<Rejection>,
    steps: usize,
    strict: bool,
}

impl Simulation {
    pub fn new(config: &PoolConfig, start: Timestamp, strict: bool) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(start));
        let vault = Arc::new(MemoryVault::new());
        let events = Arc::new(RecordingSink::new());
        let owner = ParticipantId::from_name(OWNER);
        let rewarder = ParticipantId::from_name(REWARDER);
        let roles = Arc::new(RoleTable::with_rewarder(owner, rewarder));
        vault.mint(&rewarder, REWARDER_FUNDS);

        let ctx = PoolContext::new(clock.clone(), vault.clone(), roles.clone())
            .with_events(events.clone());
        let directory = PoolDirectory::new(roles);
        let key = config.label.clone().unwrap_or_else(|| "sim".to_string());
        directory
            .deploy(&owner, &key, config, ctx)
            .context("deploying pool")?;

        Ok(Self {
            key,
            kind: config.kind,
            clock,
            vault,
            events,
            directory,
            rewarder,
            default_units: config.rewards_duration,
            actors: BTreeMap::new(),
            rejected: Vec::new(),
            steps: 0,
            strict,
        })
    }

    /// Identity for `name`, remembered for the final report.
    pub fn actor(&mut self, name: &str) -> ParticipantId {
        *self
            .actors
            .entry(name.to_string())
            .or_insert_with(|| ParticipantId::from_name(name))
    }

    pub fn fund(&mut self, name: &str, amount: Amount) {
        let id = self.actor(name);
        self.vault.mint(&id, amount);
    }

    pub fn now(&self) -> Timestamp {
        use sluice_core::traits::Clock;
        self.clock.now()
    }

    /// Events recorded since the last call.
    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        self.events.take()
    }

    /// Apply one step. A rejected step is recorded, or returned as an error
    /// in strict mode.
    pub fn apply(&mut self, step: &Step) -> Result<()> {
        let index = self.steps;
        self.steps += 1;
        match self.dispatch(step) {
            Ok(()) => {
                debug!(step = index, action = step.name(), "sim: step applied");
                Ok(())
            }
            Err(e) if self.strict => bail!("step {index} ({}) failed: {e}", step.name()),
            Err(e) => {
                warn!(step = index, action = step.name(), error = %e, "sim: step rejected");
                self.rejected.push(Rejection {
                    step: index,
                    action: step.name(),
                    error: e.to_string(),
                });
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, step: &Step) -> Result<(), RegistryError> {
        let id = match step.actor() {
            Some(name) => self.actor(name),
            None => ParticipantId::ZERO,
        };
        let (dir, key) = (&self.directory, self.key.as_str());
        match step {
            Step::Advance { secs } => self.clock.advance(*secs),
            Step::Notify { amount, units } => {
                let units = units.unwrap_or(self.default_units);
                dir.notify_reward(key, &self.rewarder, *amount, units)?;
            }
            Step::Stake { amount, .. } => {
                dir.with_stake(key, |p| p.stake(&id, *amount))?;
            }
            Step::Withdraw { amount, .. } => {
                dir.with_stake(key, |p| p.withdraw(&id, *amount))?;
            }
            Step::GetReward { .. } => {
                dir.with_stake(key, |p| p.get_reward(&id))?;
            }
            Step::Exit { .. } => match self.kind {
                PoolKind::Stake => {
                    dir.with_stake(key, |p| p.exit(&id))?;
                }
                PoolKind::Headcount => {
                    dir.with_headcount(key, |p| p.exit(&id))?;
                }
            },
            Step::Register { .. } => {
                dir.with_headcount(key, |p| p.register(&id))?;
            }
            Step::Report { compliant, .. } => {
                dir.with_headcount(key, |p| p.report_liveness(&id, *compliant))?;
            }
            Step::Claim { .. } => {
                dir.with_headcount(key, |p| p.claim_rewards(&id))?;
            }
            Step::Sweep { .. } => {
                dir.pool(key)?.lock().settlement_sweep(&self.rewarder, &id)?;
            }
        }
        Ok(())
    }

    /// Summarise the run.
    pub fn report(&self) -> Result<SimReport> {
        let pool = self.directory.pool(&self.key)?;
        let guard = pool.lock();
        let audit = guard.audit()?;
        let balanced = audit.is_balanced()?;
        let mut earned = BTreeMap::new();
        let mut balances = BTreeMap::new();
        for (name, id) in &self.actors {
            earned.insert(name.clone(), guard.earned(id)?);
            balances.insert(name.clone(), self.vault.balance_of(id));
        }
        Ok(SimReport {
            pool: self.key.clone(),
            kind: self.kind,
            steps: self.steps,
            finished_at: self.now(),
            events: self.events.len(),
            rejected: self.rejected.clone(),
            earned,
            balances,
            audit,
            balanced,
        })
    }
}
