//! The generic reward pool shared by every weighting strategy.
//!
//! Every mutating operation follows the same shape:
//!
//! 1. stage: copy the ledger and the actor's record, flush the copy to
//!    `now`, then settle the actor against it
//! 2. apply the operation's own effect to the staged copy
//! 3. perform the external transfer, if any
//! 4. commit the staged copy and emit events
//!
//! A failure at any step, including a rejected transfer, returns before
//! commit and leaves the pool exactly as it was.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::event::LedgerEvent;
use sluice_core::fixed;
use sluice_core::sink::TracingSink;
use sluice_core::traits::{AssetTransfer, Authority, Clock, EventSink};
use sluice_core::types::{Amount, DurationUnit, ParticipantId, Timestamp};
use tracing::{debug, info};

use crate::accumulator::Ledger;
use crate::audit::AuditReport;
use crate::checkpoint::ParticipantRecord;
use crate::config::PoolConfig;
use crate::scheduler::{self, RoundUpdate};
use crate::sweep;
use crate::weight::WeightSource;
use crate::window;

/// External collaborators a pool talks to.
#[derive(Clone)]
pub struct PoolContext {
    pub clock: Arc<dyn Clock>,
    /// Custody of the staked asset (stake pools).
    pub stake_asset: Arc<dyn AssetTransfer>,
    /// Custody of the reward asset.
    pub reward_asset: Arc<dyn AssetTransfer>,
    pub authority: Arc<dyn Authority>,
    pub events: Arc<dyn EventSink>,
}

impl PoolContext {
    /// Context using `reward_asset` for both assets and logging events via tracing.
    pub fn new(
        clock: Arc<dyn Clock>,
        reward_asset: Arc<dyn AssetTransfer>,
        authority: Arc<dyn Authority>,
    ) -> Self {
        Self {
            clock,
            stake_asset: reward_asset.clone(),
            reward_asset,
            authority,
            events: Arc::new(TracingSink),
        }
    }

    pub fn with_stake_asset(mut self, stake_asset: Arc<dyn AssetTransfer>) -> Self {
        self.stake_asset = stake_asset;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl fmt::Debug for PoolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolContext")
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

/// How the actor's pending accrual is settled while staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settle {
    /// Credit pending accrual to the actor.
    Credit,
    /// Credit only the accrual that falls before `window_close`; the rest
    /// goes to the undistributed balance.
    Late { window_close: Timestamp },
    /// Leave the ledger untouched.
    Skip,
}

/// Working copy of the pool state touched by one operation.
#[derive(Debug)]
pub(crate) struct Staged<W> {
    pub now: Timestamp,
    pub ledger: Ledger,
    pub strategy: W,
    pub who: ParticipantId,
    pub record: ParticipantRecord,
    /// Whole units credited during staging.
    pub credited: Amount,
    /// Scaled mass forfeited during staging.
    pub forfeited: U256,
    pub events: Vec<LedgerEvent>,
}

/// Result of a reward deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deposit {
    /// Zero amount: nothing happened.
    Skipped,
    /// Held until the round opens; carries the total held.
    Queued(Amount),
    /// Scheduled into the running round.
    Scheduled(RoundUpdate),
}

/// Reward pool over a weighting strategy `W`.
#[derive(Debug)]
pub struct RewardPool<W: WeightSource> {
    pub(crate) ledger: Ledger,
    pub(crate) participants: HashMap<ParticipantId, ParticipantRecord>,
    pub(crate) strategy: W,
    pub(crate) duration_unit: DurationUnit,
    pub(crate) rewards_duration: u64,
    pub(crate) label: Option<String>,
    pub(crate) ctx: PoolContext,
}

impl<W: WeightSource> RewardPool<W> {
    pub(crate) fn build(config: &PoolConfig, strategy: W, ctx: PoolContext) -> Result<Self, LedgerError> {
        if config.rewards_duration == 0 || config.rewards_duration_secs().is_none() {
            return Err(LedgerError::InvalidDuration);
        }
        info!(kind = %W::KIND, label = ?config.label, "pool: created");
        Ok(Self {
            ledger: Ledger::new(),
            participants: HashMap::new(),
            strategy,
            duration_unit: config.duration_unit,
            rewards_duration: config.rewards_duration,
            label: config.label.clone(),
            ctx,
        })
    }

    // ------------------------------------------------------------------
    // Staging
    // ------------------------------------------------------------------

    /// Flush a copy of the ledger and settle `who` against it.
    pub(crate) fn stage(&self, who: &ParticipantId, settle: Settle) -> Result<Staged<W>, LedgerError> {
        if who.is_zero() {
            return Err(LedgerError::ZeroParticipant);
        }
        let now = self.ctx.clock.now();
        let mut ledger = self.ledger.clone();
        if settle != Settle::Skip {
            ledger.flush(now)?;
        }
        let mut record = self
            .participants
            .get(who)
            .cloned()
            .unwrap_or_else(|| ParticipantRecord::joining(&ledger, now));

        let mut credited = 0;
        let mut forfeited = U256::zero();
        match settle {
            Settle::Credit => {
                credited = record.checkpoint(&mut ledger)?;
            }
            Settle::Late { window_close } => {
                let end = window::effective_time(now, ledger.round_end);
                let from = record.settled_at.min(end);
                let creditable = window_close.min(end).saturating_sub(from);
                (credited, forfeited) = record.settle_late(&mut ledger, creditable, end - from)?;
            }
            Settle::Skip => {}
        }
        if settle != Settle::Skip {
            record.settled_at = now;
        }

        Ok(Staged {
            now,
            ledger,
            strategy: self.strategy.clone(),
            who: *who,
            record,
            credited,
            forfeited,
            events: Vec::new(),
        })
    }

    /// Install a staged copy and publish its events.
    pub(crate) fn commit(&mut self, staged: Staged<W>) {
        let Staged {
            ledger,
            strategy,
            who,
            record,
            events,
            ..
        } = staged;
        self.ledger = ledger;
        self.strategy = strategy;
        if record.is_empty() {
            if self.participants.remove(&who).is_some() {
                debug!(participant = %who.short(), "pool: record removed");
            }
        } else {
            self.participants.insert(who, record);
        }
        for ev in &events {
            self.ctx.events.emit(ev);
        }
    }

    fn duration_secs(&self, units: u64) -> Result<u64, LedgerError> {
        if units == 0 {
            return Err(LedgerError::InvalidDuration);
        }
        self.duration_unit
            .to_seconds(units)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    pub(crate) fn rewards_duration_secs(&self) -> Result<u64, LedgerError> {
        self.duration_secs(self.rewards_duration)
    }

    // ------------------------------------------------------------------
    // Shared operations
    // ------------------------------------------------------------------

    /// Deposit `amount` of reward to be emitted over `units` duration units.
    ///
    /// Rewarder only. A zero amount is a silent no-op. The deposit is pulled
    /// from `caller` through the reward asset.
    pub fn notify_reward(
        &mut self,
        caller: &ParticipantId,
        amount: Amount,
        units: u64,
    ) -> Result<Deposit, LedgerError> {
        self.ctx.authority.require_rewarder(caller)?;
        if amount == 0 {
            return Ok(Deposit::Skipped);
        }
        let duration = self.duration_secs(units)?;
        let now = self.ctx.clock.now();

        let mut ledger = self.ledger.clone();
        let mut strategy = self.strategy.clone();
        let (outcome, event) = match strategy.hold_deposit(amount)? {
            Some(held) => {
                ledger.record_notified(amount)?;
                let ev = LedgerEvent::BudgetQueued {
                    rewarder: *caller,
                    amount,
                    pending_budget: held,
                    at: now,
                };
                (Deposit::Queued(held), ev)
            }
            None => {
                let update = scheduler::notify(&mut ledger, now, amount, duration)?;
                let ev = LedgerEvent::RewardAdded {
                    rewarder: *caller,
                    amount,
                    leftover: update.leftover,
                    rate: update.rate,
                    round_end: update.round_end,
                    at: now,
                };
                (Deposit::Scheduled(update), ev)
            }
        };

        self.ctx.reward_asset.pull(caller, amount)?;

        self.ledger = ledger;
        self.strategy = strategy;
        info!(rewarder = %caller.short(), amount, duration, "pool: reward notified");
        self.ctx.events.emit(&event);
        Ok(outcome)
    }

    /// Reward `who` could claim right now. Read-only projection.
    pub fn earned(&self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        let ledger = self.ledger.projected(self.ctx.clock.now())?;
        match self.participants.get(who) {
            Some(record) => record.projected_earned(&ledger),
            None => Ok(0),
        }
    }

    /// Settle and pay out everything `who` has earned. Zero is a no-op.
    pub(crate) fn pay_out(&mut self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        let mut staged = self.stage(who, Settle::Credit)?;
        let amount = staged.record.take_settled();
        if amount == 0 {
            return Ok(0);
        }
        staged.ledger.record_claim(amount)?;
        staged.events.push(LedgerEvent::RewardPaid {
            participant: *who,
            amount,
            at: staged.now,
        });

        self.ctx.reward_asset.push(who, amount)?;

        info!(participant = %who.short(), amount, "pool: reward paid");
        self.commit(staged);
        Ok(amount)
    }

    /// Send the whole undistributed balance to `collector`.
    ///
    /// Callable by anyone once the round has ended. Fails with
    /// [`LedgerError::NotFinished`] before the first round or while it runs.
    pub fn settlement_sweep(
        &mut self,
        caller: &ParticipantId,
        collector: &ParticipantId,
    ) -> Result<Amount, LedgerError> {
        if collector.is_zero() {
            return Err(LedgerError::ZeroParticipant);
        }
        let now = self.ctx.clock.now();
        let mut ledger = self.ledger.clone();
        let amount = sweep::sweep(&mut ledger, now)?;
        if amount > 0 {
            self.ctx.reward_asset.push(collector, amount)?;
        }
        self.ledger = ledger;
        info!(collector = %collector.short(), amount, "pool: undistributed swept");
        self.ctx.events.emit(&LedgerEvent::Swept {
            caller: *caller,
            collector: *collector,
            amount,
            at: now,
        });
        Ok(amount)
    }

    /// Change the default round length. Owner only, and only between rounds.
    pub fn set_rewards_duration(&mut self, caller: &ParticipantId, units: u64) -> Result<(), LedgerError> {
        self.ctx.authority.require_owner(caller)?;
        self.duration_secs(units)?;
        let now = self.ctx.clock.now();
        if window::is_active(now, self.ledger.round_end) {
            return Err(LedgerError::RoundInProgress {
                round_end: self.ledger.round_end,
            });
        }
        self.rewards_duration = units;
        info!(units, "pool: rewards duration updated");
        self.ctx.events.emit(&LedgerEvent::RewardsDurationUpdated {
            owner: *caller,
            units,
            at: now,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn kind(&self) -> sluice_core::types::PoolKind {
        W::KIND
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn strategy(&self) -> &W {
        &self.strategy
    }

    pub fn participant(&self, who: &ParticipantId) -> Option<&ParticipantRecord> {
        self.participants.get(who)
    }

    /// Number of records held (active or with claimable reward).
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn now(&self) -> Timestamp {
        self.ctx.clock.now()
    }

    /// `min(now, round_end)`.
    pub fn last_time_reward_applicable(&self) -> Timestamp {
        window::effective_time(self.ctx.clock.now(), self.ledger.round_end)
    }

    /// Accumulator value as of now, scaled.
    pub fn reward_per_weight(&self) -> Result<U256, LedgerError> {
        Ok(self.ledger.projected(self.ctx.clock.now())?.accumulator)
    }

    /// Whole units the current rate emits over one default round.
    pub fn reward_for_duration(&self) -> Result<Amount, LedgerError> {
        let secs = self.rewards_duration_secs()?;
        let (units, _) = fixed::downscale(fixed::mul(self.ledger.reward_rate, U256::from(secs))?)?;
        Ok(units)
    }

    pub fn round_end(&self) -> Timestamp {
        self.ledger.round_end
    }

    pub fn rewards_duration(&self) -> u64 {
        self.rewards_duration
    }

    pub fn duration_unit(&self) -> DurationUnit {
        self.duration_unit
    }

    /// Whole units currently sweepable, as of now.
    pub fn undistributed(&self) -> Result<Amount, LedgerError> {
        let ledger = self.ledger.projected(self.ctx.clock.now())?;
        Ok(fixed::downscale(ledger.undistributed)?.0)
    }

    pub fn total_reward_notified(&self) -> Amount {
        self.ledger.total_notified
    }

    /// Conservation terms as of now.
    pub fn audit(&self) -> Result<AuditReport, LedgerError> {
        let now = self.ctx.clock.now();
        let ledger = self.ledger.projected(now)?;
        let mut settled: Amount = 0;
        let mut pending = U256::zero();
        let mut weight_sum: u128 = 0;
        for record in self.participants.values() {
            settled = settled
                .checked_add(record.settled_unclaimed)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            pending = fixed::add(pending, record.pending(&ledger)?)?;
            weight_sum = weight_sum
                .checked_add(record.weight)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        Ok(AuditReport {
            at: now,
            total_notified: ledger.total_notified,
            total_claimed: ledger.total_claimed,
            total_swept: ledger.total_swept,
            settled_unclaimed: settled,
            pending,
            undistributed: ledger.undistributed,
            unemitted: ledger.unemitted()?,
            held_budget: self.strategy.held_budget(),
            total_weight: ledger.total_weight,
            weight_sum,
        })
    }
}
