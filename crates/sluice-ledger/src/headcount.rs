//! Headcount-weighted pools: every registered participant has weight 1.
//!
//! Participants prove liveness by reporting at least once every
//! `max_report_span` seconds. A compliant report inside the window settles
//! accrual normally. A compliant report after the window credits only the
//! accrual up to the window's close and forfeits the silent remainder to the
//! undistributed balance. Non-compliant reports are recorded and change
//! nothing else.
//!
//! Deposits made before anyone registers are held back and become the
//! budget of the first round, which opens on the first registration.

use sluice_core::U256;
use sluice_core::error::LedgerError;
use sluice_core::event::LedgerEvent;
use sluice_core::types::{Amount, ParticipantId, Weight};
use tracing::{info, warn};

use crate::config::PoolConfig;
use crate::pool::{PoolContext, RewardPool, Settle};
use crate::scheduler;
use crate::weight::HeadcountWeighted;

/// A pool that splits rewards evenly among live registered participants.
pub type HeadcountPool = RewardPool<HeadcountWeighted>;

/// What a liveness report did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessOutcome {
    pub compliant: bool,
    /// Whether the report arrived within `max_report_span` of the previous one.
    pub in_window: bool,
    /// Whole units moved to the participant's claimable balance.
    pub credited: Amount,
    /// Scaled mass diverted to the undistributed balance.
    pub forfeited: U256,
}

impl RewardPool<HeadcountWeighted> {
    /// Create an empty headcount pool. `config.kind` is not consulted.
    pub fn new(config: &PoolConfig, ctx: PoolContext) -> Result<Self, LedgerError> {
        if config.max_report_span_secs == 0 {
            return Err(LedgerError::InvalidDuration);
        }
        Self::build(config, HeadcountWeighted::new(config.max_report_span_secs), ctx)
    }

    /// Add `who` with weight 1. The first registration ever opens the round.
    pub fn register(&mut self, who: &ParticipantId) -> Result<Weight, LedgerError> {
        if self.is_active(who) {
            return Err(LedgerError::AlreadyRegistered(*who));
        }
        let mut staged = self.stage(who, Settle::Credit)?;
        staged.record.weight = 1;
        staged.record.last_activity = staged.now;
        staged.ledger.add_weight(1)?;
        let total_workers = staged.ledger.total_weight;
        staged.events.push(LedgerEvent::Registered {
            participant: *who,
            total_workers,
            at: staged.now,
        });

        if !staged.strategy.started {
            let budget = std::mem::take(&mut staged.strategy.pending_budget);
            let duration = self.rewards_duration_secs()?;
            let update = scheduler::start(&mut staged.ledger, staged.now, budget, duration)?;
            staged.strategy.started = true;
            info!(budget, round_end = update.round_end, "headcount: round started");
            staged.events.push(LedgerEvent::RoundStarted {
                budget,
                rate: update.rate,
                round_end: update.round_end,
                at: staged.now,
            });
        }

        info!(participant = %who.short(), total_workers, "headcount: registered");
        self.commit(staged);
        Ok(total_workers)
    }

    /// Remove `who`. Accrual so far is settled and stays claimable.
    pub fn exit(&mut self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        if !self.is_active(who) {
            return Err(LedgerError::NotRegistered(*who));
        }
        let mut staged = self.stage(who, Settle::Credit)?;
        staged.record.weight = 0;
        staged.ledger.remove_weight(1)?;
        let settled = staged.record.settled_unclaimed;
        staged.events.push(LedgerEvent::Exited {
            participant: *who,
            settled_unclaimed: settled,
            total_workers: staged.ledger.total_weight,
            at: staged.now,
        });

        info!(participant = %who.short(), settled, "headcount: exited");
        self.commit(staged);
        Ok(settled)
    }

    /// Record a liveness report from an active participant.
    ///
    /// A late compliant report keeps the share of pending accrual earned
    /// within `max_report_span` of the last compliant report, pro rata by
    /// time, and forfeits the rest.
    ///
    /// Staleness is only judged here: [`exit`](Self::exit) and
    /// [`claim_rewards`](Self::claim_rewards) settle a stale participant's
    /// accrual in full.
    pub fn report_liveness(
        &mut self,
        who: &ParticipantId,
        compliant: bool,
    ) -> Result<LivenessOutcome, LedgerError> {
        let last_activity = match self.participants.get(who) {
            Some(record) if record.weight > 0 => record.last_activity,
            _ => return Err(LedgerError::NotRegistered(*who)),
        };
        let now = self.ctx.clock.now();
        let in_window = now.saturating_sub(last_activity) <= self.strategy.max_report_span;

        let settle = match (compliant, in_window) {
            (false, _) => Settle::Skip,
            (true, true) => Settle::Credit,
            (true, false) => Settle::Late {
                window_close: last_activity.saturating_add(self.strategy.max_report_span),
            },
        };
        let mut staged = self.stage(who, settle)?;
        let stats = &mut staged.record.liveness;
        if compliant {
            stats.compliant_reports += 1;
            if !in_window {
                stats.late_reports += 1;
            }
            staged.record.last_activity = now;
        } else {
            stats.noncompliant_reports += 1;
        }
        stats.last_compliant = Some(compliant);

        staged.events.push(LedgerEvent::LivenessReported {
            participant: *who,
            compliant,
            in_window,
            at: now,
        });
        if !staged.forfeited.is_zero() {
            warn!(
                participant = %who.short(),
                forfeited = %staged.forfeited,
                silent_secs = now.saturating_sub(last_activity),
                "headcount: late report, accrual forfeited"
            );
            staged.events.push(LedgerEvent::RewardForfeited {
                participant: *who,
                amount: staged.forfeited,
                at: now,
            });
        }

        let outcome = LivenessOutcome {
            compliant,
            in_window,
            credited: staged.credited,
            forfeited: staged.forfeited,
        };
        self.commit(staged);
        Ok(outcome)
    }

    /// Pay out everything `who` has earned. Works after exit too.
    pub fn claim_rewards(&mut self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        self.pay_out(who)
    }

    /// Change the liveness window. Owner only.
    pub fn set_max_report_span(&mut self, caller: &ParticipantId, secs: u64) -> Result<(), LedgerError> {
        self.ctx.authority.require_owner(caller)?;
        if secs == 0 {
            return Err(LedgerError::InvalidDuration);
        }
        self.strategy.max_report_span = secs;
        info!(secs, "headcount: report span updated");
        self.ctx.events.emit(&LedgerEvent::ReportSpanUpdated {
            owner: *caller,
            secs,
            at: self.ctx.clock.now(),
        });
        Ok(())
    }

    pub fn total_workers(&self) -> Weight {
        self.ledger.total_weight
    }

    pub fn is_active(&self, who: &ParticipantId) -> bool {
        self.participants.get(who).is_some_and(|r| r.weight > 0)
    }

    pub fn max_report_span(&self) -> u64 {
        self.strategy.max_report_span
    }

    /// Deposits waiting for the first registration.
    pub fn pending_budget(&self) -> Amount {
        self.strategy.pending_budget
    }

    pub fn started(&self) -> bool {
        self.strategy.started
    }
}
