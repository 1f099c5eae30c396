//! Stake-weighted pools: weight is the participant's staked balance.

use sluice_core::error::LedgerError;
use sluice_core::event::LedgerEvent;
use sluice_core::types::{Amount, ParticipantId, Weight};
use tracing::info;

use crate::config::PoolConfig;
use crate::pool::{PoolContext, RewardPool, Settle};
use crate::weight::StakeWeighted;

/// A pool whose participants earn in proportion to the amount staked.
pub type StakePool = RewardPool<StakeWeighted>;

impl RewardPool<StakeWeighted> {
    /// Create an empty stake pool. `config.kind` is not consulted.
    pub fn new(config: &PoolConfig, ctx: PoolContext) -> Result<Self, LedgerError> {
        Self::build(config, StakeWeighted, ctx)
    }

    /// Pull `amount` of the staked asset from `who` and add it to their weight.
    pub fn stake(&mut self, who: &ParticipantId, amount: Amount) -> Result<Weight, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut staged = self.stage(who, Settle::Credit)?;
        staged.record.weight = staged
            .record
            .weight
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        staged.ledger.add_weight(amount)?;
        staged.record.last_activity = staged.now;

        let balance = staged.record.weight;
        staged.events.push(LedgerEvent::Staked {
            participant: *who,
            amount,
            balance,
            total_weight: staged.ledger.total_weight,
            at: staged.now,
        });

        self.ctx.stake_asset.pull(who, amount)?;

        info!(participant = %who.short(), amount, balance, "stake: staked");
        self.commit(staged);
        Ok(balance)
    }

    /// Return `amount` of stake to `who`. Accrual so far stays claimable.
    pub fn withdraw(&mut self, who: &ParticipantId, amount: Amount) -> Result<Weight, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut staged = self.stage(who, Settle::Credit)?;
        let have = staged.record.weight;
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        staged.record.weight = have - amount;
        staged.ledger.remove_weight(amount)?;
        staged.record.last_activity = staged.now;

        let balance = staged.record.weight;
        staged.events.push(LedgerEvent::Withdrawn {
            participant: *who,
            amount,
            balance,
            total_weight: staged.ledger.total_weight,
            at: staged.now,
        });

        self.ctx.stake_asset.push(who, amount)?;

        info!(participant = %who.short(), amount, balance, "stake: withdrawn");
        self.commit(staged);
        Ok(balance)
    }

    /// Pay out everything `who` has earned. Zero earnings is a no-op.
    pub fn get_reward(&mut self, who: &ParticipantId) -> Result<Amount, LedgerError> {
        self.pay_out(who)
    }

    /// Withdraw the full balance, then claim. Returns `(withdrawn, reward)`.
    ///
    /// The two steps commit separately: if the payout fails the withdrawal
    /// still stands and the reward stays claimable.
    pub fn exit(&mut self, who: &ParticipantId) -> Result<(Amount, Amount), LedgerError> {
        let balance = self.balance_of(who);
        if balance > 0 {
            self.withdraw(who, balance)?;
        }
        let reward = self.get_reward(who)?;
        Ok((balance, reward))
    }

    /// Total staked across all participants.
    pub fn total_supply(&self) -> Weight {
        self.ledger.total_weight
    }

    pub fn balance_of(&self, who: &ParticipantId) -> Weight {
        self.participants.get(who).map_or(0, |r| r.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FUNDS, Harness, id};
    use sluice_core::error::ErrorKind;
    use sluice_core::types::PoolKind;

    const DAY: u64 = 86_400;

    fn pool(h: &Harness) -> StakePool {
        StakePool::new(&PoolConfig::new(PoolKind::Stake), h.ctx.clone()).unwrap()
    }

    // ------------------------------------------------------------------
    // stake / withdraw
    // ------------------------------------------------------------------

    #[test]
    fn stake_moves_funds_and_weight() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        assert_eq!(p.stake(&alice, 500).unwrap(), 500);
        assert_eq!(p.balance_of(&alice), 500);
        assert_eq!(p.total_supply(), 500);
        assert_eq!(h.vault.balance_of(&alice), FUNDS - 500);
        assert_eq!(h.events.named("staked").len(), 1);
    }

    #[test]
    fn zero_stake_rejected() {
        let h = Harness::new();
        let mut p = pool(&h);
        assert_eq!(p.stake(&id("alice"), 0), Err(LedgerError::ZeroAmount));
        assert!(h.events.is_empty());
    }

    #[test]
    fn zero_identity_rejected() {
        let h = Harness::new();
        let mut p = pool(&h);
        assert_eq!(p.stake(&ParticipantId::ZERO, 5), Err(LedgerError::ZeroParticipant));
    }

    #[test]
    fn over_withdraw_is_insufficient_balance() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.stake(&alice, 10).unwrap();
        let err = p.withdraw(&alice, 11).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { have: 10, need: 11 });
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(p.balance_of(&alice), 10);
    }

    #[test]
    fn failed_pull_leaves_pool_unchanged() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.notify_reward(&h.rewarder, 7_000, 7).unwrap();
        p.stake(&alice, 10).unwrap();
        h.advance(DAY);
        let before = (p.ledger().clone(), p.participant(&alice).cloned());
        h.events.take();

        h.vault.set_frozen(true);
        let err = p.stake(&alice, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        assert_eq!((p.ledger().clone(), p.participant(&alice).cloned()), before);
        assert!(h.events.is_empty());
    }

    // ------------------------------------------------------------------
    // accrual
    // ------------------------------------------------------------------

    #[test]
    fn proportional_split_after_one_day() {
        let h = Harness::new();
        let mut p = pool(&h);
        let (alice, bob) = (id("alice"), id("bob"));
        p.notify_reward(&h.rewarder, 7_000_000, 7).unwrap();
        p.stake(&alice, 9_000).unwrap();
        p.stake(&bob, 1_000).unwrap();
        h.advance(DAY);

        let a = p.earned(&alice).unwrap();
        let b = p.earned(&bob).unwrap();
        assert!(a.abs_diff(900_000) <= 180, "alice earned {a}");
        assert!(b.abs_diff(100_000) <= 20, "bob earned {b}");
    }

    #[test]
    fn late_joiner_earns_nothing_retroactively() {
        let h = Harness::new();
        let mut p = pool(&h);
        let (alice, bob) = (id("alice"), id("bob"));
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 1).unwrap();
        h.advance(3 * DAY);
        p.stake(&bob, 1).unwrap();
        assert_eq!(p.earned(&bob).unwrap(), 0);
        h.advance(DAY);
        // alice: 3 days alone + half of one day
        assert!(p.earned(&alice).unwrap().abs_diff(350) <= 1);
        assert!(p.earned(&bob).unwrap().abs_diff(50) <= 1);
    }

    #[test]
    fn earned_is_read_only() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 3).unwrap();
        h.advance(DAY);
        let before = p.ledger().clone();
        assert!(p.earned(&alice).unwrap() > 0);
        assert_eq!(p.ledger(), &before);
    }

    #[test]
    fn get_reward_pays_and_zeroes() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 1).unwrap();
        h.advance(7 * DAY);
        let paid = p.get_reward(&alice).unwrap();
        assert!(paid.abs_diff(700) <= 1);
        assert_eq!(h.vault.balance_of(&alice), FUNDS - 1 + paid);
        assert_eq!(p.earned(&alice).unwrap(), 0);
        // nothing left: no-op, no event
        let n = h.events.len();
        assert_eq!(p.get_reward(&alice).unwrap(), 0);
        assert_eq!(h.events.len(), n);
    }

    #[test]
    fn exit_returns_stake_and_reward_and_drops_record() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 40).unwrap();
        h.advance(DAY);
        let (withdrawn, reward) = p.exit(&alice).unwrap();
        assert_eq!(withdrawn, 40);
        assert!(reward.abs_diff(100) <= 1);
        assert!(p.participant(&alice).is_none());
        assert_eq!(p.total_supply(), 0);
    }

    #[test]
    fn exit_with_failed_payout_keeps_withdrawal() {
        let h = Harness::new();
        let stake_vault = std::sync::Arc::new(sluice_core::vault::MemoryVault::new());
        let alice = id("alice");
        stake_vault.mint(&alice, 40);
        let ctx = h.ctx.clone().with_stake_asset(stake_vault.clone());
        let mut p = StakePool::new(&PoolConfig::new(PoolKind::Stake), ctx).unwrap();
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 40).unwrap();
        h.advance(DAY);

        h.vault.set_frozen(true);
        let err = p.exit(&alice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        // the withdrawal committed, the reward is still owed
        assert_eq!(p.balance_of(&alice), 0);
        assert_eq!(p.total_supply(), 0);
        assert_eq!(stake_vault.balance_of(&alice), 40);
        let owed = p.earned(&alice).unwrap();
        assert!(owed.abs_diff(100) <= 1);
        assert_eq!(h.events.named("withdrawn").len(), 1);
        assert!(h.events.named("reward_paid").is_empty());

        h.vault.set_frozen(false);
        assert_eq!(p.get_reward(&alice).unwrap(), owed);
        assert!(p.participant(&alice).is_none());
        assert!(p.audit().unwrap().is_balanced().unwrap());
    }

    #[test]
    fn withdraw_keeps_accrual_claimable() {
        let h = Harness::new();
        let mut p = pool(&h);
        let alice = id("alice");
        p.notify_reward(&h.rewarder, 700, 7).unwrap();
        p.stake(&alice, 5).unwrap();
        h.advance(DAY);
        p.withdraw(&alice, 5).unwrap();
        let settled = p.participant(&alice).map(|r| r.settled_unclaimed()).unwrap_or(0);
        assert!(settled.abs_diff(100) <= 1);
        h.advance(DAY);
        assert_eq!(p.earned(&alice).unwrap(), settled);
    }

    // ------------------------------------------------------------------
    // deposits and views
    // ------------------------------------------------------------------

    #[test]
    fn notify_requires_rewarder() {
        let h = Harness::new();
        let mut p = pool(&h);
        let err = p.notify_reward(&h.owner, 10, 7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert_eq!(p.total_reward_notified(), 0);
    }

    #[test]
    fn zero_deposit_is_skipped() {
        let h = Harness::new();
        let mut p = pool(&h);
        assert_eq!(p.notify_reward(&h.rewarder, 0, 7).unwrap(), crate::pool::Deposit::Skipped);
        assert!(h.events.is_empty());
    }

    #[test]
    fn zero_duration_rejected() {
        let h = Harness::new();
        let mut p = pool(&h);
        assert_eq!(p.notify_reward(&h.rewarder, 10, 0), Err(LedgerError::InvalidDuration));
    }

    #[test]
    fn views_track_round() {
        let h = Harness::new();
        let mut p = pool(&h);
        p.notify_reward(&h.rewarder, 7_000, 7).unwrap();
        assert_eq!(p.round_end(), crate::testkit::T0 + 7 * DAY);
        assert_eq!(p.last_time_reward_applicable(), crate::testkit::T0);
        assert!(p.reward_for_duration().unwrap().abs_diff(7_000) <= 1);
        h.advance(10 * DAY);
        assert_eq!(p.last_time_reward_applicable(), p.round_end());
        // nobody staked: the whole deposit is sweepable
        assert!(p.undistributed().unwrap().abs_diff(7_000) <= 1);
    }

    #[test]
    fn set_rewards_duration_only_between_rounds() {
        let h = Harness::new();
        let mut p = pool(&h);
        p.notify_reward(&h.rewarder, 7_000, 7).unwrap();
        assert!(matches!(
            p.set_rewards_duration(&h.owner, 14),
            Err(LedgerError::RoundInProgress { .. })
        ));
        assert_eq!(
            p.set_rewards_duration(&h.rewarder, 14).unwrap_err().kind(),
            ErrorKind::NotAuthorized
        );
        h.advance(7 * DAY);
        p.set_rewards_duration(&h.owner, 14).unwrap();
        assert_eq!(p.rewards_duration(), 14);
    }

    #[test]
    fn audit_balances_through_lifecycle() {
        let h = Harness::new();
        let mut p = pool(&h);
        let (alice, bob) = (id("alice"), id("bob"));
        p.notify_reward(&h.rewarder, 1_000_003, 3).unwrap();
        assert!(p.audit().unwrap().is_balanced().unwrap());
        p.stake(&alice, 7).unwrap();
        h.advance(DAY / 3);
        p.stake(&bob, 11).unwrap();
        h.advance(DAY);
        p.get_reward(&alice).unwrap();
        p.withdraw(&bob, 4).unwrap();
        assert!(p.audit().unwrap().is_balanced().unwrap());
        h.advance(5 * DAY);
        p.settlement_sweep(&bob, &h.owner).unwrap();
        p.exit(&alice).unwrap();
        assert!(p.audit().unwrap().is_balanced().unwrap());
    }
}
