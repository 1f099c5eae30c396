//! Audit events emitted after every committed mutation.
//!
//! The event stream is sufficient to reconstruct the accrual history of a
//! pool: every rate change, weight change, payout, forfeiture, and sweep is
//! recorded with its actor, timestamp, and resulting amounts. A journal
//! written as JSON reads back into the same events.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::types::{Amount, ParticipantId, Timestamp, Weight};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A reward deposit changed the emission rate.
    RewardAdded {
        rewarder: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        /// Unspent emission carried over from the in-flight round (scaled).
        leftover: U256,
        /// New emission rate per second (scaled).
        rate: U256,
        round_end: Timestamp,
        at: Timestamp,
    },
    /// A reward deposit arrived before the headcount round opened.
    BudgetQueued {
        rewarder: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        #[serde(with = "crate::wide")]
        pending_budget: Amount,
        at: Timestamp,
    },
    /// The first headcount registration opened the round clock.
    RoundStarted {
        #[serde(with = "crate::wide")]
        budget: Amount,
        rate: U256,
        round_end: Timestamp,
        at: Timestamp,
    },
    Staked {
        participant: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        #[serde(with = "crate::wide")]
        balance: Weight,
        #[serde(with = "crate::wide")]
        total_weight: Weight,
        at: Timestamp,
    },
    Withdrawn {
        participant: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        #[serde(with = "crate::wide")]
        balance: Weight,
        #[serde(with = "crate::wide")]
        total_weight: Weight,
        at: Timestamp,
    },
    RewardPaid {
        participant: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        at: Timestamp,
    },
    Registered {
        participant: ParticipantId,
        #[serde(with = "crate::wide")]
        total_workers: Weight,
        at: Timestamp,
    },
    Exited {
        participant: ParticipantId,
        #[serde(with = "crate::wide")]
        settled_unclaimed: Amount,
        #[serde(with = "crate::wide")]
        total_workers: Weight,
        at: Timestamp,
    },
    LivenessReported {
        participant: ParticipantId,
        compliant: bool,
        in_window: bool,
        at: Timestamp,
    },
    /// Accrual diverted to the undistributed balance by a late report.
    RewardForfeited {
        participant: ParticipantId,
        /// Forfeited mass (scaled).
        amount: U256,
        at: Timestamp,
    },
    Swept {
        caller: ParticipantId,
        collector: ParticipantId,
        #[serde(with = "crate::wide")]
        amount: Amount,
        at: Timestamp,
    },
    RewardsDurationUpdated {
        owner: ParticipantId,
        units: u64,
        at: Timestamp,
    },
    ReportSpanUpdated {
        owner: ParticipantId,
        secs: u64,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// Operation name, matching the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RewardAdded { .. } => "reward_added",
            Self::BudgetQueued { .. } => "budget_queued",
            Self::RoundStarted { .. } => "round_started",
            Self::Staked { .. } => "staked",
            Self::Withdrawn { .. } => "withdrawn",
            Self::RewardPaid { .. } => "reward_paid",
            Self::Registered { .. } => "registered",
            Self::Exited { .. } => "exited",
            Self::LivenessReported { .. } => "liveness_reported",
            Self::RewardForfeited { .. } => "reward_forfeited",
            Self::Swept { .. } => "swept",
            Self::RewardsDurationUpdated { .. } => "rewards_duration_updated",
            Self::ReportSpanUpdated { .. } => "report_span_updated",
        }
    }

    /// The identity that caused the event, if any.
    pub fn actor(&self) -> Option<ParticipantId> {
        match self {
            Self::RewardAdded { rewarder, .. } | Self::BudgetQueued { rewarder, .. } => {
                Some(*rewarder)
            }
            Self::RoundStarted { .. } => None,
            Self::Staked { participant, .. }
            | Self::Withdrawn { participant, .. }
            | Self::RewardPaid { participant, .. }
            | Self::Registered { participant, .. }
            | Self::Exited { participant, .. }
            | Self::LivenessReported { participant, .. }
            | Self::RewardForfeited { participant, .. } => Some(*participant),
            Self::Swept { caller, .. } => Some(*caller),
            Self::RewardsDurationUpdated { owner, .. } | Self::ReportSpanUpdated { owner, .. } => {
                Some(*owner)
            }
        }
    }

    /// Timestamp at which the event was committed.
    pub fn at(&self) -> Timestamp {
        match self {
            Self::RewardAdded { at, .. }
            | Self::BudgetQueued { at, .. }
            | Self::RoundStarted { at, .. }
            | Self::Staked { at, .. }
            | Self::Withdrawn { at, .. }
            | Self::RewardPaid { at, .. }
            | Self::Registered { at, .. }
            | Self::Exited { at, .. }
            | Self::LivenessReported { at, .. }
            | Self::RewardForfeited { at, .. }
            | Self::Swept { at, .. }
            | Self::RewardsDurationUpdated { at, .. }
            | Self::ReportSpanUpdated { at, .. } => *at,
        }
    }
}
