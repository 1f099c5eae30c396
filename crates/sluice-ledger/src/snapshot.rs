//! Point-in-time pool snapshots.
//!
//! A [`PoolSnapshot`] captures everything needed to rebuild a pool except
//! its collaborators. Snapshots are encoded with bincode (serde path) and
//! checked for internal consistency on restore.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sluice_core::error::{LedgerError, SluiceError};
use sluice_core::types::{DurationUnit, ParticipantId, PoolKind, Weight};
use tracing::info;

use crate::accumulator::Ledger;
use crate::checkpoint::ParticipantRecord;
use crate::pool::{PoolContext, RewardPool};
use crate::weight::WeightSource;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "W: WeightSource")]
pub struct PoolSnapshot<W: WeightSource> {
    pub version: u32,
    pub kind: PoolKind,
    pub duration_unit: DurationUnit,
    pub rewards_duration: u64,
    pub label: Option<String>,
    pub ledger: Ledger,
    pub strategy: W,
    /// Sorted by participant id so equal pools encode identically.
    pub participants: Vec<(ParticipantId, ParticipantRecord)>,
}

impl<W: WeightSource> PoolSnapshot<W> {
    pub fn encode(&self) -> Result<Vec<u8>, SluiceError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| SluiceError::Snapshot(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SluiceError> {
        let (snapshot, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| SluiceError::Snapshot(e.to_string()))?;
        Ok(snapshot)
    }

    /// Check the snapshot describes a reachable pool state.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let bad = |msg: String| Err(LedgerError::InconsistentSnapshot(msg));
        if self.version != SNAPSHOT_VERSION {
            return bad(format!("unsupported version {}", self.version));
        }
        if self.kind != W::KIND {
            return bad(format!("snapshot is for a {} pool", self.kind));
        }
        if self.rewards_duration == 0 || self.duration_unit.to_seconds(self.rewards_duration).is_none() {
            return bad("rewards duration out of range".into());
        }
        if self.ledger.round_end > 0 && self.ledger.last_update > self.ledger.round_end {
            return bad("last update past round end".into());
        }

        let mut weight_sum: Weight = 0;
        let mut prev: Option<&ParticipantId> = None;
        for (id, record) in &self.participants {
            if prev.is_some_and(|p| p >= id) {
                return bad("participants not sorted or duplicated".into());
            }
            prev = Some(id);
            if id.is_zero() || record.is_empty() {
                return bad(format!("invalid record for {id}"));
            }
            if !W::weight_is_valid(record.weight) {
                return bad(format!("weight {} not allowed for {id}", record.weight));
            }
            if record.accumulator_paid > self.ledger.accumulator {
                return bad(format!("{id} paid past the accumulator"));
            }
            weight_sum = weight_sum
                .checked_add(record.weight)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        if weight_sum != self.ledger.total_weight {
            return bad(format!(
                "weights sum to {weight_sum}, ledger holds {}",
                self.ledger.total_weight
            ));
        }
        Ok(())
    }
}

impl<W: WeightSource> RewardPool<W> {
    /// Capture the current state.
    pub fn snapshot(&self) -> PoolSnapshot<W> {
        let mut participants: Vec<_> = self
            .participants
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        participants.sort_by(|a, b| a.0.cmp(&b.0));
        PoolSnapshot {
            version: SNAPSHOT_VERSION,
            kind: W::KIND,
            duration_unit: self.duration_unit,
            rewards_duration: self.rewards_duration,
            label: self.label.clone(),
            ledger: self.ledger.clone(),
            strategy: self.strategy.clone(),
            participants,
        }
    }

    /// Rebuild a pool from a validated snapshot.
    pub fn restore(snapshot: PoolSnapshot<W>, ctx: PoolContext) -> Result<Self, LedgerError> {
        snapshot.validate()?;
        let participants: HashMap<_, _> = snapshot.participants.into_iter().collect();
        info!(
            kind = %W::KIND,
            participants = participants.len(),
            "snapshot: pool restored"
        );
        Ok(Self {
            ledger: snapshot.ledger,
            participants,
            strategy: snapshot.strategy,
            duration_unit: snapshot.duration_unit,
            rewards_duration: snapshot.rewards_duration,
            label: snapshot.label,
            ctx,
        })
    }
}
