//! Core value types: participant identities, amounts, timestamps, durations.
//!
//! Token amounts and weights are `u128` base units. Timestamps are Unix
//! seconds as `u64`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SECONDS_PER_DAY;

/// Token amount in base units of an asset.
pub type Amount = u128;

/// Share basis of a participant (stake balance, or 1 while registered).
pub type Weight = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Opaque 32-byte identity of a participant, rewarder, owner, or collector.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ParticipantId(pub [u8; 32]);

impl ParticipantId {
    /// The zero identity. Never a valid actor.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Derive a stable identity from a human-readable name (BLAKE3 of the name).
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice_core::types::ParticipantId;
    /// assert_eq!(ParticipantId::from_name("alice"), ParticipantId::from_name("alice"));
    /// assert_ne!(ParticipantId::from_name("alice"), ParticipantId::from_name("bob"));
    /// ```
    pub fn from_name(name: &str) -> Self {
        Self(*blake3::hash(name.as_bytes()).as_bytes())
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes in hex, for compact log fields.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Unit in which reward-period durations are expressed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Seconds,
    #[default]
    Days,
}

impl DurationUnit {
    /// Convert a count of this unit into seconds. `None` on overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice_core::types::DurationUnit;
    /// assert_eq!(DurationUnit::Days.to_seconds(7), Some(604_800));
    /// assert_eq!(DurationUnit::Seconds.to_seconds(90), Some(90));
    /// ```
    pub fn to_seconds(&self, units: u64) -> Option<u64> {
        match self {
            Self::Seconds => Some(units),
            Self::Days => units.checked_mul(SECONDS_PER_DAY),
        }
    }
}

/// Which weighting strategy a pool uses.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Weight is the participant's staked balance.
    Stake,
    /// Weight is 1 per registered participant.
    Headcount,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stake => f.write_str("stake"),
            Self::Headcount => f.write_str("headcount"),
        }
    }
}
