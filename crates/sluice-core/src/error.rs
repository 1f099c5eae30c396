//! Error types for Sluice pools.
use thiserror::Error;

use crate::types::{Amount, ParticipantId, Timestamp};

/// Capability checked by an [`Authority`](crate::traits::Authority).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Rewarder,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => f.write_str("owner"),
            Self::Rewarder => f.write_str("rewarder"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: Amount, need: Amount },
    #[error("transfer rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")] ZeroAmount,
    #[error("zero participant identity")] ZeroParticipant,
    #[error("duration must be positive")] InvalidDuration,
    #[error("participant already registered: {0}")] AlreadyRegistered(ParticipantId),
    #[error("participant not registered: {0}")] NotRegistered(ParticipantId),
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: Amount, need: Amount },
    #[error("{caller} is not {role}")] NotAuthorized { caller: ParticipantId, role: Role },
    #[error("round not finished: now {now}, round end {round_end}")] NotFinished { now: Timestamp, round_end: Timestamp },
    #[error("reward round still in progress until {round_end}")] RoundInProgress { round_end: Timestamp },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("inconsistent snapshot: {0}")] InconsistentSnapshot(String),
    #[error("transfer failed: {0}")] Transfer(#[from] TransferError),
}

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PreconditionViolation,
    InsufficientBalance,
    NotAuthorized,
    NotYetFinished,
    TransferFailed,
    Arithmetic,
}

impl LedgerError {
    /// Map this error onto the failure taxonomy callers dispatch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::ZeroParticipant
            | Self::InvalidDuration
            | Self::AlreadyRegistered(_)
            | Self::NotRegistered(_)
            | Self::RoundInProgress { .. }
            | Self::InconsistentSnapshot(_) => ErrorKind::PreconditionViolation,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::NotFinished { .. } => ErrorKind::NotYetFinished,
            Self::Transfer(_) => ErrorKind::TransferFailed,
            Self::ArithmeticOverflow => ErrorKind::Arithmetic,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("pool already deployed for key {0}")] AlreadyDeployed(String),
    #[error("no pool deployed for key {0}")] UnknownPool(String),
    #[error("pool {key} is a {actual} pool")] WrongPoolKind { key: String, actual: String },
    #[error(transparent)] Ledger(#[from] LedgerError),
}

#[derive(Error, Debug)]
pub enum SluiceError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Registry(#[from] RegistryError),
    #[error("config: {0}")] Config(String),
    #[error("snapshot: {0}")] Snapshot(String),
}
