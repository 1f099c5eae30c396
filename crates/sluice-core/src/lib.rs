//! # sluice-core
//! Foundation types and collaborator traits for Sluice reward pools.
//!
//! - [`types`]: participant identities, amounts, duration units
//! - [`fixed`]: checked `U256` fixed-point helpers at [`constants::PRECISION`]
//! - [`error`]: error taxonomy shared by every crate
//! - [`traits`]: clock, value transfer, authorization, and event sink seams
//! - [`event`]: the structured audit events emitted by every mutation
//! - [`wide`]: serde adapter for `u128` amounts in tagged enums
//! - [`clock`], [`vault`], [`auth`], [`sink`]: in-process reference collaborators

pub mod auth;
pub mod clock;
pub mod constants;
pub mod error;
pub mod event;
pub mod fixed;
pub mod sink;
pub mod traits;
pub mod types;
pub mod vault;
pub mod wide;

pub use primitive_types::U256;
