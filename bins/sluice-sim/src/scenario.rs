//! Scenario files: a pool configuration plus a timed list of actions.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sluice_core::types::{Amount, Timestamp};
use sluice_ledger::PoolConfig;

/// Default simulation start (2023-11-14T22:13:20Z).
pub const DEFAULT_START: Timestamp = 1_700_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub pool: PoolConfig,
    #[serde(default = "default_start")]
    pub start: Timestamp,
    /// Initial balances, by actor name. The rewarder is funded automatically.
    #[serde(default)]
    pub funding: Vec<Funding>,
    pub steps: Vec<Step>,
}

fn default_start() -> Timestamp {
    DEFAULT_START
}

#[derive(Debug, Clone, Deserialize)]
pub struct Funding {
    pub who: String,
    #[serde(with = "sluice_core::wide")]
    pub amount: Amount,
}

/// One scripted action. Actors are referred to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Advance {
        secs: u64,
    },
    /// Deposit from the rewarder. `units` defaults to the pool's rewards duration.
    Notify {
        #[serde(with = "sluice_core::wide")]
        amount: Amount,
        #[serde(default)]
        units: Option<u64>,
    },
    Stake {
        who: String,
        #[serde(with = "sluice_core::wide")]
        amount: Amount,
    },
    Withdraw {
        who: String,
        #[serde(with = "sluice_core::wide")]
        amount: Amount,
    },
    GetReward { who: String },
    Exit { who: String },
    Register { who: String },
    Report { who: String, compliant: bool },
    Claim { who: String },
    Sweep { collector: String },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::Notify { .. } => "notify",
            Self::Stake { .. } => "stake",
            Self::Withdraw { .. } => "withdraw",
            Self::GetReward { .. } => "get_reward",
            Self::Exit { .. } => "exit",
            Self::Register { .. } => "register",
            Self::Report { .. } => "report",
            Self::Claim { .. } => "claim",
            Self::Sweep { .. } => "sweep",
        }
    }

    /// The named actor this step acts on or pays out to.
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::Advance { .. } | Self::Notify { .. } => None,
            Self::Stake { who, .. }
            | Self::Withdraw { who, .. }
            | Self::GetReward { who }
            | Self::Exit { who }
            | Self::Register { who }
            | Self::Report { who, .. }
            | Self::Claim { who } => Some(who),
            Self::Sweep { collector } => Some(collector),
        }
    }
}

impl Scenario {
    /// Load a TOML or JSON scenario (format chosen by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = settings
            .try_deserialize()
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        scenario
            .pool
            .validate()
            .context("invalid pool configuration")?;
        Ok(scenario)
    }
}
