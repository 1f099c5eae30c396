//! Pool configuration.
//!
//! [`PoolConfig`] can be built programmatically or loaded from a TOML/JSON
//! file layered with `SLUICE_*` environment overrides (for example
//! `SLUICE_MAX_REPORT_SPAN_SECS=7200`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use sluice_core::constants::{DEFAULT_MAX_REPORT_SPAN_SECS, DEFAULT_REWARDS_DURATION};
use sluice_core::error::SluiceError;
use sluice_core::types::{DurationUnit, PoolKind};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "SLUICE";

/// Configuration for one reward pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Weighting strategy.
    pub kind: PoolKind,
    /// Unit of `rewards_duration` and of deposit durations.
    #[serde(default)]
    pub duration_unit: DurationUnit,
    /// Round length used when a headcount pool opens, and the default
    /// deposit duration for callers that do not pass one.
    #[serde(default = "default_rewards_duration")]
    pub rewards_duration: u64,
    /// Longest gap between liveness reports (headcount pools).
    #[serde(default = "default_max_report_span")]
    pub max_report_span_secs: u64,
    /// Free-form name used in logs.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_rewards_duration() -> u64 {
    DEFAULT_REWARDS_DURATION
}

fn default_max_report_span() -> u64 {
    DEFAULT_MAX_REPORT_SPAN_SECS
}

impl PoolConfig {
    /// Defaults for a pool of the given kind.
    pub fn new(kind: PoolKind) -> Self {
        Self {
            kind,
            duration_unit: DurationUnit::default(),
            rewards_duration: DEFAULT_REWARDS_DURATION,
            max_report_span_secs: DEFAULT_MAX_REPORT_SPAN_SECS,
            label: None,
        }
    }

    /// Load from a file (format chosen by extension) plus `SLUICE_*` env vars.
    pub fn load(path: &Path) -> Result<Self, SluiceError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| SluiceError::Config(e.to_string()))?;
        Self::finish(settings)
    }

    /// Parse from a TOML string (no environment layering).
    pub fn from_toml(text: &str) -> Result<Self, SluiceError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .map_err(|e| SluiceError::Config(e.to_string()))?;
        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self, SluiceError> {
        let cfg: PoolConfig = settings
            .try_deserialize()
            .map_err(|e| SluiceError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject zero durations and spans.
    pub fn validate(&self) -> Result<(), SluiceError> {
        if self.rewards_duration == 0 {
            return Err(SluiceError::Config("rewards_duration must be positive".into()));
        }
        if self.duration_unit.to_seconds(self.rewards_duration).is_none() {
            return Err(SluiceError::Config("rewards_duration overflows seconds".into()));
        }
        if self.kind == PoolKind::Headcount && self.max_report_span_secs == 0 {
            return Err(SluiceError::Config("max_report_span_secs must be positive".into()));
        }
        Ok(())
    }

    /// `rewards_duration` in seconds.
    pub fn rewards_duration_secs(&self) -> Option<u64> {
        self.duration_unit.to_seconds(self.rewards_duration)
    }
}
