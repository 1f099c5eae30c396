//! Protocol constants. Amounts are in base units of the reward asset.

/// Fixed-point scale for rates, the accumulator, and undistributed reward.
///
/// `1.0` reward unit per weight unit is stored as `PRECISION`.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Seconds in one day, the unit used by day-denominated reward periods.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: u64 = 3_600;

/// Default length of a reward round, in [`DurationUnit`](crate::types::DurationUnit)s.
pub const DEFAULT_REWARDS_DURATION: u64 = 7;

/// Default maximum gap between two liveness reports before a participant is stale.
pub const DEFAULT_MAX_REPORT_SPAN_SECS: u64 = SECONDS_PER_HOUR;
