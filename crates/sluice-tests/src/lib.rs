//! Cross-crate test suite for Sluice reward pools.
//!
//! Scenario tests replay the reference accrual scenarios end to end through
//! the public pool API. Property tests drive random operation sequences and
//! check that the books always balance, that the accumulator only moves
//! forward, and that nobody earns for time before they joined.

pub mod helpers;
