//! # sluice-registry: Directory of reward pools.
//!
//! A [`PoolDirectory`] maps a collection key (for example an NFT collection
//! or worker fleet name) to exactly one deployed pool. Deployment is owner
//! only and a key can be deployed once. Each pool sits behind its own mutex,
//! so operations on one pool are serialised while different pools proceed
//! independently.

pub mod directory;
pub mod pool;

pub use directory::PoolDirectory;
pub use pool::{AnyPool, SharedPool};
