//! Construction-time configuration for the tunable containers.

use crate::error::{ContainerError, Result};
use serde::{Deserialize, Serialize};

/// Default coin-flip probability for skip list promotion.
pub const DEFAULT_PROBABILITY: f64 = 0.5;
/// Default number of skip list levels.
pub const DEFAULT_MAX_LEVEL: usize = 16;
/// Default number of hash table buckets.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
/// Default hash table growth threshold.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Skip list level selection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipListConfig {
    /// Maximum number of levels a node may be promoted to.
    pub max_level: usize,
    /// Probability that a node is promoted one more level.
    pub probability: f64,
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            probability: DEFAULT_PROBABILITY,
        }
    }
}

impl SkipListConfig {
    /// Checks that the parameters describe a usable skip list.
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 {
            return Err(ContainerError::ZeroMaxLevel);
        }
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(ContainerError::InvalidProbability(self.probability));
        }
        Ok(())
    }
}

/// Hash table sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HashTableConfig {
    /// Number of buckets allocated up front.
    pub initial_capacity: usize,
    /// `len / capacity` ratio at which the bucket array doubles.
    pub load_factor: f64,
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl HashTableConfig {
    /// Checks that the parameters describe a usable hash table.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ContainerError::ZeroCapacity);
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(ContainerError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}

/// Configuration handed to [`ContainerKind::build`](crate::ContainerKind::build).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Parameters for skip lists.
    pub skip_list: SkipListConfig,
    /// Parameters for hash tables.
    pub hash_table: HashTableConfig,
}

impl ContainerConfig {
    /// Validates every nested config.
    pub fn validate(&self) -> Result<()> {
        self.skip_list.validate()?;
        self.hash_table.validate()
    }
}
