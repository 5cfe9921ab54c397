//! Planner configuration
//!
//! Cost constants and feature toggles for plan selection. The defaults are
//! conventional values; deployments tune them against real workloads.

use serde::{Deserialize, Serialize};

use crate::plan::JoinAlgorithm;

/// Default per-operator memory budget (4MB) before hash/sort spill
pub const DEFAULT_OPERATOR_MEM_BUDGET: u64 = 4 * 1024 * 1024;

/// Default maximum relation count for exhaustive DP enumeration
pub const DEFAULT_ENUMERATION_BUDGET: usize = 10;

/// Default selectivity for equality filters with no statistics
pub const DEFAULT_EQ_SELECTIVITY: f64 = 0.1;

/// Default selectivity for range filters with no statistics
pub const DEFAULT_RANGE_SELECTIVITY: f64 = 0.33;

/// Default selectivity for join conditions with no statistics
pub const DEFAULT_JOIN_SELECTIVITY: f64 = 0.1;

/// Default rows read per sequential I/O
pub const DEFAULT_ROWS_PER_PAGE: f64 = 100.0;

/// Configuration for the plan selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Memory budget per operator in bytes; hash builds and sorts larger
    /// than this are charged the spill penalty
    pub operator_mem_budget: u64,

    /// Allow nested-loop join
    pub enable_nested_loop: bool,

    /// Allow hash join
    pub enable_hash_join: bool,

    /// Allow merge join
    pub enable_merge_join: bool,

    /// Maximum relation count planned with exhaustive subset DP; larger
    /// queries fall back to a greedy left-deep join order
    pub enumeration_budget: usize,

    /// Fallback selectivity for equality filters
    pub fallback_eq_selectivity: f64,

    /// Fallback selectivity for range filters
    pub fallback_range_selectivity: f64,

    /// Fallback selectivity for join conditions
    pub fallback_join_selectivity: f64,

    /// CPU cost of processing one row sequentially
    pub seq_row_cost: f64,

    /// I/O penalty multiplier for random access relative to sequential
    pub random_access_cost: f64,

    /// CPU cost of inserting one row into a hash table
    pub hash_build_cost: f64,

    /// CPU cost of probing a hash table for one row
    pub hash_probe_cost: f64,

    /// CPU cost of sorting per row (the n log n factor is applied separately)
    pub sort_row_cost: f64,

    /// Multiplier applied to hash/sort cost once the operator spills
    pub spill_penalty: f64,

    /// Rows read per sequential I/O operation
    pub rows_per_page: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            operator_mem_budget: DEFAULT_OPERATOR_MEM_BUDGET,
            enable_nested_loop: true,
            enable_hash_join: true,
            enable_merge_join: true,
            enumeration_budget: DEFAULT_ENUMERATION_BUDGET,
            fallback_eq_selectivity: DEFAULT_EQ_SELECTIVITY,
            fallback_range_selectivity: DEFAULT_RANGE_SELECTIVITY,
            fallback_join_selectivity: DEFAULT_JOIN_SELECTIVITY,
            seq_row_cost: 1.0,
            random_access_cost: 4.0,
            hash_build_cost: 1.5,
            hash_probe_cost: 1.2,
            sort_row_cost: 2.0,
            spill_penalty: 2.0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl PlannerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-operator memory budget in bytes
    pub fn with_mem_budget(mut self, bytes: u64) -> Self {
        self.operator_mem_budget = bytes;
        self
    }

    /// Enable or disable nested-loop join
    pub fn with_nested_loop(mut self, enabled: bool) -> Self {
        self.enable_nested_loop = enabled;
        self
    }

    /// Enable or disable hash join
    pub fn with_hash_join(mut self, enabled: bool) -> Self {
        self.enable_hash_join = enabled;
        self
    }

    /// Enable or disable merge join
    pub fn with_merge_join(mut self, enabled: bool) -> Self {
        self.enable_merge_join = enabled;
        self
    }

    /// Set the maximum relation count for exhaustive enumeration
    pub fn with_enumeration_budget(mut self, relations: usize) -> Self {
        self.enumeration_budget = relations;
        self
    }

    /// Set the fallback selectivity for join conditions
    pub fn with_fallback_join_selectivity(mut self, selectivity: f64) -> Self {
        self.fallback_join_selectivity = selectivity.clamp(0.0, 1.0);
        self
    }

    /// Check whether a join algorithm is enabled
    pub fn algorithm_enabled(&self, algorithm: JoinAlgorithm) -> bool {
        match algorithm {
            JoinAlgorithm::NestedLoop => self.enable_nested_loop,
            JoinAlgorithm::Hash => self.enable_hash_join,
            JoinAlgorithm::Merge => self.enable_merge_join,
        }
    }

    /// List the enabled join algorithms in deterministic order
    pub fn enabled_algorithms(&self) -> Vec<JoinAlgorithm> {
        [
            JoinAlgorithm::NestedLoop,
            JoinAlgorithm::Hash,
            JoinAlgorithm::Merge,
        ]
        .into_iter()
        .filter(|a| self.algorithm_enabled(*a))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert!(config.enable_nested_loop);
        assert!(config.enable_hash_join);
        assert!(config.enable_merge_join);
        assert_eq!(config.enumeration_budget, DEFAULT_ENUMERATION_BUDGET);
        assert_eq!(config.operator_mem_budget, DEFAULT_OPERATOR_MEM_BUDGET);
    }

    #[test]
    fn test_builder_methods() {
        let config = PlannerConfig::new()
            .with_mem_budget(1024)
            .with_merge_join(false)
            .with_enumeration_budget(4);

        assert_eq!(config.operator_mem_budget, 1024);
        assert!(!config.enable_merge_join);
        assert_eq!(config.enumeration_budget, 4);
    }

    #[test]
    fn test_enabled_algorithms_respects_toggles() {
        let config = PlannerConfig::new()
            .with_nested_loop(false)
            .with_merge_join(false);

        assert_eq!(config.enabled_algorithms(), vec![JoinAlgorithm::Hash]);
        assert!(!config.algorithm_enabled(JoinAlgorithm::NestedLoop));
        assert!(config.algorithm_enabled(JoinAlgorithm::Hash));
    }

    #[test]
    fn test_fallback_selectivity_clamped() {
        let config = PlannerConfig::new().with_fallback_join_selectivity(3.0);
        assert_eq!(config.fallback_join_selectivity, 1.0);
    }
}
