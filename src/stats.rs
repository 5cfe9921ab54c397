//! Statistics provider - the planner's read-only estimate oracle
//!
//! The selector queries statistics by relation and column. Every lookup is
//! optional: a missing entry degrades to a configured fallback estimate and
//! never fails planning. Snapshots are immutable once built, so concurrent
//! planning invocations may share one snapshot without locking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::query::{Predicate, Relation};

/// Read-only source of cardinality statistics
///
/// Implementations return `None` for anything they do not know; the selector
/// substitutes configured fallbacks.
pub trait StatisticsProvider {
    /// Estimated row count for a relation
    fn row_count(&self, relation: &str) -> Option<u64>;

    /// Estimated number of distinct values in a column
    fn distinct_count(&self, relation: &str, column: &str) -> Option<u64>;

    /// Estimated fraction of null values in a column
    fn null_fraction(&self, relation: &str, column: &str) -> Option<f64>;

    /// Direct selectivity estimate for a predicate, overriding the derived
    /// formulas; most providers have no answer here
    fn predicate_selectivity(&self, _predicate: &Predicate) -> Option<f64> {
        None
    }
}

/// Statistics for a single column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Estimated number of distinct values
    pub distinct_count: Option<u64>,
    /// Estimated fraction of nulls
    pub null_fraction: Option<f64>,
}

impl ColumnStatistics {
    /// Create empty column statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the distinct value count
    pub fn distinct(mut self, count: u64) -> Self {
        self.distinct_count = Some(count);
        self
    }

    /// Set the null fraction
    pub fn nulls(mut self, fraction: f64) -> Self {
        self.null_fraction = Some(fraction.clamp(0.0, 1.0));
        self
    }
}

/// Statistics for a single table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// Table name
    pub name: String,
    /// Estimated row count
    pub row_count: u64,
    /// Per-column statistics
    pub columns: HashMap<String, ColumnStatistics>,
}

impl TableStatistics {
    /// Create table statistics with a row count
    pub fn new(name: impl Into<String>, row_count: u64) -> Self {
        Self {
            name: name.into(),
            row_count,
            columns: HashMap::new(),
        }
    }

    /// Attach statistics for one column
    pub fn column(mut self, name: impl Into<String>, stats: ColumnStatistics) -> Self {
        self.columns.insert(name.into(), stats);
        self
    }
}

/// In-memory statistics snapshot keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    tables: HashMap<String, TableStatistics>,
}

impl CatalogStatistics {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Register statistics for a table, replacing any previous entry
    pub fn add_table(&mut self, stats: TableStatistics) {
        self.tables.insert(stats.name.clone(), stats);
    }

    /// Look up statistics for a table
    pub fn get_table(&self, name: &str) -> Option<&TableStatistics> {
        self.tables.get(name)
    }
}

impl StatisticsProvider for CatalogStatistics {
    fn row_count(&self, relation: &str) -> Option<u64> {
        self.tables.get(relation).map(|t| t.row_count)
    }

    fn distinct_count(&self, relation: &str, column: &str) -> Option<u64> {
        self.tables
            .get(relation)
            .and_then(|t| t.columns.get(column))
            .and_then(|c| c.distinct_count)
    }

    fn null_fraction(&self, relation: &str, column: &str) -> Option<f64> {
        self.tables
            .get(relation)
            .and_then(|t| t.columns.get(column))
            .and_then(|c| c.null_fraction)
    }
}

/// Resolves row counts and predicate selectivities against a statistics
/// snapshot, degrading to configured fallbacks on any miss
pub struct SelectivityEstimator<'a> {
    stats: &'a dyn StatisticsProvider,
    config: &'a PlannerConfig,
}

impl<'a> SelectivityEstimator<'a> {
    /// Create an estimator over a statistics snapshot
    pub fn new(stats: &'a dyn StatisticsProvider, config: &'a PlannerConfig) -> Self {
        Self { stats, config }
    }

    /// Effective row count for a relation: provider value if present,
    /// otherwise the descriptor's own estimate
    pub fn row_count(&self, relation: &Relation) -> f64 {
        self.stats
            .row_count(&relation.name)
            .unwrap_or(relation.rows) as f64
    }

    /// Estimate the selectivity of a predicate, in [0, 1].
    ///
    /// Precedence: caller-supplied estimate on the predicate, then a direct
    /// provider estimate, then the derived formulas with configured fallbacks.
    pub fn selectivity(&self, predicate: &Predicate) -> f64 {
        let (Predicate::Filter { selectivity, .. } | Predicate::Join { selectivity, .. }) =
            predicate;
        if let Some(s) = selectivity {
            return s.clamp(0.0, 1.0);
        }
        if let Some(s) = self.stats.predicate_selectivity(predicate) {
            return s.clamp(0.0, 1.0);
        }

        match predicate {
            Predicate::Filter {
                relation,
                column,
                op,
                ..
            } => {
                let eq_sel = self.equality_selectivity(relation, column);
                if op.is_equality() {
                    eq_sel
                } else if op.is_range() {
                    self.config.fallback_range_selectivity
                } else {
                    // Not-equal keeps everything equality would drop
                    (1.0 - eq_sel).clamp(0.0, 1.0)
                }
            }

            Predicate::Join {
                left_relation,
                left_column,
                right_relation,
                right_column,
                ..
            } => {
                // Standard equi-join estimate: 1 / max(NDV left, NDV right)
                let ndv_left = self.stats.distinct_count(left_relation, left_column);
                let ndv_right = self.stats.distinct_count(right_relation, right_column);
                match (ndv_left, ndv_right) {
                    (Some(l), Some(r)) => 1.0 / (l.max(r).max(1) as f64),
                    (Some(n), None) | (None, Some(n)) => 1.0 / (n.max(1) as f64),
                    (None, None) => self.config.fallback_join_selectivity,
                }
            }
        }
    }

    /// Equality selectivity: (1 - null fraction) / NDV when statistics are
    /// available, otherwise the configured fallback
    fn equality_selectivity(&self, relation: &str, column: &str) -> f64 {
        let null_frac = self.stats.null_fraction(relation, column).unwrap_or(0.0);
        match self.stats.distinct_count(relation, column) {
            Some(ndv) => ((1.0 - null_frac) / ndv.max(1) as f64).clamp(0.0, 1.0),
            None => self.config.fallback_eq_selectivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CompareOp;

    fn sample_stats() -> CatalogStatistics {
        let mut stats = CatalogStatistics::new();
        stats.add_table(
            TableStatistics::new("users", 1000)
                .column("id", ColumnStatistics::new().distinct(1000))
                .column("city", ColumnStatistics::new().distinct(50).nulls(0.1)),
        );
        stats.add_table(TableStatistics::new("orders", 20000).column(
            "user_id",
            ColumnStatistics::new().distinct(900),
        ));
        stats
    }

    #[test]
    fn test_provider_lookups() {
        let stats = sample_stats();
        assert_eq!(stats.row_count("users"), Some(1000));
        assert_eq!(stats.row_count("missing"), None);
        assert_eq!(stats.distinct_count("users", "id"), Some(1000));
        assert_eq!(stats.null_fraction("users", "city"), Some(0.1));
        assert_eq!(stats.null_fraction("users", "id"), None);
    }

    #[test]
    fn test_row_count_prefers_provider() {
        let stats = sample_stats();
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        // Descriptor says 5; provider knows better
        let known = Relation::new("users", 5).seq_scan();
        assert_eq!(est.row_count(&known), 1000.0);

        let unknown = Relation::new("events", 5).seq_scan();
        assert_eq!(est.row_count(&unknown), 5.0);
    }

    #[test]
    fn test_equality_selectivity_uses_ndv() {
        let stats = sample_stats();
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        let pred = Predicate::filter("users", "city", CompareOp::Eq);
        // (1 - 0.1 nulls) / 50 distinct
        let sel = est.selectivity(&pred);
        assert!((sel - 0.018).abs() < 1e-9);
    }

    #[test]
    fn test_missing_statistics_falls_back() {
        let stats = CatalogStatistics::new();
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        let eq = Predicate::filter("users", "name", CompareOp::Eq);
        assert_eq!(est.selectivity(&eq), config.fallback_eq_selectivity);

        let range = Predicate::filter("users", "age", CompareOp::Gt);
        assert_eq!(est.selectivity(&range), config.fallback_range_selectivity);

        let join = Predicate::join("a", "x", "b", "y");
        assert_eq!(est.selectivity(&join), config.fallback_join_selectivity);
    }

    #[test]
    fn test_join_selectivity_uses_larger_ndv() {
        let stats = sample_stats();
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        let join = Predicate::join("orders", "user_id", "users", "id");
        // 1 / max(900, 1000)
        assert!((est.selectivity(&join) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_selectivity_wins() {
        let stats = sample_stats();
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        let pred = Predicate::filter("users", "city", CompareOp::Eq).with_selectivity(0.5);
        assert_eq!(est.selectivity(&pred), 0.5);
    }

    #[test]
    fn test_provider_predicate_override() {
        struct PinnedSelectivity;
        impl StatisticsProvider for PinnedSelectivity {
            fn row_count(&self, _relation: &str) -> Option<u64> {
                None
            }
            fn distinct_count(&self, _relation: &str, _column: &str) -> Option<u64> {
                None
            }
            fn null_fraction(&self, _relation: &str, _column: &str) -> Option<f64> {
                None
            }
            fn predicate_selectivity(&self, _predicate: &Predicate) -> Option<f64> {
                Some(0.25)
            }
        }

        let stats = PinnedSelectivity;
        let config = PlannerConfig::default();
        let est = SelectivityEstimator::new(&stats, &config);

        let pred = Predicate::filter("users", "age", CompareOp::Gt);
        assert_eq!(est.selectivity(&pred), 0.25);

        // A caller-supplied estimate still wins over the provider
        let explicit = Predicate::filter("users", "age", CompareOp::Gt).with_selectivity(0.5);
        assert_eq!(est.selectivity(&explicit), 0.5);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = sample_stats();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("users"));
        assert!(json.contains("distinct_count"));
    }
}
