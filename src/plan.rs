//! Plan trees
//!
//! A plan tree's leaves are access paths and its internal nodes are joins.
//! Every node carries its estimated cost and cardinality, and every predicate
//! is attached to exactly one node: filters inside the scan that reads their
//! relation, join conditions on the lowest join covering both sides. Trees
//! are immutable once built.

use crate::config::PlannerConfig;
use crate::cost::Cost;
use crate::path::AccessPath;
use crate::query::Predicate;

/// Join algorithm for an internal plan node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAlgorithm {
    /// For each outer row, look up or rescan the inner side
    NestedLoop,
    /// Build a hash table on the right side, probe with the left
    Hash,
    /// Merge two inputs sorted on the join key
    Merge,
}

impl JoinAlgorithm {
    /// Operator name for display
    pub fn name(&self) -> &'static str {
        match self {
            JoinAlgorithm::NestedLoop => "NestedLoopJoin",
            JoinAlgorithm::Hash => "HashJoin",
            JoinAlgorithm::Merge => "MergeJoin",
        }
    }

    /// Whether this algorithm needs at least one equi-join condition
    /// (nested loop can evaluate a cross product)
    pub fn requires_condition(&self) -> bool {
        !matches!(self, JoinAlgorithm::NestedLoop)
    }
}

/// Physical plan node
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Leaf: read one relation through a chosen access path
    Scan {
        path: AccessPath,
        /// Filter predicates pushed into this scan
        filters: Vec<Predicate>,
        /// Average output row width in bytes
        width: f64,
        cost: Cost,
    },

    /// Internal: join two child plans
    Join {
        algorithm: JoinAlgorithm,
        /// Join conditions attached at this node (empty for a cross product)
        conditions: Vec<Predicate>,
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        width: f64,
        cost: Cost,
    },
}

impl PlanNode {
    /// Build a scan leaf from a chosen access path.
    ///
    /// `key_selectivity` covers filters on the path's index key column,
    /// `output_selectivity` covers all filters pushed into the scan.
    pub fn scan(
        path: AccessPath,
        filters: Vec<Predicate>,
        input_rows: f64,
        width: f64,
        key_selectivity: f64,
        output_selectivity: f64,
        config: &PlannerConfig,
    ) -> PlanNode {
        let cost = path.cost(input_rows, key_selectivity, output_selectivity, config);
        PlanNode::Scan {
            path,
            filters,
            width,
            cost,
        }
    }

    /// Build a join node over two child plans.
    ///
    /// `selectivity` is the combined selectivity of `conditions` (1.0 for a
    /// cross product). The caller guarantees the algorithm is applicable:
    /// hash and merge need at least one condition.
    pub fn join(
        algorithm: JoinAlgorithm,
        conditions: Vec<Predicate>,
        selectivity: f64,
        left: PlanNode,
        right: PlanNode,
        config: &PlannerConfig,
    ) -> PlanNode {
        debug_assert!(!algorithm.requires_condition() || !conditions.is_empty());

        let out_rows = left.rows() * right.rows() * selectivity;
        let width = left.width() + right.width();
        let lc = *left.cost();
        let rc = *right.cost();

        let cost = match algorithm {
            JoinAlgorithm::NestedLoop => {
                if let Some(per_probe) = Self::index_probe_rows(&right, &conditions, selectivity) {
                    // Inner side is an index scan on the join key: each outer
                    // row does one lookup instead of a rescan
                    Cost {
                        rows: out_rows,
                        cpu: lc.cpu + lc.rows * (1.0 + per_probe * config.seq_row_cost),
                        io: lc.io
                            + lc.rows * per_probe * config.random_access_cost
                                / config.rows_per_page,
                    }
                } else {
                    // Rescan the inner side for every outer row
                    Cost {
                        rows: out_rows,
                        cpu: lc.cpu + lc.rows * rc.cpu,
                        io: lc.io + lc.rows * rc.io,
                    }
                }
            }

            JoinAlgorithm::Hash => {
                let build_bytes = rc.rows * right.width();
                let mut op_cpu =
                    rc.rows * config.hash_build_cost + lc.rows * config.hash_probe_cost;
                let mut op_io = 0.0;
                if build_bytes > config.operator_mem_budget as f64 {
                    // Build side spills: partitions written out and re-read
                    op_cpu *= config.spill_penalty;
                    op_io += 2.0 * rc.rows / config.rows_per_page;
                }
                Cost {
                    rows: out_rows,
                    cpu: lc.cpu + rc.cpu + op_cpu,
                    io: lc.io + rc.io + op_io,
                }
            }

            JoinAlgorithm::Merge => {
                let (left_key, right_key) = conditions
                    .first()
                    .and_then(|c| Self::condition_keys(c, &left))
                    .map(|(l, r)| (Some(l), Some(r)))
                    .unwrap_or((None, None));
                let (sort_l_cpu, sort_l_io) = Self::sort_cost(&left, left_key, config);
                let (sort_r_cpu, sort_r_io) = Self::sort_cost(&right, right_key, config);
                let merge_cpu = (lc.rows + rc.rows) * config.seq_row_cost;
                Cost {
                    rows: out_rows,
                    cpu: lc.cpu + rc.cpu + sort_l_cpu + sort_r_cpu + merge_cpu,
                    io: lc.io + rc.io + sort_l_io + sort_r_io,
                }
            }
        };

        PlanNode::Join {
            algorithm,
            conditions,
            left: Box::new(left),
            right: Box::new(right),
            width,
            cost,
        }
    }

    /// Cost of this node's subtree
    pub fn cost(&self) -> &Cost {
        match self {
            PlanNode::Scan { cost, .. } => cost,
            PlanNode::Join { cost, .. } => cost,
        }
    }

    /// Estimated output rows
    pub fn rows(&self) -> f64 {
        self.cost().rows
    }

    /// Average output row width in bytes
    pub fn width(&self) -> f64 {
        match self {
            PlanNode::Scan { width, .. } => *width,
            PlanNode::Join { width, .. } => *width,
        }
    }

    /// Check whether this subtree reads the named relation
    pub fn covers(&self, relation: &str) -> bool {
        match self {
            PlanNode::Scan { path, .. } => path.relation() == relation,
            PlanNode::Join { left, right, .. } => left.covers(relation) || right.covers(relation),
        }
    }

    /// Number of scan leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            PlanNode::Scan { .. } => 1,
            PlanNode::Join { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// (relation, column) the node's output is sorted on, if any
    pub fn sorted_on(&self) -> Option<(&str, &str)> {
        match self {
            PlanNode::Scan { path, .. } => path.sort_key().map(|k| (path.relation(), k)),
            PlanNode::Join {
                algorithm,
                conditions,
                left,
                ..
            } => match algorithm {
                // Outer order is preserved
                JoinAlgorithm::NestedLoop => left.sorted_on(),
                JoinAlgorithm::Hash => None,
                JoinAlgorithm::Merge => conditions
                    .first()
                    .and_then(|c| Self::condition_keys(c, left))
                    .map(|(l, _)| l),
            },
        }
    }

    /// Collect every join algorithm used in this subtree
    pub fn join_algorithms(&self) -> Vec<JoinAlgorithm> {
        match self {
            PlanNode::Scan { .. } => vec![],
            PlanNode::Join {
                algorithm,
                left,
                right,
                ..
            } => {
                let mut algos = left.join_algorithms();
                algos.extend(right.join_algorithms());
                algos.push(*algorithm);
                algos
            }
        }
    }

    /// Resolve a join condition's key columns into (left child side, right
    /// child side) order, given which relations the left child covers
    fn condition_keys<'a>(
        condition: &'a Predicate,
        left: &PlanNode,
    ) -> Option<((&'a str, &'a str), (&'a str, &'a str))> {
        if let Predicate::Join {
            left_relation,
            left_column,
            right_relation,
            right_column,
            ..
        } = condition
        {
            if left.covers(left_relation) {
                Some((
                    (left_relation, left_column),
                    (right_relation, right_column),
                ))
            } else {
                Some((
                    (right_relation, right_column),
                    (left_relation, left_column),
                ))
            }
        } else {
            None
        }
    }

    /// Matching inner rows per outer probe when the inner side is an index
    /// scan leaf on one of the join keys; `None` means rescans are required
    fn index_probe_rows(
        inner: &PlanNode,
        conditions: &[Predicate],
        selectivity: f64,
    ) -> Option<f64> {
        let PlanNode::Scan {
            path: AccessPath::IndexScan { relation, key, .. },
            ..
        } = inner
        else {
            return None;
        };
        // Resolving against the inner node puts the inner side's key first
        let probes_on_key = conditions.iter().any(|c| {
            Self::condition_keys(c, inner)
                .map(|(inner_key, _)| inner_key == (relation.as_str(), key.as_str()))
                .unwrap_or(false)
        });
        if probes_on_key {
            Some(inner.rows() * selectivity)
        } else {
            None
        }
    }

    /// Cost of sorting one merge input, zero when already sorted on its key
    fn sort_cost(
        input: &PlanNode,
        key: Option<(&str, &str)>,
        config: &PlannerConfig,
    ) -> (f64, f64) {
        if let (Some(sorted), Some(wanted)) = (input.sorted_on(), key) {
            if sorted == wanted {
                return (0.0, 0.0);
            }
        }
        let n = input.rows();
        let mut cpu = n * n.log2().max(1.0) * config.sort_row_cost;
        let mut io = 0.0;
        if n * input.width() > config.operator_mem_budget as f64 {
            cpu *= config.spill_penalty;
            io += 2.0 * n / config.rows_per_page;
        }
        (cpu, io)
    }
}
