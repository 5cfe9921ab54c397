//! Plan selection
//!
//! Bottom-up dynamic programming over relation subsets: for every subset
//! (ascending by bitmask) the cheapest plan producing that subset's join is
//! memoized in an arena indexed by the subset mask. Each subset is costed by
//! trying every split into two previously-planned halves and every enabled
//! join algorithm. Cyclic join graphs need no special handling because the
//! enumeration is over relation subsets, not join-graph edges.
//!
//! Single-relation subsets keep every candidate access path, not just the
//! cheapest: an index scan that loses on its own can still win inside a
//! nested-loop probe or as a presorted merge input. Composite subsets keep
//! one best plan.
//!
//! Queries above the enumeration budget skip the DP and fall back to a
//! greedy left-deep join order: degraded plan quality, same correctness.

use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::path::AccessPath;
use crate::plan::PlanNode;
use crate::query::{PathDef, Predicate, QueryDescriptor, Relation};
use crate::stats::{SelectivityEstimator, StatisticsProvider};

/// Hard upper bound on DP enumeration regardless of configuration; the
/// subset arena has `1 << n` entries
const MAX_DP_RELATIONS: usize = 20;

/// A join condition resolved to relation indices within one query
struct JoinEdge {
    left: usize,
    right: usize,
    selectivity: f64,
    predicate: Predicate,
}

impl JoinEdge {
    /// Check whether this edge connects the two disjoint relation sets
    fn connects(&self, left_mask: usize, right_mask: usize) -> bool {
        let l = 1 << self.left;
        let r = 1 << self.right;
        (left_mask & l != 0 && right_mask & r != 0) || (left_mask & r != 0 && right_mask & l != 0)
    }
}

/// Cost-based plan selector
///
/// One selector may plan many queries; each invocation is a pure synchronous
/// computation with its own DP arena, so selectors and statistics snapshots
/// can be shared across threads read-only.
pub struct PlanSelector {
    config: PlannerConfig,
}

impl Default for PlanSelector {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl PlanSelector {
    /// Create a selector with the given configuration
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The selector's configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Select the minimum-estimated-cost plan tree for a query
    pub fn select(
        &self,
        query: &QueryDescriptor,
        stats: &dyn StatisticsProvider,
    ) -> PlannerResult<PlanNode> {
        if query.relations.is_empty() {
            return Err(PlannerError::EmptyQuery);
        }

        let n = query.relations.len();
        let est = SelectivityEstimator::new(stats, &self.config);

        // Resolve predicates: filters grouped per relation, join conditions
        // as index edges, selectivities fixed up-front
        let mut filters: Vec<Vec<(Predicate, f64)>> = vec![Vec::new(); n];
        let mut edges: Vec<JoinEdge> = Vec::new();
        for pred in &query.predicates {
            let sel = est.selectivity(pred);
            match pred {
                Predicate::Filter { relation, .. } => {
                    let i = require_relation(query, relation)?;
                    filters[i].push((pred.clone(), sel));
                }
                Predicate::Join {
                    left_relation,
                    right_relation,
                    ..
                } => {
                    edges.push(JoinEdge {
                        left: require_relation(query, left_relation)?,
                        right: require_relation(query, right_relation)?,
                        selectivity: sel,
                        predicate: pred.clone(),
                    });
                }
            }
        }

        debug!(
            relations = n,
            predicates = query.predicates.len(),
            "selecting plan"
        );

        // Base case: cost every declared access path per relation
        let mut candidates = Vec::with_capacity(n);
        for (i, relation) in query.relations.iter().enumerate() {
            candidates.push(self.scan_candidates(relation, &filters[i], &est)?);
        }

        if n == 1 {
            let cands = candidates.remove(0);
            return reduce_cheapest(cands).ok_or_else(|| PlannerError::NoAccessPath {
                relation: query.relations[0].name.clone(),
            });
        }

        let plan = if n > self.config.enumeration_budget.min(MAX_DP_RELATIONS) {
            debug!(
                relations = n,
                budget = self.config.enumeration_budget,
                "enumeration budget exceeded, falling back to greedy join order"
            );
            let base = candidates
                .into_iter()
                .zip(&query.relations)
                .map(|(cands, relation)| {
                    reduce_cheapest(cands).ok_or_else(|| PlannerError::NoAccessPath {
                        relation: relation.name.clone(),
                    })
                })
                .collect::<PlannerResult<Vec<_>>>()?;
            self.greedy_plan(base, &edges)?
        } else {
            self.dp_plan(candidates, &edges)?
        };

        debug!(cost = plan.cost().total(), rows = plan.rows(), "plan selected");
        Ok(plan)
    }

    /// Cost every declared access path for one relation, with all of its
    /// filters pushed into the scan; candidates stay in declaration order
    fn scan_candidates(
        &self,
        relation: &Relation,
        filters: &[(Predicate, f64)],
        est: &SelectivityEstimator<'_>,
    ) -> PlannerResult<Vec<PlanNode>> {
        let input_rows = est.row_count(relation);
        let output_sel: f64 = filters.iter().map(|(_, s)| s).product();
        let pushed: Vec<Predicate> = filters.iter().map(|(p, _)| p.clone()).collect();

        let mut candidates = Vec::with_capacity(relation.paths.len());
        for path in &relation.paths {
            let (access, key_sel) = match path {
                PathDef::SeqScan => (
                    AccessPath::SeqScan {
                        relation: relation.name.clone(),
                    },
                    1.0,
                ),
                PathDef::Index { name, key } => {
                    // Filters on the key column bound the rows fetched
                    let key_sel: f64 = filters
                        .iter()
                        .filter(|(p, _)| {
                            matches!(p, Predicate::Filter { column, .. } if column == key)
                        })
                        .map(|(_, s)| s)
                        .product();
                    (
                        AccessPath::IndexScan {
                            relation: relation.name.clone(),
                            index: name.clone(),
                            key: key.clone(),
                        },
                        key_sel,
                    )
                }
            };
            candidates.push(PlanNode::scan(
                access,
                pushed.clone(),
                input_rows,
                relation.width as f64,
                key_sel,
                output_sel,
                &self.config,
            ));
        }

        if candidates.is_empty() {
            return Err(PlannerError::NoAccessPath {
                relation: relation.name.clone(),
            });
        }
        Ok(candidates)
    }

    /// Exhaustive subset DP; `candidates[i]` are the costed access paths for
    /// relation `i`
    fn dp_plan(
        &self,
        candidates: Vec<Vec<PlanNode>>,
        edges: &[JoinEdge],
    ) -> PlannerResult<PlanNode> {
        let n = candidates.len();
        let full: usize = (1 << n) - 1;
        debug!(relations = n, subsets = 1usize << n, "enumerating join orders");
        let mut arena: Vec<Vec<PlanNode>> = vec![Vec::new(); 1 << n];
        for (i, cands) in candidates.into_iter().enumerate() {
            arena[1 << i] = cands;
        }

        // Ascending mask order visits every strict subset before its superset
        for mask in 1..=full {
            if mask.count_ones() < 2 {
                continue;
            }
            let mut best = self.best_split(mask, &arena, edges, false);
            if best.is_none() {
                // No connected split: the subset spans a disconnected part of
                // the join graph, so allow cross products
                best = self.best_split(mask, &arena, edges, true);
            }
            arena[mask] = best.into_iter().collect();
        }

        arena[full].pop().ok_or_else(|| PlannerError::Infeasible {
            detail: "every applicable join algorithm is disabled".into(),
        })
    }

    /// Cheapest join over all splits of `mask` into two planned halves.
    /// Splits with no connecting condition are skipped unless `allow_cross`.
    fn best_split(
        &self,
        mask: usize,
        arena: &[Vec<PlanNode>],
        edges: &[JoinEdge],
        allow_cross: bool,
    ) -> Option<PlanNode> {
        let mut best: Option<PlanNode> = None;

        let mut sub = (mask - 1) & mask;
        while sub > 0 {
            let rest = mask ^ sub;
            let connecting: Vec<&JoinEdge> =
                edges.iter().filter(|e| e.connects(sub, rest)).collect();
            if !connecting.is_empty() || allow_cross {
                let selectivity: f64 = connecting.iter().map(|e| e.selectivity).product();
                let conditions: Vec<Predicate> =
                    connecting.iter().map(|e| e.predicate.clone()).collect();
                for left in &arena[sub] {
                    for right in &arena[rest] {
                        for algorithm in self.config.enabled_algorithms() {
                            if algorithm.requires_condition() && conditions.is_empty() {
                                continue;
                            }
                            let candidate = PlanNode::join(
                                algorithm,
                                conditions.clone(),
                                selectivity,
                                left.clone(),
                                right.clone(),
                                &self.config,
                            );
                            best = Some(pick_better(best, candidate));
                        }
                    }
                }
            }
            sub = (sub - 1) & mask;
        }

        best
    }

    /// Greedy left-deep fallback: start from the smallest relation, then
    /// repeatedly join the smallest remaining relation, preferring one
    /// connected to the plan built so far
    fn greedy_plan(&self, base: Vec<PlanNode>, edges: &[JoinEdge]) -> PlannerResult<PlanNode> {
        let mut remaining: Vec<(usize, PlanNode)> = base.into_iter().enumerate().collect();
        remaining.sort_by(|a, b| a.1.rows().total_cmp(&b.1.rows()).then(a.0.cmp(&b.0)));

        let (first, mut current) = remaining.remove(0);
        let mut joined_mask: usize = 1 << first;

        while !remaining.is_empty() {
            let pos = remaining
                .iter()
                .position(|(i, _)| edges.iter().any(|e| e.connects(joined_mask, 1 << *i)))
                .unwrap_or(0);
            let (idx, right) = remaining.remove(pos);

            let connecting: Vec<&JoinEdge> = edges
                .iter()
                .filter(|e| e.connects(joined_mask, 1 << idx))
                .collect();
            let selectivity: f64 = connecting.iter().map(|e| e.selectivity).product();
            let conditions: Vec<Predicate> =
                connecting.iter().map(|e| e.predicate.clone()).collect();

            let mut best: Option<PlanNode> = None;
            for algorithm in self.config.enabled_algorithms() {
                if algorithm.requires_condition() && conditions.is_empty() {
                    continue;
                }
                let candidate = PlanNode::join(
                    algorithm,
                    conditions.clone(),
                    selectivity,
                    current.clone(),
                    right.clone(),
                    &self.config,
                );
                best = Some(pick_better(best, candidate));
            }

            current = best.ok_or_else(|| PlannerError::Infeasible {
                detail: "every applicable join algorithm is disabled".into(),
            })?;
            joined_mask |= 1 << idx;
        }

        Ok(current)
    }
}

/// Fold a candidate list down to its cheapest plan
fn reduce_cheapest(candidates: Vec<PlanNode>) -> Option<PlanNode> {
    candidates
        .into_iter()
        .fold(None, |best, candidate| Some(pick_better(best, candidate)))
}

/// Keep the cheaper plan; on an exact tie the incumbent wins, which makes
/// selection deterministic in enumeration order
fn pick_better(best: Option<PlanNode>, candidate: PlanNode) -> PlanNode {
    match best {
        None => candidate,
        Some(current) => {
            if candidate.cost().is_cheaper_than(current.cost()) {
                candidate
            } else {
                current
            }
        }
    }
}

/// Resolve a relation name to its index in the descriptor
fn require_relation(query: &QueryDescriptor, name: &str) -> PlannerResult<usize> {
    query
        .relation_index(name)
        .ok_or_else(|| PlannerError::UnknownRelation { name: name.into() })
}
