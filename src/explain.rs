//! EXPLAIN output formatting
//!
//! Formats a selected plan tree for display: one line per node with the
//! operator kind, relation/index names, and estimated rows and cost.

use std::fmt::Write;

use crate::path::AccessPath;
use crate::plan::PlanNode;

/// Format a plan tree for EXPLAIN output
pub struct ExplainOutput;

impl ExplainOutput {
    /// Format a plan tree as a string
    pub fn format(plan: &PlanNode) -> String {
        let mut output = String::new();
        Self::format_node(plan, 0, &mut output);
        output
    }

    fn format_node(plan: &PlanNode, indent: usize, out: &mut String) {
        let prefix = "  ".repeat(indent);

        match plan {
            PlanNode::Scan {
                path,
                filters,
                cost,
                ..
            } => {
                match path {
                    AccessPath::SeqScan { relation } => {
                        writeln!(
                            out,
                            "{}SeqScan: {} rows={:.0} cost={:.2}",
                            prefix,
                            relation,
                            cost.rows,
                            cost.total()
                        )
                        .unwrap();
                    }
                    AccessPath::IndexScan {
                        relation, index, ..
                    } => {
                        writeln!(
                            out,
                            "{}IndexScan: {} via {} rows={:.0} cost={:.2}",
                            prefix,
                            relation,
                            index,
                            cost.rows,
                            cost.total()
                        )
                        .unwrap();
                    }
                }
                for filter in filters {
                    writeln!(out, "{}  filter: {}", prefix, filter).unwrap();
                }
            }

            PlanNode::Join {
                algorithm,
                conditions,
                left,
                right,
                cost,
                ..
            } => {
                writeln!(
                    out,
                    "{}{}: rows={:.0} cost={:.2}",
                    prefix,
                    algorithm.name(),
                    cost.rows,
                    cost.total()
                )
                .unwrap();
                for condition in conditions {
                    writeln!(out, "{}  cond: {}", prefix, condition).unwrap();
                }
                writeln!(out, "{}  left:", prefix).unwrap();
                Self::format_node(left, indent + 2, out);
                writeln!(out, "{}  right:", prefix).unwrap();
                Self::format_node(right, indent + 2, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::query::{CompareOp, Predicate, QueryDescriptor, Relation};
    use crate::selector::PlanSelector;
    use crate::stats::CatalogStatistics;

    #[test]
    fn test_explain_single_scan() {
        let selector = PlanSelector::default();
        let stats = CatalogStatistics::new();
        let query = QueryDescriptor::new()
            .relation(Relation::new("users", 1000).seq_scan())
            .predicate(Predicate::filter("users", "age", CompareOp::Gt));

        let plan = selector.select(&query, &stats).unwrap();
        let explain = ExplainOutput::format(&plan);

        assert!(explain.contains("SeqScan: users"));
        assert!(explain.contains("filter: users.age > ?"));
        assert!(explain.contains("rows="));
        assert!(explain.contains("cost="));
    }

    #[test]
    fn test_explain_join_tree() {
        let selector = PlanSelector::new(PlannerConfig::default());
        let stats = CatalogStatistics::new();
        let query = QueryDescriptor::new()
            .relation(Relation::new("orders", 10_000).seq_scan())
            .relation(Relation::new("users", 1_000).seq_scan())
            .predicate(Predicate::join("orders", "user_id", "users", "id"));

        let plan = selector.select(&query, &stats).unwrap();
        let explain = ExplainOutput::format(&plan);

        assert!(explain.contains("Join"));
        assert!(explain.contains("cond: orders.user_id = users.id"));
        assert!(explain.contains("left:"));
        assert!(explain.contains("right:"));
    }
}
