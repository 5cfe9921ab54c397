//! qopt - cost-based query plan selector
//!
//! Given a logical query description (relations, predicates, candidate
//! access paths) and a read-only statistics snapshot, enumerates candidate
//! physical plans and returns the minimum-estimated-cost plan tree.
//!
//! ## Pipeline
//!
//! ```text
//! QueryDescriptor + StatisticsProvider
//!   → PlanSelector::select() → PlanNode (cheapest tree)
//!   → ExplainOutput::format() → diagnostic display
//! ```
//!
//! ## Example
//!
//! ```
//! use qopt::{CatalogStatistics, PlanSelector, Predicate, QueryDescriptor, Relation};
//!
//! let query = QueryDescriptor::new()
//!     .relation(Relation::new("orders", 10_000).seq_scan())
//!     .relation(Relation::new("users", 1_000).seq_scan().index("users_pkey", "id"))
//!     .predicate(Predicate::join("orders", "user_id", "users", "id"));
//!
//! let stats = CatalogStatistics::new();
//! let plan = PlanSelector::default().select(&query, &stats).unwrap();
//! assert!(plan.cost().total() > 0.0);
//! ```

pub mod config;
pub mod cost;
pub mod error;
pub mod explain;
pub mod path;
pub mod plan;
pub mod query;
pub mod selector;
pub mod stats;

pub use config::PlannerConfig;
pub use cost::Cost;
pub use error::{PlannerError, PlannerResult};
pub use explain::ExplainOutput;
pub use path::AccessPath;
pub use plan::{JoinAlgorithm, PlanNode};
pub use query::{CompareOp, PathDef, Predicate, QueryDescriptor, Relation};
pub use selector::PlanSelector;
pub use stats::{
    CatalogStatistics, ColumnStatistics, SelectivityEstimator, StatisticsProvider, TableStatistics,
};
