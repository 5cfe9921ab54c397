//! Query descriptor - the plan selector's input
//!
//! Describes a logical query: the relations it reads, the candidate access
//! paths declared for each relation, and the predicates filtering or joining
//! them. Produced by an external parsing/rewriting stage; the selector never
//! sees SQL text.

use std::fmt;

/// Default average row width in bytes when the caller supplies none
pub const DEFAULT_ROW_WIDTH: u32 = 64;

/// Comparison operator in a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Check if this is an equality comparison
    pub fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq)
    }

    /// Check if this is a range comparison
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", op)
    }
}

/// Candidate access path declared for a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDef {
    /// Full sequential scan
    SeqScan,
    /// Single-column index; an index scan returns rows sorted on the key
    Index { name: String, key: String },
}

/// A base relation referenced by the query
///
/// Carries the caller's cardinality estimates; the statistics provider may
/// override the row count at planning time.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Table name or alias, unique within one query
    pub name: String,
    /// Estimated row count
    pub rows: u64,
    /// Average row width in bytes
    pub width: u32,
    /// Candidate access paths, in declaration order
    pub paths: Vec<PathDef>,
}

impl Relation {
    /// Create a relation with no access paths declared
    pub fn new(name: impl Into<String>, rows: u64) -> Self {
        Self {
            name: name.into(),
            rows,
            width: DEFAULT_ROW_WIDTH,
            paths: Vec::new(),
        }
    }

    /// Set the average row width in bytes
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Declare a sequential scan path
    pub fn seq_scan(mut self) -> Self {
        self.paths.push(PathDef::SeqScan);
        self
    }

    /// Declare an index on a key column
    pub fn index(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.paths.push(PathDef::Index {
            name: name.into(),
            key: key.into(),
        });
        self
    }
}

/// A boolean condition attached to one or two relations
///
/// Filters reference a single relation and are pushed into its scan; join
/// conditions reference two relations and are attached to the lowest join
/// covering both sides.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Single-relation filter: `relation.column op <constant>`
    Filter {
        relation: String,
        column: String,
        op: CompareOp,
        /// Caller-supplied selectivity estimate; resolved via the statistics
        /// provider (then configured fallbacks) when absent
        selectivity: Option<f64>,
    },

    /// Equi-join condition: `left.left_column = right.right_column`
    Join {
        left_relation: String,
        left_column: String,
        right_relation: String,
        right_column: String,
        /// Caller-supplied selectivity estimate
        selectivity: Option<f64>,
    },
}

impl Predicate {
    /// Create a filter predicate
    pub fn filter(relation: impl Into<String>, column: impl Into<String>, op: CompareOp) -> Self {
        Predicate::Filter {
            relation: relation.into(),
            column: column.into(),
            op,
            selectivity: None,
        }
    }

    /// Create an equi-join condition between two relations
    pub fn join(
        left_relation: impl Into<String>,
        left_column: impl Into<String>,
        right_relation: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Predicate::Join {
            left_relation: left_relation.into(),
            left_column: left_column.into(),
            right_relation: right_relation.into(),
            right_column: right_column.into(),
            selectivity: None,
        }
    }

    /// Attach an explicit selectivity estimate
    pub fn with_selectivity(mut self, estimate: f64) -> Self {
        let clamped = estimate.clamp(0.0, 1.0);
        match &mut self {
            Predicate::Filter { selectivity, .. } => *selectivity = Some(clamped),
            Predicate::Join { selectivity, .. } => *selectivity = Some(clamped),
        }
        self
    }

    /// Check if this is a join condition
    pub fn is_join(&self) -> bool {
        matches!(self, Predicate::Join { .. })
    }

    /// Names of the relations this predicate references
    pub fn relations(&self) -> Vec<&str> {
        match self {
            Predicate::Filter { relation, .. } => vec![relation],
            Predicate::Join {
                left_relation,
                right_relation,
                ..
            } => vec![left_relation, right_relation],
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Filter {
                relation,
                column,
                op,
                ..
            } => write!(f, "{}.{} {} ?", relation, column, op),
            Predicate::Join {
                left_relation,
                left_column,
                right_relation,
                right_column,
                ..
            } => write!(
                f,
                "{}.{} = {}.{}",
                left_relation, left_column, right_relation, right_column
            ),
        }
    }
}

/// Logical query description: relations plus predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    /// Relations read by the query, in declaration order
    pub relations: Vec<Relation>,
    /// Filter and join predicates
    pub predicates: Vec<Predicate>,
}

impl QueryDescriptor {
    /// Create an empty query descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relation
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Add a predicate
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Find the index of a relation by name
    pub fn relation_index(&self, name: &str) -> Option<usize> {
        self.relations.iter().position(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_builder() {
        let rel = Relation::new("users", 1000)
            .width(80)
            .seq_scan()
            .index("users_pkey", "id");

        assert_eq!(rel.name, "users");
        assert_eq!(rel.rows, 1000);
        assert_eq!(rel.width, 80);
        assert_eq!(rel.paths.len(), 2);
        assert_eq!(rel.paths[0], PathDef::SeqScan);
    }

    #[test]
    fn test_predicate_relations() {
        let filter = Predicate::filter("users", "age", CompareOp::Gt);
        assert_eq!(filter.relations(), vec!["users"]);
        assert!(!filter.is_join());

        let join = Predicate::join("orders", "user_id", "users", "id");
        assert_eq!(join.relations(), vec!["orders", "users"]);
        assert!(join.is_join());
    }

    #[test]
    fn test_predicate_selectivity_clamped() {
        let pred = Predicate::filter("users", "age", CompareOp::Gt).with_selectivity(1.5);
        match pred {
            Predicate::Filter { selectivity, .. } => assert_eq!(selectivity, Some(1.0)),
            _ => panic!("Expected Filter"),
        }
    }

    #[test]
    fn test_predicate_display() {
        let join = Predicate::join("orders", "user_id", "users", "id");
        assert_eq!(join.to_string(), "orders.user_id = users.id");

        let filter = Predicate::filter("users", "age", CompareOp::Ge);
        assert_eq!(filter.to_string(), "users.age >= ?");
    }

    #[test]
    fn test_relation_index_lookup() {
        let query = QueryDescriptor::new()
            .relation(Relation::new("users", 100).seq_scan())
            .relation(Relation::new("orders", 200).seq_scan());

        assert_eq!(query.relation_index("orders"), Some(1));
        assert_eq!(query.relation_index("missing"), None);
    }
}
