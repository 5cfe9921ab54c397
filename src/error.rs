//! Planner error types

use thiserror::Error;

/// Errors raised during plan selection
///
/// Statistics misses are deliberately not represented here: a missing
/// statistics entry degrades to a configured fallback estimate and never
/// aborts planning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// Relation has no candidate access path and cannot be read
    #[error("No access path for relation '{relation}'")]
    NoAccessPath { relation: String },

    /// Configuration disables every algorithm a required join could use
    #[error("Infeasible plan: {detail}")]
    Infeasible { detail: String },

    /// Query descriptor names no relations
    #[error("Query references no relations")]
    EmptyQuery,

    /// Predicate references a relation absent from the query descriptor
    #[error("Unknown relation '{name}' referenced by predicate")]
    UnknownRelation { name: String },
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
