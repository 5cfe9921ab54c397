//! Access paths - physical strategies for reading one relation
//!
//! Each variant computes its own cost: sequential scans pay for every row at
//! sequential I/O rates; index scans pay only for estimated matching rows but
//! at a random-access penalty per row.

use crate::config::PlannerConfig;
use crate::cost::Cost;

/// A concrete strategy for reading one relation's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPath {
    /// Sequential scan of every row
    SeqScan { relation: String },

    /// Scan via a single-column index; output is sorted on the key column
    IndexScan {
        relation: String,
        index: String,
        key: String,
    },
}

impl AccessPath {
    /// The relation this path reads
    pub fn relation(&self) -> &str {
        match self {
            AccessPath::SeqScan { relation } => relation,
            AccessPath::IndexScan { relation, .. } => relation,
        }
    }

    /// Sort key the path's output is ordered on, if any
    pub fn sort_key(&self) -> Option<&str> {
        match self {
            AccessPath::SeqScan { .. } => None,
            AccessPath::IndexScan { key, .. } => Some(key),
        }
    }

    /// Estimate the cost of reading through this path.
    ///
    /// `key_selectivity` is the combined selectivity of filters on the index
    /// key column (1.0 for a sequential scan or an unfiltered index scan);
    /// `output_selectivity` is the combined selectivity of all filters pushed
    /// into the scan.
    pub fn cost(
        &self,
        input_rows: f64,
        key_selectivity: f64,
        output_selectivity: f64,
        config: &PlannerConfig,
    ) -> Cost {
        let output_rows = input_rows * output_selectivity;
        match self {
            AccessPath::SeqScan { .. } => Cost {
                rows: output_rows,
                cpu: input_rows * config.seq_row_cost,
                io: input_rows / config.rows_per_page,
            },

            AccessPath::IndexScan { .. } => {
                // Only rows matching the key filter are fetched, but each
                // fetch is a random access
                let matching = input_rows * key_selectivity;
                Cost {
                    rows: output_rows,
                    cpu: matching * config.seq_row_cost,
                    io: matching * config.random_access_cost / config.rows_per_page,
                }
            }
        }
    }
}
