//! Cost model for plan comparison
//!
//! Every plan node carries a `Cost`: estimated output rows plus CPU and I/O
//! work in abstract units. Plans are compared by weighted total cost.

/// Weight of one I/O unit relative to one CPU unit
const IO_WEIGHT: f64 = 10.0;

/// Cost estimate for a plan node, cumulative over its subtree
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cost {
    /// Estimated number of rows produced
    pub rows: f64,
    /// CPU cost (arbitrary units)
    pub cpu: f64,
    /// I/O cost (arbitrary units)
    pub io: f64,
}

impl Cost {
    /// Create a cost estimate
    pub fn new(rows: f64, cpu: f64, io: f64) -> Self {
        Self { rows, cpu, io }
    }

    /// Create a zero cost
    pub fn zero() -> Self {
        Self::default()
    }

    /// Calculate total cost (I/O weighted higher than CPU)
    pub fn total(&self) -> f64 {
        self.cpu + self.io * IO_WEIGHT
    }

    /// Compare two costs for plan selection: lower total wins, exact ties
    /// fall to lower output cardinality
    pub fn is_cheaper_than(&self, other: &Cost) -> bool {
        match self.total().total_cmp(&other.total()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.rows < other.rows,
        }
    }
}
