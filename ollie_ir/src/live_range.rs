//! Live ranges: the handle register allocation attaches to variables
//!
//! The IR defines the structure and the variable link; construction,
//! coalescing, and coloring belong to the external allocator.

use crate::registers::Register;
use crate::symbols::StackRegion;
use crate::variable::VarId;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// Handle to a live range in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiveRangeId(pub u32);

impl LiveRangeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A group of variables that must share one register
#[derive(Debug, Clone)]
pub struct LiveRange {
    pub id: u32,
    /// Variables belonging to this range
    pub variables: Vec<VarId>,
    /// Interference neighbors
    pub neighbors: HashSet<LiveRangeId>,
    /// Spill slot, once the allocator decides to spill
    pub stack_region: Option<StackRegion>,
    pub spill_cost: f64,
    pub use_count: u32,
    pub assignment_count: u32,
    pub degree: u32,
    /// Position in the interference graph, once built
    pub graph_index: Option<u32>,
    /// Class-relative parameter index for precolored parameter ranges
    pub parameter_class_index: Option<u8>,
    pub precolored: bool,
    pub spilled: bool,
    /// The chosen register
    pub register: Option<Register>,
}

impl LiveRange {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            variables: Vec::new(),
            neighbors: HashSet::new(),
            stack_region: None,
            spill_cost: 0.0,
            use_count: 0,
            assignment_count: 0,
            degree: 0,
            graph_index: None,
            parameter_class_index: None,
            precolored: false,
            spilled: false,
            register: None,
        }
    }

    pub fn add_neighbor(&mut self, other: LiveRangeId) -> bool {
        let added = self.neighbors.insert(other);
        if added {
            self.degree += 1;
        }
        added
    }

    pub fn interferes_with(&self, other: LiveRangeId) -> bool {
        self.neighbors.contains(&other)
    }
}
