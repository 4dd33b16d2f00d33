//! The three-address variable

use crate::globals::LocalConstId;
use crate::live_range::LiveRangeId;
use crate::registers::Register;
use crate::symbols::{FuncSymbolId, StackRegion, VarSymbolId};
use crate::types::{TypeId, VariableSize};
use serde::{Deserialize, Serialize};

/// Handle to a variable in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The five disjoint variable kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    /// Compiler-generated scalar with a monotonically increasing id
    Temp { id: u32 },
    /// A source-level symbol at one SSA generation
    NonTemp {
        symbol: VarSymbolId,
        ssa_generation: u32,
    },
    /// The address of a named storage location; always quad-word
    MemoryAddress {
        symbol: Option<VarSymbolId>,
        stack_region: Option<StackRegion>,
    },
    /// Reference to a function-scoped constant pool entry; always quad-word
    LocalConstant { constant: LocalConstId },
    /// RIP-relative reference to a function symbol; always quad-word
    FunctionAddress { function: FuncSymbolId },
}

/// A reference to a storage location used by the IR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub kind: VariableKind,
    pub defined_type: TypeId,
    pub size: VariableSize,
    pub live_range: Option<LiveRangeId>,
    pub is_dereferenced: bool,
    /// Set once this variable addresses through the stack pointer
    pub is_stack_pointer: bool,
    /// Filled in by register allocation
    pub register: Option<Register>,
}

impl Variable {
    pub fn new(kind: VariableKind, defined_type: TypeId, size: VariableSize) -> Self {
        Self {
            kind,
            defined_type,
            size,
            live_range: None,
            is_dereferenced: false,
            is_stack_pointer: false,
            register: None,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self.kind, VariableKind::Temp { .. })
    }

    pub fn is_non_temp(&self) -> bool {
        matches!(self.kind, VariableKind::NonTemp { .. })
    }

    pub fn is_memory_address(&self) -> bool {
        matches!(self.kind, VariableKind::MemoryAddress { .. })
    }

    pub fn ssa_generation(&self) -> Option<u32> {
        match self.kind {
            VariableKind::NonTemp { ssa_generation, .. } => Some(ssa_generation),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<VarSymbolId> {
        match self.kind {
            VariableKind::NonTemp { symbol, .. } => Some(symbol),
            VariableKind::MemoryAddress { symbol, .. } => symbol,
            _ => None,
        }
    }

    /// Two variables are equal iff they have the same kind and either the
    /// same temp id, or the same underlying symbol and SSA generation.
    pub fn equals(&self, other: &Variable) -> bool {
        match (&self.kind, &other.kind) {
            (VariableKind::Temp { id: a }, VariableKind::Temp { id: b }) => a == b,
            (
                VariableKind::NonTemp {
                    symbol: a,
                    ssa_generation: ga,
                },
                VariableKind::NonTemp {
                    symbol: b,
                    ssa_generation: gb,
                },
            ) => a == b && ga == gb,
            (
                VariableKind::MemoryAddress {
                    symbol: a,
                    stack_region: ra,
                },
                VariableKind::MemoryAddress {
                    symbol: b,
                    stack_region: rb,
                },
            ) => a == b && ra == rb,
            (
                VariableKind::LocalConstant { constant: a },
                VariableKind::LocalConstant { constant: b },
            ) => a == b,
            (
                VariableKind::FunctionAddress { function: a },
                VariableKind::FunctionAddress { function: b },
            ) => a == b,
            _ => false,
        }
    }

    /// Like [`Variable::equals`] but ignoring the SSA generation, so any two
    /// generations of one symbol compare equal.
    pub fn equals_no_ssa(&self, other: &Variable) -> bool {
        match (&self.kind, &other.kind) {
            (
                VariableKind::NonTemp { symbol: a, .. },
                VariableKind::NonTemp { symbol: b, .. },
            ) => a == b,
            _ => self.equals(other),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
