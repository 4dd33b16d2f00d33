//! The abstract three-address statement model
//!
//! One variant per statement class, with per-variant payload. Classification
//! predicates collapse to pattern matches.

use crate::constant::ConstId;
use crate::module::{BlockId, JumpTableId};
use crate::operators::{ConditionCode, Operator};
use crate::symbols::FuncSymbolId;
use crate::variable::VarId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Handle to a statement in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StmtId(pub u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a memory access on the move family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryAccessType {
    #[default]
    None,
    Read,
    Write,
}

/// Abstract LEA forms, progressively lowered into concrete x86-64
/// addressing modes during selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaForm {
    /// `k(r)`
    OffsetOnly { offset: ConstId, base: VarId },
    /// `(r1, r2)`
    RegistersOnly { base: VarId, index: VarId },
    /// `(r1, r2, s)` with s ∈ {1, 2, 4, 8}
    RegistersAndScale { base: VarId, index: VarId, scale: u8 },
    /// `k(r1, r2)`
    RegistersAndOffset {
        offset: ConstId,
        base: VarId,
        index: VarId,
    },
    /// `k(r1, r2, s)`
    RegistersOffsetAndScale {
        offset: ConstId,
        base: VarId,
        index: VarId,
        scale: u8,
    },
    /// `lc(%rip)` or `f(%rip)`
    RipRelative { target: VarId },
    /// `k + lc(%rip)`
    RipRelativeWithOffset { offset: ConstId, target: VarId },
    /// `(, r, s)`
    IndexAndScale { index: VarId, scale: u8 },
    /// `k(, r, s)`
    IndexOffsetAndScale {
        offset: ConstId,
        index: VarId,
        scale: u8,
    },
}

/// Parameter vector for calls and ϕ functions
pub type ParameterList = SmallVec<[VarId; 6]>;

/// A three-address statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `assignee <- op1 <operator> op2`
    BinaryOp {
        assignee: VarId,
        op1: VarId,
        op: Operator,
        op2: VarId,
    },
    /// `assignee <- op1 <operator> constant`
    BinaryOpConst {
        assignee: VarId,
        op1: VarId,
        op: Operator,
        op2: ConstId,
    },
    /// `assignee <- op1`
    Assign { assignee: VarId, op1: VarId },
    /// `assignee <- constant`
    AssignConst { assignee: VarId, constant: ConstId },
    Ret { value: Option<VarId> },
    Jump { target: BlockId },
    /// Conditional branch; the condition code was chosen by branch selection
    Branch {
        if_target: BlockId,
        else_target: BlockId,
        relies_on: VarId,
        branch: ConditionCode,
    },
    Call {
        assignee: Option<VarId>,
        function: FuncSymbolId,
        parameters: ParameterList,
    },
    IndirectCall {
        assignee: Option<VarId>,
        callee: VarId,
        parameters: ParameterList,
    },
    /// `load assignee <- [address]`
    Load { assignee: VarId, address: VarId },
    /// `store [address] <- source`
    Store { address: VarId, source: VarId },
    /// `load assignee <- [address + offset]`
    LoadOff {
        assignee: VarId,
        address: VarId,
        offset: ConstId,
    },
    /// `store [address + offset] <- source`
    StoreOff {
        address: VarId,
        offset: ConstId,
        source: VarId,
    },
    /// Address computation in one of the abstract LEA forms
    Lea { assignee: VarId, form: LeaForm },
    Phi {
        assignee: VarId,
        parameters: ParameterList,
    },
    Neg { assignee: VarId, op1: VarId },
    Not { assignee: VarId, op1: VarId },
    LogicalNot { assignee: VarId, op1: VarId },
    Inc { target: VarId },
    Dec { target: VarId },
    AsmInline { assembly: String },
    /// No operation
    Idle,
    /// Set flags from `target & target`
    TestIfNotZero { target: VarId },
    /// Raw memory touch through a computed address
    MemAccess {
        assignee: VarId,
        address: VarId,
        access: MemoryAccessType,
    },
    /// Compute a jump-table target address: `assignee <- .JT<n>(, index, m)`
    IndirJumpAddrCalc {
        assignee: VarId,
        jump_table: JumpTableId,
        index: VarId,
        multiplier: u8,
    },
    /// `jmp *address`
    IndirectJump { address: VarId },
    /// Zero a variable
    Clear { target: VarId },
    StackAlloc { bytes: u32 },
    StackDealloc { bytes: u32 },
    /// Materialize the not-equal flag into a byte
    SetNe { assignee: VarId },
}

impl Statement {
    /// Statement class is a load (any of the offset forms, or a reading
    /// memory touch)
    pub fn is_load_operation(&self) -> bool {
        matches!(
            self,
            Statement::Load { .. }
                | Statement::LoadOff { .. }
                | Statement::MemAccess {
                    access: MemoryAccessType::Read,
                    ..
                }
        )
    }

    /// Statement class is a store (any of the offset forms, or a writing
    /// memory touch)
    pub fn is_store_operation(&self) -> bool {
        matches!(
            self,
            Statement::Store { .. }
                | Statement::StoreOff { .. }
                | Statement::MemAccess {
                    access: MemoryAccessType::Write,
                    ..
                }
        )
    }

    pub fn is_binary_op(&self) -> bool {
        matches!(
            self,
            Statement::BinaryOp { .. } | Statement::BinaryOpConst { .. }
        )
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Statement::Assign { .. } | Statement::AssignConst { .. }
        )
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Statement::Branch { .. })
    }

    pub fn is_block_terminator(&self) -> bool {
        matches!(
            self,
            Statement::Ret { .. }
                | Statement::Jump { .. }
                | Statement::Branch { .. }
                | Statement::IndirectJump { .. }
        )
    }

    /// The variable this statement defines, if any
    pub fn assignee(&self) -> Option<VarId> {
        match self {
            Statement::BinaryOp { assignee, .. }
            | Statement::BinaryOpConst { assignee, .. }
            | Statement::Assign { assignee, .. }
            | Statement::AssignConst { assignee, .. }
            | Statement::Load { assignee, .. }
            | Statement::LoadOff { assignee, .. }
            | Statement::Lea { assignee, .. }
            | Statement::Phi { assignee, .. }
            | Statement::Neg { assignee, .. }
            | Statement::Not { assignee, .. }
            | Statement::LogicalNot { assignee, .. }
            | Statement::IndirJumpAddrCalc { assignee, .. }
            | Statement::SetNe { assignee } => Some(*assignee),
            Statement::MemAccess {
                assignee, access, ..
            } => match access {
                MemoryAccessType::Write => None,
                _ => Some(*assignee),
            },
            Statement::Call { assignee, .. } | Statement::IndirectCall { assignee, .. } => {
                *assignee
            }
            Statement::Inc { target } | Statement::Dec { target } | Statement::Clear { target } => {
                Some(*target)
            }
            _ => None,
        }
    }

    /// Short class name used by diagnostics
    pub fn class_name(&self) -> &'static str {
        match self {
            Statement::BinaryOp { .. } => "binary op",
            Statement::BinaryOpConst { .. } => "binary op const",
            Statement::Assign { .. } => "assign",
            Statement::AssignConst { .. } => "assign const",
            Statement::Ret { .. } => "ret",
            Statement::Jump { .. } => "jump",
            Statement::Branch { .. } => "branch",
            Statement::Call { .. } => "call",
            Statement::IndirectCall { .. } => "indirect call",
            Statement::Load { .. } => "load",
            Statement::Store { .. } => "store",
            Statement::LoadOff { .. } => "load offset",
            Statement::StoreOff { .. } => "store offset",
            Statement::Lea { .. } => "lea",
            Statement::Phi { .. } => "phi",
            Statement::Neg { .. } => "neg",
            Statement::Not { .. } => "not",
            Statement::LogicalNot { .. } => "logical not",
            Statement::Inc { .. } => "inc",
            Statement::Dec { .. } => "dec",
            Statement::AsmInline { .. } => "asm inline",
            Statement::Idle => "idle",
            Statement::TestIfNotZero { .. } => "test if not zero",
            Statement::MemAccess { .. } => "memory access",
            Statement::IndirJumpAddrCalc { .. } => "indirect jump address calc",
            Statement::IndirectJump { .. } => "indirect jump",
            Statement::Clear { .. } => "clear",
            Statement::StackAlloc { .. } => "stack alloc",
            Statement::StackDealloc { .. } => "stack dealloc",
            Statement::SetNe { .. } => "set ne",
        }
    }
}
