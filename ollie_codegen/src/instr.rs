//! The concrete instruction model
//!
//! Variants group opcodes by operand shape; every variant still carries its
//! concrete [`Opcode`] so printing and the opcode-family predicates work
//! uniformly. Operands stay variable-based until the printer resolves them
//! through live ranges in register mode.

use crate::address::AddressMode;
use crate::opcode::Opcode;
use ollie_ir::{BlockId, ConstId, FuncSymbolId, MemoryAccessType, Register, VarId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An instruction operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A three-address variable; resolved to a register or stack slot later
    Variable(VarId),
    /// A literal immediate
    Immediate(ConstId),
    /// A fixed physical register (implicit operands, fixed-register lowering)
    Register(Register),
    /// A memory access through a concrete addressing mode
    Memory(AddressMode),
}

impl Operand {
    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory(_))
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Operand::Immediate(_))
    }

    pub fn is_register_like(&self) -> bool {
        matches!(self, Operand::Variable(_) | Operand::Register(_))
    }
}

/// Parameter vector carried on call instructions for liveness
pub type CallParameters = SmallVec<[VarId; 6]>;

/// A selected x86-64 instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// The move family. With `access = Write` the destination variable is
    /// not assigned; with `Read` or `None` it is.
    Move {
        opcode: Opcode,
        source: Operand,
        destination: Operand,
        access: MemoryAccessType,
    },
    /// Two-operand ALU: the destination is both read and written
    Alu {
        opcode: Opcode,
        source: Operand,
        destination: Operand,
    },
    /// Shift or rotate; the count is an immediate or the CL register
    Shift {
        opcode: Opcode,
        count: Operand,
        destination: Operand,
    },
    /// Single-operand read-modify-write: NEG, NOT, INC, DEC
    Unary { opcode: Opcode, destination: Operand },
    /// Address computation
    Lea {
        opcode: Opcode,
        mode: AddressMode,
        destination: VarId,
    },
    /// Divide, reading the implicit hi:lo dividend pair and writing the
    /// implicit quotient/remainder pair
    Division {
        opcode: Opcode,
        divisor: Operand,
        /// Hi half of the dividend (RDX family)
        high_source: Register,
        /// Lo half of the dividend (RAX family)
        low_source: Register,
        quotient: Register,
        remainder: Register,
    },
    /// Wide unsigned multiply, reading the implicit source and writing the
    /// implicit hi:lo destination pair
    WideMultiplication {
        opcode: Opcode,
        source: Operand,
        implicit_source: Register,
        destination_high: Register,
        destination_low: Register,
    },
    /// CBTW/CWTL/CLTD/CQTO, fully implicit
    Extension { opcode: Opcode },
    /// Flag-setting compare; `destination - source` in AT&T order
    Compare {
        opcode: Opcode,
        source: Operand,
        destination: Operand,
    },
    Test {
        opcode: Opcode,
        source: Operand,
        destination: Operand,
    },
    ConditionalMove {
        opcode: Opcode,
        source: Operand,
        destination: VarId,
    },
    ConditionalSet { opcode: Opcode, destination: VarId },
    /// Unconditional jump to a block label
    Jump { target: BlockId },
    /// Conditional jump to a block label
    ConditionalJump { opcode: Opcode, target: BlockId },
    IndirectJump { target: Operand },
    /// Push of a variable through its live range
    Push { source: VarId },
    Pop { destination: VarId },
    /// Push of a physical register, bypassing the live-range machinery;
    /// only valid after register assignment
    PushDirect { opcode: Opcode, register: Register },
    PopDirect { opcode: Opcode, register: Register },
    CallDirect {
        function: FuncSymbolId,
        parameters: CallParameters,
        returns: Option<VarId>,
    },
    CallIndirect {
        callee: Operand,
        parameters: CallParameters,
        returns: Option<VarId>,
    },
    Return { value: Option<VarId> },
    InlineAssembly { assembly: String },
    Nop,
}

impl Instruction {
    /// The concrete opcode, when the variant carries one
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Instruction::Move { opcode, .. }
            | Instruction::Alu { opcode, .. }
            | Instruction::Shift { opcode, .. }
            | Instruction::Unary { opcode, .. }
            | Instruction::Lea { opcode, .. }
            | Instruction::Division { opcode, .. }
            | Instruction::WideMultiplication { opcode, .. }
            | Instruction::Extension { opcode }
            | Instruction::Compare { opcode, .. }
            | Instruction::Test { opcode, .. }
            | Instruction::ConditionalMove { opcode, .. }
            | Instruction::ConditionalSet { opcode, .. }
            | Instruction::ConditionalJump { opcode, .. }
            | Instruction::PushDirect { opcode, .. }
            | Instruction::PopDirect { opcode, .. } => Some(*opcode),
            Instruction::Jump { .. } => Some(Opcode::Jmp),
            Instruction::IndirectJump { .. } => Some(Opcode::Jmp),
            Instruction::Push { .. } => Some(Opcode::Pushq),
            Instruction::Pop { .. } => Some(Opcode::Popq),
            Instruction::CallDirect { .. } => Some(Opcode::Call),
            Instruction::CallIndirect { .. } => Some(Opcode::IndirectCall),
            Instruction::Return { .. } => Some(Opcode::Ret),
            Instruction::Nop => Some(Opcode::Nop),
            Instruction::InlineAssembly { .. } => None,
        }
    }

    /// A move that reads memory into a register
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Instruction::Move {
                opcode,
                access: MemoryAccessType::Read,
                ..
            } if opcode.is_move_family()
        )
    }

    /// A move that writes a register out to memory
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Instruction::Move {
                opcode,
                access: MemoryAccessType::Write,
                ..
            } if opcode.is_move_family()
        )
    }

    /// Whether a move-family instruction assigns its destination variable:
    /// everything except the write direction does.
    pub fn is_move_destination_assigned(&self) -> bool {
        matches!(
            self,
            Instruction::Move {
                opcode,
                access: MemoryAccessType::None | MemoryAccessType::Read,
                ..
            } if opcode.is_move_family()
        )
    }

    /// The ALU read-modify-write family
    pub fn is_destination_also_operand(&self) -> bool {
        match self {
            Instruction::Alu { opcode, .. } | Instruction::Shift { opcode, .. } => {
                opcode.is_destination_also_operand()
            }
            _ => false,
        }
    }

    pub fn is_unsigned_multiplication(&self) -> bool {
        matches!(
            self,
            Instruction::WideMultiplication { opcode, .. }
            if opcode.is_unsigned_multiplication()
        )
    }

    /// A same-width register-to-register copy with no memory involvement
    pub fn is_pure_copy(&self) -> bool {
        matches!(
            self,
            Instruction::Move {
                opcode,
                source,
                access: MemoryAccessType::None,
                ..
            } if opcode.is_plain_move() && source.is_register_like()
        )
    }

    /// An immediate loaded straight into a register
    pub fn is_constant_assignment(&self) -> bool {
        matches!(
            self,
            Instruction::Move {
                opcode,
                source: Operand::Immediate(_),
                access: MemoryAccessType::None,
                ..
            } if matches!(
                opcode,
                Opcode::Movb | Opcode::Movw | Opcode::Movl | Opcode::Movq
            )
        )
    }

    /// Whether control cannot fall through this instruction
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. }
                | Instruction::IndirectJump { .. }
                | Instruction::Return { .. }
        )
    }
}
