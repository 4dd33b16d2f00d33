//! The instruction selector
//!
//! Rewrites each block's three-address statements into concrete x86-64
//! instructions. Opcode choice follows operand width, signedness, and
//! floating-point class; comparisons feeding an adjacent branch fuse into
//! a bare CMP; divisions expand into the implicit-pair sequence; constant
//! multiplications synthesize LEA or shifts where the multiplier allows.
//!
//! R10 and R11 are reserved as selector scratch registers and are never
//! handed to the allocator.

use crate::address::{lower_lea_form, AddressMode, LoweredLea};
use crate::instr::{CallParameters, Instruction, Operand};
use crate::moves::{select_move, MoveSelection};
use crate::opcode::Opcode;
use log::debug;
use ollie_common::{Diagnostics, OllieError, OllieResult};
use ollie_ir::{
    select_conditional_move, select_set, BasicBlock, BlockId, ConstId, ConstantValue, Function,
    FuncSymbolId, GlobalId, IrContext, JumpTable, LocalConstId, MemoryAccessType, Module,
    Operator, Polarity, Register, Statement, VarId, VariableSize,
};

/// Divisor scratch for divide-by-immediate lowering
const DIVISOR_SCRATCH: Register = Register::R10;
/// Staging scratch for two-step conversions
const CONVERT_SCRATCH: Register = Register::R11;

/// A block of selected instructions
#[derive(Debug, Clone)]
pub struct SelectedBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

/// A function after selection
#[derive(Debug, Clone)]
pub struct SelectedFunction {
    pub symbol: FuncSymbolId,
    pub blocks: Vec<SelectedBlock>,
    pub local_constants: Vec<LocalConstId>,
    pub stack_frame_size: u32,
}

/// A module after selection
#[derive(Debug, Clone)]
pub struct SelectedModule {
    pub name: String,
    pub functions: Vec<SelectedFunction>,
    pub globals: Vec<GlobalId>,
    pub jump_tables: Vec<JumpTable>,
}

/// Rewrites abstract statements into concrete instructions.
///
/// Structural violations abort selection with an error; block-shape
/// findings that do not block code generation (empty blocks, missing
/// terminators) are collected as non-fatal diagnostics instead.
pub struct InstructionSelector<'a> {
    ctx: &'a mut IrContext,
    statements_consumed: usize,
    instructions_emitted: usize,
    diagnostics: Diagnostics,
}

impl<'a> InstructionSelector<'a> {
    pub fn new(ctx: &'a mut IrContext) -> Self {
        Self {
            ctx,
            statements_consumed: 0,
            instructions_emitted: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    fn size_of(&self, var: VarId) -> VariableSize {
        self.ctx.variable(var).size
    }

    fn is_signed(&self, var: VarId) -> bool {
        self.ctx.types.is_signed(self.ctx.variable(var).defined_type)
    }

    fn is_float(&self, var: VarId) -> bool {
        self.size_of(var).is_floating_point()
    }

    /// Select a whole module
    pub fn select_module(&mut self, module: &Module) -> OllieResult<SelectedModule> {
        let mut functions = Vec::with_capacity(module.functions.len());
        for function in &module.functions {
            functions.push(self.select_function(function)?);
        }
        debug!(
            "selection for module '{}': {} statements consumed, {} instructions emitted, {} diagnostics",
            module.name,
            self.statements_consumed,
            self.instructions_emitted,
            self.diagnostics.messages.len()
        );
        Ok(SelectedModule {
            name: module.name.clone(),
            functions,
            globals: module.globals.clone(),
            jump_tables: module.jump_tables.clone(),
        })
    }

    pub fn select_function(&mut self, function: &Function) -> OllieResult<SelectedFunction> {
        let mut blocks = Vec::with_capacity(function.blocks.len());
        for block in &function.blocks {
            blocks.push(self.select_block(block)?);
        }
        Ok(SelectedFunction {
            symbol: function.symbol,
            blocks,
            local_constants: function.local_constants.clone(),
            stack_frame_size: function.stack_frame_size,
        })
    }

    /// Select one block. A relational operation whose result only feeds the
    /// immediately following branch leaves its result in the flags and the
    /// SETcc is skipped.
    pub fn select_block(&mut self, block: &BasicBlock) -> OllieResult<SelectedBlock> {
        let statements: Vec<Statement> = block
            .statements()
            .iter()
            .map(|&s| self.ctx.statement(s).clone())
            .collect();

        match statements.last() {
            None => self
                .diagnostics
                .warning(format!("block {} is empty", block.id.label())),
            Some(last) if !last.is_block_terminator() => self.diagnostics.warning(format!(
                "block {} does not end in a terminator",
                block.id.label()
            )),
            _ => {}
        }

        let mut out = Vec::new();
        let mut i = 0;
        while i < statements.len() {
            if i + 1 < statements.len() && self.fuses(&statements[i], &statements[i + 1]) {
                self.select_compare_only(&statements[i], &mut out)?;
                self.select_branch(&statements[i + 1], true, &mut out)?;
                self.statements_consumed += 2;
                i += 2;
                continue;
            }
            self.select_statement(&statements[i], &mut out)?;
            self.statements_consumed += 1;
            i += 1;
        }
        self.instructions_emitted += out.len();
        Ok(SelectedBlock {
            id: block.id,
            instructions: out,
        })
    }

    /// Whether `first` is a relational operation feeding `second`'s branch
    fn fuses(&self, first: &Statement, second: &Statement) -> bool {
        let assignee = match first {
            Statement::BinaryOp { assignee, op, .. }
            | Statement::BinaryOpConst { assignee, op, .. } if op.is_relational() => *assignee,
            _ => return false,
        };
        match second {
            Statement::Branch { relies_on, .. } => *relies_on == assignee,
            _ => false,
        }
    }

    /// Emit the CMP for a relational operation, leaving the result in flags
    fn select_compare_only(
        &mut self,
        statement: &Statement,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        match statement {
            Statement::BinaryOp { op1, op2, .. } => {
                let size = self.size_of(*op1);
                out.push(Instruction::Compare {
                    opcode: Opcode::cmp(size),
                    source: Operand::Variable(*op2),
                    destination: Operand::Variable(*op1),
                });
                Ok(())
            }
            Statement::BinaryOpConst { op1, op2, .. } => {
                let size = self.size_of(*op1);
                out.push(Instruction::Compare {
                    opcode: Opcode::cmp(size),
                    source: Operand::Immediate(*op2),
                    destination: Operand::Variable(*op1),
                });
                Ok(())
            }
            other => Err(OllieError::internal_error(format!(
                "cannot fuse a {} into a branch",
                other.class_name()
            ))),
        }
    }

    fn select_branch(
        &mut self,
        statement: &Statement,
        flags_ready: bool,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let Statement::Branch {
            if_target,
            else_target,
            relies_on,
            branch,
        } = statement
        else {
            return Err(OllieError::internal_error("expected a branch statement"));
        };
        if !flags_ready {
            let size = self.size_of(*relies_on);
            out.push(Instruction::Test {
                opcode: Opcode::test(size),
                source: Operand::Variable(*relies_on),
                destination: Operand::Variable(*relies_on),
            });
        }
        out.push(Instruction::ConditionalJump {
            opcode: Opcode::jcc(*branch),
            target: *if_target,
        });
        out.push(Instruction::Jump {
            target: *else_target,
        });
        Ok(())
    }

    /// Select one statement in isolation
    pub fn select_statement(
        &mut self,
        statement: &Statement,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        match statement {
            Statement::BinaryOp {
                assignee,
                op1,
                op,
                op2,
            } => self.select_binary_op(*assignee, *op1, *op, Operand::Variable(*op2), out),
            Statement::BinaryOpConst {
                assignee,
                op1,
                op,
                op2,
            } => {
                if *op == Operator::Star {
                    return self.select_multiply_by_constant(*assignee, *op1, *op2, out);
                }
                self.select_binary_op(*assignee, *op1, *op, Operand::Immediate(*op2), out)
            }
            Statement::Assign { assignee, op1 } => self.select_assign(*assignee, *op1, out),
            Statement::AssignConst { assignee, constant } => {
                self.select_assign_const(*assignee, *constant, out)
            }
            Statement::Ret { value } => {
                if let Some(value) = value {
                    let size = self.size_of(*value);
                    let home = if size.is_floating_point() {
                        Register::Xmm0
                    } else {
                        Register::Rax
                    };
                    out.push(Instruction::Move {
                        opcode: Opcode::mov(size),
                        source: Operand::Variable(*value),
                        destination: Operand::Register(home),
                        access: MemoryAccessType::None,
                    });
                }
                out.push(Instruction::Return { value: *value });
                Ok(())
            }
            Statement::Jump { target } => {
                out.push(Instruction::Jump { target: *target });
                Ok(())
            }
            Statement::Branch { .. } => self.select_branch(statement, false, out),
            Statement::Call {
                assignee,
                function,
                parameters,
            } => {
                out.push(Instruction::CallDirect {
                    function: *function,
                    parameters: CallParameters::from_slice(parameters),
                    returns: *assignee,
                });
                self.move_return_value(*assignee, out);
                Ok(())
            }
            Statement::IndirectCall {
                assignee,
                callee,
                parameters,
            } => {
                out.push(Instruction::CallIndirect {
                    callee: Operand::Variable(*callee),
                    parameters: CallParameters::from_slice(parameters),
                    returns: *assignee,
                });
                self.move_return_value(*assignee, out);
                Ok(())
            }
            Statement::Load { assignee, address } => {
                let size = self.size_of(*assignee);
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Memory(AddressMode::indirect(*address)),
                    destination: Operand::Variable(*assignee),
                    access: MemoryAccessType::Read,
                });
                Ok(())
            }
            Statement::LoadOff {
                assignee,
                address,
                offset,
            } => {
                let size = self.size_of(*assignee);
                let offset = self.ctx.constant(*offset).integer_value()?;
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Memory(AddressMode::OffsetOnly {
                        offset,
                        base: *address,
                    }),
                    destination: Operand::Variable(*assignee),
                    access: MemoryAccessType::Read,
                });
                Ok(())
            }
            Statement::Store { address, source } => {
                let size = self.size_of(*source);
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Variable(*source),
                    destination: Operand::Memory(AddressMode::indirect(*address)),
                    access: MemoryAccessType::Write,
                });
                Ok(())
            }
            Statement::StoreOff {
                address,
                offset,
                source,
            } => {
                let size = self.size_of(*source);
                let offset = self.ctx.constant(*offset).integer_value()?;
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Variable(*source),
                    destination: Operand::Memory(AddressMode::OffsetOnly {
                        offset,
                        base: *address,
                    }),
                    access: MemoryAccessType::Write,
                });
                Ok(())
            }
            Statement::Lea { assignee, form } => match lower_lea_form(self.ctx, form)? {
                LoweredLea::RegisterMove { source } => {
                    out.push(Instruction::Move {
                        opcode: Opcode::Movq,
                        source: Operand::Variable(source),
                        destination: Operand::Variable(*assignee),
                        access: MemoryAccessType::None,
                    });
                    Ok(())
                }
                LoweredLea::Address(mode) => {
                    out.push(Instruction::Lea {
                        opcode: Opcode::lea(self.size_of(*assignee))?,
                        mode,
                        destination: *assignee,
                    });
                    Ok(())
                }
            },
            Statement::Phi { .. } => Err(OllieError::internal_error(
                "phi functions must be eliminated before instruction selection",
            )),
            Statement::Neg { assignee, op1 } => self.select_unary(
                *assignee,
                *op1,
                Opcode::neg(self.size_of(*assignee)),
                out,
            ),
            Statement::Not { assignee, op1 } => self.select_unary(
                *assignee,
                *op1,
                Opcode::not(self.size_of(*assignee)),
                out,
            ),
            Statement::LogicalNot { assignee, op1 } => {
                let size = self.size_of(*op1);
                out.push(Instruction::Test {
                    opcode: Opcode::test(size),
                    source: Operand::Variable(*op1),
                    destination: Operand::Variable(*op1),
                });
                out.push(Instruction::ConditionalSet {
                    opcode: Opcode::setcc(select_set(Operator::LogicalNot, Polarity::Normal, false)),
                    destination: *assignee,
                });
                Ok(())
            }
            Statement::Inc { target } => {
                out.push(Instruction::Unary {
                    opcode: Opcode::inc(self.size_of(*target)),
                    destination: Operand::Variable(*target),
                });
                Ok(())
            }
            Statement::Dec { target } => {
                out.push(Instruction::Unary {
                    opcode: Opcode::dec(self.size_of(*target)),
                    destination: Operand::Variable(*target),
                });
                Ok(())
            }
            Statement::AsmInline { assembly } => {
                out.push(Instruction::InlineAssembly {
                    assembly: assembly.clone(),
                });
                Ok(())
            }
            Statement::Idle => {
                out.push(Instruction::Nop);
                Ok(())
            }
            Statement::TestIfNotZero { target } => {
                out.push(Instruction::Test {
                    opcode: Opcode::test(self.size_of(*target)),
                    source: Operand::Variable(*target),
                    destination: Operand::Variable(*target),
                });
                Ok(())
            }
            Statement::MemAccess {
                assignee,
                address,
                access,
            } => match access {
                MemoryAccessType::Read => {
                    out.push(Instruction::Move {
                        opcode: Opcode::mov(self.size_of(*assignee)),
                        source: Operand::Memory(AddressMode::indirect(*address)),
                        destination: Operand::Variable(*assignee),
                        access: MemoryAccessType::Read,
                    });
                    Ok(())
                }
                MemoryAccessType::Write => {
                    out.push(Instruction::Move {
                        opcode: Opcode::mov(self.size_of(*assignee)),
                        source: Operand::Variable(*assignee),
                        destination: Operand::Memory(AddressMode::indirect(*address)),
                        access: MemoryAccessType::Write,
                    });
                    Ok(())
                }
                MemoryAccessType::None => Err(OllieError::internal_error(
                    "memory access statement without a direction",
                )),
            },
            Statement::IndirJumpAddrCalc {
                assignee,
                jump_table,
                index,
                multiplier,
            } => {
                out.push(Instruction::Lea {
                    opcode: Opcode::Leaq,
                    mode: AddressMode::JumpTable {
                        table: *jump_table,
                        index: *index,
                        scale: *multiplier,
                    },
                    destination: *assignee,
                });
                Ok(())
            }
            Statement::IndirectJump { address } => {
                out.push(Instruction::IndirectJump {
                    target: Operand::Variable(*address),
                });
                Ok(())
            }
            Statement::Clear { target } => {
                out.push(Instruction::Alu {
                    opcode: Opcode::xor(self.size_of(*target)),
                    source: Operand::Variable(*target),
                    destination: Operand::Variable(*target),
                });
                Ok(())
            }
            Statement::StackAlloc { bytes } => {
                let amount = self.ctx.constant_of(ConstantValue::ULong(*bytes as u64));
                out.push(Instruction::Alu {
                    opcode: Opcode::Subq,
                    source: Operand::Immediate(amount),
                    destination: Operand::Register(Register::Rsp),
                });
                Ok(())
            }
            Statement::StackDealloc { bytes } => {
                let amount = self.ctx.constant_of(ConstantValue::ULong(*bytes as u64));
                out.push(Instruction::Alu {
                    opcode: Opcode::Addq,
                    source: Operand::Immediate(amount),
                    destination: Operand::Register(Register::Rsp),
                });
                Ok(())
            }
            Statement::SetNe { assignee } => {
                out.push(Instruction::ConditionalSet {
                    opcode: Opcode::Setne,
                    destination: *assignee,
                });
                Ok(())
            }
        }
    }

    fn move_return_value(&self, assignee: Option<VarId>, out: &mut Vec<Instruction>) {
        if let Some(assignee) = assignee {
            let size = self.size_of(assignee);
            let home = if size.is_floating_point() {
                Register::Xmm0
            } else {
                Register::Rax
            };
            out.push(Instruction::Move {
                opcode: Opcode::mov(size),
                source: Operand::Register(home),
                destination: Operand::Variable(assignee),
                access: MemoryAccessType::None,
            });
        }
    }

    fn copy_into(&self, assignee: VarId, op1: VarId, out: &mut Vec<Instruction>) {
        out.push(Instruction::Move {
            opcode: Opcode::mov(self.size_of(assignee)),
            source: Operand::Variable(op1),
            destination: Operand::Variable(assignee),
            access: MemoryAccessType::None,
        });
    }

    fn select_unary(
        &mut self,
        assignee: VarId,
        op1: VarId,
        opcode: Opcode,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        self.copy_into(assignee, op1, out);
        out.push(Instruction::Unary {
            opcode,
            destination: Operand::Variable(assignee),
        });
        Ok(())
    }

    /// General binary-operation selection. `op2` is a variable or immediate.
    fn select_binary_op(
        &mut self,
        assignee: VarId,
        op1: VarId,
        op: Operator,
        op2: Operand,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let size = self.size_of(assignee);
        let signed = self.is_signed(op1);

        if op.is_relational() {
            // Floating-point compares set CF/ZF, so they select from the
            // unsigned column.
            let cmp_signed = signed && !self.is_float(op1);
            out.push(Instruction::Compare {
                opcode: Opcode::cmp(self.size_of(op1)),
                source: op2,
                destination: Operand::Variable(op1),
            });
            out.push(Instruction::ConditionalSet {
                opcode: Opcode::setcc(select_set(op, Polarity::Normal, cmp_signed)),
                destination: assignee,
            });
            return Ok(());
        }

        match op {
            Operator::Plus => {
                self.copy_into(assignee, op1, out);
                out.push(Instruction::Alu {
                    opcode: Opcode::add(size),
                    source: op2,
                    destination: Operand::Variable(assignee),
                });
            }
            Operator::Minus => {
                self.copy_into(assignee, op1, out);
                out.push(Instruction::Alu {
                    opcode: Opcode::sub(size),
                    source: op2,
                    destination: Operand::Variable(assignee),
                });
            }
            Operator::Star => {
                if size.is_floating_point() || signed {
                    self.copy_into(assignee, op1, out);
                    out.push(Instruction::Alu {
                        opcode: Opcode::imul(size),
                        source: op2,
                        destination: Operand::Variable(assignee),
                    });
                } else {
                    self.select_wide_multiplication(assignee, op1, op2, out);
                }
            }
            Operator::Slash => {
                if size.is_floating_point() {
                    self.copy_into(assignee, op1, out);
                    let opcode = if size == VariableSize::SinglePrecision {
                        Opcode::Divss
                    } else {
                        Opcode::Divsd
                    };
                    out.push(Instruction::Alu {
                        opcode,
                        source: op2,
                        destination: Operand::Variable(assignee),
                    });
                } else {
                    self.select_division(assignee, op1, op2, signed, size, false, out)?;
                }
            }
            Operator::Modulo => {
                self.select_division(assignee, op1, op2, signed, size, true, out)?;
            }
            Operator::ShiftLeft | Operator::ShiftRight => {
                self.select_shift(assignee, op1, op, op2, signed, size, out)?;
            }
            Operator::BitwiseAnd | Operator::LogicalAnd => {
                self.copy_into(assignee, op1, out);
                out.push(Instruction::Alu {
                    opcode: Opcode::and(size),
                    source: op2,
                    destination: Operand::Variable(assignee),
                });
            }
            Operator::BitwiseOr | Operator::LogicalOr => {
                self.copy_into(assignee, op1, out);
                out.push(Instruction::Alu {
                    opcode: Opcode::or(size),
                    source: op2,
                    destination: Operand::Variable(assignee),
                });
            }
            Operator::BitwiseXor => {
                self.copy_into(assignee, op1, out);
                out.push(Instruction::Alu {
                    opcode: Opcode::xor(size),
                    source: op2,
                    destination: Operand::Variable(assignee),
                });
            }
            other => {
                return Err(OllieError::internal_error(format!(
                    "operator {} is not a binary operation",
                    other
                )))
            }
        }
        Ok(())
    }

    fn select_shift(
        &mut self,
        assignee: VarId,
        op1: VarId,
        op: Operator,
        count: Operand,
        signed: bool,
        size: VariableSize,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        // SAL and SHL encode identically; the split mirrors the source
        // operator's signedness.
        let opcode = match (op, signed) {
            (Operator::ShiftLeft, true) => Opcode::sal(size),
            (Operator::ShiftLeft, false) => Opcode::shl(size),
            (Operator::ShiftRight, true) => Opcode::sar(size),
            (Operator::ShiftRight, false) => Opcode::shr(size),
            _ => {
                return Err(OllieError::internal_error(
                    "shift selection on a non-shift operator",
                ))
            }
        };
        self.copy_into(assignee, op1, out);
        let count = match count {
            Operand::Immediate(c) => Operand::Immediate(c),
            // Variable counts go through CL.
            other => {
                out.push(Instruction::Move {
                    opcode: Opcode::Movb,
                    source: other,
                    destination: Operand::Register(Register::Rcx),
                    access: MemoryAccessType::None,
                });
                Operand::Register(Register::Rcx)
            }
        };
        out.push(Instruction::Shift {
            opcode,
            count,
            destination: Operand::Variable(assignee),
        });
        Ok(())
    }

    /// Unsigned multiply through the implicit AX-family pair
    fn select_wide_multiplication(
        &mut self,
        assignee: VarId,
        op1: VarId,
        op2: Operand,
        out: &mut Vec<Instruction>,
    ) {
        let size = self.size_of(assignee);
        // MUL takes a register or memory operand only.
        let op2 = match op2 {
            Operand::Immediate(c) => {
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Immediate(c),
                    destination: Operand::Register(DIVISOR_SCRATCH),
                    access: MemoryAccessType::None,
                });
                Operand::Register(DIVISOR_SCRATCH)
            }
            other => other,
        };
        out.push(Instruction::Move {
            opcode: Opcode::mov(size),
            source: Operand::Variable(op1),
            destination: Operand::Register(Register::Rax),
            access: MemoryAccessType::None,
        });
        out.push(Instruction::WideMultiplication {
            opcode: Opcode::mul_wide(size),
            source: op2,
            implicit_source: Register::Rax,
            destination_high: Register::Rdx,
            destination_low: Register::Rax,
        });
        out.push(Instruction::Move {
            opcode: Opcode::mov(size),
            source: Operand::Register(Register::Rax),
            destination: Operand::Variable(assignee),
            access: MemoryAccessType::None,
        });
    }

    /// Integer division. Signed divides sign-extend the dividend into the
    /// hi half; unsigned divides zero it instead.
    fn select_division(
        &mut self,
        assignee: VarId,
        op1: VarId,
        divisor: Operand,
        signed: bool,
        size: VariableSize,
        want_remainder: bool,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        if size.is_floating_point() {
            return Err(OllieError::internal_error(
                "remainder is undefined on floating-point operands",
            ));
        }

        // The divisor needs a register or memory home; immediates stage
        // through the scratch register.
        let divisor = match divisor {
            Operand::Immediate(c) => {
                out.push(Instruction::Move {
                    opcode: Opcode::mov(size),
                    source: Operand::Immediate(c),
                    destination: Operand::Register(DIVISOR_SCRATCH),
                    access: MemoryAccessType::None,
                });
                Operand::Register(DIVISOR_SCRATCH)
            }
            other => other,
        };

        if signed {
            out.push(Instruction::Move {
                opcode: Opcode::mov(size),
                source: Operand::Variable(op1),
                destination: Operand::Register(Register::Rax),
                access: MemoryAccessType::None,
            });
            out.push(Instruction::Extension {
                opcode: Opcode::sign_extension(size),
            });
        } else if size == VariableSize::Byte {
            // Zero-extending the byte dividend into EAX clears the implicit
            // AH half in one move.
            out.push(Instruction::Move {
                opcode: Opcode::Movzbl,
                source: Operand::Variable(op1),
                destination: Operand::Register(Register::Rax),
                access: MemoryAccessType::None,
            });
        } else {
            out.push(Instruction::Move {
                opcode: Opcode::mov(size),
                source: Operand::Variable(op1),
                destination: Operand::Register(Register::Rax),
                access: MemoryAccessType::None,
            });
            out.push(Instruction::Alu {
                opcode: Opcode::xor(size),
                source: Operand::Register(Register::Rdx),
                destination: Operand::Register(Register::Rdx),
            });
        }

        let opcode = if signed {
            Opcode::idiv(size)
        } else {
            Opcode::div(size)
        };
        // The byte forms keep the high half in AH, not the RDX family.
        let high_half = if size == VariableSize::Byte {
            Register::Ah
        } else {
            Register::Rdx
        };
        out.push(Instruction::Division {
            opcode,
            divisor,
            high_source: high_half,
            low_source: Register::Rax,
            quotient: Register::Rax,
            remainder: high_half,
        });

        let result = if want_remainder {
            high_half
        } else {
            Register::Rax
        };
        out.push(Instruction::Move {
            opcode: Opcode::mov(size),
            source: Operand::Register(result),
            destination: Operand::Variable(assignee),
            access: MemoryAccessType::None,
        });
        Ok(())
    }

    /// Constant multiplier synthesis: 1 copies, {2,4,8} become an LEA with
    /// an index scale, other powers of two shift, everything else multiplies.
    fn select_multiply_by_constant(
        &mut self,
        assignee: VarId,
        op1: VarId,
        multiplier: ConstId,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let size = self.size_of(assignee);
        let signed = self.is_signed(op1);
        let value = self.ctx.constant(multiplier).clone();

        if value.is_one() {
            self.copy_into(assignee, op1, out);
            return Ok(());
        }
        if !size.is_floating_point() && value.is_lea_compatible_power_of_2() {
            if let Ok(opcode) = Opcode::lea(size) {
                out.push(Instruction::Lea {
                    opcode,
                    mode: AddressMode::IndexAndScale {
                        index: op1,
                        scale: value.integer_value()? as u8,
                    },
                    destination: assignee,
                });
                return Ok(());
            }
        }
        if !size.is_floating_point() && value.is_power_of_2() {
            let shift = value.integer_value()?.trailing_zeros() as i64;
            let count = self.ctx.constant_of(ConstantValue::Int(shift as i32));
            self.copy_into(assignee, op1, out);
            out.push(Instruction::Shift {
                opcode: if signed {
                    Opcode::sal(size)
                } else {
                    Opcode::shl(size)
                },
                count: Operand::Immediate(count),
                destination: Operand::Variable(assignee),
            });
            return Ok(());
        }
        if !signed && !size.is_floating_point() {
            self.select_wide_multiplication(assignee, op1, Operand::Immediate(multiplier), out);
            return Ok(());
        }
        self.copy_into(assignee, op1, out);
        out.push(Instruction::Alu {
            opcode: Opcode::imul(size),
            source: Operand::Immediate(multiplier),
            destination: Operand::Variable(assignee),
        });
        Ok(())
    }

    fn select_assign(
        &mut self,
        assignee: VarId,
        op1: VarId,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let source_size = self.size_of(op1);
        let destination_size = self.size_of(assignee);
        let signed = self.is_signed(op1);
        match select_move(source_size, destination_size, signed)? {
            MoveSelection::One(opcode) => {
                out.push(Instruction::Move {
                    opcode,
                    source: Operand::Variable(op1),
                    destination: Operand::Variable(assignee),
                    access: MemoryAccessType::None,
                });
            }
            MoveSelection::Two { first, second } => {
                out.push(Instruction::Move {
                    opcode: first,
                    source: Operand::Variable(op1),
                    destination: Operand::Register(CONVERT_SCRATCH),
                    access: MemoryAccessType::None,
                });
                out.push(Instruction::Move {
                    opcode: second,
                    source: Operand::Register(CONVERT_SCRATCH),
                    destination: Operand::Variable(assignee),
                    access: MemoryAccessType::None,
                });
            }
        }
        Ok(())
    }

    fn select_assign_const(
        &mut self,
        assignee: VarId,
        constant: ConstId,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let size = self.size_of(assignee);
        if size.is_floating_point() || self.ctx.constant(constant).is_floating_point() {
            return Err(OllieError::internal_error(
                "floating-point literals load through the local-constant pool",
            ));
        }
        out.push(Instruction::Move {
            opcode: Opcode::mov(size),
            source: Operand::Immediate(constant),
            destination: Operand::Variable(assignee),
            access: MemoryAccessType::None,
        });
        Ok(())
    }

    /// Conditional assignment: `destination := (lhs <op> rhs) ? source :
    /// destination`, emitted as a CMP followed by the matching CMOV.
    pub fn select_conditional_assignment(
        &mut self,
        destination: VarId,
        lhs: VarId,
        op: Operator,
        rhs: Operand,
        source: VarId,
        polarity: Polarity,
        out: &mut Vec<Instruction>,
    ) -> OllieResult<()> {
        let signed = self.is_signed(lhs) && !self.is_float(lhs);
        out.push(Instruction::Compare {
            opcode: Opcode::cmp(self.size_of(lhs)),
            source: rhs,
            destination: Operand::Variable(lhs),
        });
        out.push(Instruction::ConditionalMove {
            opcode: Opcode::cmovcc(select_conditional_move(op, polarity, signed)),
            source: Operand::Variable(source),
            destination,
        });
        Ok(())
    }

    /// Selection statistics: (statements consumed, instructions emitted)
    pub fn statistics(&self) -> (usize, usize) {
        (self.statements_consumed, self.instructions_emitted)
    }

    /// Non-fatal findings collected while selecting
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hand the collected findings to the driver, leaving the selector
    /// with an empty collection
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
