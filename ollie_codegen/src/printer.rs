//! AT&T-syntax rendering of selected instructions and whole modules
//!
//! Operands print in AT&T order (source, destination) with percent-prefixed
//! registers and `$`-prefixed immediates. Variable rendering is pluggable:
//! the printer can show OIR names, live-range ids, or the physical
//! sub-register chosen by allocation.

use crate::address::AddressMode;
use crate::instr::{Instruction, Operand};
use crate::opcode::Opcode;
use crate::select::{SelectedBlock, SelectedFunction, SelectedModule};
use ollie_ir::{
    printer as oir_printer, ConstId, ConstantValue, GlobalInitializer, GlobalVariable, IrContext,
    LocalConstantValue, Register, VarId, VariableKind, VariableSize,
};

/// How variables inside instructions are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariablePrintingMode {
    /// Bare OIR names (`t7`, `x_2`)
    Inline,
    /// OIR names annotated with their live range (`x_2(LR4)`), used in
    /// block-header listings
    BlockHeader,
    /// Operand syntax: address markers, `.LC<n>(%rip)`, RIP-relative names
    #[default]
    InInstruction,
    /// Live-range ids (`LR4`)
    LiveRanges,
    /// Physical sub-register names via the assigned register and the
    /// variable's size class
    Registers,
}

/// Renders selected instructions and assembly data sections
pub struct AsmPrinter<'a> {
    ctx: &'a IrContext,
    mode: VariablePrintingMode,
}

fn family_width(opcode: Opcode) -> VariableSize {
    match opcode.mnemonic().chars().last() {
        Some('b') => VariableSize::Byte,
        Some('w') => VariableSize::Word,
        Some('l') => VariableSize::DoubleWord,
        Some('q') => VariableSize::QuadWord,
        Some('s') => VariableSize::SinglePrecision,
        Some('d') => VariableSize::DoublePrecision,
        _ => VariableSize::QuadWord,
    }
}

fn move_source_width(opcode: Opcode) -> VariableSize {
    use Opcode::*;
    match opcode {
        Movsbw | Movsbl | Movsbq | Movzbw | Movzbl | Movzbq => VariableSize::Byte,
        Movswl | Movswq | Movzwl | Movzwq => VariableSize::Word,
        Movslq | Cvtsi2ssl | Cvtsi2sdl => VariableSize::DoubleWord,
        Cvtsi2ssq | Cvtsi2sdq => VariableSize::QuadWord,
        Cvttss2sil | Cvttss2siq | Cvtss2sd => VariableSize::SinglePrecision,
        Cvttsd2sil | Cvttsd2siq | Cvtsd2ss => VariableSize::DoublePrecision,
        other => family_width(other),
    }
}

fn move_destination_width(opcode: Opcode) -> VariableSize {
    use Opcode::*;
    match opcode {
        Movsbw | Movzbw => VariableSize::Word,
        Movsbl | Movswl | Movzbl | Movzwl | Cvttss2sil | Cvttsd2sil => VariableSize::DoubleWord,
        Movsbq | Movswq | Movslq | Movzbq | Movzwq | Cvttss2siq | Cvttsd2siq => {
            VariableSize::QuadWord
        }
        Cvtsi2ssl | Cvtsi2ssq | Cvtss2sd => VariableSize::SinglePrecision,
        Cvtsi2sdl | Cvtsi2sdq | Cvtsd2ss => VariableSize::DoublePrecision,
        other => family_width(other),
    }
}

impl<'a> AsmPrinter<'a> {
    pub fn new(ctx: &'a IrContext) -> Self {
        Self {
            ctx,
            mode: VariablePrintingMode::default(),
        }
    }

    pub fn with_mode(ctx: &'a IrContext, mode: VariablePrintingMode) -> Self {
        Self { ctx, mode }
    }

    pub fn mode(&self) -> VariablePrintingMode {
        self.mode
    }

    fn resolved_register(&self, var: VarId) -> Option<Register> {
        let variable = self.ctx.variable(var);
        variable.register.or_else(|| {
            variable
                .live_range
                .and_then(|lr| self.ctx.live_range(lr).register)
        })
    }

    /// Render a variable under the current printing mode
    pub fn format_variable(&self, var: VarId) -> String {
        let variable = self.ctx.variable(var);
        match self.mode {
            VariablePrintingMode::Inline => oir_printer::format_variable(self.ctx, var),
            VariablePrintingMode::BlockHeader => {
                let name = oir_printer::format_variable(self.ctx, var);
                match variable.live_range {
                    Some(lr) => format!("{}(LR{})", name, self.ctx.live_range(lr).id),
                    None => name,
                }
            }
            VariablePrintingMode::InInstruction => match variable.kind {
                VariableKind::LocalConstant { constant } => {
                    format!("{}(%rip)", self.ctx.local_constant(constant).label())
                }
                VariableKind::FunctionAddress { function } => {
                    format!("{}(%rip)", self.ctx.symbols.function(function).name)
                }
                _ => oir_printer::format_variable(self.ctx, var),
            },
            VariablePrintingMode::LiveRanges => match variable.live_range {
                Some(lr) => format!("LR{}", self.ctx.live_range(lr).id),
                None => oir_printer::format_variable(self.ctx, var),
            },
            VariablePrintingMode::Registers => match self.resolved_register(var) {
                Some(register) => register.name(variable.size).to_string(),
                None => oir_printer::format_variable(self.ctx, var),
            },
        }
    }

    /// Render a variable forced to quad-word width (address positions)
    fn format_address_variable(&self, var: VarId) -> String {
        if self.mode == VariablePrintingMode::Registers {
            if let Some(register) = self.resolved_register(var) {
                return register.name(VariableSize::QuadWord).to_string();
            }
        }
        self.format_variable(var)
    }

    fn format_immediate(&self, constant: ConstId) -> String {
        format!("${}", oir_printer::format_constant(self.ctx, constant))
    }

    /// Render a concrete addressing mode
    pub fn format_address(&self, mode: &AddressMode) -> String {
        let reg = |v: &VarId| self.format_address_variable(*v);
        match mode {
            AddressMode::OffsetOnly { offset: 0, base } => format!("({})", reg(base)),
            AddressMode::OffsetOnly { offset, base } => format!("{}({})", offset, reg(base)),
            AddressMode::RegistersOnly { base, index } => {
                format!("({},{})", reg(base), reg(index))
            }
            AddressMode::RegistersAndScale { base, index, scale } => {
                format!("({},{},{})", reg(base), reg(index), scale)
            }
            AddressMode::RegistersAndOffset {
                offset,
                base,
                index,
            } => format!("{}({},{})", offset, reg(base), reg(index)),
            AddressMode::RegistersOffsetAndScale {
                offset,
                base,
                index,
                scale,
            } => format!("{}({},{},{})", offset, reg(base), reg(index), scale),
            AddressMode::RipRelative { target } => self.rip_operand(*target, 0),
            AddressMode::RipRelativeWithOffset { offset, target } => {
                self.rip_operand(*target, *offset)
            }
            AddressMode::IndexAndScale { index, scale } => {
                format!("(,{},{})", reg(index), scale)
            }
            AddressMode::IndexOffsetAndScale {
                offset,
                index,
                scale,
            } => format!("{}(,{},{})", offset, reg(index), scale),
            AddressMode::JumpTable {
                table,
                index,
                scale,
            } => format!("{}(,{},{})", table.label(), reg(index), scale),
        }
    }

    fn rip_operand(&self, target: VarId, offset: i64) -> String {
        let symbol = match self.ctx.variable(target).kind {
            VariableKind::LocalConstant { constant } => self.ctx.local_constant(constant).label(),
            VariableKind::FunctionAddress { function } => {
                self.ctx.symbols.function(function).name.clone()
            }
            VariableKind::NonTemp { symbol, .. } => {
                self.ctx.symbols.variable(symbol).name.clone()
            }
            VariableKind::MemoryAddress {
                symbol: Some(symbol),
                ..
            } => self.ctx.symbols.variable(symbol).name.clone(),
            _ => oir_printer::format_variable(self.ctx, target),
        };
        if offset == 0 {
            format!("{}(%rip)", symbol)
        } else {
            format!("{}+{}(%rip)", symbol, offset)
        }
    }

    /// Render an operand; `hint` sizes fixed-register operands
    pub fn format_operand(&self, operand: &Operand, hint: VariableSize) -> String {
        match operand {
            Operand::Variable(v) => self.format_variable(*v),
            Operand::Immediate(c) => self.format_immediate(*c),
            Operand::Register(r) => r.name(hint).to_string(),
            Operand::Memory(mode) => self.format_address(mode),
        }
    }

    /// Render one instruction as a line of AT&T assembly (without the
    /// leading tab). Division and wide multiplication append a comment
    /// naming their implicit operands.
    pub fn format_instruction(&self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Move {
                opcode,
                source,
                destination,
                ..
            } => format!(
                "{} {}, {}",
                opcode,
                self.format_operand(source, move_source_width(*opcode)),
                self.format_operand(destination, move_destination_width(*opcode))
            ),
            Instruction::Alu {
                opcode,
                source,
                destination,
            } => {
                let width = family_width(*opcode);
                format!(
                    "{} {}, {}",
                    opcode,
                    self.format_operand(source, width),
                    self.format_operand(destination, width)
                )
            }
            Instruction::Shift {
                opcode,
                count,
                destination,
            } => format!(
                "{} {}, {}",
                opcode,
                // A register shift count is always CL.
                self.format_operand(count, VariableSize::Byte),
                self.format_operand(destination, family_width(*opcode))
            ),
            Instruction::Unary {
                opcode,
                destination,
            } => format!(
                "{} {}",
                opcode,
                self.format_operand(destination, family_width(*opcode))
            ),
            Instruction::Lea {
                opcode,
                mode,
                destination,
            } => format!(
                "{} {}, {}",
                opcode,
                self.format_address(mode),
                self.format_variable(*destination)
            ),
            Instruction::Division {
                opcode, divisor, ..
            } => {
                let width = family_width(*opcode);
                let pair = implicit_pair(width);
                format!(
                    "{} {}\t# implicit: {} dividend, {} quotient, {} remainder",
                    opcode,
                    self.format_operand(divisor, width),
                    pair.dividend,
                    pair.quotient,
                    pair.remainder
                )
            }
            Instruction::WideMultiplication { opcode, source, .. } => {
                let width = family_width(*opcode);
                let pair = implicit_pair(width);
                format!(
                    "{} {}\t# implicit: {} source, {} destination",
                    opcode,
                    self.format_operand(source, width),
                    pair.quotient,
                    pair.dividend
                )
            }
            Instruction::Extension { opcode } => opcode.mnemonic().to_string(),
            Instruction::Compare {
                opcode,
                source,
                destination,
            }
            | Instruction::Test {
                opcode,
                source,
                destination,
            } => {
                let width = family_width(*opcode);
                format!(
                    "{} {}, {}",
                    opcode,
                    self.format_operand(source, width),
                    self.format_operand(destination, width)
                )
            }
            Instruction::ConditionalMove {
                opcode,
                source,
                destination,
            } => {
                let width = self.ctx.variable(*destination).size;
                format!(
                    "{} {}, {}",
                    opcode,
                    self.format_operand(source, width),
                    self.format_variable(*destination)
                )
            }
            Instruction::ConditionalSet {
                opcode,
                destination,
            } => format!("{} {}", opcode, self.format_variable(*destination)),
            Instruction::Jump { target } => format!("jmp {}", target.label()),
            Instruction::ConditionalJump { opcode, target } => {
                format!("{} {}", opcode, target.label())
            }
            Instruction::IndirectJump { target } => format!(
                "jmp *{}",
                self.format_operand(target, VariableSize::QuadWord)
            ),
            Instruction::Push { source } => {
                format!("pushq {}", self.format_address_variable(*source))
            }
            Instruction::Pop { destination } => {
                format!("popq {}", self.format_address_variable(*destination))
            }
            Instruction::PushDirect { opcode, register } => {
                if register.is_sse() {
                    // No architectural SSE push; adjust and spill.
                    format!(
                        "subq $8, %rsp\n\tmovsd {}, (%rsp)",
                        register.quad_name()
                    )
                } else {
                    format!("{} {}", opcode, register.quad_name())
                }
            }
            Instruction::PopDirect { opcode, register } => {
                if register.is_sse() {
                    format!(
                        "movsd (%rsp), {}\n\taddq $8, %rsp",
                        register.quad_name()
                    )
                } else {
                    format!("{} {}", opcode, register.quad_name())
                }
            }
            Instruction::CallDirect { function, .. } => {
                format!("call {}", self.ctx.symbols.function(*function).name)
            }
            Instruction::CallIndirect { callee, .. } => format!(
                "call *{}",
                self.format_operand(callee, VariableSize::QuadWord)
            ),
            Instruction::Return { .. } => "ret".to_string(),
            Instruction::InlineAssembly { assembly } => assembly.clone(),
            Instruction::Nop => "nop".to_string(),
        }
    }

    /// Render a selected block: label plus one tab-indented line per
    /// instruction
    pub fn print_block(&self, block: &SelectedBlock) -> String {
        let mut out = format!("{}:\n", block.id.label());
        for instruction in &block.instructions {
            out.push('\t');
            out.push_str(&self.format_instruction(instruction));
            out.push('\n');
        }
        out
    }

    /// Render a selected function with its directive header and `.LC` pool
    pub fn print_function(&self, function: &SelectedFunction) -> String {
        let name = &self.ctx.symbols.function(function.symbol).name;
        let mut out = String::new();
        if !function.local_constants.is_empty() {
            out.push_str("\t.section .rodata\n");
            for &lc in &function.local_constants {
                out.push_str(&self.print_local_constant(lc));
            }
        }
        out.push_str("\t.text\n");
        out.push_str(&format!("\t.globl {}\n", name));
        out.push_str(&format!("\t.type {}, @function\n", name));
        out.push_str(&format!("{}:\n", name));
        for block in &function.blocks {
            out.push_str(&self.print_block(block));
        }
        out
    }

    fn print_local_constant(&self, id: ollie_ir::LocalConstId) -> String {
        let entry = self.ctx.local_constant(id);
        match &entry.value {
            LocalConstantValue::String(text) => {
                format!("{}:\n\t.string {:?}\n", entry.label(), text)
            }
            LocalConstantValue::Float(value) => format!(
                "\t.align 4\n{}:\n\t.long {}\n",
                entry.label(),
                value.to_bits()
            ),
            LocalConstantValue::Double(value) => {
                let bits = value.to_bits();
                // Little-endian pair: low half first.
                format!(
                    "\t.align 8\n{}:\n\t.long {}\n\t.long {}\n",
                    entry.label(),
                    bits & 0xffff_ffff,
                    bits >> 32
                )
            }
        }
    }

    fn initializer_directive(&self, constant: ConstId) -> String {
        match self.ctx.constant(constant) {
            ConstantValue::Byte(v) => format!("\t.byte {}\n", v),
            ConstantValue::UByte(v) | ConstantValue::Char(v) => format!("\t.byte {}\n", v),
            ConstantValue::Short(v) => format!("\t.value {}\n", v),
            ConstantValue::UShort(v) => format!("\t.value {}\n", v),
            ConstantValue::Int(v) => format!("\t.long {}\n", v),
            ConstantValue::UInt(v) => format!("\t.long {}\n", v),
            ConstantValue::Long(v) => format!("\t.quad {}\n", v),
            ConstantValue::ULong(v) => format!("\t.quad {}\n", v),
            ConstantValue::Float(v) => format!("\t.long {}\n", v.to_bits()),
            ConstantValue::Double(v) => {
                let bits = v.to_bits();
                format!("\t.long {}\n\t.long {}\n", bits & 0xffff_ffff, bits >> 32)
            }
            ConstantValue::String(text) => format!("\t.string {:?}\n", text),
            ConstantValue::RelativeAddress(var) => match self.ctx.variable(*var).kind {
                VariableKind::LocalConstant { constant } => {
                    format!("\t.quad {}\n", self.ctx.local_constant(constant).label())
                }
                _ => format!("\t.quad {}\n", oir_printer::format_variable(self.ctx, *var)),
            },
        }
    }

    /// Render one global variable with its section and alignment directives.
    /// Uninitialized data lands in `.bss`, plain data in `.data`, and
    /// initializers holding local-constant pointers in `.data.rel.local`.
    pub fn print_global(&self, global: &GlobalVariable) -> String {
        let symbol = self.ctx.symbols.variable(global.symbol);
        let size = self.ctx.types.size(symbol.defined_type);
        let align = self.alignment_of(symbol.defined_type);
        let mut out = format!("\t.globl {}\n", symbol.name);
        match &global.initializer {
            GlobalInitializer::None => {
                out.push_str("\t.bss\n");
                if align > 1 {
                    out.push_str(&format!("\t.align {}\n", align));
                }
                out.push_str(&format!("{}:\n\t.zero {}\n", symbol.name, size));
            }
            initializer => {
                if global.relocatable_data {
                    out.push_str("\t.section .data.rel.local,\"aw\"\n");
                } else {
                    out.push_str("\t.data\n");
                }
                if align > 1 {
                    out.push_str(&format!("\t.align {}\n", align));
                }
                out.push_str(&format!("{}:\n", symbol.name));
                match initializer {
                    GlobalInitializer::Constant(c) => {
                        out.push_str(&self.initializer_directive(*c))
                    }
                    GlobalInitializer::Array(members) => {
                        for member in members {
                            out.push_str(&self.initializer_directive(*member));
                        }
                    }
                    GlobalInitializer::String(text) => {
                        out.push_str(&format!("\t.string {:?}\n", text))
                    }
                    GlobalInitializer::None => {}
                }
            }
        }
        out
    }

    /// Element-based alignment: arrays align on their member, aggregates
    /// and pointers on eight bytes
    fn alignment_of(&self, ty: ollie_ir::TypeId) -> u32 {
        use ollie_ir::TypeKind;
        match &self.ctx.types.get(ty).kind {
            TypeKind::Basic(token) => token.size().max(1),
            TypeKind::Array { member, .. } => self.alignment_of(*member),
            _ => 8,
        }
    }

    /// Render a whole module: globals, functions with their pools, and
    /// jump tables
    pub fn print_module(&self, module: &SelectedModule) -> String {
        let mut out = String::new();
        for &global in &module.globals {
            out.push_str(&self.print_global(self.ctx.global(global)));
        }
        for function in &module.functions {
            out.push_str(&self.print_function(function));
        }
        if !module.jump_tables.is_empty() {
            out.push_str("\t.section .rodata\n\t.align 8\n");
            for table in &module.jump_tables {
                out.push_str(&format!("{}:\n", table.id.label()));
                for target in &table.targets {
                    out.push_str(&format!("\t.quad {}\n", target.label()));
                }
            }
        }
        out
    }
}

struct ImplicitPair {
    dividend: &'static str,
    quotient: &'static str,
    remainder: &'static str,
}

fn implicit_pair(width: VariableSize) -> ImplicitPair {
    match width {
        VariableSize::Byte => ImplicitPair {
            dividend: "ah:al",
            quotient: "al",
            remainder: "ah",
        },
        VariableSize::Word => ImplicitPair {
            dividend: "dx:ax",
            quotient: "ax",
            remainder: "dx",
        },
        VariableSize::QuadWord => ImplicitPair {
            dividend: "rdx:rax",
            quotient: "rax",
            remainder: "rdx",
        },
        _ => ImplicitPair {
            dividend: "edx:eax",
            quotient: "eax",
            remainder: "edx",
        },
    }
}
