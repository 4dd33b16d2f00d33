//! Human-readable rendering of the abstract three-address form
//!
//! Statements render with OIR syntax such as `t7 <- t3 + t4`,
//! `load t8 <- x_2`, or `cbranch_g .L4 else .L5`. LEA forms render with
//! their concrete address-mode syntax.

use crate::constant::{ConstId, ConstantValue};
use crate::context::IrContext;
use crate::module::{BasicBlock, Function, Module};
use crate::statement::{LeaForm, MemoryAccessType, Statement};
use crate::variable::{VarId, VariableKind};

/// Render a variable by its OIR name
pub fn format_variable(ctx: &IrContext, id: VarId) -> String {
    let variable = ctx.variable(id);
    match variable.kind {
        VariableKind::Temp { id } => format!("t{}", id),
        VariableKind::NonTemp {
            symbol,
            ssa_generation,
        } => format!("{}_{}", ctx.symbols.variable(symbol).name, ssa_generation),
        VariableKind::MemoryAddress {
            symbol: Some(symbol),
            ..
        } => format!("&{}", ctx.symbols.variable(symbol).name),
        VariableKind::MemoryAddress {
            symbol: None,
            stack_region,
        } => match stack_region {
            Some(region) => format!("&stack[{}]", region.offset),
            None => "&?".to_string(),
        },
        VariableKind::LocalConstant { constant } => ctx.local_constant(constant).label(),
        VariableKind::FunctionAddress { function } => {
            ctx.symbols.function(function).name.clone()
        }
    }
}

/// Render a constant by its literal value
pub fn format_constant(ctx: &IrContext, id: ConstId) -> String {
    match ctx.constant(id) {
        ConstantValue::RelativeAddress(var) => format_variable(ctx, *var),
        other => other.to_string(),
    }
}

/// Render an abstract LEA form with concrete address-mode syntax
pub fn format_lea_form(ctx: &IrContext, form: &LeaForm) -> String {
    let var = |v: &VarId| format_variable(ctx, *v);
    let con = |c: &ConstId| format_constant(ctx, *c);
    match form {
        LeaForm::OffsetOnly { offset, base } => format!("{}({})", con(offset), var(base)),
        LeaForm::RegistersOnly { base, index } => format!("({}, {})", var(base), var(index)),
        LeaForm::RegistersAndScale { base, index, scale } => {
            format!("({}, {}, {})", var(base), var(index), scale)
        }
        LeaForm::RegistersAndOffset {
            offset,
            base,
            index,
        } => format!("{}({}, {})", con(offset), var(base), var(index)),
        LeaForm::RegistersOffsetAndScale {
            offset,
            base,
            index,
            scale,
        } => format!("{}({}, {}, {})", con(offset), var(base), var(index), scale),
        LeaForm::RipRelative { target } => format!("{}(%rip)", var(target)),
        LeaForm::RipRelativeWithOffset { offset, target } => {
            format!("{} + {}(%rip)", con(offset), var(target))
        }
        LeaForm::IndexAndScale { index, scale } => format!("(, {}, {})", var(index), scale),
        LeaForm::IndexOffsetAndScale {
            offset,
            index,
            scale,
        } => format!("{}(, {}, {})", con(offset), var(index), scale),
    }
}

/// Render one three-address statement
pub fn format_statement(ctx: &IrContext, statement: &Statement) -> String {
    let var = |v: &VarId| format_variable(ctx, *v);
    let con = |c: &ConstId| format_constant(ctx, *c);
    match statement {
        Statement::BinaryOp {
            assignee,
            op1,
            op,
            op2,
        } => format!("{} <- {} {} {}", var(assignee), var(op1), op, var(op2)),
        Statement::BinaryOpConst {
            assignee,
            op1,
            op,
            op2,
        } => format!("{} <- {} {} {}", var(assignee), var(op1), op, con(op2)),
        Statement::Assign { assignee, op1 } => format!("{} <- {}", var(assignee), var(op1)),
        Statement::AssignConst { assignee, constant } => {
            format!("{} <- {}", var(assignee), con(constant))
        }
        Statement::Ret { value: Some(value) } => format!("ret {}", var(value)),
        Statement::Ret { value: None } => "ret".to_string(),
        Statement::Jump { target } => format!("jmp {}", target.label()),
        Statement::Branch {
            if_target,
            else_target,
            branch,
            ..
        } => format!(
            "cbranch_{} {} else {}",
            branch,
            if_target.label(),
            else_target.label()
        ),
        Statement::Call {
            assignee,
            function,
            parameters,
        } => {
            let params = parameters.iter().map(|p| var(p)).collect::<Vec<_>>().join(", ");
            let call = format!("call {}({})", ctx.symbols.function(*function).name, params);
            match assignee {
                Some(assignee) => format!("{} <- {}", var(assignee), call),
                None => call,
            }
        }
        Statement::IndirectCall {
            assignee,
            callee,
            parameters,
        } => {
            let params = parameters.iter().map(|p| var(p)).collect::<Vec<_>>().join(", ");
            let call = format!("call *{}({})", var(callee), params);
            match assignee {
                Some(assignee) => format!("{} <- {}", var(assignee), call),
                None => call,
            }
        }
        Statement::Load { assignee, address } => {
            format!("load {} <- {}", var(assignee), var(address))
        }
        Statement::Store { address, source } => {
            format!("store {} <- {}", var(address), var(source))
        }
        Statement::LoadOff {
            assignee,
            address,
            offset,
        } => format!("load {} <- {}[{}]", var(assignee), var(address), con(offset)),
        Statement::StoreOff {
            address,
            offset,
            source,
        } => format!("store {}[{}] <- {}", var(address), con(offset), var(source)),
        Statement::Lea { assignee, form } => {
            format!("{} <- lea {}", var(assignee), format_lea_form(ctx, form))
        }
        Statement::Phi {
            assignee,
            parameters,
        } => {
            let params = parameters.iter().map(|p| var(p)).collect::<Vec<_>>().join(", ");
            format!("{} <- PHI({})", var(assignee), params)
        }
        Statement::Neg { assignee, op1 } => format!("{} <- neg {}", var(assignee), var(op1)),
        Statement::Not { assignee, op1 } => format!("{} <- not {}", var(assignee), var(op1)),
        Statement::LogicalNot { assignee, op1 } => {
            format!("{} <- logical_not {}", var(assignee), var(op1))
        }
        Statement::Inc { target } => format!("inc {}", var(target)),
        Statement::Dec { target } => format!("dec {}", var(target)),
        Statement::AsmInline { assembly } => format!("asm {{ {} }}", assembly),
        Statement::Idle => "idle".to_string(),
        Statement::TestIfNotZero { target } => format!("test_nz {}", var(target)),
        Statement::MemAccess {
            assignee,
            address,
            access,
        } => match access {
            MemoryAccessType::Write => format!("mem[{}] <- {}", var(address), var(assignee)),
            MemoryAccessType::Read => format!("{} <- mem[{}]", var(assignee), var(address)),
            MemoryAccessType::None => format!("mem[{}]", var(address)),
        },
        Statement::IndirJumpAddrCalc {
            assignee,
            jump_table,
            index,
            multiplier,
        } => format!(
            "{} <- {}(, {}, {})",
            var(assignee),
            jump_table.label(),
            var(index),
            multiplier
        ),
        Statement::IndirectJump { address } => format!("jmp *{}", var(address)),
        Statement::Clear { target } => format!("clear {}", var(target)),
        Statement::StackAlloc { bytes } => format!("stack_alloc {}", bytes),
        Statement::StackDealloc { bytes } => format!("stack_dealloc {}", bytes),
        Statement::SetNe { assignee } => format!("setne {}", var(assignee)),
    }
}

/// Render a block: its label followed by one indented statement per line
pub fn print_block(ctx: &IrContext, block: &BasicBlock) -> String {
    let mut out = format!("{}:\n", block.id.label());
    for &stmt in block.statements() {
        out.push_str("    ");
        out.push_str(&format_statement(ctx, ctx.statement(stmt)));
        out.push('\n');
    }
    out
}

/// Render a whole function in OIR form
pub fn print_function(ctx: &IrContext, function: &Function) -> String {
    let mut out = format!("{}:\n", ctx.symbols.function(function.symbol).name);
    for block in &function.blocks {
        out.push_str(&print_block(ctx, block));
    }
    out
}

/// Render every function of a module in OIR form
pub fn print_module(ctx: &IrContext, module: &Module) -> String {
    let mut out = String::new();
    for function in &module.functions {
        out.push_str(&print_function(ctx, function));
        out.push('\n');
    }
    out
}
