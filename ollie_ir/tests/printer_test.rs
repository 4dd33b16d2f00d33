//! Tests for the OIR pretty-printer

use ollie_ir::printer::{format_lea_form, format_statement, print_block};
use ollie_ir::{
    BasicType, Function, FunctionSymbol, IrContext, LeaForm, Operator, ParameterList, Polarity,
    VariableSymbol,
};
use pretty_assertions::assert_eq;

fn context() -> IrContext {
    IrContext::new()
}

#[test]
fn test_binary_op_renders_with_arrow() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let dst = ctx.temp(ty).expect("temp");
    let a = ctx.temp(ty).expect("temp");
    let b = ctx.temp(ty).expect("temp");
    let stmt = ctx.emit_binary_op(dst, a, Operator::Plus, b);

    assert_eq!(
        format_statement(&ctx, ctx.statement(stmt)),
        "t0 <- t1 + t2"
    );
}

#[test]
fn test_load_and_store_render_with_offsets() {
    let mut ctx = context();
    let i64_ty = ctx.types.basic(BasicType::I64);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", i64_ty));
    let base = ctx.temp(i64_ty).expect("temp");
    let value = ctx.var_ssa(x, 2).expect("var");
    let three = ctx.int_constant(3, i64_ty).expect("constant");

    let load = ctx.emit_load(base, value);
    assert_eq!(format_statement(&ctx, ctx.statement(load)), "load t0 <- x_2");

    let store = ctx.emit_store_off(base, three, value);
    assert_eq!(
        format_statement(&ctx, ctx.statement(store)),
        "store t0[3] <- x_2"
    );
}

#[test]
fn test_branch_renders_condition_and_both_targets() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let cond = ctx.temp(ty).expect("temp");
    let ret = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(ret, vec![]);
    let symbol = ctx.symbols.add_function(FunctionSymbol {
        name: "f".to_string(),
        signature,
    });
    let mut function = Function::new(symbol);
    let then_block = function.add_block(&mut ctx);
    let else_block = function.add_block(&mut ctx);

    let code = ollie_ir::select_branch(Operator::GreaterThan, Polarity::Normal, true);
    let stmt = ctx.emit_branch(then_block, else_block, cond, code);
    assert_eq!(
        format_statement(&ctx, ctx.statement(stmt)),
        "cbranch_g .L0 else .L1"
    );
}

#[test]
fn test_phi_renders_parameter_list() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", ty));
    let dst = ctx.temp(ty).expect("temp");
    let gen1 = ctx.var_ssa(x, 1).expect("var");
    let gen2 = ctx.var_ssa(x, 2).expect("var");

    let mut params = ParameterList::new();
    params.push(gen1);
    params.push(gen2);
    let stmt = ctx.emit_phi(dst, params);
    assert_eq!(
        format_statement(&ctx, ctx.statement(stmt)),
        "t0 <- PHI(x_1, x_2)"
    );
}

#[test]
fn test_lea_forms_render_address_mode_syntax() {
    let mut ctx = context();
    let i64_ty = ctx.types.basic(BasicType::I64);
    let base = ctx.temp(i64_ty).expect("temp");
    let index = ctx.temp(i64_ty).expect("temp");
    let eight = ctx.int_constant(8, i64_ty).expect("constant");

    let form = LeaForm::RegistersOffsetAndScale {
        offset: eight,
        base,
        index,
        scale: 4,
    };
    assert_eq!(format_lea_form(&ctx, &form), "8(t0, t1, 4)");

    let form = LeaForm::IndexAndScale { index, scale: 2 };
    assert_eq!(format_lea_form(&ctx, &form), "(, t1, 2)");

    let lc = ctx.string_local_constant("msg");
    let lc_var = ctx.local_constant_temp(lc);
    let form = LeaForm::RipRelative { target: lc_var };
    assert_eq!(format_lea_form(&ctx, &form), ".LC0(%rip)");
}

#[test]
fn test_call_renders_assignee_and_parameters() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(ty, vec![ty, ty]);
    let callee = ctx.symbols.add_function(FunctionSymbol {
        name: "max".to_string(),
        signature,
    });
    let dst = ctx.temp(ty).expect("temp");
    let a = ctx.temp(ty).expect("temp");
    let b = ctx.temp(ty).expect("temp");

    let mut params = ParameterList::new();
    params.push(a);
    params.push(b);
    let stmt = ctx.emit_call(Some(dst), callee, params);
    assert_eq!(
        format_statement(&ctx, ctx.statement(stmt)),
        "t0 <- call max(t1, t2)"
    );
}

#[test]
fn test_block_prints_label_and_indented_statements() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(ty, vec![]);
    let symbol = ctx.symbols.add_function(FunctionSymbol {
        name: "main".to_string(),
        signature,
    });
    let mut function = Function::new(symbol);
    let block_id = function.add_block(&mut ctx);

    let t = ctx.temp(ty).expect("temp");
    let one = ctx.int_constant(1, ty).expect("constant");
    let assign = ctx.emit_assign_const(t, one);
    let ret = ctx.emit_ret(Some(t));

    let block = function.block_mut(block_id).expect("block exists");
    block.append(&mut ctx, assign);
    block.append(&mut ctx, ret);

    let block = function.block(block_id).expect("block exists");
    assert_eq!(print_block(&ctx, block), ".L0:\n    t0 <- 1\n    ret t0\n");
}

#[test]
fn test_memory_address_prints_with_address_marker() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", ty));
    let addr = ctx.memory_address_var(x);
    let dst = ctx.temp(ty).expect("temp");

    let stmt = ctx.emit_load(dst, addr);
    assert_eq!(format_statement(&ctx, ctx.statement(stmt)), "load t0 <- &x");
}
