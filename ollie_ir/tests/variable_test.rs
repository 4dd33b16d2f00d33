//! Tests for the variable emitters and the variable equality rules

use ollie_ir::{
    BasicType, IrContext, ParameterClass, StackRegion, VariableKind, VariableSize, VariableSymbol,
};

fn context() -> IrContext {
    IrContext::new()
}

#[test]
fn test_temp_ids_are_monotonic_and_distinct() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);

    let t0 = ctx.temp(ty).expect("temp should allocate");
    let t1 = ctx.temp(ty).expect("temp should allocate");

    let (id0, id1) = match (ctx.variable(t0).kind, ctx.variable(t1).kind) {
        (VariableKind::Temp { id: a }, VariableKind::Temp { id: b }) => (a, b),
        other => panic!("expected two temps, found {:?}", other),
    };
    assert!(id1 > id0, "temp ids must increase monotonically");
    assert!(
        !ctx.variable(t0).equals(ctx.variable(t1)),
        "distinct temps must not compare equal"
    );
}

#[test]
fn test_temp_size_follows_type() {
    let mut ctx = context();
    let i16_ty = ctx.types.basic(BasicType::I16);
    let f64_ty = ctx.types.basic(BasicType::F64);

    let word = ctx.temp(i16_ty).expect("temp should allocate");
    let dbl = ctx.temp(f64_ty).expect("temp should allocate");

    assert_eq!(ctx.variable(word).size, VariableSize::Word);
    assert_eq!(ctx.variable(dbl).size, VariableSize::DoublePrecision);
}

#[test]
fn test_ssa_generations_of_one_symbol_are_distinct_variables() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I32);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", ty));

    let gen1 = ctx.var_ssa(x, 1).expect("var should allocate");
    let gen2 = ctx.var_ssa(x, 2).expect("var should allocate");
    let gen1_again = ctx.var_ssa(x, 1).expect("var should allocate");

    assert!(
        !ctx.variable(gen1).equals(ctx.variable(gen2)),
        "different SSA generations must not compare equal"
    );
    assert!(
        ctx.variable(gen1).equals_no_ssa(ctx.variable(gen2)),
        "generations of one symbol must compare equal without SSA"
    );
    assert!(
        ctx.variable(gen1).equals(ctx.variable(gen1_again)),
        "the same symbol and generation must compare equal"
    );
}

#[test]
fn test_parameter_alias_is_substituted() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I64);

    let implementation = ctx
        .symbols
        .add_variable(VariableSymbol::new("n_impl", ty).with_stack_region(StackRegion {
            offset: -8,
            size: 8,
        }));
    let mut parameter = VariableSymbol::new("n", ty).with_parameter(ParameterClass::Integer, 0);
    parameter.alias = Some(implementation);
    let parameter = ctx.symbols.add_variable(parameter);

    let v = ctx.var(parameter).expect("var should allocate");
    assert_eq!(
        ctx.variable(v).symbol(),
        Some(implementation),
        "emitting a variable for an aliased parameter must substitute the alias"
    );
}

#[test]
fn test_inferred_type_overrides_declared_type() {
    let mut ctx = context();
    let declared = ctx.types.basic(BasicType::I32);
    let inferred = ctx.types.basic(BasicType::I64);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", declared));

    let v = ctx
        .var_from_identifier(x, inferred)
        .expect("var should allocate");
    assert_eq!(ctx.variable(v).defined_type, inferred);
    assert_eq!(ctx.variable(v).size, VariableSize::QuadWord);
}

#[test]
fn test_memory_address_variables_are_quad_word() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::I8);
    let x = ctx
        .symbols
        .add_variable(VariableSymbol::new("x", ty).with_stack_region(StackRegion {
            offset: -16,
            size: 1,
        }));

    let addr = ctx.memory_address_var(x);
    let variable = ctx.variable(addr);
    assert_eq!(
        variable.size,
        VariableSize::QuadWord,
        "an address is always quad-word sized"
    );
    match variable.kind {
        VariableKind::MemoryAddress {
            symbol: Some(symbol),
            stack_region: Some(region),
        } => {
            assert_eq!(symbol, x);
            assert_eq!(region.offset, -16);
        }
        ref other => panic!("expected a memory address kind, found {:?}", other),
    }
}

#[test]
fn test_local_constant_temp_bumps_reference_count() {
    let mut ctx = context();
    let lc = ctx.string_local_constant("hello");
    assert_eq!(ctx.local_constant(lc).reference_count, 0);

    let v1 = ctx.local_constant_temp(lc);
    let v2 = ctx.local_constant_temp(lc);

    assert_eq!(ctx.local_constant(lc).reference_count, 2);
    assert_eq!(ctx.variable(v1).size, VariableSize::QuadWord);
    assert!(
        ctx.variable(v1).equals(ctx.variable(v2)),
        "two references to one pool entry compare equal"
    );
}

#[test]
fn test_function_pointer_temp_uses_signature_type() {
    let mut ctx = context();
    let ret = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(ret, vec![]);
    let f = ctx.symbols.add_function(ollie_ir::FunctionSymbol {
        name: "callback".to_string(),
        signature,
    });

    let fp = ctx.function_pointer_temp(f);
    assert_eq!(ctx.variable(fp).defined_type, signature);
    assert_eq!(ctx.variable(fp).size, VariableSize::QuadWord);
}

#[test]
fn test_var_copy_preserves_kind_and_generation() {
    let mut ctx = context();
    let ty = ctx.types.basic(BasicType::U32);
    let x = ctx.symbols.add_variable(VariableSymbol::new("x", ty));

    let original = ctx.var_ssa(x, 3).expect("var should allocate");
    ctx.variable_mut(original).is_stack_pointer = true;
    let copy = ctx.var_copy(original);

    assert!(
        ctx.variable(copy).equals(ctx.variable(original)),
        "a copy compares equal to its source"
    );
    assert_eq!(ctx.variable(copy).ssa_generation(), Some(3));
    assert!(ctx.variable(copy).is_stack_pointer);
}

#[test]
fn test_temp_from_live_range_links_both_directions() {
    let mut ctx = context();
    let lr = ctx.new_live_range();

    let t = ctx.temp_from_live_range(lr);

    assert_eq!(ctx.variable(t).live_range, Some(lr));
    assert!(
        ctx.live_range(lr).variables.contains(&t),
        "the live range must list the new temp"
    );
    assert_eq!(ctx.variable(t).size, VariableSize::QuadWord);
}
