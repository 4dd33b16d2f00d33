//! Tests for module JSON snapshots

use ollie_ir::{BasicType, Function, FunctionSymbol, IrContext, Module, Operator};

fn build_module(ctx: &mut IrContext) -> Module {
    let ty = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(ty, vec![]);
    let symbol = ctx.symbols.add_function(FunctionSymbol {
        name: "main".to_string(),
        signature,
    });

    let mut module = Module::new("snapshot");
    let mut function = Function::new(symbol);
    let entry = function.add_block(ctx);

    let dst = ctx.temp(ty).expect("temp");
    let a = ctx.temp(ty).expect("temp");
    let b = ctx.temp(ty).expect("temp");
    let add = ctx.emit_binary_op(dst, a, Operator::Plus, b);
    let ret = ctx.emit_ret(Some(dst));

    let block = function.block_mut(entry).expect("block exists");
    block.append(ctx, add);
    block.append(ctx, ret);

    module.add_function(function);
    module
}

#[test]
fn test_module_round_trips_through_json() {
    let mut ctx = IrContext::new();
    let module = build_module(&mut ctx);

    let json = module.to_json().expect("serialization should succeed");
    let restored = Module::from_json(&json).expect("deserialization should succeed");

    assert_eq!(restored.name, module.name);
    assert_eq!(restored.functions.len(), 1);
    let original = &module.functions[0];
    let round_tripped = &restored.functions[0];
    assert_eq!(round_tripped.symbol, original.symbol);
    assert_eq!(round_tripped.blocks.len(), original.blocks.len());
    assert_eq!(
        round_tripped.blocks[0].statements(),
        original.blocks[0].statements(),
        "statement handles must survive the round trip in order"
    );
}

#[test]
fn test_snapshot_contains_block_labels() {
    let mut ctx = IrContext::new();
    let module = build_module(&mut ctx);

    let json = module.to_json().expect("serialization should succeed");
    assert!(
        json.contains("\"functions\""),
        "the snapshot lists functions"
    );
    assert!(json.contains("snapshot"), "the snapshot keeps the name");
}

#[test]
fn test_malformed_snapshot_is_a_typed_error() {
    let err = Module::from_json("{ not json").expect_err("garbage must not parse");
    assert!(
        err.to_string().contains("deserialization failed"),
        "the error should describe the failure: {}",
        err
    );
}
