//! Instruction selection performance benchmarks

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

use ollie_codegen::{AsmPrinter, InstructionSelector};
use ollie_ir::{
    BasicType, Function, FunctionSymbol, IrContext, Module, Operator, VariableSymbol,
};

/// Build a module with a long straight-line block of mixed arithmetic
fn build_benchmark_module(statements_per_block: usize) -> (IrContext, Module) {
    let mut ctx = IrContext::new();
    let i32_ty = ctx.types.basic(BasicType::I32);
    let signature = ctx.types.function(i32_ty, vec![i32_ty, i32_ty]);
    let symbol = ctx.symbols.add_function(FunctionSymbol {
        name: "hot_loop_body".to_string(),
        signature,
    });

    let a = ctx.symbols.add_variable(VariableSymbol::new("a", i32_ty));
    let b = ctx.symbols.add_variable(VariableSymbol::new("b", i32_ty));
    let a = ctx.var(a).expect("var");
    let b = ctx.var(b).expect("var");

    let mut module = Module::new("benchmark");
    let mut function = Function::new(symbol);
    let entry = function.add_block(&mut ctx);

    let operators = [
        Operator::Plus,
        Operator::Minus,
        Operator::Star,
        Operator::BitwiseAnd,
        Operator::BitwiseXor,
        Operator::Slash,
    ];
    let mut statements = Vec::with_capacity(statements_per_block + 1);
    let mut previous = a;
    for i in 0..statements_per_block {
        let dst = ctx.temp(i32_ty).expect("temp");
        let op = operators[i % operators.len()];
        statements.push(ctx.emit_binary_op(dst, previous, op, b));
        previous = dst;
    }
    statements.push(ctx.emit_ret(Some(previous)));

    let block = function.block_mut(entry).expect("block exists");
    for stmt in statements {
        block.append(&mut ctx, stmt);
    }
    module.add_function(function);
    (ctx, module)
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("instruction_selection");
    group.measurement_time(Duration::from_secs(10));

    for size in [100usize, 1_000, 10_000] {
        group.bench_function(format!("select_{}_statements", size), |bencher| {
            let (mut ctx, module) = build_benchmark_module(size);
            bencher.iter(|| {
                let mut selector = InstructionSelector::new(&mut ctx);
                let selected = selector
                    .select_module(black_box(&module))
                    .expect("selection succeeds");
                black_box(selected)
            });
        });
    }
    group.finish();
}

fn bench_printing(c: &mut Criterion) {
    let (mut ctx, module) = build_benchmark_module(1_000);
    let selected = {
        let mut selector = InstructionSelector::new(&mut ctx);
        selector.select_module(&module).expect("selection succeeds")
    };

    c.bench_function("print_1000_statement_module", |bencher| {
        bencher.iter(|| {
            let printer = AsmPrinter::new(&ctx);
            black_box(printer.print_module(black_box(&selected)))
        });
    });
}

criterion_group!(benches, bench_selection, bench_printing);
criterion_main!(benches);
