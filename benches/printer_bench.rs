//! Lowering and printing benchmarks.
//!
//! Source trees are generated with `SourceBuilder`: `functions` function
//! declarations, each with `statements_per_fn` locals and a call per local,
//! followed by top-level calls that force hoisting.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tslua::{CompilerOptions, LuaTarget, SourceUnit, Transpiler};
use tslua_lowering::SymbolFlags;
use tslua_lowering::source::BinaryOperator;

// =============================================================================
// Generated sources
// =============================================================================

fn generate_unit(name: &str, functions: usize, statements_per_fn: usize) -> SourceUnit {
    let b = tslua::SourceBuilder::new();
    let mut statements = Vec::with_capacity(functions * 2);
    let mut function_symbols = Vec::with_capacity(functions);

    // Calls before the declarations so every function is hoisted.
    for f in 0..functions {
        let symbol = b.symbol(&format!("fn_{f}"), SymbolFlags::empty());
        function_symbols.push(symbol);
        statements.push(b.expression_statement(b.call(b.id(symbol), vec![b.number(f as f64)])));
    }

    for (f, symbol) in function_symbols.into_iter().enumerate() {
        let input = b.symbol("input", SymbolFlags::empty());
        let mut body = Vec::with_capacity(statements_per_fn * 2 + 1);
        let mut previous = b.id(input);
        for s in 0..statements_per_fn {
            let local = b.symbol(&format!("v{s}"), SymbolFlags::CONST);
            let value = b.binary(previous, BinaryOperator::Plus, b.number((f * s) as f64));
            body.push(b.const_(local, value));
            body.push(b.expression_statement(b.call_global("print", vec![b.string("value"), b.id(local)])));
            previous = b.id(local);
        }
        body.push(b.ret(Some(previous)));
        statements.push(b.function_declaration(symbol, vec![b.param(input)], body));
    }

    let (file, symbols) = b.finish(name, statements);
    SourceUnit { file, symbols }
}

fn options() -> CompilerOptions {
    CompilerOptions {
        lua_target: LuaTarget::Lua54,
        no_implicit_global_variables: true,
        ..CompilerOptions::default()
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_transpile_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpile_throughput");
    let transpiler = Transpiler::new(options());

    for (functions, statements_per_fn) in [(10, 10), (50, 20), (200, 20)] {
        let unit = generate_unit("bench.ts", functions, statements_per_fn);
        let bytes = unit.file.text.len() as u64;
        let label = format!("{functions}x{statements_per_fn}");

        group.throughput(Throughput::Bytes(bytes));
        group.bench_with_input(BenchmarkId::new("transpile", &label), &unit, |b, unit| {
            b.iter(|| black_box(transpiler.transpile(&unit.file, &unit.symbols)))
        });
    }

    group.finish();
}

fn bench_print_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("printer");
    let options = options();
    let unit = generate_unit("bench.ts", 100, 20);
    let lowered = tslua_lowering::transform_source_file(&unit.file, &unit.symbols, &options);

    group.bench_function("print", |b| {
        b.iter(|| black_box(tslua_printer::print(&lowered.file, &options, "bench.lua", "bench.ts")))
    });

    let traceback = CompilerOptions {
        source_map_traceback: true,
        inline_source_map: true,
        ..options.clone()
    };
    group.bench_function("print_with_traceback_and_inline_map", |b| {
        b.iter(|| black_box(tslua_printer::print(&lowered.file, &traceback, "bench.lua", "bench.ts")))
    });

    group.finish();
}

fn bench_transpile_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpile_files");
    let units: Vec<SourceUnit> = (0..32)
        .map(|i| generate_unit(&format!("src/file_{i}.ts"), 20, 10))
        .collect();
    let transpiler = Transpiler::new(CompilerOptions {
        source_map: true,
        ..options()
    });

    group.bench_function("parallel_32_files", |b| {
        b.iter(|| black_box(transpiler.transpile_files(&units)))
    });
    group.bench_function("sequential_32_files", |b| {
        b.iter(|| {
            let results: Vec<_> = units
                .iter()
                .map(|unit| transpiler.transpile(&unit.file, &unit.symbols))
                .collect();
            black_box(results)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_transpile_throughput,
    bench_print_only,
    bench_transpile_files
);
criterion_main!(benches);
