use RustedVarParam::Utils::config::SolverConfig;
use RustedVarParam::ode::vop_solver::VariationOfParameters;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn quiet() -> SolverConfig {
    SolverConfig {
        loglevel: Some("off".to_string()),
        ..SolverConfig::default()
    }
}

fn solve_with_conditions(equation: &str, conditions: &[&str]) {
    let mut solver = VariationOfParameters::with_config(equation, quiet()).unwrap();
    solver.solve().unwrap();
    solver.apply_condition_strings(conditions).unwrap();
}

fn bench_second_order(c: &mut Criterion) {
    c.bench_function("y'' - 2y' + y = e^x", |b| {
        b.iter(|| solve_with_conditions(black_box("y'' - 2y' + y = e^x"), &["y(0) = 1", "y'(0) = 0"]))
    });
    c.bench_function("y'' + y = 1/cos(x)", |b| {
        b.iter(|| solve_with_conditions(black_box("y'' + y = 1/cos(x)"), &["y(0) = 1", "y'(0) = 0"]))
    });
}

fn bench_fourth_order(c: &mut Criterion) {
    c.bench_function("y'''' + 2y'' + y = x cos(x)", |b| {
        b.iter(|| {
            solve_with_conditions(
                black_box("y'''' + 2y'' + y = x cos(x)"),
                &["y(0) = 0", "y'(0) = 0", "y''(0) = 0", "y'''(0) = 1"],
            )
        })
    });
}

criterion_group!(benches, bench_second_order, bench_fourth_order);
criterion_main!(benches);
