#![allow(non_snake_case)]
use RustedNumMethods::Utils::data_generation::random_system;
use RustedNumMethods::numerical::functions::ClosureFunction;
use RustedNumMethods::numerical::integration::{Integrator, QuadratureRule};
use RustedNumMethods::numerical::optimization::minimize_scalar::ScalarSearch;
use RustedNumMethods::somelinalg::dense_solvers::{LinearSolverMethod, LinearSystemSolver};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_linear_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense solvers 8x8");
    let Ok((A, b)) = random_system(8, -10.0, 10.0, Some(1)) else {
        return;
    };
    let solver = LinearSystemSolver::new();
    for method in [LinearSolverMethod::Gauss, LinearSolverMethod::GaussJordan, LinearSolverMethod::Cramer] {
        group.bench_function(method.to_string(), |bench| {
            bench.iter(|| solver.solve(method, black_box(&A), black_box(&b)))
        });
    }
    group.finish();
}

fn bench_root_scan(c: &mut Criterion) {
    let f = ClosureFunction::new(|x: f64| (3.0 * x).sin(), "sin(3x)");
    let solver = ScalarSearch::new();
    c.bench_function("root scan sin(3x) on [0, 20]", |bench| {
        bench.iter(|| solver.find_all_roots(&f, black_box(0.0), black_box(20.0)))
    });
}

fn bench_simpson(c: &mut Criterion) {
    let f = ClosureFunction::new(|x: f64| x.exp() * x.cos(), "exp(x)cos(x)");
    let integrator = Integrator::new();
    c.bench_function("adaptive Simpson", |bench| {
        bench.iter(|| integrator.integrate_adaptive(&f, 0.0, black_box(3.0), 1e-10, QuadratureRule::Simpson))
    });
}

criterion_group!(benches, bench_linear_solvers, bench_root_scan, bench_simpson);
criterion_main!(benches);
