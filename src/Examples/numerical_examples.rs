use crate::Utils::data_generation::{noisy_polynomial_data, random_system};
use crate::Utils::solver_settings::SolverSettings;
use crate::Utils::statistics::statistics_table;
use crate::numerical::cancellation::CancellationToken;
use crate::numerical::error::DomainError;
use crate::numerical::functions::{ClosureFunction, ClosureVectorFunction, FallibleFunction};
use crate::numerical::integration::PartitionMode;
use crate::numerical::optimization::minimize_scalar::SearchMode;
use crate::numerical::optimization::newton_minimizer::find_good_starting_point;
use crate::numerical::optimization::polynomial_fit::fit_linear_and_quadratic;
use crate::somelinalg::dense_solvers::{LinearSolverMethod, RhsConvention, fastest, matrix_from_rows, vector_from_slice};
use crate::somelinalg::linear_sys_diagnostics::{hilbert_matrix, linear_system_diagnostics};
use nalgebra::DVector;
use std::thread;
use std::time::Duration;
use strum::IntoEnumIterator;

/// every solver is built from `settings`, so a settings file passed to the binary changes the runs
pub fn numerical_examples(example: usize, settings: &SolverSettings) {
    match example {
        0 => {
            // bisection: one root and a scan for every root on the interval
            let f = ClosureFunction::new(|x: f64| x * x * x - 2.0 * x - 5.0, "x^3-2x-5");
            let solver = settings.bisection_solver();
            match solver.bisection(&f, 2.0, 3.0) {
                Ok(result) => println!("{}", statistics_table(&result.statistics())),
                Err(e) => println!("bisection failed: {}", e),
            }
            let g = ClosureFunction::new(|x: f64| x.sin(), "sin(x)");
            match solver.find_all_roots(&g, -1.0, 10.0) {
                Ok(scan) => println!("roots of sin(x) on [-1, 10]: {:?}", scan.roots),
                Err(e) => println!("root scan failed: {}", e),
            }
        }
        1 => {
            // golden section: minimum, maximum and root of the same function
            let f = ClosureFunction::new(|x: f64| (x - 1.0).powi(2) - 4.0, "(x-1)^2-4");
            let solver = settings.golden_section_solver();
            for mode in SearchMode::iter() {
                let (a, b) = match mode {
                    SearchMode::Root => (1.0, 5.0),
                    _ => (-2.0, 4.0),
                };
                match solver.golden_section(&f, a, b, mode) {
                    Ok(result) => {
                        let (x, y) = result.rounded();
                        println!("{} on [{}, {}]: x = {}, f(x) = {}", mode, a, b, x, y);
                    }
                    Err(e) => println!("{} failed: {}", mode, e),
                }
            }
            let wave = ClosureFunction::new(|x: f64| x.cos() + 0.01 * x, "cos(x)+0.01x");
            if let Ok(extrema) = solver.find_all_extrema(&wave, 0.0, 12.0, SearchMode::Minimum) {
                let points: Vec<f64> = extrema.iter().map(|r| r.rounded().0).collect();
                println!("local minima of cos(x)+0.01x on [0, 12]: {:?}", points);
            }
        }
        2 => {
            // Newton minimization with a starting point picked by sampling
            let f = FallibleFunction::new(
                |x: f64| {
                    if x <= 0.0 {
                        Err(DomainError::at_point(x, "ln(x) needs x > 0"))
                    } else {
                        Ok(x - x.ln())
                    }
                },
                "x-ln(x)",
            );
            let minimizer = settings.newton_minimizer();
            let result = find_good_starting_point(&f, 0.1, 5.0)
                .and_then(|x0| minimizer.minimize(&f, x0, 0.1, 5.0));
            match result {
                Ok(result) => println!("{}", statistics_table(&result.statistics())),
                Err(e) => println!("Newton failed: {}", e),
            }
        }
        3 => {
            // coordinate descent on a shifted paraboloid in 2 and 3 variables
            let f2 = ClosureVectorFunction::new(
                |x: &DVector<f64>| (x[0] - 1.0).powi(2) + 2.0 * (x[1] + 0.5).powi(2),
                "paraboloid2",
            );
            let f3 = ClosureVectorFunction::new(
                |x: &DVector<f64>| x[0].powi(2) + (x[1] - 2.0).powi(2) + (x[2] + 1.0).powi(2),
                "paraboloid3",
            );
            let solver = settings.coordinate_descent();
            let start2 = DVector::from_vec(vec![3.0, 3.0]);
            match solver.minimize(&f2, &start2, &[(-5.0, 5.0), (-5.0, 5.0)]) {
                Ok(result) => println!("{}", statistics_table(&result.statistics())),
                Err(e) => println!("coordinate descent failed: {}", e),
            }
            let start3 = DVector::from_vec(vec![1.0, 1.0, 1.0]);
            match solver.minimize(&f3, &start3, &[(-3.0, 3.0); 3]) {
                Ok(result) => println!("3D minimum at {:?}", result.point.as_slice()),
                Err(e) => println!("coordinate descent failed: {}", e),
            }
        }
        4 => {
            // dense linear systems: the configured methods on the same system, both sign conventions
            let rows = vec![
                vec![2.0, 1.0, -1.0],
                vec![-3.0, -1.0, 2.0],
                vec![-2.0, 1.0, 2.0],
            ];
            let A = match matrix_from_rows(&rows) {
                Ok(A) => A,
                Err(e) => {
                    println!("bad matrix: {}", e);
                    return;
                }
            };
            let mut solver = settings.linear_solver();
            solver.set_convention(RhsConvention::Standard);
            let b = vector_from_slice(&[8.0, -11.0, -3.0]);
            let outcomes = solver.solve_all(&settings.linear_methods, &A, &b);
            if let Some(best) = fastest(&outcomes) {
                println!("fastest method: {}", best.method);
            }
            solver.set_convention(RhsConvention::Negated);
            let negated_b = -b.clone();
            match solver.gauss_elimination(&A, &negated_b) {
                Ok(x) => println!("A*x + b = 0 with negated b: x = {:?}", x.as_slice()),
                Err(e) => println!("failed: {}", e),
            }
            let hilbert = hilbert_matrix(8);
            let ones = DVector::from_element(8, 1.0);
            println!("{:?}", linear_system_diagnostics(&hilbert, &ones, 1e5));
        }
        5 => {
            // larger random system, diagonally dominant so every method succeeds
            match random_system(8, -10.0, 10.0, Some(2024)) {
                Ok((A, b)) => {
                    settings.linear_solver().solve_all(&settings.linear_methods, &A, &b);
                }
                Err(e) => println!("failed: {}", e),
            }
        }
        6 => {
            // quadrature: the configured rules and partition mode, then a fixed n for comparison
            let f = ClosureFunction::new(|x: f64| x.exp() * x.sin(), "exp(x)sin(x)");
            let integrator = settings.integrator();
            let rules = &settings.integration.rules;
            let outcomes = integrator.integrate_all(&f, 0.0, 2.0, settings.integration.mode, rules);
            for outcome in &outcomes {
                if let Ok(result) = &outcome.result {
                    println!("{}: {} estimates", outcome.rule, result.estimates);
                }
            }
            integrator.integrate_all(&f, 0.0, 2.0, PartitionMode::Fixed(100), rules);
        }
        7 => {
            // least squares of degree 1 and 2 on noisy data
            let points = match noisy_polynomial_data(&[1.0, -2.0, 0.5], -4.0, 4.0, 30, 0.2, Some(7)) {
                Ok(points) => points,
                Err(e) => {
                    println!("failed: {}", e);
                    return;
                }
            };
            match fit_linear_and_quadratic(&points) {
                Ok((linear, quadratic)) => {
                    println!("linear:    {}  R² = {:.5}", linear.equation(), linear.r_squared);
                    println!("quadratic: {}  R² = {:.5}", quadratic.equation(), quadratic.r_squared);
                }
                Err(e) => println!("fit failed: {}", e),
            }
        }
        8 => {
            // settings written inline instead of a file
            let document = "
                // demo settings
                bisection tolerance: 1e-10 max_iterations: 200
                integration rules: Simpson, Trapezoidal tolerance: 1e-9
            ";
            match document.parse::<SolverSettings>() {
                Ok(inline) => {
                    let f = ClosureFunction::new(|x: f64| x.cos() - x, "cos(x)-x");
                    if let Ok(result) = inline.bisection_solver().bisection(&f, 0.0, 1.0) {
                        println!("cos(x) = x at {} ({} iterations)", result.point, result.iterations);
                    }
                    inline.integrator().integrate_all(
                        &f,
                        0.0,
                        1.0,
                        inline.integration.mode,
                        &inline.integration.rules,
                    );
                }
                Err(e) => println!("bad settings: {}", e),
            }
        }
        9 => {
            // Cramer's rule on 10 unknowns runs for seconds; the main thread cancels it midway
            let (A, b) = match random_system(10, -10.0, 10.0, Some(9)) {
                Ok(system) => system,
                Err(e) => {
                    println!("failed: {}", e);
                    return;
                }
            };
            let token = CancellationToken::new();
            let mut solver = settings.linear_solver();
            solver.set_cramer_max_dimension(10);
            solver.set_cancellation(token.clone());
            let worker = thread::spawn(move || solver.solve(LinearSolverMethod::Cramer, &A, &b));
            thread::sleep(Duration::from_millis(100));
            token.cancel();
            match worker.join() {
                Ok(Ok(x)) => println!("finished before cancellation: {:?}", x.as_slice()),
                Ok(Err(e)) => println!("stopped: {}", e),
                Err(_) => println!("worker thread panicked"),
            }
        }
        _ => println!("no example with number {}", example),
    }
}
