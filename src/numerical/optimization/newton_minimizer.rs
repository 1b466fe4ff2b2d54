//! Newton iteration for stationary points of f(x) with derivatives estimated by central differences.
//! Steps are kept inside the bounding interval [a, b].
use crate::Utils::formatting::{decimal_places, round_to};
use crate::Utils::statistics::log_statistics;
use crate::numerical::cancellation::{CancellationToken, check_cancelled};
use crate::numerical::error::{DomainError, NumericalError, validate_interval};
use crate::numerical::functions::ScalarFunction;
use log::{debug, info, warn};
use strum_macros::Display;

/// number of samples of the starting-point scan
pub const STARTING_POINT_SAMPLES: usize = 20;
/// share of samples that must be finite for a function to be considered usable on an interval
pub const USABLE_SHARE: f64 = 0.7;

/// What kind of stationary point the method stopped at, judged by the sign of f''
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StationaryKind {
    Minimum,
    Maximum,
    Saddle,
}

impl StationaryKind {
    pub fn from_curvature(second_derivative: f64) -> Self {
        if second_derivative > 0.0 {
            StationaryKind::Minimum
        } else if second_derivative < 0.0 {
            StationaryKind::Maximum
        } else {
            StationaryKind::Saddle
        }
    }
}

/// Why the iteration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NewtonTermination {
    /// |f'(x)| < tolerance
    GradientSmall,
    /// |x_new - x| < tolerance
    StepSmall,
    /// |f''(x)| below the curvature threshold, the Newton step is undefined
    FlatCurvature,
    MaxIterations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewtonIteration {
    pub iteration: usize,
    pub x: f64,
    pub value: f64,
    pub first_derivative: f64,
    pub second_derivative: f64,
}

#[derive(Debug, Clone)]
pub struct NewtonConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub first_derivative_step: f64,
    pub second_derivative_step: f64,
    pub min_curvature: f64,
    pub keep_history: bool,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            first_derivative_step: 1e-5,
            second_derivative_step: 1e-4,
            min_curvature: 1e-12,
            keep_history: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewtonResult {
    pub point: f64,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
    pub kind: StationaryKind,
    pub termination: NewtonTermination,
    pub final_first_derivative: f64,
    pub final_second_derivative: f64,
    pub tolerance: f64,
    pub history: Vec<NewtonIteration>,
}

impl NewtonResult {
    pub fn is_minimum(&self) -> bool {
        self.converged && self.kind == StationaryKind::Minimum
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let places = decimal_places(self.tolerance);
        vec![
            ("point".to_string(), round_to(self.point, places).to_string()),
            ("value".to_string(), round_to(self.value, places).to_string()),
            ("iterations".to_string(), self.iterations.to_string()),
            ("converged".to_string(), self.converged.to_string()),
            ("stationary point".to_string(), self.kind.to_string()),
            ("termination".to_string(), self.termination.to_string()),
            ("f'(x)".to_string(), format!("{:e}", self.final_first_derivative)),
            ("f''(x)".to_string(), format!("{:e}", self.final_second_derivative)),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewtonMinimizer {
    config: NewtonConfig,
    cancellation: Option<CancellationToken>,
}

impl NewtonMinimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NewtonConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn set_derivative_steps(&mut self, first: f64, second: f64) {
        self.config.first_derivative_step = first;
        self.config.second_derivative_step = second;
    }

    pub fn set_keep_history(&mut self, keep_history: bool) {
        self.config.keep_history = keep_history;
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// central difference (f(x+h) - f(x-h)) / 2h
    pub fn first_derivative<F>(&self, function: &F, x: f64) -> Result<f64, DomainError>
    where
        F: ScalarFunction + ?Sized,
    {
        let h = self.config.first_derivative_step;
        let f_plus = function.evaluate(x + h)?;
        let f_minus = function.evaluate(x - h)?;
        Ok((f_plus - f_minus) / (2.0 * h))
    }

    /// central difference (f(x+h) - 2f(x) + f(x-h)) / h^2
    pub fn second_derivative<F>(&self, function: &F, x: f64, fx: f64) -> Result<f64, DomainError>
    where
        F: ScalarFunction + ?Sized,
    {
        let h = self.config.second_derivative_step;
        let f_plus = function.evaluate(x + h)?;
        let f_minus = function.evaluate(x - h)?;
        Ok((f_plus - 2.0 * fx + f_minus) / (h * h))
    }

    fn validate(&self, x0: f64, a: f64, b: f64) -> Result<(), NumericalError> {
        validate_interval(a, b, self.config.tolerance)?;
        if !x0.is_finite() {
            return Err(NumericalError::InvalidInput(format!(
                "initial point must be finite, got {}",
                x0
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(NumericalError::InvalidInput(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.config.first_derivative_step > 0.0) || !(self.config.second_derivative_step > 0.0) {
            return Err(NumericalError::InvalidInput(
                "derivative steps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Newton iteration x_{n+1} = x_n - f'(x_n) / f''(x_n) started at x0.
    /// [a, b] only bounds the steps; x0 itself may lie anywhere.
    pub fn minimize<F>(&self, function: &F, x0: f64, a: f64, b: f64) -> Result<NewtonResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        self.validate(x0, a, b)?;
        let tolerance = self.config.tolerance;
        let width = b - a;
        info!(
            "Newton minimization of {} from x0 = {} on [{}, {}]",
            function.name(),
            x0,
            a,
            b
        );

        let mut history = Vec::new();
        let mut x = x0;
        let mut iterations = 0;
        let mut termination = NewtonTermination::MaxIterations;
        let mut last_curvature = 0.0;

        while iterations < self.config.max_iterations {
            check_cancelled(&self.cancellation)?;
            let fx = function.evaluate(x)?;
            let d1 = self.first_derivative(function, x)?;
            let d2 = self.second_derivative(function, x, fx)?;
            iterations += 1;
            last_curvature = d2;
            if self.config.keep_history {
                history.push(NewtonIteration {
                    iteration: iterations,
                    x,
                    value: fx,
                    first_derivative: d1,
                    second_derivative: d2,
                });
            }
            debug!("iteration {}: x = {}, f = {}, f' = {}, f'' = {}", iterations, x, fx, d1, d2);

            if d1.abs() < tolerance {
                termination = NewtonTermination::GradientSmall;
                break;
            }
            if d2.abs() < self.config.min_curvature {
                warn!(
                    "second derivative {} is too small at x = {}, Newton step may diverge",
                    d2, x
                );
                termination = NewtonTermination::FlatCurvature;
                break;
            }

            let mut step = -d1 / d2;
            if step.abs() > width {
                step = step.signum() * width * 0.5;
            }
            let mut x_new = x + step;
            if x_new < a {
                x_new = a + width * 0.01;
            }
            if x_new > b {
                x_new = b - width * 0.01;
            }

            let displacement = (x_new - x).abs();
            x = x_new;
            if displacement < tolerance {
                termination = NewtonTermination::StepSmall;
                break;
            }
        }

        let converged = matches!(
            termination,
            NewtonTermination::GradientSmall | NewtonTermination::StepSmall
        );
        if termination == NewtonTermination::MaxIterations {
            warn!(
                "Newton method reached {} iterations without convergence",
                self.config.max_iterations
            );
        }

        let value = function.evaluate(x)?;
        let final_first_derivative = self.first_derivative(function, x)?;
        let final_second_derivative = self.second_derivative(function, x, value)?;
        let kind = match termination {
            // the curvature of the last completed step decides the kind
            NewtonTermination::GradientSmall | NewtonTermination::StepSmall => {
                StationaryKind::from_curvature(last_curvature)
            }
            _ => StationaryKind::from_curvature(final_second_derivative),
        };

        let result = NewtonResult {
            point: x,
            value,
            iterations,
            converged,
            kind,
            termination,
            final_first_derivative,
            final_second_derivative,
            tolerance,
            history,
        };
        if log::log_enabled!(log::Level::Debug) {
            log_statistics("NEWTON METHOD STATISTICS", &result.statistics());
        }
        Ok(result)
    }
}

/// Sample [a, b] at 21 evenly spaced points and return the one with the lowest finite value;
/// the midpoint when the function is undefined everywhere on the grid
pub fn find_good_starting_point<F>(function: &F, a: f64, b: f64) -> Result<f64, NumericalError>
where
    F: ScalarFunction + ?Sized,
{
    if !a.is_finite() || !b.is_finite() || a >= b {
        return Err(NumericalError::InvalidInterval { a, b, epsilon: 0.0 });
    }
    let step = (b - a) / STARTING_POINT_SAMPLES as f64;
    let best = (0..=STARTING_POINT_SAMPLES)
        .map(|i| a + i as f64 * step)
        .filter_map(|x| function.evaluate(x).ok().map(|fx| (x, fx)))
        .min_by(|p, q| p.1.total_cmp(&q.1));
    Ok(match best {
        Some((x, _)) => x,
        None => (a + b) / 2.0,
    })
}

/// true when at least 70% of 11 evenly spaced samples on [a, b] are finite and below 1e10 in magnitude
pub fn usable_on_interval<F>(function: &F, a: f64, b: f64) -> bool
where
    F: ScalarFunction + ?Sized,
{
    let samples = 10;
    let step = (b - a) / samples as f64;
    let valid = (0..=samples)
        .filter(|&i| {
            function
                .evaluate(a + i as f64 * step)
                .map(|fx| fx.abs() < 1e10)
                .unwrap_or(false)
        })
        .count();
    valid as f64 >= samples as f64 * USABLE_SHARE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::functions::{ClosureFunction, FallibleFunction};
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_minimum() {
        let minimizer = NewtonMinimizer::new();
        let func = ClosureFunction::new(|x| x * x - 4.0 * x + 5.0, "x^2 - 4x + 5");
        let result = minimizer.minimize(&func, 0.0, -10.0, 10.0).unwrap();
        assert!(result.converged);
        assert!(result.is_minimum());
        assert_relative_eq!(result.point, 2.0, epsilon = 1e-5);
        assert_relative_eq!(result.value, 1.0, epsilon = 1e-8);
        assert_eq!(result.history.len(), result.iterations);
        assert_eq!(result.history[0].x, 0.0);
    }

    #[test]
    fn test_quartic_minimum() {
        let minimizer = NewtonMinimizer::new();
        // f'(x) = 4(x-1)^3 + 2(x-1): single minimum at x = 1
        let func = ClosureFunction::new(
            |x: f64| (x - 1.0).powi(4) + (x - 1.0).powi(2),
            "(x-1)^4 + (x-1)^2",
        );
        let result = minimizer.minimize(&func, 3.0, -5.0, 5.0).unwrap();
        assert!(result.converged);
        assert_eq!(result.kind, StationaryKind::Minimum);
        assert_relative_eq!(result.point, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_maximum_is_classified() {
        let minimizer = NewtonMinimizer::new();
        let func = ClosureFunction::new(|x| -(x - 1.0) * (x - 1.0) + 3.0, "-(x-1)^2 + 3");
        let result = minimizer.minimize(&func, 0.0, -5.0, 5.0).unwrap();
        assert!(result.converged);
        assert_eq!(result.kind, StationaryKind::Maximum);
        assert!(!result.is_minimum());
        assert_relative_eq!(result.point, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_flat_curvature_stops_without_convergence() {
        let minimizer = NewtonMinimizer::new();
        // symmetric samples around 0 make the second difference exactly zero
        let func = ClosureFunction::new(|x| 2.0 * x, "2x");
        let result = minimizer.minimize(&func, 0.0, -1.0, 1.0).unwrap();
        assert!(!result.converged);
        assert_eq!(result.termination, NewtonTermination::FlatCurvature);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.point, 0.0);
        assert_eq!(result.kind, StationaryKind::Saddle);
    }

    #[test]
    fn test_steps_stay_inside_bounds() {
        let minimizer = NewtonMinimizer::new();
        // minimum at 10 lies outside [0, 4]: the iterate is pulled back 1% inside b and stays there
        let func = ClosureFunction::new(|x| (x - 10.0) * (x - 10.0), "(x-10)^2");
        let result = minimizer.minimize(&func, 1.0, 0.0, 4.0).unwrap();
        assert_eq!(result.termination, NewtonTermination::StepSmall);
        assert_eq!(result.history.len(), 3);
        for record in &result.history[1..] {
            assert!(record.x >= 0.0 && record.x <= 4.0);
        }
        assert_relative_eq!(result.point, 4.0 - 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let mut minimizer = NewtonMinimizer::new();
        minimizer.set_max_iterations(2);
        let func = ClosureFunction::new(|x| (x - 10.0) * (x - 10.0), "(x-10)^2");
        let result = minimizer.minimize(&func, 1.0, 0.0, 4.0).unwrap();
        assert!(!result.converged);
        assert_eq!(result.termination, NewtonTermination::MaxIterations);
        assert_eq!(result.iterations, 2);
        assert_relative_eq!(result.point, 3.96, epsilon = 1e-12);
    }

    #[test]
    fn test_domain_error_at_iterate_surfaces() {
        let minimizer = NewtonMinimizer::new();
        let func = FallibleFunction::new(
            |x: f64| {
                if x <= 0.0 {
                    Err(DomainError::at_point(x, "log of non-positive number"))
                } else {
                    Ok(x - x.ln())
                }
            },
            "x - ln(x)",
        );
        assert!(matches!(
            minimizer.minimize(&func, -1.0, -2.0, 2.0),
            Err(NumericalError::DomainError(_))
        ));
        let result = minimizer.minimize(&func, 0.5, 0.1, 3.0).unwrap();
        assert_relative_eq!(result.point, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_input() {
        let minimizer = NewtonMinimizer::new();
        let func = ClosureFunction::new(|x| x * x, "x^2");
        assert!(matches!(
            minimizer.minimize(&func, 0.0, 1.0, -1.0),
            Err(NumericalError::InvalidInterval { .. })
        ));
        assert!(matches!(
            minimizer.minimize(&func, f64::NAN, -1.0, 1.0),
            Err(NumericalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cancellation() {
        let mut minimizer = NewtonMinimizer::new();
        let token = CancellationToken::new();
        minimizer.set_cancellation(token.clone());
        token.cancel();
        let func = ClosureFunction::new(|x| x * x, "x^2");
        assert_eq!(
            minimizer.minimize(&func, 1.0, -1.0, 2.0).unwrap_err(),
            NumericalError::Cancelled
        );
    }

    #[test]
    fn test_find_good_starting_point() {
        let func = ClosureFunction::new(|x| (x - 2.0) * (x - 2.0), "(x-2)^2");
        let x = find_good_starting_point(&func, 0.0, 10.0).unwrap();
        assert_relative_eq!(x, 2.0, epsilon = 1e-12);

        let undefined = ClosureFunction::new(|_| f64::NAN, "nan");
        assert_eq!(find_good_starting_point(&undefined, 0.0, 4.0).unwrap(), 2.0);
    }

    #[test]
    fn test_usable_on_interval() {
        let func = ClosureFunction::new(|x: f64| x.sqrt(), "sqrt(x)");
        assert!(usable_on_interval(&func, 0.0, 4.0));
        assert!(!usable_on_interval(&func, -4.0, 1.0));
    }
}
