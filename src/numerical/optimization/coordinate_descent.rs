//! Greedy coordinate descent for f: R^k -> R, k = 2 or 3, inside a box.
//!
//! Each sweep tries `x - h*e_i` and `x + h*e_i` for every axis and keeps the strictly smaller value.
//! The step h is fixed for the whole run, so the result is only as fine as h.
use crate::Utils::statistics::log_statistics;
use crate::numerical::cancellation::{CancellationToken, check_cancelled};
use crate::numerical::error::NumericalError;
use crate::numerical::functions::{ClosureVectorFunction, VectorFunction};
use log::{info, warn};
use nalgebra::DVector;

pub const MIN_DIMENSION: usize = 2;
pub const MAX_DIMENSION: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorIterationRecord {
    pub iteration: usize,
    pub point: DVector<f64>,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct CoordinateDescentConfig {
    pub step_size: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub keep_history: bool,
}

impl Default for CoordinateDescentConfig {
    fn default() -> Self {
        Self {
            step_size: 0.1,
            tolerance: 1e-6,
            max_iterations: 1000,
            keep_history: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinateDescentResult {
    pub point: DVector<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
    /// candidates skipped because the function was undefined there
    pub skipped_evaluations: usize,
    /// iteration 0 is the (clamped) initial point
    pub history: Vec<VectorIterationRecord>,
}

impl CoordinateDescentResult {
    pub fn statistics(&self) -> Vec<(String, String)> {
        vec![
            ("point".to_string(), format!("{:?}", self.point.as_slice())),
            ("value".to_string(), self.value.to_string()),
            ("iterations".to_string(), self.iterations.to_string()),
            ("converged".to_string(), self.converged.to_string()),
            (
                "skipped evaluations".to_string(),
                self.skipped_evaluations.to_string(),
            ),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoordinateDescent {
    config: CoordinateDescentConfig,
    cancellation: Option<CancellationToken>,
}

impl CoordinateDescent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CoordinateDescentConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    pub fn set_step_size(&mut self, step_size: f64) {
        self.config.step_size = step_size;
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn set_keep_history(&mut self, keep_history: bool) {
        self.config.keep_history = keep_history;
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn config(&self) -> &CoordinateDescentConfig {
        &self.config
    }

    fn validate(&self, initial: &DVector<f64>, bounds: &[(f64, f64)]) -> Result<(), NumericalError> {
        let k = initial.len();
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&k) {
            return Err(NumericalError::InvalidInput(format!(
                "coordinate descent supports 2 or 3 variables, got {}",
                k
            )));
        }
        if bounds.len() != k {
            return Err(NumericalError::InvalidInput(format!(
                "expected {} bounds, got {}",
                k,
                bounds.len()
            )));
        }
        for (axis, &(min, max)) in bounds.iter().enumerate() {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(NumericalError::InvalidInput(format!(
                    "bounds of axis {} must satisfy min < max, got [{}, {}]",
                    axis, min, max
                )));
            }
        }
        if initial.iter().any(|x| !x.is_finite()) {
            return Err(NumericalError::InvalidInput(
                "initial point must be finite".to_string(),
            ));
        }
        let config = &self.config;
        if !(config.step_size > 0.0) || !config.step_size.is_finite() {
            return Err(NumericalError::InvalidInput(format!(
                "step size must be positive, got {}",
                config.step_size
            )));
        }
        if !(config.tolerance > 0.0) {
            return Err(NumericalError::InvalidInput(format!(
                "tolerance must be positive, got {}",
                config.tolerance
            )));
        }
        if config.max_iterations == 0 {
            return Err(NumericalError::InvalidInput(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn minimize<F>(
        &self,
        function: &F,
        initial: &DVector<f64>,
        bounds: &[(f64, f64)],
    ) -> Result<CoordinateDescentResult, NumericalError>
    where
        F: VectorFunction + ?Sized,
    {
        self.validate(initial, bounds)?;
        let step = self.config.step_size;
        let tolerance = self.config.tolerance;

        let mut current = initial.clone();
        for (axis, &(min, max)) in bounds.iter().enumerate() {
            let clamped = current[axis].clamp(min, max);
            if clamped != current[axis] {
                warn!(
                    "initial coordinate {} = {} lies outside [{}, {}], moved to {}",
                    axis, current[axis], min, max, clamped
                );
                current[axis] = clamped;
            }
        }
        let mut current_value = function.evaluate(&current)?;
        info!(
            "coordinate descent for {} from {:?}, f = {}",
            function.name(),
            current.as_slice(),
            current_value
        );

        let mut history = Vec::new();
        if self.config.keep_history {
            history.push(VectorIterationRecord {
                iteration: 0,
                point: current.clone(),
                value: current_value,
            });
        }

        let mut iterations = 0;
        let mut converged = false;
        let mut skipped_evaluations = 0;
        while iterations < self.config.max_iterations {
            check_cancelled(&self.cancellation)?;
            iterations += 1;
            let previous = current.clone();
            let previous_value = current_value;

            for (axis, &(min, max)) in bounds.iter().enumerate() {
                let mut negative = current.clone();
                negative[axis] = (negative[axis] - step).clamp(min, max);
                let mut positive = current.clone();
                positive[axis] = (positive[axis] + step).clamp(min, max);

                let negative_value = function.evaluate(&negative).ok();
                let positive_value = function.evaluate(&positive).ok();
                skipped_evaluations +=
                    negative_value.is_none() as usize + positive_value.is_none() as usize;

                // strict comparisons: ties keep the current point
                match (negative_value, positive_value) {
                    (Some(neg), pos) if neg < current_value && pos.is_none_or(|pos| neg < pos) => {
                        current = negative;
                        current_value = neg;
                    }
                    (_, Some(pos)) if pos < current_value => {
                        current = positive;
                        current_value = pos;
                    }
                    _ => {}
                }
            }

            if self.config.keep_history {
                history.push(VectorIterationRecord {
                    iteration: iterations,
                    point: current.clone(),
                    value: current_value,
                });
            }

            let displacement = (&current - &previous).norm();
            let value_change = (current_value - previous_value).abs();
            if displacement < tolerance && value_change < tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                "coordinate descent reached {} iterations without convergence",
                self.config.max_iterations
            );
        }
        let result = CoordinateDescentResult {
            point: current,
            value: current_value,
            iterations,
            converged,
            skipped_evaluations,
            history,
        };
        if log::log_enabled!(log::Level::Debug) {
            log_statistics("COORDINATE DESCENT STATISTICS", &result.statistics());
        }
        Ok(result)
    }
}

/// Convenience wrapper for closures over slices
pub fn coordinate_descent<F>(
    function: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    step_size: f64,
    tolerance: f64,
) -> Result<CoordinateDescentResult, NumericalError>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let func = ClosureVectorFunction::new(function, "coordinate_descent_function");
    let mut solver = CoordinateDescent::new();
    solver.set_step_size(step_size);
    solver.set_tolerance(tolerance);
    solver.minimize(&func, &DVector::from_column_slice(initial), bounds)
}
