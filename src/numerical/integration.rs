//! Newton-Cotes quadratures on a uniform partition of [a, b]: left, middle and right rectangles,
//! trapezoid and Simpson. The partition count is either fixed or refined by doubling until two
//! successive estimates agree.
use crate::Utils::statistics::{comparison_table, log_statistics};
use crate::numerical::cancellation::{CancellationToken, check_cancelled};
use crate::numerical::error::NumericalError;
use crate::numerical::functions::{ClosureFunction, ScalarFunction};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum QuadratureRule {
    RectLeft,
    RectMiddle,
    RectRight,
    Trapezoidal,
    Simpson,
}

impl QuadratureRule {
    pub fn requires_even_partitions(&self) -> bool {
        matches!(self, QuadratureRule::Simpson)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartitionMode {
    Fixed(usize),
    /// double n until |I_k - I_{k-1}| < tolerance
    Automatic { tolerance: f64 },
}

#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub initial_n: usize,
    pub max_doublings: usize,
    /// refinement stops before n would reach this value
    pub max_partitions: usize,
    pub keep_history: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            initial_n: 4,
            max_doublings: 20,
            max_partitions: 1_000_000,
            keep_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRecord {
    pub iteration: usize,
    pub n: usize,
    pub estimate: f64,
}

#[derive(Debug, Clone)]
pub struct IntegrationResult {
    pub rule: QuadratureRule,
    pub value: f64,
    /// partition count of the returned estimate
    pub final_n: usize,
    /// number of estimates computed
    pub estimates: usize,
    pub converged: bool,
    pub history: Vec<RefinementRecord>,
}

impl IntegrationResult {
    pub fn statistics(&self) -> Vec<(String, String)> {
        vec![
            ("rule".to_string(), self.rule.to_string()),
            ("value".to_string(), format!("{:.10}", self.value)),
            ("final n".to_string(), self.final_n.to_string()),
            ("estimates".to_string(), self.estimates.to_string()),
            ("converged".to_string(), self.converged.to_string()),
        ]
    }
}

/// outcome of one rule inside a batch run
#[derive(Debug, Clone)]
pub struct IntegrationOutcome {
    pub rule: QuadratureRule,
    pub result: Result<IntegrationResult, NumericalError>,
    pub elapsed: Duration,
}

fn validate_bounds(a: f64, b: f64) -> Result<(), NumericalError> {
    if !a.is_finite() || !b.is_finite() || a >= b {
        return Err(NumericalError::InvalidInterval { a, b, epsilon: 0.0 });
    }
    Ok(())
}

fn validate_partitions(n: usize, rule: QuadratureRule) -> Result<(), NumericalError> {
    if n == 0 {
        return Err(NumericalError::InvalidInput(
            "number of partitions must be positive".to_string(),
        ));
    }
    if rule.requires_even_partitions() && n % 2 != 0 {
        return Err(NumericalError::InvalidInput(format!(
            "Simpson's rule requires an even number of partitions, got {}",
            n
        )));
    }
    Ok(())
}

/// Single estimate of the integral of f over [a, b] with n subintervals.
/// Any undefined sample aborts the estimate with DomainError.
pub fn integrate<F>(function: &F, a: f64, b: f64, n: usize, rule: QuadratureRule) -> Result<f64, NumericalError>
where
    F: ScalarFunction + ?Sized,
{
    validate_bounds(a, b)?;
    validate_partitions(n, rule)?;
    let h = (b - a) / n as f64;
    let node = |i: usize| a + i as f64 * h;
    let value = match rule {
        QuadratureRule::RectLeft => {
            let mut sum = 0.0;
            for i in 0..n {
                sum += function.evaluate(node(i))?;
            }
            sum * h
        }
        QuadratureRule::RectMiddle => {
            let mut sum = 0.0;
            for i in 0..n {
                sum += function.evaluate(node(i) + h / 2.0)?;
            }
            sum * h
        }
        QuadratureRule::RectRight => {
            let mut sum = 0.0;
            for i in 1..=n {
                sum += function.evaluate(node(i))?;
            }
            sum * h
        }
        QuadratureRule::Trapezoidal => {
            let mut sum = (function.evaluate(a)? + function.evaluate(b)?) / 2.0;
            for i in 1..n {
                sum += function.evaluate(node(i))?;
            }
            sum * h
        }
        QuadratureRule::Simpson => {
            let mut sum = function.evaluate(a)? + function.evaluate(b)?;
            for i in 1..n {
                let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
                sum += weight * function.evaluate(node(i))?;
            }
            sum * h / 3.0
        }
    };
    Ok(value)
}

#[derive(Debug, Clone, Default)]
pub struct Integrator {
    config: IntegrationConfig,
    cancellation: Option<CancellationToken>,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IntegrationConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    pub fn integrate<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        mode: PartitionMode,
        rule: QuadratureRule,
    ) -> Result<IntegrationResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        match mode {
            PartitionMode::Fixed(n) => {
                check_cancelled(&self.cancellation)?;
                let value = integrate(function, a, b, n, rule)?;
                let history = if self.config.keep_history {
                    vec![RefinementRecord {
                        iteration: 1,
                        n,
                        estimate: value,
                    }]
                } else {
                    Vec::new()
                };
                Ok(IntegrationResult {
                    rule,
                    value,
                    final_n: n,
                    estimates: 1,
                    converged: true,
                    history,
                })
            }
            PartitionMode::Automatic { tolerance } => self.integrate_adaptive(function, a, b, tolerance, rule),
        }
    }

    /// Doubling refinement starting at `initial_n`.
    /// Stops when two successive estimates differ by less than `tolerance` (converged),
    /// after `max_doublings` doublings, or when the next n would reach `max_partitions`.
    pub fn integrate_adaptive<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        tolerance: f64,
        rule: QuadratureRule,
    ) -> Result<IntegrationResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        validate_bounds(a, b)?;
        if !(tolerance > 0.0) || !tolerance.is_finite() {
            return Err(NumericalError::InvalidInterval {
                a,
                b,
                epsilon: tolerance,
            });
        }
        validate_partitions(self.config.initial_n, rule)?;

        let mut n = self.config.initial_n;
        let mut history = Vec::new();
        let mut previous: Option<f64> = None;
        let mut estimates = 0;
        let mut doublings = 0;
        let mut converged = false;
        let value = loop {
            check_cancelled(&self.cancellation)?;
            let estimate = integrate(function, a, b, n, rule)?;
            estimates += 1;
            if self.config.keep_history {
                history.push(RefinementRecord {
                    iteration: estimates,
                    n,
                    estimate,
                });
            }
            if let Some(previous) = previous {
                let change = (estimate - previous).abs();
                debug!("{}: n = {}, estimate = {}, change = {:e}", rule, n, estimate, change);
                if change < tolerance {
                    converged = true;
                    break estimate;
                }
            }
            previous = Some(estimate);
            if doublings >= self.config.max_doublings || n.saturating_mul(2) >= self.config.max_partitions {
                warn!(
                    "{}: refinement stopped at n = {} without reaching tolerance {}",
                    rule, n, tolerance
                );
                break estimate;
            }
            n *= 2;
            doublings += 1;
        };

        Ok(IntegrationResult {
            rule,
            value,
            final_n: n,
            estimates,
            converged,
            history,
        })
    }

    /// Run several rules on the same integral in parallel. Each rule gets its own outcome,
    /// a failing rule does not affect the others.
    pub fn integrate_all<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        mode: PartitionMode,
        rules: &[QuadratureRule],
    ) -> Vec<IntegrationOutcome>
    where
        F: ScalarFunction + Sync + ?Sized,
    {
        let outcomes: Vec<IntegrationOutcome> = rules
            .par_iter()
            .map(|&rule| {
                let start = Instant::now();
                let result = self.integrate(function, a, b, mode, rule);
                IntegrationOutcome {
                    rule,
                    result,
                    elapsed: start.elapsed(),
                }
            })
            .collect();
        info!("\n{}", outcomes_table(&outcomes));
        outcomes
    }
}

/// one row per rule: value, final n, time
pub fn outcomes_table(outcomes: &[IntegrationOutcome]) -> String {
    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(result) => vec![
                outcome.rule.to_string(),
                format!("{:.10}", result.value),
                result.final_n.to_string(),
                result.converged.to_string(),
                format!("{:.3}", outcome.elapsed.as_secs_f64() * 1000.0),
            ],
            Err(e) => vec![
                outcome.rule.to_string(),
                e.to_string(),
                "-".to_string(),
                "-".to_string(),
                format!("{:.3}", outcome.elapsed.as_secs_f64() * 1000.0),
            ],
        })
        .collect();
    comparison_table(&["rule", "value", "n", "converged", "time, ms"], &rows)
}

/// Convenience wrapper: automatic refinement of a closure with default configuration
pub fn integrate_closure<F>(function: F, a: f64, b: f64, tolerance: f64, rule: QuadratureRule) -> Result<f64, NumericalError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "integrand");
    let result = Integrator::new().integrate_adaptive(&func, a, b, tolerance, rule)?;
    if log::log_enabled!(log::Level::Debug) {
        log_statistics("INTEGRATION STATISTICS", &result.statistics());
    }
    Ok(result.value)
}
