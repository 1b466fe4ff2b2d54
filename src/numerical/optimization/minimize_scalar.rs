//! Bracketing methods for functions of one variable: bisection (single root and scan for all roots)
//! and golden-section search for minimum, maximum or root.
use crate::Utils::formatting::{decimal_places, round_to};
use crate::Utils::statistics::log_statistics;
use crate::numerical::cancellation::{CancellationToken, check_cancelled};
use crate::numerical::error::{NumericalError, validate_interval};
use crate::numerical::functions::{ClosureFunction, ScalarFunction};
use itertools::Itertools;
use log::{debug, info, warn};
use strum_macros::{Display, EnumIter};

/// golden ratio (1 + sqrt(5)) / 2
pub const GOLDEN_RATIO: f64 = 1.618033988749895;
/// iteration cap of plain bisection
pub const BISECTION_MAX_ITERATIONS: usize = 500;
/// iteration cap of bisection refinement inside a root scan
pub const SCAN_BISECTION_MAX_ITERATIONS: usize = 1000;
/// iteration cap of golden-section search
pub const GOLDEN_MAX_ITERATIONS: usize = 10_000;
/// number of subintervals used to look for several extrema
pub const EXTREMA_SUBDIVISIONS: usize = 10;

/// What golden-section search looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum SearchMode {
    Minimum,
    Maximum,
    Root,
}

/// One step of an iterative scalar method
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub point: f64,
    pub value: f64,
}

///////////////////////////////////////////RESULTS///////////////////////////////////////////
/// Result structure for bracketing methods
#[derive(Debug, Clone)]
pub struct ScalarSearchResult {
    pub point: f64,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
    /// bracket at the moment the search stopped
    pub final_interval: (f64, f64),
    pub method: String,
    pub tolerance: f64,
    pub history: Vec<IterationRecord>,
}

impl ScalarSearchResult {
    /// (point, value) rounded to the number of decimals implied by the tolerance
    pub fn rounded(&self) -> (f64, f64) {
        let places = decimal_places(self.tolerance);
        (round_to(self.point, places), round_to(self.value, places))
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let (point, value) = self.rounded();
        vec![
            ("method".to_string(), self.method.clone()),
            ("point".to_string(), point.to_string()),
            ("value".to_string(), value.to_string()),
            ("iterations".to_string(), self.iterations.to_string()),
            ("converged".to_string(), self.converged.to_string()),
            (
                "final interval".to_string(),
                format!("[{}, {}]", self.final_interval.0, self.final_interval.1),
            ),
        ]
    }
}

/// Result of scanning an interval for all roots
#[derive(Debug, Clone)]
pub struct RootScan {
    /// roots in ascending order, no two closer than 100 * tolerance
    pub roots: Vec<f64>,
    pub divisions: usize,
    /// scan samples where the function was undefined and that were skipped
    pub undefined_samples: usize,
}

/// Configuration for bracketing methods
#[derive(Debug, Clone)]
pub struct ScalarSearchConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub keep_history: bool,
}

impl Default for ScalarSearchConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: BISECTION_MAX_ITERATIONS,
            keep_history: true,
        }
    }
}

impl ScalarSearchConfig {
    /// defaults for golden-section search: larger iteration cap
    pub fn golden_section() -> Self {
        Self {
            max_iterations: GOLDEN_MAX_ITERATIONS,
            ..Self::default()
        }
    }
}

/// Main structure for bracketing root and extremum search
#[derive(Debug, Clone, Default)]
pub struct ScalarSearch {
    config: ScalarSearchConfig,
    cancellation: Option<CancellationToken>,
}

impl ScalarSearch {
    /// Create a new ScalarSearch with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new ScalarSearch with custom configuration
    pub fn with_config(config: ScalarSearchConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    /// Set tolerance for convergence
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }

    /// Set maximum number of iterations
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn set_keep_history(&mut self, keep_history: bool) {
        self.config.keep_history = keep_history;
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn config(&self) -> &ScalarSearchConfig {
        &self.config
    }

    fn record(&self, history: &mut Vec<IterationRecord>, iteration: usize, point: f64, value: f64) {
        if self.config.keep_history {
            history.push(IterationRecord {
                iteration,
                point,
                value,
            });
        }
    }

    fn endpoint_result(&self, x: f64, fx: f64, interval: (f64, f64), method: &str) -> ScalarSearchResult {
        ScalarSearchResult {
            point: x,
            value: fx,
            iterations: 0,
            converged: true,
            final_interval: interval,
            method: method.to_string(),
            tolerance: self.config.tolerance,
            history: Vec::new(),
        }
    }

    /////////////////////////////////////////BISECTION///////////////////////////////////////////

    /// Bisection method for finding roots.
    /// Requires that f(a) and f(b) have opposite signs, unless one of the ends is already a root
    pub fn bisection<F>(&self, function: &F, a: f64, b: f64) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        self.bisection_with_cap(function, a, b, self.config.max_iterations)
    }

    fn bisection_with_cap<F>(
        &self,
        function: &F,
        mut a: f64,
        mut b: f64,
        max_iterations: usize,
    ) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        validate_interval(a, b, tolerance)?;
        let mut fa = function.evaluate(a)?;
        let fb = function.evaluate(b)?;

        // Check if we already have a root at the endpoints
        if fa.abs() < tolerance {
            return Ok(self.endpoint_result(a, fa, (a, b), "bisection"));
        }
        if fb.abs() < tolerance {
            return Ok(self.endpoint_result(b, fb, (a, b), "bisection"));
        }
        if fa * fb > 0.0 {
            return Err(NumericalError::NoSignChange { a, b, fa, fb });
        }

        debug!(
            "Bisection method for function: {}, interval [{}, {}], tolerance {}",
            function.name(),
            a,
            b,
            tolerance
        );
        let mut history = Vec::new();
        let mut c = (a + b) / 2.0;
        let mut fc = fa;
        let mut iterations = 0;
        while iterations < max_iterations {
            check_cancelled(&self.cancellation)?;
            c = (a + b) / 2.0;
            fc = function.evaluate(c)?;
            iterations += 1;
            self.record(&mut history, iterations, c, fc);

            if fc.abs() < tolerance || (b - a).abs() < tolerance {
                return Ok(ScalarSearchResult {
                    point: c,
                    value: fc,
                    iterations,
                    converged: true,
                    final_interval: (a, b),
                    method: "bisection".to_string(),
                    tolerance,
                    history,
                });
            }
            if fa * fc < 0.0 {
                b = c;
            } else {
                a = c;
                fa = fc;
            }
        }
        warn!(
            "bisection for {} reached {} iterations without convergence",
            function.name(),
            max_iterations
        );
        Ok(ScalarSearchResult {
            point: c,
            value: fc,
            iterations,
            converged: false,
            final_interval: (a, b),
            method: "bisection".to_string(),
            tolerance,
            history,
        })
    }

    /// Scan [a, b] for all roots: look for sign changes and near-zero samples on a uniform grid,
    /// refine sign changes by bisection and merge roots that are closer than 100 * tolerance.
    /// Samples where the function is undefined are skipped.
    pub fn find_all_roots<F>(&self, function: &F, a: f64, b: f64) -> Result<RootScan, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        validate_interval(a, b, tolerance)?;
        let near_zero = tolerance * 10.0;
        let merge_distance = tolerance * 100.0;
        let acceptance = tolerance.max(1e-6);

        let divisions = (((b - a) * 10.0) as usize).clamp(200, 1000);
        let step = (b - a) / divisions as f64;
        let mut roots: Vec<f64> = Vec::new();
        let mut undefined_samples = 0;
        let already_found = |roots: &Vec<f64>, x: f64| roots.iter().any(|r| (r - x).abs() < merge_distance);

        let mut special_points = vec![a, b, (a + b) / 2.0];
        if a <= 0.0 && 0.0 <= b {
            special_points.push(0.0);
        }
        for x in special_points {
            match function.evaluate(x) {
                Ok(fx) if fx.abs() < near_zero && !already_found(&roots, x) => roots.push(x),
                Ok(_) => {}
                Err(_) => undefined_samples += 1,
            }
        }

        for i in 0..divisions {
            check_cancelled(&self.cancellation)?;
            let x1 = a + i as f64 * step;
            let x2 = x1 + step;
            let (f1, f2) = match (function.evaluate(x1), function.evaluate(x2)) {
                (Ok(f1), Ok(f2)) => (f1, f2),
                _ => {
                    undefined_samples += 1;
                    continue;
                }
            };
            if f1.abs() < near_zero && !already_found(&roots, x1) {
                roots.push(x1);
            }
            if f1 * f2 < 0.0 {
                let refined = self.bisection_with_cap(function, x1, x2, SCAN_BISECTION_MAX_ITERATIONS);
                match refined {
                    Ok(result) => {
                        let accepted = function
                            .evaluate(result.point)
                            .map(|fr| fr.abs() < acceptance)
                            .unwrap_or(false);
                        if accepted && !already_found(&roots, result.point) {
                            roots.push(result.point);
                        }
                    }
                    Err(NumericalError::Cancelled) => return Err(NumericalError::Cancelled),
                    Err(e) => debug!("skipping subinterval [{}, {}]: {}", x1, x2, e),
                }
            }
        }

        let roots: Vec<f64> = roots.into_iter().sorted_by(|x, y| x.total_cmp(y)).collect();
        info!(
            "found {} root(s) of {} on [{}, {}] ({} undefined samples skipped)",
            roots.len(),
            function.name(),
            a,
            b,
            undefined_samples
        );
        Ok(RootScan {
            roots,
            divisions,
            undefined_samples,
        })
    }

    /////////////////////////////////////////GOLDEN SECTION///////////////////////////////////////////

    /// golden-section search; besides a < b and tolerance > 0 the tolerance may not exceed b - a
    pub fn golden_section<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        mode: SearchMode,
    ) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        validate_interval(a, b, tolerance)?;
        if tolerance > b - a {
            return Err(NumericalError::InvalidInterval {
                a,
                b,
                epsilon: tolerance,
            });
        }
        let result = match mode {
            SearchMode::Minimum | SearchMode::Maximum => self.golden_extremum(function, a, b, mode)?,
            SearchMode::Root => self.golden_root(function, a, b)?,
        };
        if log::log_enabled!(log::Level::Debug) {
            log_statistics("GOLDEN SECTION STATISTICS", &result.statistics());
        }
        Ok(result)
    }

    fn golden_extremum<F>(
        &self,
        function: &F,
        mut a: f64,
        mut b: f64,
        mode: SearchMode,
    ) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        let mut history = Vec::new();
        let mut x1 = b - (b - a) / GOLDEN_RATIO;
        let mut x2 = a + (b - a) / GOLDEN_RATIO;
        let mut f1 = function.evaluate(x1)?;
        let mut f2 = function.evaluate(x2)?;

        let mut iterations = 0;
        let mut converged = true;
        while (b - a).abs() > tolerance {
            if iterations >= self.config.max_iterations {
                converged = false;
                warn!(
                    "golden section for {} reached {} iterations without convergence",
                    function.name(),
                    self.config.max_iterations
                );
                break;
            }
            check_cancelled(&self.cancellation)?;
            iterations += 1;
            // ties move the left end
            let drop_left = match mode {
                SearchMode::Maximum => f1 <= f2,
                _ => f1 >= f2,
            };
            if drop_left {
                a = x1;
                x1 = x2;
                f1 = f2;
                x2 = a + (b - a) / GOLDEN_RATIO;
                f2 = function.evaluate(x2)?;
            } else {
                b = x2;
                x2 = x1;
                f2 = f1;
                x1 = b - (b - a) / GOLDEN_RATIO;
                f1 = function.evaluate(x1)?;
            }
            // the interior point evaluated in this step
            let (x_new, f_new) = if drop_left { (x2, f2) } else { (x1, f1) };
            self.record(&mut history, iterations, x_new, f_new);
        }

        let point = (a + b) / 2.0;
        let value = function.evaluate(point)?;
        Ok(ScalarSearchResult {
            point,
            value,
            iterations,
            converged,
            final_interval: (a, b),
            method: format!("golden section ({})", mode),
            tolerance,
            history,
        })
    }

    fn golden_root<F>(&self, function: &F, mut a: f64, mut b: f64) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        let mut fa = function.evaluate(a)?;
        let fb = function.evaluate(b)?;
        let method = "golden section (Root)";
        if fa.abs() < tolerance {
            return Ok(self.endpoint_result(a, fa, (a, b), method));
        }
        if fb.abs() < tolerance {
            return Ok(self.endpoint_result(b, fb, (a, b), method));
        }
        if fa * fb > 0.0 {
            return Err(NumericalError::NoSignChange { a, b, fa, fb });
        }

        let mut history = Vec::new();
        let mut iterations = 0;
        let mut converged = true;
        while (b - a).abs() > tolerance {
            if iterations >= self.config.max_iterations {
                converged = false;
                break;
            }
            check_cancelled(&self.cancellation)?;
            iterations += 1;
            let mid = (a + b) / 2.0;
            let fmid = function.evaluate(mid)?;
            self.record(&mut history, iterations, mid, fmid);
            if fmid.abs() < tolerance {
                a = mid;
                b = mid;
                break;
            }
            if fa * fmid < 0.0 {
                b = mid;
            } else {
                a = mid;
                fa = fmid;
            }
        }
        let point = (a + b) / 2.0;
        let value = function.evaluate(point)?;
        Ok(ScalarSearchResult {
            point,
            value,
            iterations,
            converged,
            final_interval: (a, b),
            method: method.to_string(),
            tolerance,
            history,
        })
    }

    /// Local extrema of the requested kind: golden search on each of 10 equal subintervals,
    /// keeping only results strictly inside their subinterval. Failing subintervals are skipped.
    pub fn find_all_extrema<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        mode: SearchMode,
    ) -> Result<Vec<ScalarSearchResult>, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let tolerance = self.config.tolerance;
        validate_interval(a, b, tolerance)?;
        if mode == SearchMode::Root {
            return Err(NumericalError::InvalidInput(
                "find_all_extrema expects Minimum or Maximum mode, use find_all_roots for roots".to_string(),
            ));
        }
        let step = (b - a) / EXTREMA_SUBDIVISIONS as f64;
        let mut results: Vec<ScalarSearchResult> = Vec::new();
        for i in 0..EXTREMA_SUBDIVISIONS {
            check_cancelled(&self.cancellation)?;
            let start = a + i as f64 * step;
            let end = b.min(start + step);
            if end - start < tolerance {
                continue;
            }
            match self.golden_section(function, start, end, mode) {
                Ok(result) => {
                    let interior = result.point > start + tolerance && result.point < end - tolerance;
                    let duplicate = results
                        .iter()
                        .any(|r| (r.point - result.point).abs() < tolerance * 10.0);
                    if interior && !duplicate {
                        results.push(result);
                    }
                }
                Err(NumericalError::Cancelled) => return Err(NumericalError::Cancelled),
                Err(e) => debug!("skipping subinterval [{}, {}]: {}", start, end, e),
            }
        }
        Ok(results)
    }

    /// best of the local extrema; whole-interval search if no interior extremum was found
    pub fn find_global_extremum<F>(
        &self,
        function: &F,
        a: f64,
        b: f64,
        mode: SearchMode,
    ) -> Result<ScalarSearchResult, NumericalError>
    where
        F: ScalarFunction + ?Sized,
    {
        let extrema = self.find_all_extrema(function, a, b, mode)?;
        let best = match mode {
            SearchMode::Maximum => extrema.into_iter().max_by(|x, y| x.value.total_cmp(&y.value)),
            _ => extrema.into_iter().min_by(|x, y| x.value.total_cmp(&y.value)),
        };
        match best {
            Some(best) => Ok(best),
            None => self.golden_section(function, a, b, mode),
        }
    }
}

/// true if the function is finite at both ends and in the middle of [a, b]
pub fn function_defined_on<F>(function: &F, a: f64, b: f64) -> bool
where
    F: ScalarFunction + ?Sized,
{
    [a, (a + b) / 2.0, b]
        .iter()
        .all(|&x| function.evaluate(x).is_ok())
}

// Convenience functions for quick usage
pub fn bisection<F>(function: F, a: f64, b: f64, tolerance: f64) -> Result<f64, NumericalError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "bisection_function");
    let mut solver = ScalarSearch::new();
    solver.set_tolerance(tolerance);
    solver.set_keep_history(false);
    let result = solver.bisection(&func, a, b)?;
    Ok(result.point)
}

pub fn golden_section<F>(
    function: F,
    a: f64,
    b: f64,
    tolerance: f64,
    mode: SearchMode,
) -> Result<(f64, f64), NumericalError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "golden_section_function");
    let mut solver = ScalarSearch::with_config(ScalarSearchConfig::golden_section());
    solver.set_tolerance(tolerance);
    solver.set_keep_history(false);
    let result = solver.golden_section(&func, a, b, mode)?;
    Ok((result.point, result.value))
}
