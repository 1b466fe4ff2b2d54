//! Direct solvers for small dense systems: Gaussian elimination with partial pivoting,
//! Gauss-Jordan reduction and Cramer's rule with cofactor determinants.
//!
//! The right-hand side convention is explicit: `Standard` solves A*x = b, `Negated` solves A*x + b = 0.
//! Input matrices are never modified, every method works on its own copy.
use crate::Utils::statistics::comparison_table;
use crate::numerical::cancellation::{CancellationToken, check_cancelled};
use crate::numerical::error::NumericalError;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumIter};

/// above this dimension Cramer's rule logs a warning (cofactor expansion costs O(n!))
pub const CRAMER_WARN_DIMENSION: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum RhsConvention {
    /// A*x = b
    Standard,
    /// A*x + b = 0
    Negated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LinearSolverMethod {
    Gauss,
    GaussJordan,
    Cramer,
}

#[derive(Debug, Clone)]
pub struct LinearSolverConfig {
    pub convention: RhsConvention,
    pub singularity_tolerance: f64,
    pub cramer_max_dimension: usize,
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            convention: RhsConvention::Standard,
            singularity_tolerance: 1e-12,
            cramer_max_dimension: 10,
        }
    }
}

/// result of one method inside solve_all
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub method: LinearSolverMethod,
    pub result: Result<DVector<f64>, NumericalError>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct LinearSystemSolver {
    config: LinearSolverConfig,
    cancellation: Option<CancellationToken>,
}

impl LinearSystemSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LinearSolverConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    pub fn with_convention(convention: RhsConvention) -> Self {
        Self {
            config: LinearSolverConfig {
                convention,
                ..LinearSolverConfig::default()
            },
            cancellation: None,
        }
    }

    pub fn set_convention(&mut self, convention: RhsConvention) {
        self.config.convention = convention;
    }

    pub fn set_singularity_tolerance(&mut self, tolerance: f64) {
        self.config.singularity_tolerance = tolerance;
    }

    pub fn set_cramer_max_dimension(&mut self, dimension: usize) {
        self.config.cramer_max_dimension = dimension;
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn config(&self) -> &LinearSolverConfig {
        &self.config
    }

    /// checks shape and finiteness, returns the right-hand side of A*x = rhs
    fn prepare(&self, A: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, NumericalError> {
        let (rows, cols) = A.shape();
        if rows == 0 {
            return Err(NumericalError::InvalidInput("matrix is empty".to_string()));
        }
        if rows != cols {
            return Err(NumericalError::InvalidInput(format!(
                "matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        if b.len() != rows {
            return Err(NumericalError::InvalidInput(format!(
                "right-hand side has length {}, expected {}",
                b.len(),
                rows
            )));
        }
        if A.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(NumericalError::InvalidInput(
                "matrix and right-hand side must contain finite numbers".to_string(),
            ));
        }
        Ok(match self.config.convention {
            RhsConvention::Standard => b.clone(),
            RhsConvention::Negated => -b,
        })
    }

    /// pivots smaller than this are treated as zero
    fn pivot_threshold(&self, A: &DMatrix<f64>) -> f64 {
        self.config.singularity_tolerance * A.amax().max(1.0)
    }

    /// Gaussian elimination with partial pivoting followed by back substitution
    pub fn gauss_elimination(&self, A: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, NumericalError> {
        let mut rhs = self.prepare(A, b)?;
        let threshold = self.pivot_threshold(A);
        let mut m = A.clone();
        let n = m.nrows();

        for k in 0..n {
            check_cancelled(&self.cancellation)?;
            // row with the largest entry in column k at or below the diagonal
            let mut pivot_row = k;
            for i in (k + 1)..n {
                if m[(i, k)].abs() > m[(pivot_row, k)].abs() {
                    pivot_row = i;
                }
            }
            if m[(pivot_row, k)].abs() <= threshold {
                debug!("zero pivot in column {}", k);
                return Err(NumericalError::Singular);
            }
            if pivot_row != k {
                m.swap_rows(k, pivot_row);
                rhs.swap_rows(k, pivot_row);
            }
            for i in (k + 1)..n {
                let factor = m[(i, k)] / m[(k, k)];
                if factor == 0.0 {
                    continue;
                }
                for j in k..n {
                    m[(i, j)] -= factor * m[(k, j)];
                }
                rhs[i] -= factor * rhs[k];
            }
        }

        let mut x = DVector::zeros(n);
        for i in (0..n).rev() {
            let mut sum = rhs[i];
            for j in (i + 1)..n {
                sum -= m[(i, j)] * x[j];
            }
            x[i] = sum / m[(i, i)];
        }
        Ok(x)
    }

    /// Gauss-Jordan reduction of the augmented matrix [A | rhs] to [I | x].
    /// Rows are swapped only when the diagonal entry is unusable.
    pub fn gauss_jordan(&self, A: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, NumericalError> {
        let rhs = self.prepare(A, b)?;
        let threshold = self.pivot_threshold(A);
        let n = A.nrows();
        let mut augmented = A.clone().insert_column(n, 0.0);
        augmented.set_column(n, &rhs);

        for i in 0..n {
            check_cancelled(&self.cancellation)?;
            if augmented[(i, i)].abs() <= threshold {
                let replacement = ((i + 1)..n).find(|&k| augmented[(k, i)].abs() > threshold);
                match replacement {
                    Some(k) => augmented.swap_rows(i, k),
                    None => {
                        debug!("no usable pivot for column {}", i);
                        return Err(NumericalError::Singular);
                    }
                }
            }
            let pivot = augmented[(i, i)];
            for j in 0..=n {
                augmented[(i, j)] /= pivot;
            }
            for k in 0..n {
                if k == i {
                    continue;
                }
                let factor = augmented[(k, i)];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..=n {
                    augmented[(k, j)] -= factor * augmented[(i, j)];
                }
            }
        }
        Ok(augmented.column(n).into_owned())
    }

    /// determinant by recursive cofactor expansion along the first row
    pub fn determinant(&self, A: &DMatrix<f64>) -> Result<f64, NumericalError> {
        let (rows, cols) = A.shape();
        if rows == 0 || rows != cols {
            return Err(NumericalError::InvalidInput(format!(
                "determinant needs a non-empty square matrix, got {}x{}",
                rows, cols
            )));
        }
        cofactor_determinant(A, &self.cancellation)
    }

    /// Cramer's rule: x_i = det(A_i) / det(A), where A_i has column i replaced by the right-hand side
    pub fn cramer(&self, A: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, NumericalError> {
        let rhs = self.prepare(A, b)?;
        let n = A.nrows();
        if n > self.config.cramer_max_dimension {
            return Err(NumericalError::InvalidInput(format!(
                "Cramer's rule is limited to {} unknowns, got {}",
                self.config.cramer_max_dimension, n
            )));
        }
        if n > CRAMER_WARN_DIMENSION {
            warn!(
                "Cramer's rule with cofactor expansion on a {}x{} matrix is very slow",
                n, n
            );
        }
        let det = cofactor_determinant(A, &self.cancellation)?;
        if det.abs() < self.config.singularity_tolerance {
            debug!("determinant {} is zero", det);
            return Err(NumericalError::Singular);
        }
        let mut x = DVector::zeros(n);
        for i in 0..n {
            check_cancelled(&self.cancellation)?;
            let mut replaced = A.clone();
            replaced.set_column(i, &rhs);
            x[i] = cofactor_determinant(&replaced, &self.cancellation)? / det;
        }
        Ok(x)
    }

    pub fn solve(
        &self,
        method: LinearSolverMethod,
        A: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Result<DVector<f64>, NumericalError> {
        match method {
            LinearSolverMethod::Gauss => self.gauss_elimination(A, b),
            LinearSolverMethod::GaussJordan => self.gauss_jordan(A, b),
            LinearSolverMethod::Cramer => self.cramer(A, b),
        }
    }

    /// Run the given methods on the same system in parallel.
    /// Outcomes come back in the order of `methods`, each with its own result and timing.
    pub fn solve_all(
        &self,
        methods: &[LinearSolverMethod],
        A: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Vec<SolverOutcome> {
        let outcomes: Vec<SolverOutcome> = methods
            .par_iter()
            .map(|&method| {
                let start = Instant::now();
                let result = self.solve(method, A, b);
                SolverOutcome {
                    method,
                    result,
                    elapsed: start.elapsed(),
                }
            })
            .collect();
        info!("\n{}", outcomes_table(&outcomes));
        outcomes
    }
}

/// the token is polled before every cofactor, so large expansions stop quickly
fn cofactor_determinant(m: &DMatrix<f64>, cancellation: &Option<CancellationToken>) -> Result<f64, NumericalError> {
    let n = m.nrows();
    match n {
        0 => Ok(1.0),
        1 => Ok(m[(0, 0)]),
        2 => Ok(m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]),
        _ => {
            let mut det = 0.0;
            for j in 0..n {
                check_cancelled(cancellation)?;
                if m[(0, j)] == 0.0 {
                    continue;
                }
                let minor = m.clone().remove_row(0).remove_column(j);
                let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                det += sign * m[(0, j)] * cofactor_determinant(&minor, cancellation)?;
            }
            Ok(det)
        }
    }
}

/// quickest successful outcome of a batch
pub fn fastest(outcomes: &[SolverOutcome]) -> Option<&SolverOutcome> {
    outcomes
        .iter()
        .filter(|outcome| outcome.result.is_ok())
        .min_by_key(|outcome| outcome.elapsed)
}

pub fn outcomes_table(outcomes: &[SolverOutcome]) -> String {
    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .map(|outcome| {
            let solution = match &outcome.result {
                Ok(x) => format!("{:?}", x.as_slice()),
                Err(e) => e.to_string(),
            };
            vec![
                outcome.method.to_string(),
                solution,
                format!("{:.3}", outcome.elapsed.as_secs_f64() * 1000.0),
            ]
        })
        .collect();
    comparison_table(&["method", "solution", "time, ms"], &rows)
}

/// nested rows -> matrix; rows must be non-empty and of equal length
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, NumericalError> {
    let nrows = rows.len();
    if nrows == 0 || rows[0].is_empty() {
        return Err(NumericalError::InvalidInput("matrix is empty".to_string()));
    }
    let ncols = rows[0].len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != ncols) {
        return Err(NumericalError::InvalidInput(format!(
            "row {} has {} entries, expected {}",
            i,
            row.len(),
            ncols
        )));
    }
    Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
}

pub fn vector_from_slice(values: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn example_system() -> (DMatrix<f64>, DVector<f64>) {
        let A = matrix_from_rows(&[
            vec![2.0, 1.0, -1.0],
            vec![-3.0, -1.0, 2.0],
            vec![-2.0, 1.0, 2.0],
        ])
        .unwrap();
        (A, vector_from_slice(&[8.0, -11.0, -3.0]))
    }

    fn assert_solution(x: &DVector<f64>, expected: &[f64]) {
        assert_eq!(x.len(), expected.len());
        for (xi, ei) in x.iter().zip(expected) {
            assert_relative_eq!(*xi, *ei, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_all_methods_standard_convention() {
        let (A, b) = example_system();
        let solver = LinearSystemSolver::new();
        for method in LinearSolverMethod::iter() {
            let x = solver.solve(method, &A, &b).unwrap();
            assert_solution(&x, &[2.0, 3.0, -1.0]);
        }
    }

    #[test]
    fn test_negated_convention() {
        let (A, b) = example_system();
        let solver = LinearSystemSolver::with_convention(RhsConvention::Negated);
        let negated_b = vector_from_slice(&[-8.0, 11.0, 3.0]);
        for method in LinearSolverMethod::iter() {
            let x = solver.solve(method, &A, &negated_b).unwrap();
            assert_solution(&x, &[2.0, 3.0, -1.0]);
        }
        // the same b under both conventions gives opposite solutions
        let standard = LinearSystemSolver::new().gauss_elimination(&A, &b).unwrap();
        let negated = solver.gauss_elimination(&A, &b).unwrap();
        assert_solution(&negated, &(-standard).as_slice().to_vec());
    }

    #[test]
    fn test_inputs_are_not_modified() {
        let (A, b) = example_system();
        let (A_copy, b_copy) = (A.clone(), b.clone());
        let solver = LinearSystemSolver::new();
        for method in LinearSolverMethod::iter() {
            solver.solve(method, &A, &b).unwrap();
        }
        assert_eq!(A, A_copy);
        assert_eq!(b, b_copy);
    }

    #[test]
    fn test_singular_matrix_detected_by_all_methods() {
        let A = matrix_from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let b = vector_from_slice(&[3.0, 6.0]);
        let solver = LinearSystemSolver::new();
        for method in LinearSolverMethod::iter() {
            assert_eq!(solver.solve(method, &A, &b), Err(NumericalError::Singular));
        }
        let zero = DMatrix::<f64>::zeros(3, 3);
        let b = vector_from_slice(&[1.0, 1.0, 1.0]);
        for method in LinearSolverMethod::iter() {
            assert_eq!(solver.solve(method, &zero, &b), Err(NumericalError::Singular));
        }
    }

    #[test]
    fn test_pivoting_handles_zero_diagonal() {
        let A = matrix_from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let b = vector_from_slice(&[2.0, 3.0]);
        let solver = LinearSystemSolver::new();
        for method in LinearSolverMethod::iter() {
            let x = solver.solve(method, &A, &b).unwrap();
            assert_solution(&x, &[3.0, 2.0]);
        }
    }

    #[test]
    fn test_shape_validation() {
        let solver = LinearSystemSolver::new();
        let rect = DMatrix::<f64>::zeros(2, 3);
        let b = vector_from_slice(&[1.0, 2.0]);
        assert!(matches!(
            solver.gauss_elimination(&rect, &b),
            Err(NumericalError::InvalidInput(_))
        ));
        let (A, _) = example_system();
        assert!(matches!(
            solver.gauss_jordan(&A, &b),
            Err(NumericalError::InvalidInput(_))
        ));
        assert!(matches!(
            solver.cramer(&DMatrix::<f64>::zeros(0, 0), &DVector::zeros(0)),
            Err(NumericalError::InvalidInput(_))
        ));
        assert!(matrix_from_rows(&[vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(matrix_from_rows(&[]).is_err());
    }

    #[test]
    fn test_determinant() {
        let solver = LinearSystemSolver::new();
        let (A, _) = example_system();
        assert_relative_eq!(solver.determinant(&A).unwrap(), A.determinant(), epsilon = 1e-12);
        let A = matrix_from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![2.0, 6.0, 4.0, 8.0],
            vec![3.0, 1.0, 1.0, 2.0],
        ])
        .unwrap();
        assert_relative_eq!(solver.determinant(&A).unwrap(), 72.0, epsilon = 1e-9);
        assert!(solver.determinant(&DMatrix::<f64>::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_cramer_dimension_limit() {
        let mut solver = LinearSystemSolver::new();
        solver.set_cramer_max_dimension(3);
        let A = DMatrix::<f64>::identity(4, 4);
        let b = DVector::from_element(4, 1.0);
        assert!(matches!(solver.cramer(&A, &b), Err(NumericalError::InvalidInput(_))));
        assert_solution(&solver.gauss_elimination(&A, &b).unwrap(), &[1.0; 4]);
    }

    #[test]
    fn test_methods_agree_with_nalgebra_lu() {
        let A = matrix_from_rows(&[
            vec![4.0, -2.0, 1.0, 3.0],
            vec![3.0, 6.0, -4.0, 2.0],
            vec![2.0, 1.0, 8.0, -5.0],
            vec![1.0, -3.0, 2.0, 7.0],
        ])
        .unwrap();
        let b = vector_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let reference = A.clone().lu().solve(&b).unwrap();
        let solver = LinearSystemSolver::new();
        for method in LinearSolverMethod::iter() {
            let x = solver.solve(method, &A, &b).unwrap();
            assert_solution(&x, reference.as_slice());
        }
    }

    #[test]
    fn test_solve_all_outcomes_are_independent() {
        let mut solver = LinearSystemSolver::new();
        solver.set_cramer_max_dimension(2);
        let (A, b) = example_system();
        let methods: Vec<LinearSolverMethod> = LinearSolverMethod::iter().collect();
        let outcomes = solver.solve_all(&methods, &A, &b);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].method, LinearSolverMethod::Gauss);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_ok());
        assert!(outcomes[2].result.is_err());
        let best = fastest(&outcomes).unwrap();
        assert_ne!(best.method, LinearSolverMethod::Cramer);
        assert!(outcomes_table(&outcomes).contains("GaussJordan"));
    }

    #[test]
    fn test_cancelled_solver_stops_every_method() {
        let token = CancellationToken::new();
        let mut solver = LinearSystemSolver::new();
        solver.set_cancellation(token.clone());
        let (A, b) = example_system();
        assert!(solver.solve(LinearSolverMethod::Gauss, &A, &b).is_ok());

        token.cancel();
        for method in LinearSolverMethod::iter() {
            assert_eq!(solver.solve(method, &A, &b), Err(NumericalError::Cancelled));
        }
        assert_eq!(solver.determinant(&A), Err(NumericalError::Cancelled));
        let outcomes = solver.solve_all(&[LinearSolverMethod::Cramer, LinearSolverMethod::Gauss], &A, &b);
        assert!(outcomes.iter().all(|o| o.result == Err(NumericalError::Cancelled)));
    }
}
