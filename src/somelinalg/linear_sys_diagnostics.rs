use crate::somelinalg::dense_solvers::RhsConvention;
use log::warn;
use nalgebra::{DMatrix, DVector, stack};

/// In mathematics, the Rouché–Capelli theorem gives a necessary and sufficient condition for a system of
/// linear equations to have a solution: Ax = b is solvable if and only if rank(A) = rank([A b]).
/// Here, A is the coefficient matrix, x is the vector of unknowns, and b is the vector of constants.
pub fn has_solution(A: &DMatrix<f64>, b: &DVector<f64>) -> bool {
    let Ab: DMatrix<f64> = stack![A, b];
    let rank_A = numerical_rank(A);
    let rank_Ab = numerical_rank(&Ab);

    let result = rank_A == rank_Ab;
    if !result {
        warn!(
            "The system has no solution. rank(A) = {} != rank([A b]) = {}",
            rank_A, rank_Ab
        );
    }
    result
}

/// number of singular values above max(rows, cols) * machine epsilon * largest singular value
pub fn numerical_rank(M: &DMatrix<f64>) -> usize {
    let singular_values = M.singular_values();
    if singular_values.is_empty() {
        return 0;
    }
    let tolerance = M.nrows().max(M.ncols()) as f64 * f64::EPSILON * singular_values.max();
    singular_values.iter().filter(|&&sigma| sigma > tolerance).count()
}

/// Euclidean norm of the residual of a computed solution under the given convention:
/// |A*x - b| for Standard, |A*x + b| for Negated
pub fn residual_norm(A: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>, convention: RhsConvention) -> f64 {
    let Ax = A * x;
    match convention {
        RhsConvention::Standard => (Ax - b).norm(),
        RhsConvention::Negated => (Ax + b).norm(),
    }
}

/// The condition number of a matrix is the ratio of its largest singular value to its smallest one.
/// Infinite for a singular matrix.
pub fn condition_number(A: &DMatrix<f64>) -> f64 {
    let singular_values = A.singular_values();
    if singular_values.is_empty() {
        return f64::INFINITY;
    }
    let max_sigma = singular_values.max();
    let min_sigma = singular_values.min();
    if min_sigma == 0.0 {
        f64::INFINITY
    } else {
        max_sigma / min_sigma
    }
}

/// A system of linear equations is said to be poorly conditioned if the solution is sensitive to small changes in the input data.
pub fn poorly_conditioned(A: &DMatrix<f64>, threshold: f64) -> bool {
    let condition_number = condition_number(A);
    let poorly_conditioned = condition_number > threshold;
    if poorly_conditioned {
        warn!(
            "The system of linear equations is poorly conditioned. Condition number = {:.2}",
            condition_number
        );
    }
    poorly_conditioned
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemDiagnostics {
    pub has_solution: bool,
    pub condition_number: f64,
    pub poorly_conditioned: bool,
}

/// solvability and conditioning of A*x = b in one pass
pub fn linear_system_diagnostics(A: &DMatrix<f64>, b: &DVector<f64>, threshold: f64) -> SystemDiagnostics {
    let condition_number = condition_number(A);
    SystemDiagnostics {
        has_solution: has_solution(A, b),
        condition_number,
        poorly_conditioned: condition_number > threshold,
    }
}

/// famous example of ill-conditioned matrix
pub fn hilbert_matrix(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| 1.0 / (i as f64 + j as f64 + 1.0))
}
