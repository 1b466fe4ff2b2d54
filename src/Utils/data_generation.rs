//! Random test problems: linear systems that are guaranteed to be solvable and noisy samples of a polynomial.
use crate::numerical::error::NumericalError;
use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// seeded generator for reproducible data, thread generator otherwise
fn generator(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn check_range(low: f64, high: f64) -> Result<(), NumericalError> {
    if !(low.is_finite() && high.is_finite() && low < high) {
        return Err(NumericalError::InvalidInput(format!(
            "random values need a finite range low < high, got [{}, {}]",
            low, high
        )));
    }
    Ok(())
}

/// n x n system A*x = b with entries from [low, high). The diagonal is replaced by the sum of
/// absolute values of the row plus one, so A is strictly diagonally dominant and nonsingular.
pub fn random_system(
    n: usize,
    low: f64,
    high: f64,
    seed: Option<u64>,
) -> Result<(DMatrix<f64>, DVector<f64>), NumericalError> {
    if n == 0 {
        return Err(NumericalError::InvalidInput("system size must be at least 1".to_string()));
    }
    check_range(low, high)?;
    let mut rng = generator(seed);
    let mut A = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                A[(i, j)] = rng.random_range(low..high);
            }
        }
        let off_diagonal: f64 = A.row(i).iter().map(|v: &f64| v.abs()).sum();
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        A[(i, i)] = sign * (off_diagonal + 1.0);
    }
    let b = DVector::from_fn(n, |_, _| rng.random_range(low..high));
    debug!("generated {}x{} diagonally dominant system", n, n);
    Ok((A, b))
}

/// `count` points evenly spaced on [x_start, x_end] lying on the polynomial with the given
/// coefficients (low to high degree) plus uniform noise from [-noise, noise]
pub fn noisy_polynomial_data(
    coefficients: &[f64],
    x_start: f64,
    x_end: f64,
    count: usize,
    noise: f64,
    seed: Option<u64>,
) -> Result<Vec<(f64, f64)>, NumericalError> {
    check_range(x_start, x_end)?;
    if count < 2 {
        return Err(NumericalError::InvalidInput(format!(
            "at least 2 points are needed, got {}",
            count
        )));
    }
    if !(noise >= 0.0 && noise.is_finite()) {
        return Err(NumericalError::InvalidInput(format!(
            "noise amplitude must be non-negative, got {}",
            noise
        )));
    }
    let mut rng = generator(seed);
    let step = (x_end - x_start) / (count - 1) as f64;
    let points = (0..count)
        .map(|i| {
            let x = x_start + i as f64 * step;
            let y = coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c);
            let perturbation = if noise > 0.0 { rng.random_range(-noise..=noise) } else { 0.0 };
            (x, y + perturbation)
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::optimization::polynomial_fit::{PolynomialDegree, fit_polynomial};
    use crate::somelinalg::dense_solvers::LinearSystemSolver;
    use crate::somelinalg::linear_sys_diagnostics::residual_norm;
    use crate::somelinalg::dense_solvers::RhsConvention;

    #[test]
    fn test_random_system_is_diagonally_dominant() {
        let (A, b) = random_system(6, -5.0, 5.0, Some(42)).unwrap();
        assert_eq!(A.shape(), (6, 6));
        assert_eq!(b.len(), 6);
        for i in 0..6 {
            let off: f64 = (0..6).filter(|&j| j != i).map(|j| A[(i, j)].abs()).sum();
            assert!(A[(i, i)].abs() > off);
        }
        let x = LinearSystemSolver::new().gauss_elimination(&A, &b).unwrap();
        assert!(residual_norm(&A, &x, &b, RhsConvention::Standard) < 1e-9);
    }

    #[test]
    fn test_seed_reproducibility() {
        let first = random_system(4, 0.0, 1.0, Some(7)).unwrap();
        let second = random_system(4, 0.0, 1.0, Some(7)).unwrap();
        assert_eq!(first, second);
        let points_a = noisy_polynomial_data(&[1.0, 2.0], 0.0, 1.0, 10, 0.1, Some(3)).unwrap();
        let points_b = noisy_polynomial_data(&[1.0, 2.0], 0.0, 1.0, 10, 0.1, Some(3)).unwrap();
        assert_eq!(points_a, points_b);
    }

    #[test]
    fn test_noise_free_data_lies_on_polynomial() {
        let points = noisy_polynomial_data(&[1.0, 0.0, 2.0], -1.0, 1.0, 5, 0.0, None).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (-1.0, 3.0));
        assert_eq!(points[2], (0.0, 1.0));
        assert_eq!(points[4], (1.0, 3.0));
    }

    #[test]
    fn test_noisy_line_is_fitted() {
        let points = noisy_polynomial_data(&[2.0, 5.0], 0.0, 10.0, 50, 0.1, Some(11)).unwrap();
        for (x, y) in &points {
            assert!((y - (2.0 + 5.0 * x)).abs() <= 0.1 + 1e-12);
        }
        let fit = fit_polynomial(&points, PolynomialDegree::Linear).unwrap();
        assert!((fit.coefficients[1] - 5.0).abs() < 0.05);
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(random_system(0, 0.0, 1.0, None).is_err());
        assert!(random_system(3, 1.0, 1.0, None).is_err());
        assert!(noisy_polynomial_data(&[1.0], 0.0, 1.0, 1, 0.0, None).is_err());
        assert!(noisy_polynomial_data(&[1.0], 0.0, 1.0, 5, -0.5, None).is_err());
    }
}
