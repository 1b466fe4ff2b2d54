//! Least-squares polynomial fitting (degree 1 and 2) through the normal equations.
use crate::Utils::formatting::polynomial_equation;
use crate::numerical::error::NumericalError;
use crate::somelinalg::dense_solvers::{LinearSystemSolver, RhsConvention};
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use strum_macros::{Display, EnumIter};

/// below this total sum of squares all y are considered equal and R² is 1
pub const FLAT_DATA_THRESHOLD: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PolynomialDegree {
    Linear,
    Quadratic,
}

impl PolynomialDegree {
    pub fn as_usize(&self) -> usize {
        match self {
            PolynomialDegree::Linear => 1,
            PolynomialDegree::Quadratic => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    pub degree: PolynomialDegree,
    /// c0, c1, ... from low to high degree
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    /// number of points used after dropping non-finite ones
    pub points_used: usize,
}

impl PolynomialFit {
    /// Horner evaluation of the fitted polynomial
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn equation(&self) -> String {
        polynomial_equation(&self.coefficients)
    }
}

/// Fit y = c0 + c1 x (+ c2 x²) to the points by least squares.
/// Points with non-finite coordinates are ignored; at least two must remain.
pub fn fit_polynomial(points: &[(f64, f64)], degree: PolynomialDegree) -> Result<PolynomialFit, NumericalError> {
    let points: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if points.len() < 2 {
        return Err(NumericalError::InvalidInput(format!(
            "least squares needs at least 2 finite points, got {}",
            points.len()
        )));
    }
    let size = degree.as_usize() + 1;

    // normal equations: A[i][j] = sum x^(i+j), b[i] = sum y x^i
    let mut power_sums = vec![0.0; 2 * size - 1];
    let mut b = DVector::zeros(size);
    for &(x, y) in &points {
        let mut power = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += power;
            if k < size {
                b[k] += y * power;
            }
            power *= x;
        }
    }
    let A = DMatrix::from_fn(size, size, |i, j| power_sums[i + j]);
    debug!("normal equations: A = {}, b = {}", A, b);

    let solver = LinearSystemSolver::with_convention(RhsConvention::Standard);
    let coefficients: Vec<f64> = solver.gauss_elimination(&A, &b)?.iter().copied().collect();

    let mut fit = PolynomialFit {
        degree,
        coefficients,
        r_squared: 0.0,
        points_used: points.len(),
    };
    fit.r_squared = r_squared(&points, |x| fit.evaluate(x));
    info!("{} fit: {}, R² = {:.6}", degree, fit.equation(), fit.r_squared);
    Ok(fit)
}

/// coefficient of determination 1 - SS_res / SS_tot clamped to [0, 1]
pub fn r_squared<F>(points: &[(f64, f64)], model: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if points.is_empty() {
        return 0.0;
    }
    let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean).powi(2)).sum();
    if ss_tot < FLAT_DATA_THRESHOLD {
        return 1.0;
    }
    let ss_res: f64 = points.iter().map(|&(x, y)| (y - model(x)).powi(2)).sum();
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

/// both fits on the same data, as shown side by side
pub fn fit_linear_and_quadratic(
    points: &[(f64, f64)],
) -> Result<(PolynomialFit, PolynomialFit), NumericalError> {
    let linear = fit_polynomial(points, PolynomialDegree::Linear)?;
    let quadratic = fit_polynomial(points, PolynomialDegree::Quadratic)?;
    Ok((linear, quadratic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fit_of_noisy_points() {
        let points = [(1.0, 2.1), (2.0, 3.9), (3.0, 6.2), (4.0, 7.8), (5.0, 10.1)];
        let fit = fit_polynomial(&points, PolynomialDegree::Linear).unwrap();
        assert_eq!(fit.coefficients.len(), 2);
        assert!(fit.coefficients[1] > 0.0);
        assert!(fit.r_squared > 0.9);
        // closed form: slope = 1.99, intercept = 0.05
        assert_relative_eq!(fit.coefficients[1], 1.99, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[0], 0.05, epsilon = 1e-10);
    }

    #[test]
    fn test_linear_fit_of_growing_measurements() {
        let points = [(1.0, 2.1), (2.0, 3.2), (3.0, 4.8), (4.0, 6.1), (5.0, 7.3)];
        let fit = fit_polynomial(&points, PolynomialDegree::Linear).unwrap();
        assert!(fit.coefficients[1] > 0.0);
        assert!(fit.r_squared > 0.9);
        // Sxy = 13.3, Sxx = 10
        assert_relative_eq!(fit.coefficients[1], 1.33, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[0], 0.71, epsilon = 1e-10);
        assert_eq!(fit.points_used, 5);
    }

    #[test]
    fn test_exact_quadratic_is_recovered() {
        let points: Vec<(f64, f64)> = (-3..=3)
            .map(|i| {
                let x = i as f64;
                (x, 1.0 - 2.5 * x + 0.5 * x * x)
            })
            .collect();
        let fit = fit_polynomial(&points, PolynomialDegree::Quadratic).unwrap();
        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], -2.5, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[2], 0.5, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_eq!(fit.equation(), "y = 1 - 2.5x + 0.5x²");
        assert_relative_eq!(fit.evaluate(2.0), 1.0 - 5.0 + 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_data_has_unit_r_squared() {
        let points = [(0.0, 3.0), (1.0, 3.0), (2.0, 3.0)];
        let fit = fit_polynomial(&points, PolynomialDegree::Linear).unwrap();
        assert_eq!(fit.r_squared, 1.0);
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(fit.coefficients[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_r_squared_is_clamped() {
        let points = [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        // a model far worse than the mean would give a negative value
        assert_eq!(r_squared(&points, |_| 100.0), 0.0);
        assert_eq!(r_squared(&[], |x| x), 0.0);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_polynomial(&[(1.0, 1.0)], PolynomialDegree::Linear),
            Err(NumericalError::InvalidInput(_))
        ));
        // non-finite points are dropped before counting
        assert!(matches!(
            fit_polynomial(&[(1.0, 1.0), (f64::NAN, 2.0)], PolynomialDegree::Linear),
            Err(NumericalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_degenerate_x_is_singular() {
        // all x equal: the normal matrix has rank 1
        let points = [(2.0, 1.0), (2.0, 3.0), (2.0, 5.0)];
        assert_eq!(
            fit_polynomial(&points, PolynomialDegree::Linear),
            Err(NumericalError::Singular)
        );
    }

    #[test]
    fn test_fit_linear_and_quadratic() {
        let points = [(0.0, 1.0), (1.0, 2.0), (2.0, 5.0), (3.0, 10.0)];
        let (linear, quadratic) = fit_linear_and_quadratic(&points).unwrap();
        assert_eq!(linear.degree, PolynomialDegree::Linear);
        assert_eq!(quadratic.degree, PolynomialDegree::Quadratic);
        assert!(quadratic.r_squared >= linear.r_squared);
        assert_relative_eq!(quadratic.r_squared, 1.0, epsilon = 1e-10);
    }
}
