/// using Bisection and golden-section search to find roots and extrema of a scalar function of one variable
pub mod minimize_scalar;
/// Newton's method for minimization of a scalar function with finite-difference derivatives
pub mod newton_minimizer;
/// coordinate descent with fixed step for functions of 2 or 3 variables
pub mod coordinate_descent;
/// least-squares fitting of linear and quadratic polynomials
pub mod polynomial_fit;
