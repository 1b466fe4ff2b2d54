//! numerical methods for functions of one and several variables
/// error types shared by all methods
pub mod error;
/// function abstractions consumed by the algorithms
pub mod functions;
/// cooperative cancellation of long computations
pub mod cancellation;
/// root finding, extremum search, coordinate descent and least squares
pub mod optimization;
/// rectangle, trapezoid and Simpson quadrature with automatic choice of n
pub mod integration;
