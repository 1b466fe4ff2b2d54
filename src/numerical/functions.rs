//! Callable capabilities consumed by the numerical methods.
//!
//! Algorithms never inspect how a function is built: they only call `evaluate` and treat
//! an `Err(DomainError)` as "this sample is unusable".
use crate::numerical::error::DomainError;
use nalgebra::DVector;

/// Function of one variable f(x)
pub trait ScalarFunction {
    /// Evaluate the function at point x
    fn evaluate(&self, x: f64) -> Result<f64, DomainError>;

    /// Get function name for debugging/logging
    fn name(&self) -> &str {
        "unnamed_function"
    }
}

/// Function of several variables f(x1, ..., xk)
pub trait VectorFunction {
    fn evaluate(&self, x: &DVector<f64>) -> Result<f64, DomainError>;

    fn name(&self) -> &str {
        "unnamed_function"
    }
}

/// Simple function wrapper for closures returning plain f64.
/// NaN and infinite values are reported as domain errors.
pub struct ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    func: F,
    name: String,
}

impl<F> ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    pub fn new(func: F, name: &str) -> Self {
        Self {
            func,
            name: name.to_string(),
        }
    }
}

impl<F> ScalarFunction for ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    fn evaluate(&self, x: f64) -> Result<f64, DomainError> {
        let value = (self.func)(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DomainError::at_point(x, &format!("{} returned {}", self.name, value)))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrapper for closures that report domain errors themselves
/// (e.g. an external expression evaluator)
pub struct FallibleFunction<F>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    func: F,
    name: String,
}

impl<F> FallibleFunction<F>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    pub fn new(func: F, name: &str) -> Self {
        Self {
            func,
            name: name.to_string(),
        }
    }
}

impl<F> ScalarFunction for FallibleFunction<F>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    fn evaluate(&self, x: f64) -> Result<f64, DomainError> {
        let value = (self.func)(x)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DomainError::at_point(x, "non-finite value"))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure wrapper for functions of several variables
pub struct ClosureVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> f64,
{
    func: F,
    name: String,
}

impl<F> ClosureVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> f64,
{
    pub fn new(func: F, name: &str) -> Self {
        Self {
            func,
            name: name.to_string(),
        }
    }
}

impl<F> VectorFunction for ClosureVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> f64,
{
    fn evaluate(&self, x: &DVector<f64>) -> Result<f64, DomainError> {
        let value = (self.func)(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DomainError::new(format!(
                "{} is undefined at {:?}: returned {}",
                self.name,
                x.as_slice(),
                value
            )))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct FallibleVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> Result<f64, DomainError>,
{
    func: F,
    name: String,
}

impl<F> FallibleVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> Result<f64, DomainError>,
{
    pub fn new(func: F, name: &str) -> Self {
        Self {
            func,
            name: name.to_string(),
        }
    }
}

impl<F> VectorFunction for FallibleVectorFunction<F>
where
    F: Fn(&DVector<f64>) -> Result<f64, DomainError>,
{
    fn evaluate(&self, x: &DVector<f64>) -> Result<f64, DomainError> {
        let value = (self.func)(x)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DomainError::new(format!(
                "{} returned a non-finite value at {:?}",
                self.name,
                x.as_slice()
            )))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
