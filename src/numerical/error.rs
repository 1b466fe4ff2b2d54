use std::fmt;

/// The supplied function could not be evaluated at the requested point
/// (division by zero, logarithm of a negative number, non-finite result...)
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    pub reason: String,
}

impl DomainError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// domain error for a scalar argument
    pub fn at_point(x: f64, reason: &str) -> Self {
        Self {
            reason: format!("function is undefined at x = {}: {}", x, reason),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for DomainError {}

/// Error types shared by all numerical methods of the crate.
/// Reaching the iteration limit is NOT an error: every result carries a `converged` flag instead.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericalError {
    /// a >= b, or non-positive (or too coarse) tolerance
    InvalidInterval { a: f64, b: f64, epsilon: f64 },
    /// f(a) and f(b) have the same sign
    NoSignChange { a: f64, b: f64, fa: f64, fb: f64 },
    /// zero (or numerically zero) pivot or determinant
    Singular,
    /// the function failed at a point the algorithm cannot skip
    DomainError(DomainError),
    /// caller requested early termination
    Cancelled,
    InvalidInput(String),
}

impl fmt::Display for NumericalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NumericalError::InvalidInterval { a, b, epsilon } => {
                if a >= b {
                    write!(f, "Invalid interval: a = {} must be less than b = {}", a, b)
                } else {
                    write!(
                        f,
                        "Invalid tolerance {} for interval [{}, {}]",
                        epsilon, a, b
                    )
                }
            }
            NumericalError::NoSignChange { a, b, fa, fb } => write!(
                f,
                "Function does not change sign on [{}, {}]: f(a) = {:.6}, f(b) = {:.6}",
                a, b, fa, fb
            ),
            NumericalError::Singular => write!(f, "Matrix is singular, system has no unique solution"),
            NumericalError::DomainError(err) => write!(f, "Domain error: {}", err),
            NumericalError::Cancelled => write!(f, "Calculation cancelled"),
            NumericalError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for NumericalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NumericalError::DomainError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomainError> for NumericalError {
    fn from(err: DomainError) -> Self {
        NumericalError::DomainError(err)
    }
}

/// checks shared by all bracketing methods: a < b, finite ends, epsilon > 0
pub fn validate_interval(a: f64, b: f64, epsilon: f64) -> Result<(), NumericalError> {
    if !a.is_finite() || !b.is_finite() || a >= b || !(epsilon > 0.0) || !epsilon.is_finite() {
        return Err(NumericalError::InvalidInterval { a, b, epsilon });
    }
    Ok(())
}
