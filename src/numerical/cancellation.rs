use crate::numerical::error::NumericalError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between the caller (UI thread) and a running solver.
/// Solvers poll it once per outer iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Err(Cancelled) once cancellation was requested
    pub fn check(&self) -> Result<(), NumericalError> {
        if self.is_cancelled() {
            Err(NumericalError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// polling helper for solvers holding an optional token
pub fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), NumericalError> {
    match token {
        Some(token) => token.check(),
        None => Ok(()),
    }
}
