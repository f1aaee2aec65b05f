use std::error::Error;
use std::fmt;

/// Custom error type for reconstruction failures.
///
/// The crate is a fail-fast numerical core: nothing retries or re-regularizes
/// locally, every failure propagates to the caller so a physically meaningless
/// estimate is never returned silently.
#[derive(Debug)]
pub enum ReconError {
    /// Invalid solver configuration (unknown method, negative p or lambda,
    /// zero iteration count).
    Config(String),
    /// Singular or effectively singular system during a dense solve.
    Numerical(String),
    /// Inconsistent dimensions between the Jacobian, voltage frames, or the
    /// initial estimate.
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Failure propagated unmodified from the forward-model collaborator.
    Forward(anyhow::Error),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReconError::Config(msg) => write!(f, "invalid solver configuration: {}", msg),
            ReconError::Numerical(msg) => write!(f, "numerical failure: {}", msg),
            ReconError::ShapeMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch for {}: expected {}, got {}",
                what, expected, actual
            ),
            ReconError::Forward(err) => write!(f, "forward model error: {}", err),
        }
    }
}

impl Error for ReconError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReconError::Forward(err) => {
                let source: &(dyn Error + 'static) = err.as_ref();
                Some(source)
            }
            _ => None,
        }
    }
}
