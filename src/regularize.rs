//! Regularization matrix construction and the cached pseudo-inverse.
//!
//! Both the precomputed difference-imaging path and the per-iteration
//! Gauss-Newton path build their regularization matrix through the same
//! [`reg_matrix`] so the two modes agree numerically whenever their
//! parameters match.

use ndarray::Array2;

use crate::config::RegMethod;
use crate::error::ReconError;
use crate::math::{conj_transpose, solve_many, SolverScalar};

/// Build the regularization matrix R from G = J^H J.
///
/// Kotre: `R = diag(diag(G)^p)`. Marquardt-Levenberg: `R = I`.
pub fn reg_matrix<T: SolverScalar>(g: &Array2<T>, p: f64, method: RegMethod) -> Array2<T> {
    match method {
        RegMethod::Kotre => Array2::from_diag(&g.diag().mapv(|d| d.powf(p))),
        RegMethod::Lm => Array2::eye(g.nrows()),
    }
}

/// Build the pseudo-inverse `H = (J^H J + lamb * R)^-1 J^H`.
///
/// This is the setup-time matrix cached by the difference-imaging solver.
/// The regularization is what makes `J^H J + lamb * R` invertible in the
/// under-determined EIT case (more elements than measurements); if it is
/// still singular the solve fails with [`ReconError::Numerical`].
///
/// # Arguments
///
/// * `jac` - Jacobian at the linearization point, shape (m, n).
/// * `p` - Regularization exponent, >= 0.
/// * `lamb` - Regularization weight, >= 0.
/// * `method` - Regularization matrix method.
///
/// # Returns
///
/// The (n, m) pseudo-inverse matrix.
pub fn h_matrix<T: SolverScalar>(
    jac: &Array2<T>,
    p: f64,
    lamb: f64,
    method: RegMethod,
) -> Result<Array2<T>, ReconError> {
    if p < 0.0 {
        return Err(ReconError::Config(format!(
            "regularization exponent p must be >= 0, got {}",
            p
        )));
    }
    if lamb < 0.0 {
        return Err(ReconError::Config(format!(
            "regularization weight lamb must be >= 0, got {}",
            lamb
        )));
    }

    let jh = conj_transpose(jac);
    let g = jh.dot(jac);
    let r = reg_matrix(&g, p, method);
    let lamb_t = T::from_real(lamb);
    let damped = &g + &r.mapv(|x| x * lamb_t);
    solve_many(&damped, &jh)
}
