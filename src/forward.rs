use ndarray::{Array1, Array2};

use crate::math::SolverScalar;

/// Output of one forward solve: simulated boundary voltages and the Jacobian
/// at that operating point.
#[derive(Debug, Clone)]
pub struct ForwardSolution<T> {
    /// Simulated boundary voltages, length m.
    pub v: Array1<T>,
    /// Sensitivity of the voltages to the conductivity, shape (m, n).
    pub jac: Array2<T>,
}

/// The external forward-model collaborator.
///
/// Given a conductivity vector, an implementor simulates the boundary
/// voltages and returns a fresh Jacobian at that linearization point.
/// Excitation pattern, measurement stepping and parser configuration are
/// implementor state, not part of this seam.
///
/// The Gauss-Newton loop treats the implementor as a black-box oracle; it
/// must be deterministic for identical inputs or the reconstruction is not
/// reproducible.
pub trait ForwardModel<T: SolverScalar> {
    fn solve(&self, perm: &Array1<T>) -> anyhow::Result<ForwardSolution<T>>;
}
