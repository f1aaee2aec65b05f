//! Jacobian-regularized EIT reconstruction.
//!
//! [`JacSolver`] owns the setup-time Jacobian, the baseline conductivity and
//! the cached pseudo-inverse H. Difference imaging applies H to voltage
//! differences in a handful of variants; the Gauss-Newton loop instead
//! re-linearizes an external [`ForwardModel`] every iteration and solves the
//! damped normal equations for the update step.

use ndarray::{Array1, Array2};

use crate::config::{GnOptions, SolverParams};
use crate::error::ReconError;
use crate::forward::ForwardModel;
use crate::math::{self, conj_transpose, SolverScalar};
use crate::regularize::{h_matrix, reg_matrix};

/// Difference-imaging and Gauss-Newton solver around a fixed Jacobian.
///
/// The pseudo-inverse `H = (J^H J + lamb * R)^-1 J^H` is computed once at
/// construction and is read-only afterwards, so a shared solver is safe for
/// unsynchronized concurrent reads.
pub struct JacSolver<T> {
    jac: Array2<T>,
    perm: Array1<T>,
    params: SolverParams,
    h: Array2<T>,
}

impl<T: SolverScalar> JacSolver<T> {
    /// Set up the solver: validate parameters and precompute H.
    ///
    /// # Arguments
    ///
    /// * `jac` - Jacobian at the baseline, shape (m, n).
    /// * `perm` - Baseline conductivity, length n. Also the default initial
    ///   guess for [`JacSolver::gn`].
    /// * `params` - Regularization parameters fixed for this solver.
    pub fn new(jac: Array2<T>, perm: Array1<T>, params: SolverParams) -> Result<Self, ReconError> {
        params.validate()?;
        if perm.len() != jac.ncols() {
            return Err(ReconError::ShapeMismatch {
                what: "baseline conductivity length",
                expected: jac.ncols(),
                actual: perm.len(),
            });
        }
        let h = h_matrix(&jac, params.p, params.lamb, params.method)?;
        log::debug!(
            "solver setup: {} measurements, {} elements, p = {}, lamb = {}, method = {}",
            jac.nrows(),
            jac.ncols(),
            params.p,
            params.lamb,
            params.method
        );
        Ok(JacSolver {
            jac,
            perm,
            params,
            h,
        })
    }

    /// The cached pseudo-inverse, shape (n, m).
    pub fn h(&self) -> &Array2<T> {
        &self.h
    }

    pub fn jac(&self) -> &Array2<T> {
        &self.jac
    }

    pub fn perm(&self) -> &Array1<T> {
        &self.perm
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    fn check_frame(&self, v: &Array1<T>, what: &'static str) -> Result<(), ReconError> {
        if v.len() != self.jac.nrows() {
            return Err(ReconError::ShapeMismatch {
                what,
                expected: self.jac.nrows(),
                actual: v.len(),
            });
        }
        Ok(())
    }

    /// Dynamic (difference-imaging) solve between two measurement frames.
    ///
    /// Computes `dv = v1 - v0`, or `-(v1 - v0) / v0` element-wise when
    /// `normalize` is set, and returns `-H * dv`. Zero entries in `v0` under
    /// normalization are the caller's responsibility; they are not checked
    /// here.
    ///
    /// # Arguments
    ///
    /// * `v1` - Current measurement frame, length m.
    /// * `v0` - Reference frame, length m.
    /// * `normalize` - Divide the difference element-wise by the reference.
    ///
    /// # Returns
    ///
    /// Conductivity change per element, length n.
    pub fn solve(
        &self,
        v1: &Array1<T>,
        v0: &Array1<T>,
        normalize: bool,
    ) -> Result<Array1<T>, ReconError> {
        let dv = self.frame_difference(v1, v0, normalize)?;
        Ok(-self.h.dot(&dv))
    }

    /// Apply the cached pseudo-inverse to an already-differenced signal,
    /// returning `-H * v`.
    pub fn map(&self, v: &Array1<T>) -> Result<Array1<T>, ReconError> {
        self.check_frame(v, "difference signal length")?;
        Ok(-self.h.dot(v))
    }

    /// Gain-scaled solve.
    ///
    /// Fits the scalar gain `a = (v1 . v0) / (v0 . v0)` between the frames
    /// and reconstructs from `dv = v1 - a * v0`, compensating for global
    /// gain drift between the two measurements.
    pub fn solve_gs(&self, v1: &Array1<T>, v0: &Array1<T>) -> Result<Array1<T>, ReconError> {
        self.check_frame(v1, "current frame length")?;
        self.check_frame(v0, "reference frame length")?;
        let a = v1.dot(v0) / v0.dot(v0);
        let dv = v1 - &v0.mapv(|x| x * a);
        Ok(-self.h.dot(&dv))
    }

    /// Naive back-projection baseline, `-J^H * dv`.
    ///
    /// Bypasses the regularized pseudo-inverse entirely; useful as a fast,
    /// unregularized comparison estimate.
    pub fn bp_solve(
        &self,
        v1: &Array1<T>,
        v0: &Array1<T>,
        normalize: bool,
    ) -> Result<Array1<T>, ReconError> {
        let dv = self.frame_difference(v1, v0, normalize)?;
        Ok(-conj_transpose(&self.jac).dot(&dv))
    }

    fn frame_difference(
        &self,
        v1: &Array1<T>,
        v0: &Array1<T>,
        normalize: bool,
    ) -> Result<Array1<T>, ReconError> {
        self.check_frame(v1, "current frame length")?;
        self.check_frame(v0, "reference frame length")?;
        let dv = if normalize {
            v1.iter()
                .zip(v0.iter())
                .map(|(&a, &b)| -(a - b) / b)
                .collect()
        } else {
            v1 - v0
        };
        Ok(dv)
    }

    /// Iterative Gauss-Newton reconstruction.
    ///
    /// Runs exactly `opts.maxiter` iterations. Each iteration calls the
    /// forward model at the current estimate, forms the damped normal
    /// equations `(J^H J + lamb * R) d = J^H (v - fs.v)` with the current
    /// lambda, solves for the update `d` and replaces `x0` with `x0 - d`.
    /// Lambda decays by `opts.lamb_decay` after the update while it is above
    /// `opts.lamb_min`, feeding into the next iteration only.
    ///
    /// A forward-model failure or a singular system aborts the whole run;
    /// partial iteration results are discarded.
    ///
    /// # Arguments
    ///
    /// * `fwd` - Forward-model collaborator.
    /// * `v` - Measured boundary voltages, length m.
    /// * `x0` - Initial guess; defaults to the solver's baseline `perm`.
    /// * `opts` - Iteration count, decay schedule and per-field parameter
    ///   overrides.
    ///
    /// # Returns
    ///
    /// The estimate after the final iteration, length n.
    pub fn gn<F>(
        &self,
        fwd: &F,
        v: &Array1<T>,
        x0: Option<&Array1<T>>,
        opts: &GnOptions,
    ) -> Result<Array1<T>, ReconError>
    where
        F: ForwardModel<T>,
    {
        opts.validate()?;
        self.check_frame(v, "measured frame length")?;

        let p = opts.p.unwrap_or(self.params.p);
        let mut lamb = opts.lamb.unwrap_or(self.params.lamb);
        let method = opts.method.unwrap_or(self.params.method);

        let mut x0 = match x0 {
            Some(x) => {
                if x.len() != self.jac.ncols() {
                    return Err(ReconError::ShapeMismatch {
                        what: "initial estimate length",
                        expected: self.jac.ncols(),
                        actual: x.len(),
                    });
                }
                x.to_owned()
            }
            None => self.perm.clone(),
        };

        for i in 0..opts.maxiter {
            log::debug!("iter = {}, lamb = {}", i, lamb);

            let fs = fwd.solve(&x0).map_err(ReconError::Forward)?;
            if fs.v.len() != v.len() {
                return Err(ReconError::ShapeMismatch {
                    what: "forward voltage length",
                    expected: v.len(),
                    actual: fs.v.len(),
                });
            }
            if fs.jac.nrows() != fs.v.len() {
                return Err(ReconError::ShapeMismatch {
                    what: "forward Jacobian rows",
                    expected: fs.v.len(),
                    actual: fs.jac.nrows(),
                });
            }
            if fs.jac.ncols() != x0.len() {
                return Err(ReconError::ShapeMismatch {
                    what: "forward Jacobian columns",
                    expected: x0.len(),
                    actual: fs.jac.ncols(),
                });
            }

            let r0 = v - &fs.v;
            let jh = conj_transpose(&fs.jac);
            let j_r = jh.dot(&r0);
            let g = jh.dot(&fs.jac);

            let r_mat = reg_matrix(&g, p, method);
            let lamb_t = T::from_real(lamb);
            let damped = &g + &r_mat.mapv(|x| x * lamb_t);

            let d = math::solve(&damped, &j_r)?;
            x0 = &x0 - &d;

            if lamb > opts.lamb_min {
                lamb *= opts.lamb_decay;
            }
        }

        Ok(x0)
    }
}
