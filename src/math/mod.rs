//! Dense linear-algebra kernels used throughout the crate.
//!
//! Provides the scalar abstraction over real and complex measurements and an
//! LU-based dense solver. These kernels are intentionally small so the solver
//! modules stay readable and easy to test.
pub mod dense;
pub mod scalar;

pub use dense::{conj_transpose, inv, lu_factor, solve, solve_many, LuFactors};
pub use scalar::SolverScalar;
