use std::fmt;
use std::ops::Neg;

use ndarray::LinalgScalar;
use num_complex::Complex64;
use num_traits::{One, Zero};

/// Scalar element of the measurement and conductivity vectors.
///
/// EIT data is real for DC-like excitation and complex for multi-frequency
/// systems; the solvers are generic over both through this trait. Conjugation
/// is the identity for real scalars, so `J^H` degrades to the plain transpose.
pub trait SolverScalar:
    LinalgScalar + Zero + One + Neg<Output = Self> + PartialEq + fmt::Debug + Send + Sync
{
    /// Complex conjugate; identity for real scalars.
    fn conj(self) -> Self;
    /// Modulus, used for pivot selection in the LU factorization.
    fn modulus(self) -> f64;
    /// Element-wise real power.
    fn powf(self, p: f64) -> Self;
    /// Lift a real number into the scalar type.
    fn from_real(x: f64) -> Self;
}

impl SolverScalar for f64 {
    fn conj(self) -> Self {
        self
    }

    fn modulus(self) -> f64 {
        self.abs()
    }

    fn powf(self, p: f64) -> Self {
        f64::powf(self, p)
    }

    fn from_real(x: f64) -> Self {
        x
    }
}

impl SolverScalar for Complex64 {
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }

    fn modulus(self) -> f64 {
        self.norm()
    }

    fn powf(self, p: f64) -> Self {
        Complex64::powf(self, p)
    }

    fn from_real(x: f64) -> Self {
        Complex64::new(x, 0.0)
    }
}
