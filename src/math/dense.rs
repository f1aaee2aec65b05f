//! LU factorization with partial pivoting and the solves built on it.
//!
//! The systems in this crate are modest (thousands of unknowns at most) and
//! dense, so a textbook Doolittle factorization with row pivoting is enough.
//! Effectively singular matrices are reported as [`ReconError::Numerical`]
//! rather than producing garbage estimates.

use ndarray::{Array1, Array2};

use crate::error::ReconError;
use crate::math::scalar::SolverScalar;

/// Conjugate transpose. For real scalars this is the plain transpose.
pub fn conj_transpose<T: SolverScalar>(a: &Array2<T>) -> Array2<T> {
    a.t().mapv(T::conj)
}

/// LU factors of a square matrix, P*A = L*U with unit-diagonal L stored in
/// the strict lower triangle.
pub struct LuFactors<T> {
    lu: Array2<T>,
    perm: Vec<usize>,
}

/// Factor a square matrix.
///
/// Pivots whose modulus falls below `n * eps * max|a_ij|` are treated as
/// exact zeros, so a singular or hopelessly ill-conditioned system fails
/// instead of amplifying roundoff into the estimate.
pub fn lu_factor<T: SolverScalar>(a: &Array2<T>) -> Result<LuFactors<T>, ReconError> {
    let (n, m) = a.dim();
    if n != m {
        return Err(ReconError::ShapeMismatch {
            what: "square matrix",
            expected: n,
            actual: m,
        });
    }

    let mut lu = a.to_owned();
    let mut perm: Vec<usize> = (0..n).collect();
    let scale = lu.iter().map(|x| x.modulus()).fold(0.0_f64, f64::max);
    let tiny = n as f64 * f64::EPSILON * scale;

    for k in 0..n {
        // Partial pivoting: pick the row with the largest modulus in column k.
        let mut pivot_row = k;
        let mut pivot_mag = lu[[k, k]].modulus();
        for i in (k + 1)..n {
            let mag = lu[[i, k]].modulus();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = i;
            }
        }
        if pivot_mag <= tiny {
            return Err(ReconError::Numerical(format!(
                "matrix is singular or effectively singular (pivot {:.3e} in column {})",
                pivot_mag, k
            )));
        }
        if pivot_row != k {
            for j in 0..n {
                let tmp = lu[[k, j]];
                lu[[k, j]] = lu[[pivot_row, j]];
                lu[[pivot_row, j]] = tmp;
            }
            perm.swap(k, pivot_row);
        }

        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let factor = lu[[i, k]] / pivot;
            lu[[i, k]] = factor;
            for j in (k + 1)..n {
                let ukj = lu[[k, j]];
                lu[[i, j]] = lu[[i, j]] - factor * ukj;
            }
        }
    }

    Ok(LuFactors { lu, perm })
}

impl<T: SolverScalar> LuFactors<T> {
    pub fn order(&self) -> usize {
        self.lu.nrows()
    }

    /// Solve A*x = b for one right-hand side.
    pub fn solve_vec(&self, b: &Array1<T>) -> Result<Array1<T>, ReconError> {
        let n = self.order();
        if b.len() != n {
            return Err(ReconError::ShapeMismatch {
                what: "right-hand side length",
                expected: n,
                actual: b.len(),
            });
        }

        // Forward substitution, L*y = P*b.
        let mut y: Array1<T> = Array1::zeros(n);
        for i in 0..n {
            let mut acc = b[self.perm[i]];
            for j in 0..i {
                acc = acc - self.lu[[i, j]] * y[j];
            }
            y[i] = acc;
        }

        // Back substitution, U*x = y.
        let mut x: Array1<T> = Array1::zeros(n);
        for i in (0..n).rev() {
            let mut acc = y[i];
            for j in (i + 1)..n {
                acc = acc - self.lu[[i, j]] * x[j];
            }
            x[i] = acc / self.lu[[i, i]];
        }

        Ok(x)
    }
}

/// Solve A*x = b, factoring A once.
pub fn solve<T: SolverScalar>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, ReconError> {
    lu_factor(a)?.solve_vec(b)
}

/// Solve A*X = B column by column with a single factorization of A.
pub fn solve_many<T: SolverScalar>(a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, ReconError> {
    let factors = lu_factor(a)?;
    let n = factors.order();
    if b.nrows() != n {
        return Err(ReconError::ShapeMismatch {
            what: "right-hand side rows",
            expected: n,
            actual: b.nrows(),
        });
    }

    let mut x: Array2<T> = Array2::zeros((n, b.ncols()));
    for j in 0..b.ncols() {
        let col = factors.solve_vec(&b.column(j).to_owned())?;
        x.column_mut(j).assign(&col);
    }
    Ok(x)
}

/// Dense inverse via `solve_many` against the identity.
pub fn inv<T: SolverScalar>(a: &Array2<T>) -> Result<Array2<T>, ReconError> {
    let n = a.nrows();
    solve_many(a, &Array2::eye(n))
}
