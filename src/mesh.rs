//! Spatial adjacency filter over the element graph of a triangular mesh.
//!
//! Two elements are adjacent when they share at least one mesh node. The
//! resulting graph Laplacian acts as a spatial high-pass filter on a
//! reconstructed conductivity change. This is a legacy post-processing step
//! kept for compatibility with older pipelines; it is not part of the
//! primary reconstruction path.

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::math::SolverScalar;

/// Build the element-adjacency Laplacian D from element-to-node connectivity.
///
/// For element i with neighbor set of size k (elements sharing at least one
/// node with i, excluding i itself): `D[i][i] = k` and `D[i][j] = -1` for
/// each neighbor j. Every row sums to zero by construction.
///
/// # Arguments
///
/// * `el2no` - (ne, 3) node indices per triangular element.
///
/// # Returns
///
/// The (ne, ne) adjacency Laplacian.
pub fn adjacency_matrix<T: SolverScalar>(el2no: &Array2<usize>) -> Array2<T> {
    assert_eq!(
        el2no.ncols(),
        3,
        "adjacency_matrix expects triangular elements (3 nodes per row)"
    );
    let ne = el2no.nrows();

    let mut node_elems: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, row) in el2no.outer_iter().enumerate() {
        for &node in row.iter() {
            node_elems.entry(node).or_default().push(i);
        }
    }

    // Row-parallel neighbor scan; output is deterministic since rows are
    // assembled in element order afterwards.
    let neighbors: Vec<Vec<usize>> = (0..ne)
        .into_par_iter()
        .map(|i| {
            let mut idx: Vec<usize> = el2no
                .row(i)
                .iter()
                .flat_map(|node| node_elems[node].iter().copied())
                .collect();
            idx.sort_unstable();
            idx.dedup();
            idx
        })
        .collect();

    let mut d_mat: Array2<T> = Array2::zeros((ne, ne));
    for (i, idx) in neighbors.iter().enumerate() {
        for &j in idx {
            d_mat[[i, j]] = T::from_real(-1.0);
        }
        // idx includes element i itself; the diagonal holds the count of the
        // true neighbors only.
        d_mat[[i, i]] = T::from_real((idx.len() - 1) as f64);
    }

    log::debug!("adjacency matrix built for {} elements", ne);
    d_mat
}

/// Apply the adjacency filter to a conductivity change, `D * ds`.
///
/// Legacy smoothing projection; suppresses estimates that vary smoothly
/// across the shared-node element graph.
pub fn project<T: SolverScalar>(d_mat: &Array2<T>, ds: &Array1<T>) -> Array1<T> {
    d_mat.dot(ds)
}
