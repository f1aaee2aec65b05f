//! Integration tests for the iterative Gauss-Newton reconstruction.

use std::cell::RefCell;

use eit_recon::config::{GnOptions, RegMethod, SolverParams};
use eit_recon::error::ReconError;
use eit_recon::forward::{ForwardModel, ForwardSolution};
use eit_recon::solver::JacSolver;
use ndarray::{arr1, arr2, Array1, Array2};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Linear forward model: v = J * perm with a constant Jacobian.
struct LinearForward {
    jac: Array2<f64>,
    calls: RefCell<usize>,
}

impl LinearForward {
    fn new(jac: Array2<f64>) -> Self {
        LinearForward {
            jac,
            calls: RefCell::new(0),
        }
    }
}

impl ForwardModel<f64> for LinearForward {
    fn solve(&self, perm: &Array1<f64>) -> anyhow::Result<ForwardSolution<f64>> {
        *self.calls.borrow_mut() += 1;
        Ok(ForwardSolution {
            v: self.jac.dot(perm),
            jac: self.jac.clone(),
        })
    }
}

struct FailingForward;

impl ForwardModel<f64> for FailingForward {
    fn solve(&self, _perm: &Array1<f64>) -> anyhow::Result<ForwardSolution<f64>> {
        anyhow::bail!("electrode 3 is saturated")
    }
}

/// Forward model returning a voltage vector of the wrong length.
struct TruncatingForward;

impl ForwardModel<f64> for TruncatingForward {
    fn solve(&self, _perm: &Array1<f64>) -> anyhow::Result<ForwardSolution<f64>> {
        Ok(ForwardSolution {
            v: arr1(&[0.0]),
            jac: arr2(&[[1.0]]),
        })
    }
}

fn identity_solver() -> JacSolver<f64> {
    let jac = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
    JacSolver::new(jac, arr1(&[1.0, 2.0]), SolverParams::default()).unwrap()
}

fn scalar_solver() -> JacSolver<f64> {
    JacSolver::new(
        arr2(&[[1.0]]),
        arr1(&[1.0]),
        SolverParams {
            p: 0.0,
            lamb: 1.0,
            method: RegMethod::Lm,
        },
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Iteration semantics
// ---------------------------------------------------------------------------

#[test]
fn zero_residual_leaves_the_estimate_unchanged() {
    init_logger();
    let solver = identity_solver();
    let fwd = LinearForward::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    let x0 = arr1(&[1.0, 2.0]);
    // Measured voltages equal the forward prediction at x0, so the update
    // solves to the zero vector.
    let v = arr1(&[1.0, 2.0]);
    let x = solver.gn(&fwd, &v, Some(&x0), &GnOptions::default()).unwrap();
    assert_eq!(x, x0);
}

#[test]
fn runs_exactly_maxiter_iterations() {
    init_logger();
    let solver = identity_solver();
    let fwd = LinearForward::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    let opts = GnOptions {
        maxiter: 4,
        ..GnOptions::default()
    };
    solver
        .gn(&fwd, &arr1(&[0.5, 0.5]), None, &opts)
        .unwrap();
    assert_eq!(*fwd.calls.borrow(), 4);
}

#[test]
fn default_initial_guess_is_the_baseline() {
    let solver = identity_solver();
    let fwd = LinearForward::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    let v = arr1(&[0.0, 0.0]);
    let from_default = solver.gn(&fwd, &v, None, &GnOptions::default()).unwrap();
    let from_baseline = solver
        .gn(&fwd, &v, Some(&arr1(&[1.0, 2.0])), &GnOptions::default())
        .unwrap();
    assert_eq!(from_default, from_baseline);
}

#[test]
fn lambda_decays_after_each_iteration() {
    init_logger();
    // Scalar model: J = [1], forward v = x, measured v = 0. One iteration
    // with damping l maps x to x * (1 + 1 / (1 + l)), so the trajectory
    // pins down the damping sequence actually used.
    let solver = scalar_solver();
    let fwd = LinearForward::new(arr2(&[[1.0]]));
    let opts = GnOptions {
        maxiter: 3,
        lamb: Some(1.0),
        lamb_decay: 0.5,
        lamb_min: 0.1,
        method: Some(RegMethod::Lm),
        ..GnOptions::default()
    };
    let x = solver
        .gn(&fwd, &arr1(&[0.0]), Some(&arr1(&[1.0])), &opts)
        .unwrap();

    // Expected damping sequence [1.0, 0.5, 0.25]: decay applies after the
    // update, so the first iteration still sees the initial value.
    let mut expected = 1.0;
    for lamb in [1.0, 0.5, 0.25] {
        expected *= 1.0 + 1.0 / (1.0 + lamb);
    }
    assert!((x[0] - expected).abs() < 1e-12);
    assert!((expected - 4.5).abs() < 1e-12);
}

#[test]
fn lambda_stops_decaying_at_the_floor() {
    let solver = scalar_solver();
    let fwd = LinearForward::new(arr2(&[[1.0]]));
    let opts = GnOptions {
        maxiter: 3,
        lamb: Some(0.1),
        lamb_decay: 0.5,
        lamb_min: 0.1,
        method: Some(RegMethod::Lm),
        ..GnOptions::default()
    };
    let x = solver
        .gn(&fwd, &arr1(&[0.0]), Some(&arr1(&[1.0])), &opts)
        .unwrap();

    // lamb == lamb_min from the start, so every iteration uses 0.1.
    let mut expected = 1.0;
    for lamb in [0.1, 0.1, 0.1] {
        expected *= 1.0 + 1.0 / (1.0 + lamb);
    }
    assert!((x[0] - expected).abs() < 1e-12);
}

#[test]
fn overrides_fall_back_to_solver_params_per_field() {
    // No overrides: the configured (p, lamb, method) drive the update.
    let solver = scalar_solver();
    let fwd = LinearForward::new(arr2(&[[1.0]]));
    let x = solver
        .gn(&fwd, &arr1(&[0.0]), Some(&arr1(&[1.0])), &GnOptions::default())
        .unwrap();
    // Configured lamb = 1.0: x * (1 + 1/2) = 1.5.
    assert!((x[0] - 1.5).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn zero_maxiter_is_a_config_error() {
    let solver = identity_solver();
    let fwd = LinearForward::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    let opts = GnOptions {
        maxiter: 0,
        ..GnOptions::default()
    };
    assert!(matches!(
        solver.gn(&fwd, &arr1(&[0.0, 0.0]), None, &opts),
        Err(ReconError::Config(_))
    ));
}

#[test]
fn forward_failure_propagates() {
    let solver = identity_solver();
    let err = solver
        .gn(&FailingForward, &arr1(&[0.0, 0.0]), None, &GnOptions::default())
        .unwrap_err();
    match err {
        ReconError::Forward(inner) => {
            assert!(inner.to_string().contains("saturated"));
        }
        other => panic!("expected Forward error, got {}", other),
    }
}

#[test]
fn forward_voltage_length_mismatch_is_a_shape_error() {
    let solver = identity_solver();
    assert!(matches!(
        solver.gn(
            &TruncatingForward,
            &arr1(&[0.0, 0.0]),
            None,
            &GnOptions::default()
        ),
        Err(ReconError::ShapeMismatch { .. })
    ));
}

#[test]
fn wrong_initial_guess_length_is_a_shape_error() {
    let solver = identity_solver();
    let fwd = LinearForward::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    assert!(matches!(
        solver.gn(
            &fwd,
            &arr1(&[0.0, 0.0]),
            Some(&arr1(&[1.0])),
            &GnOptions::default()
        ),
        Err(ReconError::ShapeMismatch { .. })
    ));
}
