//! Integration tests for configuration types.

use eit_recon::config::{GnOptions, RegMethod, SolverParams};
use eit_recon::error::ReconError;

// ---------------------------------------------------------------------------
// RegMethod
// ---------------------------------------------------------------------------

#[test]
fn method_parses_case_insensitively() {
    assert_eq!("kotre".parse::<RegMethod>().unwrap(), RegMethod::Kotre);
    assert_eq!("KOTRE".parse::<RegMethod>().unwrap(), RegMethod::Kotre);
    assert_eq!("lm".parse::<RegMethod>().unwrap(), RegMethod::Lm);
}

#[test]
fn unknown_method_is_a_config_error() {
    let err = "ridge".parse::<RegMethod>().unwrap_err();
    match err {
        ReconError::Config(msg) => assert!(msg.contains("ridge")),
        other => panic!("expected Config error, got {}", other),
    }
}

#[test]
fn method_displays_lowercase() {
    assert_eq!(RegMethod::Kotre.to_string(), "kotre");
    assert_eq!(RegMethod::Lm.to_string(), "lm");
}

// ---------------------------------------------------------------------------
// Defaults and validation
// ---------------------------------------------------------------------------

#[test]
fn solver_params_defaults() {
    let params = SolverParams::default();
    assert_eq!(params.p, 0.20);
    assert_eq!(params.lamb, 0.001);
    assert_eq!(params.method, RegMethod::Kotre);
}

#[test]
fn gn_options_defaults() {
    let opts = GnOptions::default();
    assert_eq!(opts.maxiter, 1);
    assert_eq!(opts.lamb_decay, 1.0);
    assert_eq!(opts.lamb_min, 0.0);
    assert!(opts.p.is_none());
    assert!(opts.lamb.is_none());
    assert!(opts.method.is_none());
}

#[test]
fn negative_p_fails_validation() {
    let params = SolverParams {
        p: -1.0,
        ..SolverParams::default()
    };
    assert!(matches!(params.validate(), Err(ReconError::Config(_))));
}

#[test]
fn negative_lamb_fails_validation() {
    let params = SolverParams {
        lamb: -0.5,
        ..SolverParams::default()
    };
    assert!(matches!(params.validate(), Err(ReconError::Config(_))));
}

#[test]
fn zero_maxiter_fails_validation() {
    let opts = GnOptions {
        maxiter: 0,
        ..GnOptions::default()
    };
    assert!(matches!(opts.validate(), Err(ReconError::Config(_))));
}

#[test]
fn negative_override_fails_validation() {
    let opts = GnOptions {
        p: Some(-0.1),
        ..GnOptions::default()
    };
    assert!(matches!(opts.validate(), Err(ReconError::Config(_))));
}
