//! Cross-crate forward-pass contract tests.
//!
//! Drives the orchestrator against the analytic solver and checks the
//! outcomes listed in tests/testdata/forward_cases.json.

use std::sync::Arc;
use std::thread;

use serde::Deserialize;

use cosmo_core::analytic::AnalyticSolver;
use cosmo_core::params::ParameterSet;
use cosmo_core::settings::{ForwardConfig, OutputSettings, SolverSettings, SpectrumSource};
use cosmo_core::solver::{CosmologySolver, SolverError};
use cosmo_orchestration::interfaces::NullProgressReporter;
use cosmo_orchestration::orchestrator::{
    evaluate_batch, forward, forward_pass, summarize_batch, SharedSession,
};
use cosmo_orchestration::registry::DefaultFactory;

#[derive(Deserialize)]
struct CaseFile {
    #[allow(dead_code)]
    description: String,
    cases: Vec<Case>,
}

#[derive(Deserialize)]
struct Case {
    name: String,
    parameters: ParameterSet,
    outcome: String,
    #[serde(default)]
    parameter: Option<String>,
}

fn load_cases() -> Vec<Case> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/testdata/forward_cases.json");
    let data = std::fs::read_to_string(path).expect("case file not found");
    let file: CaseFile = serde_json::from_str(&data).expect("malformed case file");
    file.cases
}

fn output(lmax: usize) -> OutputSettings {
    OutputSettings {
        lmax,
        ..OutputSettings::default()
    }
}

fn reference_objective(lmax: usize) -> f64 {
    forward(
        &mut AnalyticSolver::new(),
        &ParameterSet::lambda_cdm_reference(),
        &SolverSettings::default(),
        &output(lmax),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Recorded cases
// ---------------------------------------------------------------------------

#[test]
fn recorded_cases() {
    let cases = load_cases();
    assert!(!cases.is_empty());

    let mut session = AnalyticSolver::new();
    for case in &cases {
        let result = forward(
            &mut session,
            &case.parameters,
            &SolverSettings::default(),
            &output(500),
        );
        match (case.outcome.as_str(), result) {
            ("ok", Ok(objective)) => {
                assert!(objective.is_finite() && objective > 0.0, "{}: {objective}", case.name);
            }
            (expected, Err(e)) => {
                assert_eq!(e.stage().to_string(), expected, "{}: {e}", case.name);
                if let Some(parameter) = &case.parameter {
                    match &e {
                        SolverError::InvalidParameter { name, .. } => {
                            assert_eq!(name, parameter, "{}", case.name);
                        }
                        other => panic!("{}: expected invalid {parameter}, got {other}", case.name),
                    }
                }
            }
            (expected, Ok(objective)) => {
                panic!("{}: expected {expected}, got objective {objective}", case.name)
            }
        }
    }
}

#[test]
fn text_and_numeric_inputs_agree() {
    let cases = load_cases();
    let find = |name: &str| &cases.iter().find(|c| c.name == name).unwrap().parameters;
    let run = |parameters: &ParameterSet| {
        forward(
            &mut AnalyticSolver::new(),
            parameters,
            &SolverSettings::default(),
            &output(800),
        )
        .unwrap()
    };
    let numeric = run(find("reference"));
    let text = run(find("numbers_as_text"));
    assert!(((numeric - text) / numeric).abs() < 1e-12, "{numeric} vs {text}");
}

// ---------------------------------------------------------------------------
// Contract properties
// ---------------------------------------------------------------------------

#[test]
fn forward_is_deterministic() {
    let first = reference_objective(2500);
    for _ in 0..3 {
        assert_eq!(reference_objective(2500).to_bits(), first.to_bits());
    }
}

#[test]
fn session_reuse_matches_fresh_session() {
    let mut session = AnalyticSolver::new();
    let parameters = ParameterSet::lambda_cdm_reference();
    let settings = SolverSettings::default();

    let skewed = parameters.merged(&ParameterSet::new().with("n_s", 0.9));
    forward(&mut session, &skewed, &settings, &output(300)).unwrap();
    let reused = forward(&mut session, &parameters, &settings, &output(300)).unwrap();
    assert_eq!(reused, reference_objective(300));
}

#[test]
fn monopole_and_dipole_are_excluded() {
    for lmax in [0, 1, 2, 3, 50, 2500] {
        let pass = forward_pass(
            &mut AnalyticSolver::new(),
            &ParameterSet::lambda_cdm_reference(),
            &SolverSettings::default(),
            &output(lmax),
        )
        .unwrap();
        assert_eq!(pass.spectra.len(), lmax + 1);
        assert_eq!(pass.temperature.len(), lmax.saturating_sub(1));
        let tt = pass.spectra.temperature().unwrap();
        assert_eq!(pass.temperature.as_slice(), tt.get(2..).unwrap_or_default());
    }
}

#[test]
fn objective_grows_with_lmax() {
    let mut previous = 0.0;
    for lmax in [2, 10, 100, 1000, 2500] {
        let objective = reference_objective(lmax);
        assert!(objective > previous, "lmax {lmax}: {objective} <= {previous}");
        previous = objective;
    }
}

#[test]
fn empty_parameters_fail_before_extraction() {
    let err = forward(
        &mut AnalyticSolver::new(),
        &ParameterSet::new(),
        &SolverSettings::default(),
        &OutputSettings::default(),
    )
    .unwrap_err();
    assert_ne!(err.stage(), cosmo_core::solver::Stage::Extraction);
}

#[test]
fn raw_and_lensed_differ() {
    let settings = SolverSettings::default();
    let raw = forward(
        &mut AnalyticSolver::new(),
        &ParameterSet::lambda_cdm_reference(),
        &settings,
        &OutputSettings {
            lmax: 2500,
            source: SpectrumSource::Raw,
        },
    )
    .unwrap();
    assert!(raw.is_finite());
    assert_ne!(raw, reference_objective(2500));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn shared_session_across_threads() {
    let shared = Arc::new(SharedSession::new(AnalyticSolver::new()));
    let expected = reference_objective(400);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let parameters = if i % 2 == 0 {
                    ParameterSet::lambda_cdm_reference()
                } else {
                    ParameterSet::lambda_cdm_reference().with("h", 0.72)
                };
                (
                    i,
                    shared
                        .forward(&parameters, &SolverSettings::default(), &output(400))
                        .unwrap(),
                )
            })
        })
        .collect();

    for handle in handles {
        let (i, objective) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(objective, expected);
        } else {
            assert_ne!(objective, expected);
        }
    }

    let session = Arc::try_unwrap(shared).ok().unwrap().into_inner();
    assert!(session.hubble_parameter().is_ok());
}

#[test]
fn batch_matches_sequential() {
    let sets: Vec<ParameterSet> = [0.64, 0.67, 0.70, 0.73]
        .iter()
        .map(|&h| ParameterSet::lambda_cdm_reference().with("h", h))
        .collect();
    let config = ForwardConfig {
        output: output(600),
        ..ForwardConfig::default()
    };

    let results = evaluate_batch(
        &DefaultFactory::new(),
        "analytic",
        &sets,
        &config,
        &NullProgressReporter,
    );
    assert_eq!(results.len(), sets.len());
    for (result, parameters) in results.iter().zip(&sets) {
        let sequential = forward(
            &mut AnalyticSolver::new(),
            parameters,
            &config.solver,
            &config.output,
        )
        .unwrap();
        assert_eq!(*result.outcome.as_ref().unwrap(), sequential);
    }

    let summary = summarize_batch(&results).unwrap();
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 0);
}
