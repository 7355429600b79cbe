//! In-process analytic solver.
//!
//! Mimics the observable behaviour of a Boltzmann solver session (input
//! validation, staged outputs, lensed and unlensed spectra, derived `h`)
//! with closed-form spectrum shapes: a Sachs-Wolfe plateau `A_s / 25`,
//! tilted by `n_s`, modulated by damped acoustic oscillations and
//! suppressed by reionization. The shapes are smooth and deterministic but
//! not physically accurate; use the CLASS backend for real spectra.

use std::f64::consts::PI;

use crate::constants::{keys, DEFAULT_LMAX, FIRST_PHYSICAL_MULTIPOLE};
use crate::params::{ParamValue, ParameterSet};
use crate::solver::{CosmologySolver, SolverError};
use crate::spectra::{Spectra, BB, EE, EP, PP, TE, TP, TT};

/// Inputs this solver reads; anything else is rejected like an unread input.
const ACCEPTED: [&str; 11] = [
    keys::OMEGA_B,
    keys::OMEGA_CDM,
    keys::H,
    keys::H0,
    keys::A_S,
    keys::N_S,
    keys::TAU_REIO,
    keys::OUTPUT,
    keys::LENSING,
    keys::P_K_MAX,
    keys::L_MAX_SCALARS,
];

/// Requested output stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Outputs {
    temperature: bool,
    polarization: bool,
    lensing_potential: bool,
    matter_power: bool,
}

impl Outputs {
    fn parse(value: Option<&ParamValue>) -> Result<Self, SolverError> {
        let mut outputs = Self::default();
        let Some(value) = value else {
            return Ok(outputs);
        };
        let text = value
            .as_str()
            .ok_or_else(|| SolverError::invalid(keys::OUTPUT, "expected a list of outputs"))?;
        for token in text.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "tCl" => outputs.temperature = true,
                "pCl" => outputs.polarization = true,
                "lCl" => outputs.lensing_potential = true,
                "mPk" => outputs.matter_power = true,
                other => {
                    return Err(SolverError::invalid(
                        keys::OUTPUT,
                        format!("unknown output {other}"),
                    ))
                }
            }
        }
        Ok(outputs)
    }

    fn any_cl(self) -> bool {
        self.temperature || self.polarization || self.lensing_potential
    }
}

/// Validated Lambda-CDM point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cosmology {
    omega_b: f64,
    omega_cdm: f64,
    h: f64,
    a_s: f64,
    n_s: f64,
    tau_reio: f64,
}

impl Cosmology {
    fn omega_m(&self) -> f64 {
        self.omega_b + self.omega_cdm
    }

    /// Multipole spacing of the acoustic peaks.
    fn acoustic_scale(&self) -> f64 {
        300.0 * (self.h / 0.678).powf(0.2) * (self.omega_m() / 0.142).powf(-0.1)
    }

    /// Diffusion damping multipole.
    fn damping_scale(&self) -> f64 {
        1400.0 * (self.omega_b / 0.0224).powf(0.1)
    }

    /// Relative height of the acoustic modulation; baryons raise it.
    fn peak_amplitude(&self) -> f64 {
        5.0 * (self.omega_b / 0.0224).sqrt()
    }
}

/// State after a successful compute.
#[derive(Debug, Clone)]
struct Computed {
    cosmology: Cosmology,
    outputs: Outputs,
    lensing: bool,
    l_max_scalars: usize,
}

/// Deterministic, dependency-free stand-in for an external solver session.
#[derive(Debug, Default)]
pub struct AnalyticSolver {
    config: ParameterSet,
    computed: Option<Computed>,
}

impl AnalyticSolver {
    /// Create a new session with no configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn number(&self, name: &str) -> Result<Option<f64>, SolverError> {
        match self.config.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| SolverError::invalid(name, format!("not a finite number: {value}"))),
        }
    }

    fn required(&self, name: &str, lo: f64, hi: f64) -> Result<f64, SolverError> {
        let value = self
            .number(name)?
            .ok_or_else(|| SolverError::invalid(name, "missing required parameter"))?;
        if !(lo..=hi).contains(&value) {
            return Err(SolverError::invalid(
                name,
                format!("{value} outside [{lo}, {hi}]"),
            ));
        }
        Ok(value)
    }

    fn hubble(&self) -> Result<f64, SolverError> {
        let h = match (self.number(keys::H)?, self.number(keys::H0)?) {
            (Some(_), Some(_)) => {
                return Err(SolverError::invalid(keys::H0, "cannot set both h and H0"))
            }
            (Some(h), None) => h,
            (None, Some(h0)) => h0 / 100.0,
            (None, None) => {
                return Err(SolverError::invalid(keys::H, "missing required parameter"))
            }
        };
        if !(0.2..=1.5).contains(&h) {
            return Err(SolverError::invalid(keys::H, format!("{h} outside [0.2, 1.5]")));
        }
        Ok(h)
    }

    fn lensing(&self) -> Result<bool, SolverError> {
        match self.config.get(keys::LENSING) {
            None => Ok(false),
            Some(value) => match value.to_string().trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" => Ok(true),
                "no" | "n" | "false" => Ok(false),
                other => Err(SolverError::invalid(
                    keys::LENSING,
                    format!("expected yes or no, got {other}"),
                )),
            },
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn l_max_scalars(&self) -> Result<usize, SolverError> {
        match self.number(keys::L_MAX_SCALARS)? {
            None => Ok(DEFAULT_LMAX),
            Some(v) if v >= 2.0 && v.fract() == 0.0 => Ok(v as usize),
            Some(v) => Err(SolverError::invalid(
                keys::L_MAX_SCALARS,
                format!("{v} is not an integer multipole >= 2"),
            )),
        }
    }

    fn computed(&self) -> Result<&Computed, SolverError> {
        self.computed.as_ref().ok_or(SolverError::NotComputed)
    }

    fn build_spectra(&self, lmax: usize, lensed: bool) -> Result<Spectra, SolverError> {
        let computed = self.computed()?;
        if !computed.outputs.any_cl() {
            return Err(SolverError::MissingSpectrum(
                "angular spectra (no Cl output requested)".into(),
            ));
        }
        if lensed && !computed.lensing {
            return Err(SolverError::MissingSpectrum(
                "lensed spectra (lensing = no)".into(),
            ));
        }
        if lmax > computed.l_max_scalars {
            return Err(SolverError::MultipoleOutOfRange {
                requested: lmax,
                available: computed.l_max_scalars,
            });
        }

        let cosmo = &computed.cosmology;
        let outputs = computed.outputs;
        let mut columns: Vec<(&str, Vec<f64>)> = Vec::new();
        if outputs.temperature {
            columns.push((TT, vec![0.0; lmax + 1]));
        }
        if outputs.polarization {
            columns.push((EE, vec![0.0; lmax + 1]));
            columns.push((TE, vec![0.0; lmax + 1]));
            columns.push((BB, vec![0.0; lmax + 1]));
        }
        if outputs.lensing_potential {
            columns.push((PP, vec![0.0; lmax + 1]));
            if outputs.temperature {
                columns.push((TP, vec![0.0; lmax + 1]));
            }
            if outputs.polarization {
                columns.push((EP, vec![0.0; lmax + 1]));
            }
        }

        for l in FIRST_PHYSICAL_MULTIPOLE..=lmax {
            let row = Row::at(cosmo, l, lensed);
            for (name, values) in &mut columns {
                values[l] = row.value(name);
            }
        }

        let mut spectra = Spectra::new(lmax);
        for (name, values) in columns {
            spectra.insert(name, values)?;
        }
        Ok(spectra)
    }
}

/// Raw C_l values of every spectrum at one multipole.
struct Row {
    tt: f64,
    ee: f64,
    te: f64,
    bb: f64,
    pp: f64,
    tp: f64,
    ep: f64,
}

impl Row {
    #[allow(clippy::cast_precision_loss)]
    fn at(cosmo: &Cosmology, l: usize, lensed: bool) -> Self {
        let lf = l as f64;
        let ll1 = lf * (lf + 1.0);
        let to_cl = 2.0 * PI / ll1;

        let plateau = cosmo.a_s / 25.0 * (lf / 80.0).powf(cosmo.n_s - 1.0);
        let reio = (-2.0 * cosmo.tau_reio).exp();
        let suppression = reio + (1.0 - reio) * (-lf / 10.0).exp();
        let phase = PI * lf / cosmo.acoustic_scale();
        let damping = (-(lf / cosmo.damping_scale()).powi(2)).exp();
        // Lensing smears the peaks: a fraction of the oscillation moves into the mean.
        let smoothing = if lensed { 0.1 * (lf / 2000.0).min(1.0) } else { 0.0 };
        let oscillation = 0.5 * (1.0 - phase.cos());
        let modulation = 1.0
            + cosmo.peak_amplitude()
                * damping
                * ((1.0 - smoothing) * oscillation + smoothing * 0.5);

        let d_tt = plateau * suppression * modulation * damping.sqrt();
        let x = lf / cosmo.acoustic_scale();
        let d_ee = 0.02 * plateau * x * x / (1.0 + x * x) * (1.0 + (0.5 * (1.0 - phase.sin())))
            * damping.sqrt();
        let d_te = -0.5 * (d_tt * d_ee).sqrt() * phase.cos();
        let d_bb = if lensed { 1e-3 * d_ee * (lf / 1000.0).min(1.0) } else { 0.0 };

        let phi_scale = cosmo.a_s / 2.1e-9 * cosmo.omega_m() / 0.142;
        let d_pp = 1e-7 * phi_scale / (1.0 + (lf / 60.0).powi(2));

        Self {
            tt: d_tt * to_cl,
            ee: d_ee * to_cl,
            te: d_te * to_cl,
            bb: d_bb * to_cl,
            pp: d_pp * 2.0 * PI / (ll1 * ll1),
            tp: 0.1 * (d_tt * d_pp).sqrt() * 2.0 * PI / ll1.powf(1.5),
            ep: 0.01 * (d_ee * d_pp).sqrt() * 2.0 * PI / ll1.powf(1.5),
        }
    }

    fn value(&self, name: &str) -> f64 {
        match name {
            TT => self.tt,
            EE => self.ee,
            TE => self.te,
            BB => self.bb,
            PP => self.pp,
            TP => self.tp,
            EP => self.ep,
            _ => 0.0,
        }
    }
}

impl CosmologySolver for AnalyticSolver {
    fn name(&self) -> &str {
        "analytic"
    }

    fn reset(&mut self) {
        self.config = ParameterSet::new();
        self.computed = None;
    }

    fn configure(&mut self, parameters: &ParameterSet) -> Result<(), SolverError> {
        if parameters.is_empty() {
            return Err(SolverError::invalid("", "empty parameter mapping"));
        }
        self.config.merge(parameters);
        self.computed = None;
        Ok(())
    }

    fn compute(&mut self) -> Result<(), SolverError> {
        self.computed = None;
        if self.config.is_empty() {
            return Err(SolverError::invalid("", "no parameters configured"));
        }
        if let Some(unread) = self.config.names().find(|name| !ACCEPTED.contains(name)) {
            return Err(SolverError::invalid(unread, "input parameter was not read"));
        }

        let cosmology = Cosmology {
            omega_b: self.required(keys::OMEGA_B, 1e-4, 0.1)?,
            omega_cdm: self.required(keys::OMEGA_CDM, 0.0, 0.5)?,
            h: self.hubble()?,
            a_s: self.required(keys::A_S, 1e-11, 1e-7)?,
            n_s: self.required(keys::N_S, 0.5, 1.5)?,
            tau_reio: self.required(keys::TAU_REIO, 0.0, 0.5)?,
        };
        let outputs = Outputs::parse(self.config.get(keys::OUTPUT))?;
        let lensing = self.lensing()?;
        if lensing && !(outputs.lensing_potential && (outputs.temperature || outputs.polarization))
        {
            return Err(SolverError::invalid(
                keys::LENSING,
                "lensed spectra need lCl and either tCl or pCl in output",
            ));
        }
        if let Some(k_max) = self.number(keys::P_K_MAX)? {
            if k_max <= 0.0 {
                return Err(SolverError::invalid(keys::P_K_MAX, "must be positive"));
            }
        }
        let l_max_scalars = self.l_max_scalars()?;

        let omega_m_fraction = cosmology.omega_m() / (cosmology.h * cosmology.h);
        if omega_m_fraction >= 1.0 {
            return Err(SolverError::Computation(format!(
                "background integration failed: Omega_m = {omega_m_fraction:.3} leaves no room for dark energy"
            )));
        }

        tracing::debug!(
            h = cosmology.h,
            omega_m = cosmology.omega_m(),
            l_max_scalars,
            lensing,
            matter_power = outputs.matter_power,
            "analytic solver computed"
        );
        self.computed = Some(Computed {
            cosmology,
            outputs,
            lensing,
            l_max_scalars,
        });
        Ok(())
    }

    fn lensed_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        self.build_spectra(lmax, true)
    }

    fn raw_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        self.build_spectra(lmax, false)
    }

    fn hubble_parameter(&self) -> Result<f64, SolverError> {
        Ok(self.computed()?.cosmology.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OUTPUT_DIRECTIVE;

    fn configured(params: &ParameterSet) -> AnalyticSolver {
        let mut solver = AnalyticSolver::new();
        solver.configure(params).unwrap();
        solver
            .configure(
                &ParameterSet::new()
                    .with(keys::LENSING, "yes")
                    .with(keys::P_K_MAX, 3.0)
                    .with(keys::OUTPUT, OUTPUT_DIRECTIVE),
            )
            .unwrap();
        solver
    }

    #[test]
    fn reference_point_computes() {
        let mut solver = configured(&ParameterSet::lambda_cdm_reference());
        solver.compute().unwrap();
        assert!((solver.hubble_parameter().unwrap() - 0.6781).abs() < 1e-12);

        let spectra = solver.lensed_spectra(2500).unwrap();
        assert_eq!(spectra.len(), 2501);
        let tt = spectra.temperature().unwrap();
        assert_eq!(tt[0], 0.0);
        assert_eq!(tt[1], 0.0);
        assert!(tt[2..].iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn empty_configure_rejected() {
        let mut solver = AnalyticSolver::new();
        assert!(matches!(
            solver.configure(&ParameterSet::new()),
            Err(SolverError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn compute_without_configuration_fails() {
        let mut solver = AnalyticSolver::new();
        assert!(solver.compute().is_err());
    }

    #[test]
    fn results_before_compute_fail() {
        let solver = configured(&ParameterSet::lambda_cdm_reference());
        assert!(matches!(solver.hubble_parameter(), Err(SolverError::NotComputed)));
        assert!(matches!(solver.lensed_spectra(10), Err(SolverError::NotComputed)));
    }

    #[test]
    fn missing_parameter_reported_by_name() {
        let mut params = ParameterSet::lambda_cdm_reference();
        params.remove(keys::A_S);
        let mut solver = configured(&params);
        match solver.compute() {
            Err(SolverError::InvalidParameter { name, .. }) => assert_eq!(name, keys::A_S),
            other => panic!("expected invalid A_s, got {other:?}"),
        }
    }

    #[test]
    fn unknown_parameter_rejected() {
        let params = ParameterSet::lambda_cdm_reference().with("omega_wrong", 1.0);
        let mut solver = configured(&params);
        assert!(matches!(
            solver.compute(),
            Err(SolverError::InvalidParameter { name, .. }) if name == "omega_wrong"
        ));
    }

    #[test]
    fn h_and_h0_are_exclusive() {
        let params = ParameterSet::lambda_cdm_reference().with(keys::H0, 67.81);
        let mut solver = configured(&params);
        assert!(solver.compute().is_err());

        let mut params = ParameterSet::lambda_cdm_reference();
        params.remove(keys::H);
        params.insert(keys::H0, 67.81);
        let mut solver = configured(&params);
        solver.compute().unwrap();
        assert!((solver.hubble_parameter().unwrap() - 0.6781).abs() < 1e-12);
    }

    #[test]
    fn overdense_universe_fails_in_computation() {
        let params = ParameterSet::lambda_cdm_reference()
            .with(keys::OMEGA_CDM, 0.45)
            .with(keys::H, 0.5);
        let mut solver = configured(&params);
        assert!(matches!(solver.compute(), Err(SolverError::Computation(_))));
    }

    #[test]
    fn lensed_spectra_require_lensing() {
        let mut solver = configured(&ParameterSet::lambda_cdm_reference());
        solver
            .configure(&ParameterSet::new().with(keys::LENSING, "no"))
            .unwrap();
        solver.compute().unwrap();
        assert!(matches!(
            solver.lensed_spectra(100),
            Err(SolverError::MissingSpectrum(_))
        ));
        assert!(solver.raw_spectra(100).is_ok());
    }

    #[test]
    fn lmax_beyond_l_max_scalars_fails() {
        let mut solver = configured(&ParameterSet::lambda_cdm_reference());
        solver.compute().unwrap();
        assert!(matches!(
            solver.lensed_spectra(2501),
            Err(SolverError::MultipoleOutOfRange { requested: 2501, available: 2500 })
        ));
    }

    #[test]
    fn l_max_scalars_extends_range() {
        let params = ParameterSet::lambda_cdm_reference().with(keys::L_MAX_SCALARS, 3500.0);
        let mut solver = configured(&params);
        solver.compute().unwrap();
        assert_eq!(solver.lensed_spectra(3500).unwrap().len(), 3501);
    }

    #[test]
    fn lensing_changes_spectra() {
        let mut solver = configured(&ParameterSet::lambda_cdm_reference());
        solver.compute().unwrap();
        let lensed = solver.lensed_spectra(2000).unwrap();
        let raw = solver.raw_spectra(2000).unwrap();
        assert_ne!(lensed.temperature().unwrap(), raw.temperature().unwrap());
        assert!(raw.require(BB).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn output_selects_columns() {
        let mut solver = AnalyticSolver::new();
        solver
            .configure(&ParameterSet::lambda_cdm_reference().with(keys::OUTPUT, "tCl"))
            .unwrap();
        solver.compute().unwrap();
        let spectra = solver.raw_spectra(50).unwrap();
        assert_eq!(spectra.names().collect::<Vec<_>>(), vec![TT]);
    }

    #[test]
    fn reset_discards_configuration() {
        let mut solver = configured(&ParameterSet::lambda_cdm_reference());
        solver.compute().unwrap();
        solver.reset();
        assert!(matches!(solver.hubble_parameter(), Err(SolverError::NotComputed)));
        assert!(solver.compute().is_err());
    }
}
