//! `ClassSolver`: a session that runs the CLASS executable.
//!
//! Configuration accumulates in memory. `compute` writes it to an `.ini`
//! file in a fresh temporary directory, runs CLASS there, and keeps the
//! directory alive so the extraction calls can read the output tables.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use cosmo_core::constants::{FIRST_PHYSICAL_MULTIPOLE, SPEED_OF_LIGHT_KM_S};
use cosmo_core::params::ParameterSet;
use cosmo_core::solver::{CosmologySolver, SolverError};
use cosmo_core::spectra::{self, Spectra};

use crate::ini;
use crate::table::Table;

/// Environment variable naming the CLASS executable.
pub const CLASS_BIN_ENV: &str = "COSMO_CLASS_BIN";

/// Executable looked up on `PATH` when nothing else is configured.
pub const DEFAULT_CLASS_BIN: &str = "class";

const INPUT_FILE: &str = "input.ini";
const ROOT_PREFIX: &str = "run_";

/// Warning CLASS prints on stdout for every `.ini` line it did not consume.
const UNUSED_MARKER: &str = "input line not used:";

/// Output directory of one successful CLASS run.
struct ClassRun {
    dir: TempDir,
}

impl ClassRun {
    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.path().join(format!("{ROOT_PREFIX}{suffix}"))
    }
}

/// Solver session backed by the CLASS command-line program.
pub struct ClassSolver {
    binary: PathBuf,
    config: ParameterSet,
    run: Option<ClassRun>,
}

impl ClassSolver {
    /// Create a session that runs the given executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config: ParameterSet::new(),
            run: None,
        }
    }

    /// Create a session using `COSMO_CLASS_BIN`, falling back to `class` on `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        let binary = std::env::var_os(CLASS_BIN_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CLASS_BIN), PathBuf::from);
        Self::new(binary)
    }

    /// The executable this session runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self) -> Result<&ClassRun, SolverError> {
        self.run.as_ref().ok_or(SolverError::NotComputed)
    }

    fn read_spectra(&self, suffix: &str, lmax: usize) -> Result<Spectra, SolverError> {
        let path = self.run()?.file(suffix);
        if !path.exists() {
            return Err(SolverError::MissingSpectrum(format!(
                "{suffix} (not produced by this configuration)"
            )));
        }
        spectra_from_table(&Table::read(&path)?, lmax)
    }
}

/// Map CLASS column names to spectrum names and the power of `l(l+1)` in their scaling.
fn cl_column(name: &str) -> Option<(&'static str, f64)> {
    match name {
        "TT" => Some((spectra::TT, 1.0)),
        "EE" => Some((spectra::EE, 1.0)),
        "TE" => Some((spectra::TE, 1.0)),
        "BB" => Some((spectra::BB, 1.0)),
        "phiphi" => Some((spectra::PP, 2.0)),
        "TPhi" => Some((spectra::TP, 1.5)),
        "Ephi" => Some((spectra::EP, 1.5)),
        _ => None,
    }
}

/// Convert a `format = class` C_l table to raw spectra over `0..=lmax`.
///
/// Rows hold `[l(l+1)]^p / 2pi * C_l`; multipoles the table lacks stay zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn spectra_from_table(table: &Table, lmax: usize) -> Result<Spectra, SolverError> {
    let l_col = table
        .column("l")
        .ok_or_else(|| SolverError::OutputFormat("C_l table has no l column".into()))?;
    let available = table
        .rows()
        .iter()
        .map(|row| row[l_col] as usize)
        .max()
        .unwrap_or(0);

    let wanted: Vec<(usize, &'static str, f64)> = table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(i, name)| cl_column(name).map(|(spectrum, p)| (i, spectrum, p)))
        .collect();
    let mut columns = vec![vec![0.0; available + 1]; wanted.len()];

    for row in table.rows() {
        let l = row[l_col] as usize;
        if l < FIRST_PHYSICAL_MULTIPOLE {
            continue;
        }
        let ll1 = (l * (l + 1)) as f64;
        for (values, &(i, _, power)) in columns.iter_mut().zip(&wanted) {
            values[l] = row[i] * 2.0 * PI / ll1.powf(power);
        }
    }

    let mut spectra = Spectra::new(available);
    for (values, &(_, name, _)) in columns.into_iter().zip(&wanted) {
        spectra.insert(name, values)?;
    }
    spectra.truncated(lmax)
}

/// Reduced Hubble parameter from a background table, read at z = 0.
pub fn hubble_from_background(table: &Table) -> Result<f64, SolverError> {
    let z_col = table
        .column("z")
        .ok_or_else(|| SolverError::OutputFormat("background table has no z column".into()))?;
    let h_col = table.column("H [1/Mpc]").ok_or_else(|| {
        SolverError::OutputFormat("background table has no H [1/Mpc] column".into())
    })?;
    let today = table
        .rows()
        .iter()
        .min_by(|a, b| a[z_col].abs().total_cmp(&b[z_col].abs()))
        .ok_or_else(|| SolverError::OutputFormat("background table is empty".into()))?;
    Ok(today[h_col] * SPEED_OF_LIGHT_KM_S / 100.0)
}

/// Name of the first input CLASS reported as unused, if any.
///
/// The warning reads `[WARNING: input line not used: 'name=value']`.
fn unused_input(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = &line[line.find(UNUSED_MARKER)? + UNUSED_MARKER.len()..];
        let entry = rest.trim().trim_end_matches(']').trim_matches('\'');
        let name = entry.split('=').next().unwrap_or_default().trim();
        Some(if name.is_empty() { entry.to_string() } else { name.to_string() })
    })
}

/// Turn a failed run's output into the matching error.
fn classify_failure(output: &str) -> SolverError {
    if let Some(name) = unused_input(output) {
        return SolverError::invalid(name, "input parameter was not read");
    }
    let message = output
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("solver exited without a message")
        .to_string();
    if output.contains("input_") {
        SolverError::invalid("", message)
    } else {
        SolverError::Computation(message)
    }
}

impl CosmologySolver for ClassSolver {
    fn name(&self) -> &str {
        "class"
    }

    fn reset(&mut self) {
        self.config = ParameterSet::new();
        self.run = None;
    }

    fn configure(&mut self, parameters: &ParameterSet) -> Result<(), SolverError> {
        if parameters.is_empty() {
            return Err(SolverError::invalid("", "empty parameter mapping"));
        }
        self.config.merge(parameters);
        self.run = None;
        Ok(())
    }

    fn compute(&mut self) -> Result<(), SolverError> {
        self.run = None;
        if self.config.is_empty() {
            return Err(SolverError::invalid("", "no parameters configured"));
        }

        let dir = tempfile::Builder::new().prefix("cosmoforward-").tempdir()?;
        let root = dir.path().join(ROOT_PREFIX);
        let input = dir.path().join(INPUT_FILE);
        std::fs::write(&input, ini::render(&self.config, &root.to_string_lossy()))?;

        tracing::debug!(binary = %self.binary.display(), input = %input.display(), "running CLASS");
        let output = Command::new(&self.binary)
            .arg(&input)
            .current_dir(dir.path())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SolverError::Configuration(format!(
                        "CLASS executable {} not found (set {CLASS_BIN_ENV})",
                        self.binary.display()
                    ))
                } else {
                    SolverError::Io(e)
                }
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let err = classify_failure(&text);
            tracing::warn!(status = %output.status, error = %err, "CLASS run failed");
            return Err(err);
        }

        if let Some(name) = unused_input(&String::from_utf8_lossy(&output.stdout)) {
            tracing::warn!(parameter = %name, "CLASS ignored an input");
            return Err(SolverError::invalid(name, "input parameter was not read"));
        }

        self.run = Some(ClassRun { dir });
        Ok(())
    }

    fn lensed_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        self.read_spectra("cl_lensed.dat", lmax)
    }

    fn raw_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        self.read_spectra("cl.dat", lmax)
    }

    fn hubble_parameter(&self) -> Result<f64, SolverError> {
        let path = self.run()?.file("background.dat");
        hubble_from_background(&Table::read(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cl_table() -> Table {
        Table::parse(
            "\
#  1:l  2:TT  3:EE  4:TE  5:BB  6:phiphi  7:TPhi  8:Ephi
2  6.0e-10  1.0e-12  2.0e-12  0.0  3.6e-8  1.0e-9  1.0e-10
3  6.0e-10  1.0e-12  2.0e-12  0.0  3.6e-8  1.0e-9  1.0e-10
4  6.0e-10  1.0e-12  2.0e-12  0.0  3.6e-8  1.0e-9  1.0e-10
",
        )
        .unwrap()
    }

    #[test]
    fn spectra_undo_class_scaling() {
        let spectra = spectra_from_table(&cl_table(), 4).unwrap();
        assert_eq!(spectra.len(), 5);
        let tt = spectra.temperature().unwrap();
        assert_eq!(tt[0], 0.0);
        assert_eq!(tt[1], 0.0);
        assert!((tt[2] - 6.0e-10 * 2.0 * PI / 6.0).abs() < 1e-22);
        let pp = spectra.require(spectra::PP).unwrap();
        assert!((pp[3] - 3.6e-8 * 2.0 * PI / 144.0).abs() < 1e-20);
    }

    #[test]
    fn spectra_truncate_to_lmax() {
        let spectra = spectra_from_table(&cl_table(), 3).unwrap();
        assert_eq!(spectra.lmax(), 3);
    }

    #[test]
    fn spectra_beyond_table_fail() {
        assert!(matches!(
            spectra_from_table(&cl_table(), 5),
            Err(SolverError::MultipoleOutOfRange { requested: 5, available: 4 })
        ));
    }

    #[test]
    fn hubble_read_at_redshift_zero() {
        let table = Table::parse(
            "\
#  1:z  2:proper time [Gyr]  3:H [1/Mpc]
1.0  5.0  4.0e-4
0.0  13.8  2.2619e-4
",
        )
        .unwrap();
        let h = hubble_from_background(&table).unwrap();
        assert!((h - 2.2619e-4 * SPEED_OF_LIGHT_KM_S / 100.0).abs() < 1e-12);
    }

    #[test]
    fn unused_input_names_the_key() {
        let out = "Running CLASS version v3.2\n[WARNING: input line not used: 'omega_wrong=1']\n";
        assert_eq!(unused_input(out).as_deref(), Some("omega_wrong"));
        assert_eq!(
            unused_input("[WARNING: input line not used: 'YHe = 0.24']").as_deref(),
            Some("YHe")
        );
        assert_eq!(unused_input("Computing sources\n"), None);
    }

    #[test]
    fn classify_unread_parameter() {
        let err = classify_failure("[WARNING: input line not used: 'omega_wrong=1']\nError\n");
        assert!(matches!(
            err,
            SolverError::InvalidParameter { name, .. } if name == "omega_wrong"
        ));
    }

    #[test]
    fn classify_input_and_computation_failures() {
        let err = classify_failure("Error in input_init\n=>input_read_parameters: h < 0\n");
        assert!(matches!(err, SolverError::InvalidParameter { .. }));

        let err = classify_failure("Error in perturbations_init\n=> did not converge\n");
        assert!(matches!(err, SolverError::Computation(msg) if msg == "=> did not converge"));
    }

    #[test]
    fn results_before_compute_fail() {
        let solver = ClassSolver::new("class");
        assert!(matches!(solver.hubble_parameter(), Err(SolverError::NotComputed)));
        assert!(matches!(solver.lensed_spectra(10), Err(SolverError::NotComputed)));
    }

    #[test]
    fn missing_binary_is_a_configuration_error() {
        let mut solver = ClassSolver::new("/nonexistent/class-binary");
        solver.configure(&ParameterSet::lambda_cdm_reference()).unwrap();
        assert!(matches!(solver.compute(), Err(SolverError::Configuration(_))));
    }

    #[test]
    fn empty_configure_rejected() {
        let mut solver = ClassSolver::new("class");
        assert!(solver.configure(&ParameterSet::new()).is_err());
    }
}
