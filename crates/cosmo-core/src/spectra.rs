//! Angular power spectra indexed by multipole.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::solver::SolverError;

/// Temperature auto-spectrum.
pub const TT: &str = "tt";
/// E-mode auto-spectrum.
pub const EE: &str = "ee";
/// Temperature / E-mode cross-spectrum.
pub const TE: &str = "te";
/// B-mode auto-spectrum.
pub const BB: &str = "bb";
/// Lensing potential auto-spectrum.
pub const PP: &str = "pp";
/// Temperature / lensing potential cross-spectrum.
pub const TP: &str = "tp";
/// E-mode / lensing potential cross-spectrum.
pub const EP: &str = "ep";

/// A set of raw C_l columns sharing one multipole axis `0..=lmax`.
///
/// Entry `l` of every column is the value at multipole `l`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectra {
    ell: Vec<usize>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl Spectra {
    /// Empty spectra covering `0..=lmax`; columns are added with [`insert`](Self::insert).
    #[must_use]
    pub fn new(lmax: usize) -> Self {
        Self {
            ell: (0..=lmax).collect(),
            columns: BTreeMap::new(),
        }
    }

    /// Add a column. Its length must match the multipole axis.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), SolverError> {
        let name = name.into();
        if values.len() != self.ell.len() {
            return Err(SolverError::OutputFormat(format!(
                "column {name} has {} entries, expected {}",
                values.len(),
                self.ell.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Multipole axis.
    #[must_use]
    pub fn ell(&self) -> &[usize] {
        &self.ell
    }

    /// Number of multipoles, `lmax + 1`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ell.len()
    }

    /// Whether the axis is empty (never true for spectra built with [`new`](Self::new)).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ell.is_empty()
    }

    /// Highest multipole.
    #[must_use]
    pub fn lmax(&self) -> usize {
        self.ell.len().saturating_sub(1)
    }

    /// A named column, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// A named column, or [`SolverError::MissingSpectrum`].
    pub fn require(&self, name: &str) -> Result<&[f64], SolverError> {
        self.get(name)
            .ok_or_else(|| SolverError::MissingSpectrum(name.to_string()))
    }

    /// Temperature column.
    pub fn temperature(&self) -> Result<&[f64], SolverError> {
        self.require(TT)
    }

    /// Names of the available columns.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Copy of these spectra cut down to `0..=lmax`.
    pub fn truncated(&self, lmax: usize) -> Result<Self, SolverError> {
        if lmax > self.lmax() {
            return Err(SolverError::MultipoleOutOfRange {
                requested: lmax,
                available: self.lmax(),
            });
        }
        Ok(Self {
            ell: self.ell[..=lmax].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[..=lmax].to_vec()))
                .collect(),
        })
    }
}
