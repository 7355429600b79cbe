//! Parameter sets passed to the solver.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::LAMBDA_CDM_REFERENCE;

/// A single solver input value.
///
/// Most inputs are numbers; a few (e.g. `lensing = yes`, `output = tCl`) are text.
///
/// JSON booleans read as `yes` / `no`, the solver's spelling of flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "RawValue")]
pub enum ParamValue {
    /// Numeric input.
    Number(f64),
    /// Textual input, passed through verbatim.
    Text(String),
}

/// Shapes accepted when reading a value from JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<RawValue> for ParamValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Number(value) => Self::Number(value),
            RawValue::Flag(flag) => Self::from(flag),
            RawValue::Text(text) => Self::Text(text),
        }
    }
}

impl ParamValue {
    /// Parse a raw string, preferring a number when it parses as one.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(value) => Self::Number(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Numeric view of this value, if it is a number (or numeric text).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Text view of this value, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{:e}` keeps tiny amplitudes such as A_s readable and lossless.
            Self::Number(value) if *value != 0.0 && value.abs() < 1e-4 => write!(f, "{value:e}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        Self::Text(if flag { "yes" } else { "no" }.to_string())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered mapping from solver input name to value.
///
/// Later writes replace earlier ones, mirroring how the solver accumulates
/// successive configuration calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference six-parameter Lambda-CDM point.
    #[must_use]
    pub fn lambda_cdm_reference() -> Self {
        LAMBDA_CDM_REFERENCE.iter().copied().collect()
    }

    /// Insert or replace an entry, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.entries.insert(name.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// Look up an entry as a number.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    /// Remove an entry.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.entries.remove(name)
    }

    /// Copy every entry of `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    /// Non-mutating variant of [`merge`](Self::merge).
    #[must_use]
    pub fn merged(&self, other: &ParameterSet) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Whether the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate entry names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl<K, V> Extend<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_numbers() {
        assert_eq!(ParamValue::parse("0.5"), ParamValue::Number(0.5));
        assert_eq!(ParamValue::parse("2.1e-9"), ParamValue::Number(2.1e-9));
        assert_eq!(ParamValue::parse(" yes "), ParamValue::Text("yes".into()));
    }

    #[test]
    fn display_small_numbers_in_scientific_form() {
        assert_eq!(ParamValue::Number(2.5e-9).to_string(), "2.5e-9");
        assert_eq!(ParamValue::Number(0.6781).to_string(), "0.6781");
        assert_eq!(ParamValue::Number(0.0).to_string(), "0");
        assert_eq!(ParamValue::Text("yes".into()).to_string(), "yes");
    }

    #[test]
    fn merge_overrides_existing_entries() {
        let mut base = ParameterSet::new().with("h", 0.7).with("lensing", "no");
        let overrides = ParameterSet::new().with("lensing", "yes");
        base.merge(&overrides);
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("lensing"), Some(&ParamValue::Text("yes".into())));
        assert_eq!(base.get_f64("h"), Some(0.7));
    }

    #[test]
    fn reference_point_round_trips_through_json() {
        let reference = ParameterSet::lambda_cdm_reference();
        let json = serde_json::to_string(&reference).unwrap();
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn json_object_with_mixed_values() {
        let set: ParameterSet =
            serde_json::from_str(r#"{"omega_b": 0.0224, "lensing": "yes"}"#).unwrap();
        assert_eq!(set.get_f64("omega_b"), Some(0.0224));
        assert_eq!(set.get("lensing").and_then(ParamValue::as_str), Some("yes"));
    }

    #[test]
    fn json_booleans_read_as_flags() {
        let set: ParameterSet =
            serde_json::from_str(r#"{"lensing": true, "write_thermodynamics": false}"#).unwrap();
        assert_eq!(set.get("lensing"), Some(&ParamValue::Text("yes".into())));
        assert_eq!(
            set.get("write_thermodynamics").and_then(ParamValue::as_str),
            Some("no")
        );
    }

    #[test]
    fn numeric_text_reads_as_number() {
        let set = ParameterSet::new().with("l_max_scalars", "3000");
        assert_eq!(set.get_f64("l_max_scalars"), Some(3000.0));
    }
}
