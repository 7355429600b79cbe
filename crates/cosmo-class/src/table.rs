//! Parser for the whitespace-separated tables CLASS writes.
//!
//! A table is a block of `#` comment lines followed by numeric rows. The
//! last comment line that carries `N:name` tokens names the columns; names
//! may contain spaces (`2:proper time [Gyr]`).

use std::path::Path;

use cosmo_core::solver::SolverError;

/// A parsed CLASS output table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Read and parse a table file.
    pub fn read(path: &Path) -> Result<Self, SolverError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            SolverError::OutputFormat(msg) => {
                SolverError::OutputFormat(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse table text.
    pub fn parse(text: &str) -> Result<Self, SolverError> {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                let names = column_names(comment);
                if !names.is_empty() {
                    columns = Some(names);
                }
                continue;
            }

            let row = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SolverError::OutputFormat(format!("line {}: {e}", line_no + 1)))?;
            rows.push(row);
        }

        let columns =
            columns.ok_or_else(|| SolverError::OutputFormat("missing column header".into()))?;
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(SolverError::OutputFormat(format!(
                "row {i} has {} values, header names {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of a named column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

/// Extract `N:name` column labels from a header comment.
fn column_names(comment: &str) -> Vec<String> {
    // Byte offsets where a label starts (the digits) and where its name starts (after ':').
    let bytes = comment.as_bytes();
    let mut labels: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let at_boundary = i == 0 || bytes[i - 1].is_ascii_whitespace();
        if at_boundary && bytes[i].is_ascii_digit() {
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b':' {
                labels.push((i, j + 1));
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }

    labels
        .iter()
        .enumerate()
        .map(|(k, &(_, name_start))| {
            let end = labels.get(k + 1).map_or(comment.len(), |&(next, _)| next);
            comment[name_start..end].trim().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CL: &str = "\
# dimensionless total [l(l+1)/2pi] C_l's
# for l=2 to 4, i.e. number of multipoles equal to 3
#
#  1:l            2:TT           3:EE           4:TE
       2     1.0e-10     2.0e-12    -3.0e-11
       3     1.1e-10     2.1e-12    -3.1e-11
       4     1.2e-10     2.2e-12    -3.2e-11
";

    #[test]
    fn parse_cl_table() {
        let table = Table::parse(CL).unwrap();
        assert_eq!(table.columns(), &["l", "TT", "EE", "TE"]);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.column("TE"), Some(3));
        assert_eq!(table.rows()[2][0], 4.0);
    }

    #[test]
    fn names_with_spaces() {
        let names = column_names("  1:z  2:proper time [Gyr]  3:conf. time [Mpc]  4:H [1/Mpc]");
        assert_eq!(names, vec!["z", "proper time [Gyr]", "conf. time [Mpc]", "H [1/Mpc]"]);
    }

    #[test]
    fn prose_comments_have_no_columns() {
        assert!(column_names(" for l=2 to 2500, i.e. number of multipoles equal to 2499").is_empty());
    }

    #[test]
    fn missing_header_rejected() {
        assert!(matches!(
            Table::parse("2 1.0\n3 2.0\n"),
            Err(SolverError::OutputFormat(_))
        ));
    }

    #[test]
    fn ragged_row_rejected() {
        let text = "# 1:l 2:TT\n2 1.0\n3\n";
        assert!(matches!(Table::parse(text), Err(SolverError::OutputFormat(_))));
    }

    #[test]
    fn non_numeric_row_rejected() {
        let text = "# 1:l 2:TT\n2 nope\n";
        assert!(matches!(Table::parse(text), Err(SolverError::OutputFormat(_))));
    }
}
