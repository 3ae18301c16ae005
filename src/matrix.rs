//! Square similarity matrices read from delimited text.
//!
//! The expected input is a header-less `n × n` table of numbers, one row per
//! line. Entries are similarities (typically in `[0, 1]`); the values `NA`,
//! `NaN` and empty fields mark an undefined similarity and are kept as `NaN`.
//!
//! ```rust
//! use simnet::matrix::{Delimiter, SimilarityMatrix};
//!
//! let text = "1.0 0.8 NA\n0.8 1.0 0.1\nNA 0.1 1.0\n";
//! let m = SimilarityMatrix::from_reader(text.as_bytes(), Delimiter::Whitespace).unwrap();
//! assert_eq!(m.len(), 3);
//! assert_eq!(m.names()[0], "V1");
//! assert!(m.get(0, 2).is_nan());
//! ```

use crate::error::{Error, Result};
use ndarray::Array2;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Field separator of the matrix file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Any run of spaces or tabs separates fields.
    #[default]
    Whitespace,
    /// A single separator byte such as `b','` or `b'\t'`.
    Byte(u8),
}

/// A square similarity matrix with one name per row/column.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Array2<f64>,
    names: Vec<String>,
}

impl SimilarityMatrix {
    /// Wrap an existing array. Fails unless the array is square and non-empty.
    pub fn from_array(values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows == 0 {
            return Err(Error::EmptyInput);
        }
        if rows != cols {
            return Err(Error::ShapeMismatch {
                expected: format!("{cols}x{cols}"),
                actual: format!("{rows}x{cols}"),
            });
        }
        Ok(Self {
            values,
            names: default_names(rows),
        })
    }

    /// Build from row vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = rows[0].len();
        if let Some(row) = rows.iter().find(|r| r.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: row.len(),
            });
        }
        let n = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))?;
        Self::from_array(values)
    }

    /// Read a matrix file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading similarity matrix from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    /// Read a matrix from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: Delimiter) -> Result<Self> {
        let rows = match delimiter {
            Delimiter::Whitespace => read_whitespace(BufReader::new(reader))?,
            Delimiter::Byte(b) => read_delimited(reader, b)?,
        };
        let m = Self::from_rows(rows)?;
        log::info!("loaded {}x{} similarity matrix", m.len(), m.len());
        if !m.is_symmetric(1e-9) {
            log::warn!("similarity matrix is not symmetric; only the upper triangle is used for the graph");
        }
        Ok(m)
    }

    /// Replace the default `V1..Vn` names. Names must be distinct.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.len() {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                found: names.len(),
            });
        }
        if let Some(name) = first_duplicate(&names) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        self.names = names;
        Ok(self)
    }

    /// Read one node name per non-empty line.
    pub fn read_names<R: Read>(reader: R) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Number of rows (= columns).
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Always false for a constructed matrix; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Node names, one per row.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Entry `(i, j)`; `NaN` if undefined.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Underlying array.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Whether `M[i][j]` and `M[j][i]` agree within `tol` everywhere.
    ///
    /// Two undefined entries count as equal.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.values[[i, j]], self.values[[j, i]]);
                let same = (a.is_nan() && b.is_nan()) || (a - b).abs() <= tol;
                if !same {
                    return false;
                }
            }
        }
        true
    }

    /// Rows as feature vectors for the k-means and hierarchical clusterers.
    ///
    /// Undefined entries become `0.0`. If `diagonal` is given it overwrites
    /// every `M[i][i]`.
    pub fn feature_rows(&self, diagonal: Option<f64>) -> Vec<Vec<f32>> {
        self.values
            .outer_iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| match diagonal {
                        Some(d) if i == j => d as f32,
                        _ if v.is_nan() => 0.0,
                        _ => v as f32,
                    })
                    .collect()
            })
            .collect()
    }
}

pub(crate) fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(names.len());
    names.iter().map(String::as_str).find(|name| !seen.insert(*name))
}

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("V{i}")).collect()
}

fn parse_token(token: &str, line: usize, column: usize) -> Result<f64> {
    match token {
        "" | "NA" | "NaN" | "nan" => Ok(f64::NAN),
        t => t.parse::<f64>().map_err(|_| Error::Parse {
            line,
            column,
            token: t.to_string(),
        }),
    }
}

fn read_whitespace<R: BufRead>(reader: R) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .enumerate()
            .map(|(col, tok)| parse_token(tok, idx + 1, col + 1))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Vec<f64>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = record
            .iter()
            .enumerate()
            .map(|(col, tok)| parse_token(tok, line, col + 1))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}
