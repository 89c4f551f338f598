//! CSV-backed table with verbatim string cells

use crate::error::TableError;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::debug;

/// Header plus rows of string cells
///
/// Cells are kept exactly as read so a table written back out reproduces the
/// source values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names in file order
    headers: Vec<String>,
    /// Row-major cells, each row as wide as the header
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, checking that every row matches the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        check_unique(&headers)?;
        for (index, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(TableError::LengthMismatch {
                    column: format!("<row {}>", index),
                    expected: headers.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Read a CSV file with a header row
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        let csv_err = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();
        check_unique(&headers)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Read {} rows x {} columns from {}", rows.len(), headers.len(), path.display());
        Ok(Self { headers, rows })
    }

    /// Write the table as CSV to a file, replacing any existing content
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_to(file).map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Write the table as CSV to any writer
    pub fn write_to<W: io::Write>(&self, sink: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(sink);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Borrow every cell of one column
    pub fn column(&self, name: &str) -> Result<Vec<&str>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Parse one column as finite floats
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| parse_cell(name, row, &cells[idx]))
            .collect()
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Table, TableError> {
        let mut rows = Vec::with_capacity(indices.len());
        for &index in indices {
            let row = self.rows.get(index).ok_or(TableError::RowOutOfBounds {
                index,
                rows: self.rows.len(),
            })?;
            rows.push(row.clone());
        }
        Ok(Table {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// New table holding the given columns, in the given order
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let headers: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        check_unique(&headers)?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table { headers, rows })
    }

    /// Remove the named columns that exist; returns the names actually removed
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let doomed: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !doomed.contains(self.headers[i].as_str()))
            .collect();
        let removed = self
            .headers
            .iter()
            .filter(|h| doomed.contains(h.as_str()))
            .cloned()
            .collect();

        self.headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| std::mem::take(&mut row[i])).collect();
        }
        removed
    }

    /// Append a column at the right edge
    pub fn push_column(&mut self, name: &str, values: Vec<String>) -> Result<(), TableError> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        self.check_length(name, values.len())?;
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Overwrite the cells of an existing column
    pub fn replace_column(&mut self, name: &str, values: Vec<String>) -> Result<(), TableError> {
        let idx = self.column_index(name)?;
        self.check_length(name, values.len())?;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    fn check_length(&self, name: &str, actual: usize) -> Result<(), TableError> {
        if actual != self.rows.len() {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows.len(),
                actual,
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_cell(column: &str, row: usize, cell: &str) -> Result<f64, TableError> {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(TableError::NotNumeric {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        }),
    }
}

fn check_unique(headers: &[String]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers {
        if !seen.insert(header.as_str()) {
            return Err(TableError::DuplicateColumn(header.clone()));
        }
    }
    Ok(())
}
