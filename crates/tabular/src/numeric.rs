//! Column-major numeric table

use crate::error::TableError;
use crate::table::{parse_cell, Table};

/// Named `f64` columns of equal length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericTable {
    /// Column names in order
    names: Vec<String>,
    /// One vector per column
    columns: Vec<Vec<f64>>,
    /// Shared column length
    n_rows: usize,
}

impl NumericTable {
    /// Empty table with a fixed row count
    pub fn with_rows(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Parse every column of a string table
    pub fn from_table(table: &Table) -> Result<Self, TableError> {
        let mut numeric = Self::with_rows(table.n_rows());
        for (idx, name) in table.headers().iter().enumerate() {
            let values = table
                .rows()
                .iter()
                .enumerate()
                .map(|(row, cells)| parse_cell(name, row, &cells[idx]))
                .collect::<Result<Vec<_>, _>>()?;
            numeric.push_column(name, values)?;
        }
        Ok(numeric)
    }

    /// Render back to string cells using the shortest exact float form
    pub fn to_table(&self) -> Table {
        let rows = (0..self.n_rows)
            .map(|row| self.columns.iter().map(|col| format_value(col[row])).collect())
            .collect();
        // names are unique and every column has n_rows values
        Table::new(self.names.clone(), rows).unwrap_or_default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], TableError> {
        let idx = self.index_of(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Vec<f64>, TableError> {
        let idx = self.index_of(name)?;
        Ok(&mut self.columns[idx])
    }

    /// Append a column at the right edge
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), TableError> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        self.names.push(name.to_string());
        self.columns.push(values);
        Ok(())
    }

    /// New table with the given columns in the given order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<NumericTable, TableError> {
        let mut selected = Self::with_rows(self.n_rows);
        for name in names {
            let name = name.as_ref();
            selected.push_column(name, self.column(name)?.to_vec())?;
        }
        Ok(selected)
    }

    fn index_of(&self, name: &str) -> Result<usize, TableError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }
}

fn format_value(value: f64) -> String {
    // Display already yields the shortest string that parses back exactly
    format!("{}", value)
}
