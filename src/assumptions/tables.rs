//! Generic table provider over labelled rows and columns

use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Source of assumption tables
///
/// Rows and columns are addressed by their labels as they appear in the source
/// (e.g. an age, a policy year, a basis name).
pub trait TableProvider {
    /// Raw text of one entry
    fn text(&self, table: &str, row: &str, column: &str) -> Result<String>;

    /// Row labels in source order
    fn row_keys(&self, table: &str) -> Result<Vec<String>>;

    /// Numeric entry
    fn lookup(&self, table: &str, row: &str, column: &str) -> Result<f64> {
        let value = self.text(table, row, column)?;
        value.trim().parse::<f64>().map_err(|_| EngineError::MalformedTableEntry {
            table: table.to_string(),
            row: row.to_string(),
            column: column.to_string(),
            value,
        })
    }

    /// Vectorised lookup: one value per requested row
    fn lookup_many(&self, table: &str, rows: &[String], column: &str) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.lookup(table, row, column)).collect()
    }

    /// Parse an entry into any type that parses from text, e.g. a basis.
    fn parse<T>(&self, table: &str, row: &str, column: &str) -> Result<T>
    where
        T: FromStr<Err = EngineError>,
        Self: Sized,
    {
        self.text(table, row, column)?.parse()
    }
}

/// One table: first column holds row labels, header row holds column labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
    row_index: HashMap<String, usize>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, ..Self::default() }
    }

    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<String>) {
        let label = label.into();
        self.row_index.insert(label.clone(), self.rows.len());
        self.rows.push((label, values));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn entry(&self, row: &str, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        let &r = self.row_index.get(row)?;
        self.rows[r].1.get(col).map(String::as_str)
    }
}

/// Named collection of tables
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: HashMap<String, Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        self.tables.insert(name.into(), table);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| EngineError::MissingTable { table: name.to_string(), path: None })
    }
}

impl TableProvider for TableSet {
    fn text(&self, table: &str, row: &str, column: &str) -> Result<String> {
        self.table(table)?
            .entry(row, column)
            .map(str::to_string)
            .ok_or_else(|| EngineError::MissingTableEntry {
                table: table.to_string(),
                row: row.to_string(),
                column: column.to_string(),
            })
    }

    fn row_keys(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.rows.iter().map(|(label, _)| label.clone()).collect())
    }
}
