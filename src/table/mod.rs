// src/table/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_table, sniff_delimiter};
pub use writer::{commit_all, stage_rows, StagedTable};

use crate::error::{Result, ScoreError};
use std::{collections::HashMap, path::Path};

/// A delimited file held column-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names in file order.
    headers: Vec<String>,
    /// Column name → cells, one per data row, in row order.
    columns: HashMap<String, Vec<String>>,
    row_count: usize,
}

impl Table {
    /// Transpose `rows` under `headers`. Every row must be exactly as wide as
    /// the header and header names must be unique.
    pub fn from_rows(source: &Path, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns: HashMap<String, Vec<String>> = HashMap::with_capacity(headers.len());
        for name in &headers {
            if columns.insert(name.clone(), Vec::with_capacity(rows.len())).is_some() {
                return Err(ScoreError::DuplicateColumn {
                    path: source.to_path_buf(),
                    column: name.clone(),
                });
            }
        }

        let row_count = rows.len();
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ScoreError::Parse {
                    path: source.to_path_buf(),
                    reason: format!(
                        "data row {} has {} fields, header has {}",
                        idx + 1,
                        row.len(),
                        headers.len()
                    ),
                });
            }
            for (name, cell) in headers.iter().zip(row) {
                if let Some(col) = columns.get_mut(name) {
                    col.push(cell);
                }
            }
        }

        Ok(Self {
            headers,
            columns,
            row_count,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rebuild the rows in header order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count)
            .map(|i| {
                self.headers
                    .iter()
                    .map(|h| self.columns[h][i].clone())
                    .collect()
            })
            .collect()
    }
}
