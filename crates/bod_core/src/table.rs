//! crates/bod_core/src/table.rs
//! Rectangular result sets and the four reports the dashboard renders.
//! A `ReportTable` is immutable once read; truncation returns a new table.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::errors::CoreError;

/// Ordered columns, ordered rows. Every row has exactly `columns.len()` cells.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl ReportTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, CoreError> {
        let expected = columns.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(CoreError::RaggedRow { row: i, expected, got: row.len() });
            }
        }
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(CellValue::normalized).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    /// Convenience for literals in tests and fixtures.
    pub fn from_strs(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Result<Self, CoreError> {
        Self::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    pub fn empty(columns: &[&str]) -> Self {
        Self { columns: columns.iter().map(|c| c.to_string()).collect(), rows: Vec::new() }
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn width(&self) -> usize { self.columns.len() }
    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn rows(&self) -> &[Vec<CellValue>] { &self.rows }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom. `None` when the column is absent.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a CellValue> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// First `n` rows (all rows if `n >= len`).
    pub fn head(&self, n: usize) -> ReportTable {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Replace column names positionally (source names → display names).
    pub fn with_columns(mut self, names: &[&str]) -> Result<Self, CoreError> {
        if names.len() != self.columns.len() {
            return Err(CoreError::ColumnCount { expected: self.columns.len(), got: names.len() });
        }
        self.columns = names.iter().map(|n| n.to_string()).collect();
        Ok(self)
    }

    /// Header row followed by data rows, as written to a sheet.
    pub fn to_grid(&self) -> Vec<Vec<CellValue>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().map(|c| CellValue::text(c.as_str())).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }
}

/// The four reports produced upstream, in render order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReportKind {
    Scoreboard,
    ReleasedMovies,
    WorstPicks,
    BestPicks,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Scoreboard,
        ReportKind::ReleasedMovies,
        ReportKind::WorstPicks,
        ReportKind::BestPicks,
    ];

    /// `schema.table` the transformation engine materializes for this report.
    pub fn source(&self) -> &'static str {
        match self {
            ReportKind::Scoreboard => "dashboards.scoreboard",
            ReportKind::ReleasedMovies => "combined.base_query",
            ReportKind::WorstPicks => "dashboards.worst_picks",
            ReportKind::BestPicks => "dashboards.best_picks",
        }
    }

    /// Display header, positionally matching the source columns.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::Scoreboard => &[
                "Name",
                "Scored Revenue",
                "# Released",
                "# Optimal Picks",
                "% Optimal Picks",
                "Unadjusted Revenue",
            ],
            ReportKind::ReleasedMovies => &[
                "Rank",
                "Title",
                "Drafted By",
                "Revenue",
                "Scored Revenue",
                "Round Drafted",
                "Overall Pick",
                "Multiplier",
                "Domestic Revenue",
                "Domestic Revenue %",
                "Foreign Revenue",
                "Foreign Revenue %",
                "Better Pick",
                "Better Pick Scored Revenue",
                "First Seen Date",
                "Still In Theaters",
            ],
            ReportKind::WorstPicks => &[
                "Rank",
                "Title",
                "Drafted By",
                "Overall Pick",
                "Number of Better Picks",
                "Missed Revenue",
            ],
            ReportKind::BestPicks => &[
                "Rank",
                "Title",
                "Drafted By",
                "Overall Pick",
                "Positions Gained",
                "Actual Revenue",
            ],
        }
    }

    /// Section title written above the table.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Scoreboard => "Scoreboard",
            ReportKind::ReleasedMovies => "Released Movies",
            ReportKind::WorstPicks => "Worst Picks",
            ReportKind::BestPicks => "Best Picks",
        }
    }
}
