//! crates/bod_core/src/a1.rs
//! A1-notation addressing. Rows and columns are 1-indexed everywhere in this
//! workspace; conversion to the API's 0-indexed half-open grid ranges happens
//! only inside `bod_sheets`.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Column number (1-indexed) → letters. `1 → A`, `26 → Z`, `27 → AA`.
pub fn column_letter(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Column letters → column number (1-indexed). Case-insensitive.
pub fn column_index(letters: &str) -> Result<u32, CoreError> {
    if letters.is_empty() || letters.len() > 3 {
        return Err(CoreError::InvalidColumn(letters.to_string()));
    }
    let mut n: u32 = 0;
    for b in letters.bytes() {
        let up = b.to_ascii_uppercase();
        if !up.is_ascii_uppercase() {
            return Err(CoreError::InvalidColumn(letters.to_string()));
        }
        n = n * 26 + u32::from(up - b'A' + 1);
    }
    Ok(n)
}

/// A single cell, e.g. `B4`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellLocation {
    pub row: u32,
    pub col: u32,
}

impl CellLocation {
    pub fn new(row: u32, col: u32) -> Result<Self, CoreError> {
        if row == 0 || col == 0 {
            return Err(CoreError::InvalidCell(format!("row {row}, col {col}")));
        }
        Ok(Self { row, col })
    }

    /// Same column, different row. Used for "`B{row}`"-style anchors.
    pub fn at_row(col_letters: &str, row: u32) -> Result<Self, CoreError> {
        Self::new(row, column_index(col_letters)?)
    }

    /// Shift by a signed number of rows/columns; leaving the sheet is an error.
    pub fn offset(&self, rows: i64, cols: i64) -> Result<Self, CoreError> {
        let r = i64::from(self.row) + rows;
        let c = i64::from(self.col) + cols;
        if r < 1 || c < 1 || r > i64::from(u32::MAX) || c > i64::from(u32::MAX) {
            return Err(CoreError::OffsetOutOfSheet { cell: self.to_string(), rows, cols });
        }
        Ok(Self { row: r as u32, col: c as u32 })
    }

    pub fn column_letter(&self) -> String {
        column_letter(self.col)
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

impl FromStr for CellLocation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| CoreError::InvalidCell(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let col = column_index(letters).map_err(|_| CoreError::InvalidCell(s.to_string()))?;
        let row = digits
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidCell(s.to_string()))?;
        Self::new(row, col).map_err(|_| CoreError::InvalidCell(s.to_string()))
    }
}

/// Inclusive rectangular range, e.g. `B2:F2`. `start` is always top-left.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellRange {
    pub start: CellLocation,
    pub end: CellLocation,
}

impl CellRange {
    /// Build from two corners in any order.
    pub fn new(a: CellLocation, b: CellLocation) -> Self {
        Self {
            start: CellLocation { row: a.row.min(b.row), col: a.col.min(b.col) },
            end: CellLocation { row: a.row.max(b.row), col: a.col.max(b.col) },
        }
    }

    pub fn single(cell: CellLocation) -> Self {
        Self { start: cell, end: cell }
    }

    /// `from_bounds(2, 2, 2, 6)` is `B2:F2`.
    pub fn from_bounds(r1: u32, c1: u32, r2: u32, c2: u32) -> Result<Self, CoreError> {
        Ok(Self::new(CellLocation::new(r1, c1)?, CellLocation::new(r2, c2)?))
    }

    /// Column span `"B".."G"` over rows `first..=last`.
    pub fn columns(first_col: &str, last_col: &str, first_row: u32, last_row: u32) -> Result<Self, CoreError> {
        Self::from_bounds(first_row, column_index(first_col)?, last_row, column_index(last_col)?)
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, cell: &CellLocation) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((a, b)) => {
                let a = a.parse::<CellLocation>().map_err(|_| CoreError::InvalidRange(s.to_string()))?;
                let b = b.parse::<CellLocation>().map_err(|_| CoreError::InvalidRange(s.to_string()))?;
                Ok(Self::new(a, b))
            }
            None => s
                .parse::<CellLocation>()
                .map(Self::single)
                .map_err(|_| CoreError::InvalidRange(s.to_string())),
        }
    }
}

impl From<CellLocation> for CellRange {
    fn from(cell: CellLocation) -> Self {
        Self::single(cell)
    }
}
