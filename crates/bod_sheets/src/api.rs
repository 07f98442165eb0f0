//! crates/bod_sheets/src/api.rs
//! Operation-level contract of the remote spreadsheet.
//!
//! A worksheet mutation is one `SheetOp`. Implementations may apply ops
//! immediately (memory) or queue them and send them in batches (http); either
//! way they take effect in the order issued and are all visible after `flush`.

use bod_core::{CellLocation, CellRange, CellValue};
use serde::Serialize;

use crate::format::{CellFormat, ConditionalRule};
use crate::SheetsError;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SheetOp {
    /// Rectangular values, top-left at `anchor`. Rows may be ragged.
    WriteValues { anchor: CellLocation, values: Vec<Vec<CellValue>> },
    Merge { range: CellRange },
    Format { range: CellRange, format: CellFormat },
    Conditional { range: CellRange, rule: ConditionalRule },
    /// 1-indexed column, width in pixels.
    ColumnWidth { column: u32, pixels: u32 },
    Note { cell: CellLocation, text: String },
    Resize { rows: u32, cols: u32 },
}

impl SheetOp {
    pub fn kind(&self) -> &'static str {
        match self {
            SheetOp::WriteValues { .. } => "write_values",
            SheetOp::Merge { .. } => "merge",
            SheetOp::Format { .. } => "format",
            SheetOp::Conditional { .. } => "conditional",
            SheetOp::ColumnWidth { .. } => "column_width",
            SheetOp::Note { .. } => "note",
            SheetOp::Resize { .. } => "resize",
        }
    }

    /// Cells touched, if the op addresses cells.
    pub fn range(&self) -> Option<CellRange> {
        match self {
            SheetOp::WriteValues { anchor, values } => {
                let rows = values.len() as u32;
                let cols = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
                if rows == 0 || cols == 0 {
                    return None;
                }
                Some(CellRange::new(
                    *anchor,
                    CellLocation { row: anchor.row + rows - 1, col: anchor.col + cols - 1 },
                ))
            }
            SheetOp::Merge { range } | SheetOp::Format { range, .. } | SheetOp::Conditional { range, .. } => {
                Some(*range)
            }
            SheetOp::Note { cell, .. } => Some(CellRange::single(*cell)),
            SheetOp::ColumnWidth { .. } | SheetOp::Resize { .. } => None,
        }
    }
}

/// One tab.
pub trait Worksheet {
    fn title(&self) -> &str;

    fn apply(&mut self, op: SheetOp) -> Result<(), SheetsError>;

    /// Push anything still queued. Memory sheets have nothing to push.
    fn flush(&mut self) -> Result<(), SheetsError> {
        Ok(())
    }

    /// Every value currently on the sheet, row-major, trailing empties trimmed.
    fn read_all(&mut self) -> Result<Vec<Vec<CellValue>>, SheetsError>;

    fn write_values(&mut self, anchor: CellLocation, values: Vec<Vec<CellValue>>) -> Result<(), SheetsError> {
        self.apply(SheetOp::WriteValues { anchor, values })
    }

    fn write_cell(&mut self, cell: CellLocation, value: CellValue) -> Result<(), SheetsError> {
        self.write_values(cell, vec![vec![value]])
    }

    fn merge_cells(&mut self, range: CellRange) -> Result<(), SheetsError> {
        self.apply(SheetOp::Merge { range })
    }

    fn format_range(&mut self, range: CellRange, format: CellFormat) -> Result<(), SheetsError> {
        self.apply(SheetOp::Format { range, format })
    }

    fn add_conditional_format(&mut self, range: CellRange, rule: ConditionalRule) -> Result<(), SheetsError> {
        self.apply(SheetOp::Conditional { range, rule })
    }

    fn set_column_width(&mut self, column: u32, pixels: u32) -> Result<(), SheetsError> {
        self.apply(SheetOp::ColumnWidth { column, pixels })
    }

    fn set_note(&mut self, cell: CellLocation, text: &str) -> Result<(), SheetsError> {
        self.apply(SheetOp::Note { cell, text: text.to_string() })
    }

    fn resize(&mut self, rows: u32, cols: u32) -> Result<(), SheetsError> {
        self.apply(SheetOp::Resize { rows, cols })
    }
}

/// Worksheet lifecycle inside one named spreadsheet.
pub trait Spreadsheet {
    /// Worksheet titles in tab order.
    fn worksheet_names(&mut self) -> Result<Vec<String>, SheetsError>;

    fn create_worksheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<(), SheetsError>;

    /// Missing worksheets are `NotFound`.
    fn delete_worksheet(&mut self, name: &str) -> Result<(), SheetsError>;

    /// Listed names first, in the given order; unlisted tabs keep their
    /// relative order after them. Names that do not exist are skipped.
    fn reorder_worksheets(&mut self, order: &[&str]) -> Result<(), SheetsError>;

    fn worksheet(&mut self, name: &str) -> Result<Box<dyn Worksheet + '_>, SheetsError>;

    fn has_worksheet(&mut self, name: &str) -> Result<bool, SheetsError> {
        Ok(self.worksheet_names()?.iter().any(|n| n == name))
    }
}

/// Target tab order: listed names that exist, then the rest unchanged.
pub fn reordered(current: &[String], order: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = order
        .iter()
        .filter(|n| current.iter().any(|c| c == *n))
        .map(|n| n.to_string())
        .collect();
    out.extend(current.iter().filter(|c| !order.contains(&c.as_str())).cloned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_range_spans_widest_row() {
        let op = SheetOp::WriteValues {
            anchor: "B4".parse().unwrap(),
            values: vec![vec![CellValue::Int(1); 3], vec![CellValue::Int(2); 6]],
        };
        assert_eq!(op.range().unwrap().to_string(), "B4:G5");
        let empty = SheetOp::WriteValues { anchor: "B4".parse().unwrap(), values: vec![] };
        assert!(empty.range().is_none());
    }

    #[test]
    fn reorder_keeps_unlisted_tabs_after_listed_ones() {
        let current: Vec<String> = ["Draft", "Notes", "Manual Adds", "Dashboard"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let order = ["Dashboard", "Draft", "Manual Adds", "Multipliers and Exclusions"];
        assert_eq!(reordered(&current, &order), ["Dashboard", "Draft", "Manual Adds", "Notes"]);
    }
}
