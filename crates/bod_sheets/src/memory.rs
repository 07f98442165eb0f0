//! crates/bod_sheets/src/memory.rs
//! Recording in-memory spreadsheet.
//!
//! Behaves like the remote one for everything the render cycle relies on
//! (grid bounds, tab order, values, formats layered per cell) and keeps an
//! ordered log of every call so tests can assert on sequencing.

use std::collections::BTreeMap;

use bod_core::{CellLocation, CellRange, CellValue};
use serde::Serialize;
use tracing::debug;

use crate::api::{reordered, SheetOp, Spreadsheet, Worksheet};
use crate::format::{CellFormat, ConditionalRule};
use crate::SheetsError;

/// One entry of the call log.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum LoggedOp {
    CreateWorksheet { name: String, rows: u32, cols: u32 },
    DeleteWorksheet { name: String },
    Reorder { order: Vec<String> },
    Sheet { name: String, op: SheetOp },
}

#[derive(Clone, Debug, Default)]
pub struct MemorySheet {
    pub rows: u32,
    pub cols: u32,
    cells: BTreeMap<CellLocation, CellValue>,
    merges: Vec<CellRange>,
    formats: Vec<(CellRange, CellFormat)>,
    rules: Vec<(CellRange, ConditionalRule)>,
    widths: BTreeMap<u32, u32>,
    notes: BTreeMap<CellLocation, String>,
}

impl MemorySheet {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols, ..Self::default() }
    }

    pub fn value(&self, cell: &str) -> CellValue {
        cell.parse::<CellLocation>()
            .ok()
            .and_then(|c| self.cells.get(&c).cloned())
            .unwrap_or_default()
    }

    /// Every format applied over `cell`, layered in call order.
    pub fn format_at(&self, cell: &str) -> CellFormat {
        let Ok(loc) = cell.parse::<CellLocation>() else {
            return CellFormat::default();
        };
        self.formats
            .iter()
            .filter(|(r, _)| r.contains(&loc))
            .fold(CellFormat::default(), |acc, (_, f)| acc.merged(f))
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn rules(&self) -> &[(CellRange, ConditionalRule)] {
        &self.rules
    }

    pub fn width(&self, column: u32) -> Option<u32> {
        self.widths.get(&column).copied()
    }

    pub fn note(&self, cell: &str) -> Option<&str> {
        let loc = cell.parse::<CellLocation>().ok()?;
        self.notes.get(&loc).map(String::as_str)
    }

    fn check(&self, name: &str, range: &CellRange) -> Result<(), SheetsError> {
        if range.end.row > self.rows || range.end.col > self.cols {
            return Err(SheetsError::OutOfBounds {
                sheet: name.to_string(),
                range: range.to_string(),
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    fn apply(&mut self, name: &str, op: &SheetOp) -> Result<(), SheetsError> {
        if let Some(range) = op.range() {
            self.check(name, &range)?;
        }
        match op {
            SheetOp::WriteValues { anchor, values } => {
                for (r, row) in values.iter().enumerate() {
                    for (c, v) in row.iter().enumerate() {
                        let at = CellLocation { row: anchor.row + r as u32, col: anchor.col + c as u32 };
                        if matches!(v, CellValue::Missing) || v.as_str() == Some("") {
                            self.cells.remove(&at);
                        } else {
                            self.cells.insert(at, v.clone());
                        }
                    }
                }
            }
            SheetOp::Merge { range } => self.merges.push(*range),
            SheetOp::Format { range, format } => self.formats.push((*range, format.clone())),
            SheetOp::Conditional { range, rule } => self.rules.push((*range, rule.clone())),
            SheetOp::ColumnWidth { column, pixels } => {
                self.widths.insert(*column, *pixels);
            }
            SheetOp::Note { cell, text } => {
                self.notes.insert(*cell, text.clone());
            }
            SheetOp::Resize { rows, cols } => {
                self.rows = *rows;
                self.cols = *cols;
                self.cells.retain(|c, _| c.row <= *rows && c.col <= *cols);
            }
        }
        Ok(())
    }

    fn grid(&self) -> Vec<Vec<CellValue>> {
        let Some(max_row) = self.cells.keys().map(|c| c.row).max() else {
            return Vec::new();
        };
        let mut out = vec![Vec::new(); max_row as usize];
        for (loc, v) in &self.cells {
            let row = &mut out[loc.row as usize - 1];
            if row.len() < loc.col as usize {
                row.resize(loc.col as usize, CellValue::Missing);
            }
            row[loc.col as usize - 1] = v.clone();
        }
        out
    }
}

/// Tabs in order plus the call log.
#[derive(Clone, Debug, Default)]
pub struct MemorySpreadsheet {
    tabs: Vec<(String, MemorySheet)>,
    log: Vec<LoggedOp>,
}

impl MemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-existing tabs, e.g. `[("Draft", 100, 10)]`.
    pub fn with_worksheets(tabs: &[(&str, u32, u32)]) -> Self {
        Self {
            tabs: tabs.iter().map(|(n, r, c)| (n.to_string(), MemorySheet::new(*r, *c))).collect(),
            log: Vec::new(),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.tabs.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn log(&self) -> &[LoggedOp] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tabs.iter().position(|(n, _)| n == name)
    }
}

impl Spreadsheet for MemorySpreadsheet {
    fn worksheet_names(&mut self) -> Result<Vec<String>, SheetsError> {
        Ok(self.tabs.iter().map(|(n, _)| n.clone()).collect())
    }

    fn create_worksheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<(), SheetsError> {
        if self.position(name).is_some() {
            return Err(SheetsError::Api {
                status: 400,
                message: format!("A sheet with the name \"{name}\" already exists."),
            });
        }
        self.tabs.push((name.to_string(), MemorySheet::new(rows, cols)));
        self.log.push(LoggedOp::CreateWorksheet { name: name.to_string(), rows, cols });
        debug!(name, rows, cols, "worksheet created");
        Ok(())
    }

    fn delete_worksheet(&mut self, name: &str) -> Result<(), SheetsError> {
        let i = self.position(name).ok_or_else(|| SheetsError::NotFound(name.to_string()))?;
        self.tabs.remove(i);
        self.log.push(LoggedOp::DeleteWorksheet { name: name.to_string() });
        Ok(())
    }

    fn reorder_worksheets(&mut self, order: &[&str]) -> Result<(), SheetsError> {
        let names: Vec<String> = self.tabs.iter().map(|(n, _)| n.clone()).collect();
        let target = reordered(&names, order);
        let mut tabs = std::mem::take(&mut self.tabs);
        for name in &target {
            if let Some(i) = tabs.iter().position(|(n, _)| n == name) {
                self.tabs.push(tabs.remove(i));
            }
        }
        self.log.push(LoggedOp::Reorder { order: target });
        Ok(())
    }

    fn worksheet(&mut self, name: &str) -> Result<Box<dyn Worksheet + '_>, SheetsError> {
        let i = self.position(name).ok_or_else(|| SheetsError::NotFound(name.to_string()))?;
        Ok(Box::new(MemoryWorksheet { book: self, index: i }))
    }
}

struct MemoryWorksheet<'a> {
    book: &'a mut MemorySpreadsheet,
    index: usize,
}

impl Worksheet for MemoryWorksheet<'_> {
    fn title(&self) -> &str {
        &self.book.tabs[self.index].0
    }

    fn apply(&mut self, op: SheetOp) -> Result<(), SheetsError> {
        let (name, sheet) = &mut self.book.tabs[self.index];
        sheet.apply(name, &op)?;
        let name = name.clone();
        self.book.log.push(LoggedOp::Sheet { name, op });
        Ok(())
    }

    fn read_all(&mut self) -> Result<Vec<Vec<CellValue>>, SheetsError> {
        Ok(self.book.tabs[self.index].1.grid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NumberFormat;

    fn book() -> MemorySpreadsheet {
        MemorySpreadsheet::with_worksheets(&[("Draft", 50, 5), ("Dashboard", 10, 25)])
    }

    #[test]
    fn writes_land_at_anchor_and_blank_strings_clear() {
        let mut b = book();
        {
            let mut ws = b.worksheet("Dashboard").unwrap();
            ws.write_values(
                "B4".parse().unwrap(),
                vec![
                    vec![CellValue::text("Name"), CellValue::text("Revenue")],
                    vec![CellValue::text("Ann"), CellValue::Int(0)],
                ],
            )
            .unwrap();
            ws.write_cell("C5".parse().unwrap(), CellValue::text("")).unwrap();
        }
        let s = b.sheet("Dashboard").unwrap();
        assert_eq!(s.value("B4"), CellValue::text("Name"));
        assert_eq!(s.value("B5"), CellValue::text("Ann"));
        assert_eq!(s.value("C5"), CellValue::Missing);
    }

    #[test]
    fn out_of_grid_writes_fail() {
        let mut b = book();
        let mut ws = b.worksheet("Dashboard").unwrap();
        let err = ws.write_cell("A11".parse().unwrap(), CellValue::Int(1)).unwrap_err();
        assert!(matches!(err, SheetsError::OutOfBounds { rows: 10, cols: 25, .. }));
        ws.resize(11, 25).unwrap();
        ws.write_cell("A11".parse().unwrap(), CellValue::Int(1)).unwrap();
    }

    #[test]
    fn formats_layer_in_call_order() {
        let mut b = book();
        {
            let mut ws = b.worksheet("Dashboard").unwrap();
            ws.format_range("B4:G4".parse().unwrap(), CellFormat::center().bold()).unwrap();
            ws.format_range("C4:C9".parse().unwrap(), CellFormat::right().number(NumberFormat::currency()))
                .unwrap();
        }
        let s = b.sheet("Dashboard").unwrap();
        let c4 = s.format_at("C4");
        assert_eq!(c4, CellFormat::right().bold().number(NumberFormat::currency()));
        assert_eq!(s.format_at("B4"), CellFormat::center().bold());
        assert!(s.format_at("A1").is_empty());
    }

    #[test]
    fn lifecycle_is_logged_in_order() {
        let mut b = book();
        b.delete_worksheet("Dashboard").unwrap();
        b.create_worksheet("Dashboard", 20, 25).unwrap();
        b.reorder_worksheets(&["Dashboard", "Draft"]).unwrap();
        assert_eq!(b.worksheet_names().unwrap(), ["Dashboard", "Draft"]);
        assert!(b.create_worksheet("Draft", 1, 1).is_err());
        assert!(matches!(b.delete_worksheet("Nope"), Err(SheetsError::NotFound(_))));
        assert_eq!(
            b.log(),
            [
                LoggedOp::DeleteWorksheet { name: "Dashboard".into() },
                LoggedOp::CreateWorksheet { name: "Dashboard".into(), rows: 20, cols: 25 },
                LoggedOp::Reorder { order: vec!["Dashboard".into(), "Draft".into()] },
            ]
        );
    }

    #[test]
    fn read_all_returns_row_major_grid() {
        let mut b = book();
        let mut ws = b.worksheet("Draft").unwrap();
        ws.write_cell("B2".parse().unwrap(), CellValue::Int(7)).unwrap();
        let grid = ws.read_all().unwrap();
        assert_eq!(grid, vec![vec![], vec![CellValue::Missing, CellValue::Int(7)]]);
    }
}
