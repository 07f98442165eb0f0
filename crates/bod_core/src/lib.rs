//! bod_core: Core types shared across the dashboard workspace.
//!
//! This crate is **I/O-free**. It defines the stable vocabulary used by
//! `bod_layout`, `bod_io`, `bod_sheets`, `bod_report`, `bod_pipeline`, `bod_cli`.
//!
//! - Cell values with an explicit `Missing` marker (`CellValue`)
//! - Rectangular result sets (`ReportTable`) and the four dashboard reports (`ReportKind`)
//! - A1 addressing (`CellLocation`, `CellRange`, column letters)
//! - Fully-qualified table references (`TableRef`)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core parsing & shape checks.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidCell(String),
        InvalidRange(String),
        InvalidColumn(String),
        OffsetOutOfSheet { cell: String, rows: i64, cols: i64 },
        InvalidTableRef(String),
        RaggedRow { row: usize, expected: usize, got: usize },
        ColumnCount { expected: usize, got: usize },
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidCell(s) => write!(f, "invalid cell reference: {s}"),
                CoreError::InvalidRange(s) => write!(f, "invalid range: {s}"),
                CoreError::InvalidColumn(s) => write!(f, "invalid column: {s}"),
                CoreError::OffsetOutOfSheet { cell, rows, cols } => {
                    write!(f, "offset ({rows}, {cols}) from {cell} leaves the sheet")
                }
                CoreError::InvalidTableRef(s) => {
                    write!(f, "invalid table reference (expected catalog.schema.table): {s}")
                }
                CoreError::RaggedRow { row, expected, got } => {
                    write!(f, "row {row} has {got} cells, expected {expected}")
                }
                CoreError::ColumnCount { expected, got } => {
                    write!(f, "column rename expects {expected} names, got {got}")
                }
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod a1;
pub mod cell;
pub mod ids;
pub mod table;

pub use a1::{column_index, column_letter, CellLocation, CellRange};
pub use cell::CellValue;
pub use errors::CoreError;
pub use ids::TableRef;
pub use table::{ReportKind, ReportTable};
