//! crates/bod_sheets/src/lib.rs
//! Spreadsheet contract for the dashboard.
//!
//! - `format`: alignment / number format / text style / conditional rules.
//! - `api`: the `Spreadsheet` and `Worksheet` traits and the `SheetOp` vocabulary.
//! - `memory`: recording in-memory implementation (tests, dry runs).
//! - `auth` + `http` (feature `http`): Google Sheets v4 / Drive v3 over blocking HTTP.
//!
//! Addresses are 1-indexed A1 everywhere; only `http` converts to 0-indexed grid ranges.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod api;
pub mod format;
pub mod memory;

#[cfg(feature = "http")]
pub mod auth;
#[cfg(feature = "http")]
pub mod http;

pub use api::{SheetOp, Spreadsheet, Worksheet};
pub use format::{CellFormat, Color, ConditionalRule, HorizontalAlignment, NumberFormat, TextFormat};
pub use memory::{LoggedOp, MemorySheet, MemorySpreadsheet};

#[cfg(feature = "http")]
pub use auth::{ServiceAccountToken, StaticToken, TokenSource};
#[cfg(feature = "http")]
pub use http::HttpSpreadsheet;

#[derive(Debug, Error)]
pub enum SheetsError {
    /// Transport failure (DNS, TLS, connection reset, body decode).
    #[error("http error: {0}")]
    Http(String),

    /// Non-success response from the API after retries.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Spreadsheet or worksheet lookup by name failed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation targets cells outside the worksheet grid.
    #[error("{range} is outside worksheet '{sheet}' ({rows}x{cols})")]
    OutOfBounds { sheet: String, range: String, rows: u32, cols: u32 },

    #[error("auth error: {0}")]
    Auth(String),

    #[error("core: {0}")]
    Core(#[from] bod_core::CoreError),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for SheetsError {
    fn from(e: reqwest::Error) -> Self {
        SheetsError::Http(e.to_string())
    }
}

pub type SheetsResult<T> = Result<T, SheetsError>;

pub mod prelude {
    pub use crate::{SheetsError, SheetsResult};
    pub use crate::api::{SheetOp, Spreadsheet, Worksheet};
    pub use crate::format::{CellFormat, Color, ConditionalRule, NumberFormat};
    pub use crate::memory::MemorySpreadsheet;
}
