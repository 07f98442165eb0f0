//! bod_report: what goes on the Dashboard worksheet, and where.
//!
//! Pure model, no I/O:
//! - `formats`: named cell formats, per-table column formats, notes, column widths.
//! - `assets`: `build_assets` turns the four report tables plus a `Layout` into
//!   ordered `RenderAsset`s, each with its post-write hooks.
//! - `context`: the typed context hooks read (sheet height, freshness message, ...)
//!   and the translation of hooks into `SheetOp`s.
//! - `digest`: SHA-256 over the canonical JSON of a plan, logged per cycle.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod assets;
pub mod context;
pub mod digest;
pub mod formats;

pub use assets::{build_assets, PostWriteHook, RenderAsset, ReportTables};
pub use context::{is_done_updating, sheet_level_ops, Freshness, RenderContext};
pub use digest::plan_digest;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("core: {0}")]
    Core(#[from] bod_core::CoreError),

    /// A report table does not have the columns its kind renders.
    #[error("{table}: expected {expected} columns, got {got}")]
    Shape { table: &'static str, expected: usize, got: usize },

    #[error("plan serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

pub mod prelude {
    pub use crate::{ReportError, ReportResult};
    pub use crate::assets::{build_assets, PostWriteHook, RenderAsset, ReportTables};
    pub use crate::context::{sheet_level_ops, Freshness, RenderContext};
}
