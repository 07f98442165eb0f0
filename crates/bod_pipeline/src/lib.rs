//! bod_pipeline: one dashboard sync, end to end:
//! transform → load → layout → provision → write → hooks → sheet-level formats → diagnostics.
//!
//! The crate owns ordering only. Data comes through `bod_io::TableSource`, the
//! spreadsheet through `bod_sheets::Spreadsheet`, and what to draw from
//! `bod_report`. The transformation engine is an opaque three-step commit
//! (`TransformEngine`) so the whole chain runs against fakes in tests.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod diagnostics;
pub mod load;
pub mod render;
pub mod sync;
pub mod transform;

pub use diagnostics::{log_min_revenue_info, log_missing_movies, MinRevenueReport};
pub use load::{data_through, load_tables};
pub use render::{provision, render_cycle, RenderSummary, DASHBOARD, SIBLINGS, WORKSHEET_ORDER};
pub use sync::{sync_draft, SyncOptions};
pub use transform::{SqlMeshCli, TransformEngine, TransformPlan, TransformStep};

/// Single error surface for a sync. Buckets drive the CLI exit code and the
/// retry decision; the text stays whatever the failing layer reported.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad or duplicate configuration. Never retried.
    #[error("config: {0}")]
    Config(String),

    /// A secret named by the config is missing from the environment.
    #[error("credentials: {0}")]
    Credential(String),

    /// Filesystem or database access.
    #[error("io: {0}")]
    Io(String),

    /// A table is missing or has an unexpected shape.
    #[error("data: {0}")]
    Data(String),

    #[error("spreadsheet: {0}")]
    Sheets(#[from] bod_sheets::SheetsError),

    /// The transformation engine failed; nothing was written to the spreadsheet.
    #[error("transform: {0}")]
    Transform(String),

    #[error("render: {0}")]
    Render(#[from] bod_report::ReportError),
}

impl PipelineError {
    /// Whether another attempt of the same sync can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Config(_) | PipelineError::Credential(_))
    }
}

impl From<bod_io::IoError> for PipelineError {
    fn from(e: bod_io::IoError) -> Self {
        use bod_io::IoError;
        use PipelineError::*;
        match e {
            IoError::Config(c) => Config(c.to_string()),
            e @ IoError::MissingCredential { .. } => Credential(e.to_string()),
            IoError::Path { path, msg } => Io(format!("{}: {msg}", path.display())),
            IoError::TableNotFound(t) => Data(format!("table not found: {t}")),
            IoError::Sqlite(e) => Io(format!("sqlite: {e}")),
            IoError::Core(e) => Data(e.to_string()),
        }
    }
}

impl From<bod_io::ConfigError> for PipelineError {
    fn from(e: bod_io::ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<bod_core::CoreError> for PipelineError {
    fn from(e: bod_core::CoreError) -> Self {
        PipelineError::Data(e.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

pub mod prelude {
    pub use crate::{PipelineError, PipelineResult};
    pub use crate::render::{render_cycle, RenderSummary};
    pub use crate::sync::{sync_draft, SyncOptions};
    pub use crate::transform::{SqlMeshCli, TransformEngine};
}
