//! crates/bod_io/src/lib.rs
//! I/O boundary for the dashboard job.
//!
//! - `config`: per-draft YAML config, validated once into a typed `DraftConfig`.
//! - `credentials`: secrets resolved from the environment at point of use.
//! - `source`: the tabular data source the transformation engine materializes into.
//! - `clock`: injectable UTC clock so year checks and timestamps are testable.
//!
//! Shared error type (`IoError`) with `From` conversions used across modules.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

pub mod clock;
pub mod config;
pub mod credentials;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, load_configs, validate_config, ConfigError, DraftConfig, UpdateType};
pub use credentials::{S3Credentials, ServiceAccount};
pub use source::{SqliteSource, TableSource};

/// Unified error for bod_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Config missing, unparsable, or failing validation. Never retried.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A secret named by the config is absent from the environment or malformed.
    #[error("{var} is not set or is invalid in the environment")]
    MissingCredential { var: String },

    /// Filesystem / path errors (database directory, schema files).
    #[error("io/path error at {path}: {msg}")]
    Path { path: PathBuf, msg: String },

    /// Table reference does not belong to the opened catalog, or the schema is not attached.
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("core: {0}")]
    Core(#[from] bod_core::CoreError),
}

pub type IoResult<T> = Result<T, IoError>;

pub mod prelude {
    pub use crate::{IoError, IoResult};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::{load_config, load_configs, DraftConfig, UpdateType};
    pub use crate::credentials::{S3Credentials, ServiceAccount};
    pub use crate::source::{SqliteSource, TableSource};
}
