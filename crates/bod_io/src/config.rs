// crates/bod_io/src/config.rs
//
// Per-draft YAML configuration.
//
// - Parsed loosely (`serde_yaml::Value`), then validated by hand so that every
//   missing field and every type problem is reported in one message.
// - The result is a typed `DraftConfig`; nothing downstream touches raw YAML.
// - The config path travels inside `DraftConfig::path`; nothing here writes the
//   process environment.
// - Year must be the current UTC year or the one before it (clock injected).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {msg}")]
    Read { path: PathBuf, msg: String },

    #[error("Configuration file {0} is empty or invalid")]
    Empty(PathBuf),

    #[error("yaml error in {path}: {msg}")]
    Yaml { path: PathBuf, msg: String },

    /// Aggregated validation findings, already formatted for humans.
    #[error("{0}")]
    Invalid(String),

    /// Two or more configs in one batch share an identifier.
    #[error("{0}")]
    Duplicate(String),
}

/// Where the raw box-office data is pulled from before transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateType {
    Web,
    S3 {
        bucket: String,
        access_key_id_var: String,
        secret_access_key_var: String,
    },
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Web => "web",
            UpdateType::S3 { .. } => "s3",
        }
    }
}

/// Validated configuration for one draft (one league, one dashboard).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftConfig {
    /// File the config was loaded from; handed explicitly to the transformation engine.
    pub path: PathBuf,
    pub year: i32,
    /// Display name written as the dashboard title.
    pub name: String,
    /// Spreadsheet (document) name.
    pub sheet_name: String,
    /// Also the catalog name in the data source.
    pub draft_id: String,
    pub update_type: UpdateType,
    /// Name of the environment variable holding the service-account JSON.
    pub gspread_credentials_name: String,
    pub database_dir: PathBuf,
    pub transform_project: PathBuf,
}

// ---------- field table ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Int,
    Str,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Str => "str",
        }
    }

    fn accepts(self, v: &Value) -> bool {
        match self {
            Kind::Int => matches!(v, Value::Number(n) if n.is_i64() || n.is_u64()),
            Kind::Str => v.is_string(),
        }
    }
}

const REQUIRED: [(&str, Kind); 6] = [
    ("year", Kind::Int),
    ("name", Kind::Str),
    ("sheet_name", Kind::Str),
    ("draft_id", Kind::Str),
    ("update_type", Kind::Str),
    ("gspread_credentials_name", Kind::Str),
];

const OPTIONAL_PATHS: [&str; 2] = ["database_dir", "transform_project"];

const S3_REQUIRED: [&str; 3] = ["bucket", "s3_access_key_id_var_name", "s3_secret_access_key_var_name"];

/// Type names as operators see them in error messages.
fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dict",
        Value::Tagged(_) => "tagged",
    }
}

fn get_str<'a>(raw: &'a Mapping, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

// ---------- validation ----------

/// Validate a raw mapping. `current_year` is the UTC year at load time.
/// `path` is recorded on the result and anchors relative directories.
pub fn validate_config(raw: &Mapping, path: &Path, current_year: i32) -> Result<DraftConfig, ConfigError> {
    let mut missing: Vec<&str> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for (field, kind) in REQUIRED {
        match raw.get(field) {
            None => missing.push(field),
            Some(v) if !kind.accepts(v) => {
                errors.push(format!("{field}: expected {}, got {}", kind.name(), type_name(v)));
            }
            Some(_) => {}
        }
    }

    let year = raw.get("year").and_then(Value::as_i64);
    if let Some(y) = year {
        let valid = [i64::from(current_year) - 1, i64::from(current_year)];
        if !valid.contains(&y) {
            errors.push(format!("year: must be {} or {}, got {y}", current_year - 1, current_year));
        }
    }

    let update_type = raw.get("update_type");
    if let Some(v) = update_type {
        if !matches!(v.as_str(), Some("s3" | "web")) {
            errors.push("update_type: must be 's3' or 'web'".to_string());
        }
    }
    let is_s3 = update_type.and_then(Value::as_str) == Some("s3");
    if is_s3 {
        for field in S3_REQUIRED {
            match raw.get(field) {
                None => errors.push(format!("{field}: required when update_type is 's3'")),
                Some(v) if !v.is_string() => {
                    errors.push(format!("{field}: expected str, got {}", type_name(v)));
                }
                Some(_) => {}
            }
        }
    }

    for field in OPTIONAL_PATHS {
        if let Some(v) = raw.get(field) {
            if !v.is_string() {
                errors.push(format!("{field}: expected str, got {}", type_name(v)));
            }
        }
    }

    let mut lines = Vec::new();
    if !missing.is_empty() {
        lines.push(format!("Missing required fields: {}", missing.join(", ")));
    }
    if !errors.is_empty() {
        lines.push(format!("Type/validation errors: {}", errors.join("; ")));
    }
    if !lines.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "Configuration validation failed:\n{}",
            lines.join("\n")
        )));
    }

    // Every field below was checked above; the fallbacks are unreachable.
    let text = |key: &str| get_str(raw, key).unwrap_or_default().to_string();
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let dir = |key: &str, default: &str| match get_str(raw, key) {
        Some(p) => base.join(p),
        None => base.join(default),
    };

    let update_type = if is_s3 {
        UpdateType::S3 {
            bucket: text("bucket"),
            access_key_id_var: text("s3_access_key_id_var_name"),
            secret_access_key_var: text("s3_secret_access_key_var_name"),
        }
    } else {
        UpdateType::Web
    };

    Ok(DraftConfig {
        path: path.to_path_buf(),
        year: year.and_then(|y| i32::try_from(y).ok()).unwrap_or(current_year),
        name: text("name"),
        sheet_name: text("sheet_name"),
        draft_id: text("draft_id"),
        update_type,
        gspread_credentials_name: text("gspread_credentials_name"),
        database_dir: dir("database_dir", "databases"),
        transform_project: dir("transform_project", "transform"),
    })
}

/// Read, parse and validate one config file.
pub fn load_config(path: &Path, clock: &impl Clock) -> Result<DraftConfig, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Read { path: path.to_path_buf(), msg: e.to_string() })?;
    if text.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    let value: Value = serde_yaml::from_str(&text)
        .map_err(|e| ConfigError::Yaml { path: path.to_path_buf(), msg: e.to_string() })?;
    let raw = match value {
        Value::Mapping(m) if !m.is_empty() => m,
        _ => return Err(ConfigError::Empty(path.to_path_buf())),
    };
    let cfg = validate_config(&raw, path, clock.current_year())?;
    debug!(path = %path.display(), draft_id = %cfg.draft_id, "config loaded");
    Ok(cfg)
}

/// Load a batch of configs. Per-file failures and cross-file duplicate
/// `draft_id` / `sheet_name` values are all reported together.
pub fn load_configs<P: AsRef<Path>>(paths: &[P], clock: &impl Clock) -> Result<Vec<DraftConfig>, ConfigError> {
    let mut loaded = Vec::with_capacity(paths.len());
    let mut failures: Vec<(PathBuf, ConfigError)> = Vec::new();
    for p in paths {
        match load_config(p.as_ref(), clock) {
            Ok(c) => loaded.push(c),
            Err(e) => failures.push((p.as_ref().to_path_buf(), e)),
        }
    }

    if failures.len() == 1 && paths.len() == 1 {
        if let Some((_, e)) = failures.pop() {
            return Err(e);
        }
    }
    if !failures.is_empty() {
        let msg = failures
            .iter()
            .map(|(p, e)| format!("{}: {e}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ConfigError::Invalid(msg));
    }

    check_duplicates(&loaded)?;
    Ok(loaded)
}

fn check_duplicates(configs: &[DraftConfig]) -> Result<(), ConfigError> {
    let by_draft: Vec<(&str, &Path)> =
        configs.iter().map(|c| (c.draft_id.as_str(), c.path.as_path())).collect();
    let by_sheet: Vec<(&str, &Path)> =
        configs.iter().map(|c| (c.sheet_name.as_str(), c.path.as_path())).collect();

    let mut findings = Vec::new();
    for (label, pairs) in [("draft_id", by_draft), ("sheet_name", by_sheet)] {
        let mut seen: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (value, path) in pairs {
            seen.entry(value).or_default().push(path.display().to_string());
        }
        for (value, owners) in seen {
            if owners.len() > 1 {
                findings.push(format!("{label} '{value}' is used by: {}", owners.join(", ")));
            }
        }
    }
    if findings.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Duplicate(format!(
            "Duplicate configuration identifiers:\n{}",
            findings.join("\n")
        )))
    }
}
