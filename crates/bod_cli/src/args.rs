// crates/bod_cli/src/args.rs
//
// Argument surface of the `bod` binary.
//
// - `sync`: one dashboard sync per config, with per-config retries.
// - `validate`: load and validate configs only (batch duplicate check included).
// - `layout`: print the computed layout for four table lengths.
//
// Config paths must be local files; existence is checked here so a typo
// fails before any logging or network setup.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "bod",
    disable_help_subcommand = true,
    about = "Box office draft dashboard: transform, render, diagnose"
)]
pub struct Cli {
    /// Emit logs as JSON lines (stderr).
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Transform, render and diagnose each configured draft.
    Sync(SyncArgs),
    /// Validate config files without touching data or spreadsheets.
    Validate(ConfigArgs),
    /// Print the layout for the given table lengths as JSON.
    Layout(LayoutArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Draft config YAML file. Repeat for several drafts.
    #[arg(long = "config", required = true, num_args = 1..)]
    pub configs: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Extra attempts per config after a failure.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Seconds to wait between attempts.
    #[arg(long, default_value_t = 60)]
    pub backoff_secs: u64,

    /// Render into an in-memory spreadsheet and print the run summary.
    #[arg(long)]
    pub dry_run: bool,

    /// Render from the tables already materialized.
    #[arg(long)]
    pub skip_transform: bool,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct LayoutArgs {
    #[arg(long)]
    pub scoreboard: usize,
    #[arg(long)]
    pub released: usize,
    #[arg(long)]
    pub worst: usize,
    #[arg(long)]
    pub best: usize,
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    Repeated(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "config must be a local file (no scheme): {p}"),
            NotFound(p) => write!(f, "config file not found: {p}"),
            Repeated(p) => write!(f, "config given more than once: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

fn check_config_paths(paths: &[PathBuf]) -> Result<(), CliError> {
    let mut seen = BTreeSet::new();
    for p in paths {
        let shown = p.display().to_string();
        if has_scheme(&shown) {
            return Err(CliError::NonLocalPath(shown));
        }
        if !Path::new(p).is_file() {
            return Err(CliError::NotFound(shown));
        }
        if !seen.insert(p.clone()) {
            return Err(CliError::Repeated(shown));
        }
    }
    Ok(())
}

impl Cli {
    /// Cross-flag and filesystem checks clap cannot express.
    pub fn validate(&self) -> Result<(), CliError> {
        match &self.command {
            Command::Sync(a) => check_config_paths(&a.config.configs),
            Command::Validate(a) => check_config_paths(&a.configs),
            Command::Layout(_) => Ok(()),
        }
    }
}

/// Parse argv (clap exits on `--help`/usage errors) then run `Cli::validate`.
pub fn parse_and_validate() -> Result<Cli, CliError> {
    let cli = Cli::parse();
    cli.validate()?;
    Ok(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn sync_defaults_match_the_schedule() {
        let cli = parse(&["bod", "sync", "--config", "a.yml"]);
        let Command::Sync(a) = cli.command else { panic!("expected sync") };
        assert_eq!((a.retries, a.backoff_secs), (3, 60));
        assert!(!a.dry_run && !a.skip_transform && !cli.log_json);
    }

    #[test]
    fn several_configs_and_global_flags() {
        let cli = parse(&["bod", "sync", "--config", "a.yml", "--config", "b.yml", "--log-json", "--dry-run"]);
        assert!(cli.log_json);
        let Command::Sync(a) = cli.command else { panic!("expected sync") };
        assert_eq!(a.config.configs, [PathBuf::from("a.yml"), PathBuf::from("b.yml")]);
        assert!(a.dry_run);
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["bod", "validate"]).is_err());
    }

    #[test]
    fn remote_and_repeated_paths_are_rejected() {
        assert!(matches!(
            check_config_paths(&[PathBuf::from("https://example.com/a.yml")]),
            Err(CliError::NonLocalPath(_))
        ));
        assert!(matches!(check_config_paths(&[PathBuf::from("nope.yml")]), Err(CliError::NotFound(_))));

        let f = tempfile::NamedTempFile::new().unwrap();
        let p = f.path().to_path_buf();
        assert!(check_config_paths(&[p.clone()]).is_ok());
        assert!(matches!(check_config_paths(&[p.clone(), p]), Err(CliError::Repeated(_))));
    }
}
