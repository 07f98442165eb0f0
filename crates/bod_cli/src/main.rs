// crates/bod_cli/src/main.rs
//
// `bod` entry point: exit codes, error mapping, logging setup, and the
// per-config retry loop around `bod_pipeline::sync_draft`.
//
// One invocation handles every `--config` in order. A failing draft does not
// stop the others; the exit code reflects the first failure.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad arguments, invalid/duplicate configs, missing credentials.
    pub const CONFIG: i32 = 2;
    /// The transformation engine failed; the spreadsheet was not touched.
    pub const TRANSFORM: i32 = 3;
    /// Database, filesystem or spreadsheet API.
    pub const IO: i32 = 4;
    /// Building the render plan failed.
    pub const RENDER: i32 = 5;
}

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use args::{parse_and_validate as parse_cli, Command, ConfigArgs, LayoutArgs, SyncArgs};
use bod_io::{load_configs, DraftConfig, SqliteSource, SystemClock};
use bod_layout::compute_layout_from;
use bod_pipeline::{sync_draft, PipelineError, RenderSummary, SqlMeshCli, SyncOptions};
use bod_sheets::{MemorySpreadsheet, Spreadsheet};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Central error type for exit-code mapping.
#[derive(Debug)]
enum MainError {
    Config(String),
    Transform(String),
    Io(String),
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Config(m) | MainError::Transform(m) | MainError::Io(m) | MainError::Render(m) => {
                f.write_str(m)
            }
        }
    }
}

fn main() -> ExitCode {
    // A missing .env is normal in production; the scheduler sets the environment.
    let _ = dotenvy::dotenv();

    let cli = match parse_cli() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("bod: error: {e}");
            return ExitCode::from(exitcodes::CONFIG as u8);
        }
    };
    init_tracing(cli.log_json);

    let result = match &cli.command {
        Command::Sync(a) => run_sync(a),
        Command::Validate(a) => validate(a),
        Command::Layout(a) => print_layout(*a),
    };
    let rc = match result {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("bod: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Config(_) => CONFIG,
        MainError::Transform(_) => TRANSFORM,
        MainError::Io(_) => IO,
        MainError::Render(_) => RENDER,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Config(m) | Credential(m) => MainError::Config(m),
        Transform(m) => MainError::Transform(m),
        Io(m) | Data(m) => MainError::Io(m),
        Sheets(e) => MainError::Io(e.to_string()),
        Render(e) => MainError::Render(e.to_string()),
    }
}

fn load(args: &ConfigArgs) -> Result<Vec<DraftConfig>, MainError> {
    load_configs(&args.configs, &SystemClock).map_err(|e| MainError::Config(e.to_string()))
}

fn validate(args: &ConfigArgs) -> Result<(), MainError> {
    for cfg in load(args)? {
        println!("{}: ok ({}, {})", cfg.path.display(), cfg.draft_id, cfg.update_type.as_str());
    }
    Ok(())
}

fn print_layout(args: LayoutArgs) -> Result<(), MainError> {
    let layout = compute_layout_from(args.scoreboard, args.released, args.worst, args.best);
    let text = serde_json::to_string_pretty(&layout).map_err(|e| MainError::Render(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn run_sync(args: &SyncArgs) -> Result<(), MainError> {
    let configs = load(&args.config)?;
    let mut first_failure = None;
    for cfg in &configs {
        match sync_with_retries(cfg, args) {
            Ok(summary) => {
                if args.dry_run {
                    let text =
                        serde_json::to_string_pretty(&summary).map_err(|e| MainError::Render(e.to_string()))?;
                    println!("{text}");
                }
            }
            Err(e) => {
                error!(draft = %cfg.draft_id, error = %e, "sync failed");
                first_failure.get_or_insert(map_pipeline_err(e));
            }
        }
    }
    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Up to `1 + retries` attempts with a fixed pause. Configuration and
/// credential problems are returned at once.
fn sync_with_retries(cfg: &DraftConfig, args: &SyncArgs) -> Result<RenderSummary, PipelineError> {
    let attempts = args.retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match sync_once(cfg, args) {
            Ok(summary) => {
                info!(draft = %cfg.draft_id, attempt, digest = %summary.digest, "sync complete");
                return Ok(summary);
            }
            Err(e) if !e.is_retryable() || attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    draft = %cfg.draft_id,
                    attempt,
                    error = %e,
                    "sync failed; retrying in {}s",
                    args.backoff_secs
                );
                thread::sleep(Duration::from_secs(args.backoff_secs));
                attempt += 1;
            }
        }
    }
}

fn sync_once(cfg: &DraftConfig, args: &SyncArgs) -> Result<RenderSummary, PipelineError> {
    let mut engine = SqlMeshCli::for_config(cfg)?;
    let mut sheets: Box<dyn Spreadsheet> = if args.dry_run {
        Box::new(MemorySpreadsheet::new())
    } else {
        open_remote(cfg)?
    };
    sync_draft(
        cfg,
        &mut engine,
        |c| SqliteSource::for_config(c).map_err(PipelineError::from),
        sheets.as_mut(),
        &SystemClock,
        SyncOptions { skip_transform: args.skip_transform },
    )
}

#[cfg(feature = "http")]
fn open_remote(cfg: &DraftConfig) -> Result<Box<dyn Spreadsheet>, PipelineError> {
    use bod_io::ServiceAccount;
    use bod_sheets::{HttpSpreadsheet, ServiceAccountToken};

    let account = ServiceAccount::from_env(&cfg.gspread_credentials_name)?;
    let token = ServiceAccountToken::from_json(account.json())?;
    let book = HttpSpreadsheet::open(&cfg.sheet_name, Box::new(token))?;
    info!(spreadsheet = %cfg.sheet_name, account = account.client_email(), "spreadsheet opened");
    Ok(Box::new(book))
}

#[cfg(not(feature = "http"))]
fn open_remote(cfg: &DraftConfig) -> Result<Box<dyn Spreadsheet>, PipelineError> {
    Err(PipelineError::Config(format!(
        "{}: built without the `http` feature; only --dry-run is available",
        cfg.sheet_name
    )))
}
