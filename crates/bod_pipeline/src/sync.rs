//! crates/bod_pipeline/src/sync.rs
//! Top level of one scheduled run for one draft.

use bod_io::{Clock, DraftConfig, TableSource};
use bod_sheets::Spreadsheet;
use tracing::{info, info_span};

use crate::render::{render_cycle, RenderSummary};
use crate::transform::TransformEngine;
use crate::PipelineError;

#[derive(Clone, Copy, Debug, Default)]
pub struct SyncOptions {
    /// Render from whatever the data source already holds.
    pub skip_transform: bool,
}

/// Transform, then render (diagnostics included).
///
/// The source is opened only after the transform commits, so it sees the
/// freshly materialized tables. A transform failure returns before the
/// spreadsheet is touched.
pub fn sync_draft<E, S, C>(
    cfg: &DraftConfig,
    engine: &mut E,
    open_source: impl FnOnce(&DraftConfig) -> Result<S, PipelineError>,
    sheets: &mut dyn Spreadsheet,
    clock: &C,
    opts: SyncOptions,
) -> Result<RenderSummary, PipelineError>
where
    E: TransformEngine + ?Sized,
    S: TableSource,
    C: Clock + ?Sized,
{
    let span = info_span!("sync", draft = %cfg.draft_id, year = cfg.year);
    let _guard = span.enter();

    if opts.skip_transform {
        info!("transform skipped");
    } else {
        engine.plan_apply_run()?;
    }
    let source = open_source(cfg)?;
    render_cycle(cfg, &source, sheets, clock)
}
