//! crates/bod_pipeline/src/render.rs
//! One render cycle against a spreadsheet.
//!
//! Strict order: provision worksheets → write every asset's data → run every
//! asset's hooks → notes and widths → trim the grid → diagnostics. Any error
//! propagates; the next run deletes and recreates the Dashboard anyway.

use bod_io::{Clock, DraftConfig, TableSource};
use bod_layout::consts::SHEET_COLUMNS;
use bod_layout::{compute_layout, Layout};
use bod_report::{
    build_assets, is_done_updating, plan_digest, sheet_level_ops, Freshness, RenderAsset, RenderContext,
};
use bod_sheets::{SheetOp, Spreadsheet, Worksheet};
use serde::Serialize;
use tracing::{debug, info};

use crate::diagnostics::{log_min_revenue_info, log_missing_movies, MinRevenueReport};
use crate::load::{data_through, load_tables};
use crate::PipelineError;

pub const DASHBOARD: &str = "Dashboard";

/// Worksheets the league maintains by hand, created empty when absent: `(name, rows, cols)`.
pub const SIBLINGS: [(&str, u32, u32); 2] = [("Manual Adds", 100, 5), ("Multipliers and Exclusions", 100, 3)];

pub const WORKSHEET_ORDER: [&str; 4] = [DASHBOARD, "Draft", "Manual Adds", "Multipliers and Exclusions"];

/// What one cycle did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderSummary {
    pub layout: Layout,
    /// SHA-256 of the rendered plan; equal across runs over the same data.
    pub digest: String,
    pub assets: usize,
    pub done_updating: bool,
    pub missing_movies: Vec<String>,
    pub min_revenue: MinRevenueReport,
}

/// Siblings if missing, a fresh `Dashboard` of `height` rows, canonical tab order.
pub fn provision(sheets: &mut dyn Spreadsheet, height: u32) -> Result<(), PipelineError> {
    let existing = sheets.worksheet_names()?;
    for (name, rows, cols) in SIBLINGS {
        if !existing.iter().any(|n| n == name) {
            info!(worksheet = name, "creating worksheet");
            sheets.create_worksheet(name, rows, cols)?;
        }
    }
    if existing.iter().any(|n| n == DASHBOARD) {
        sheets.delete_worksheet(DASHBOARD)?;
    }
    sheets.create_worksheet(DASHBOARD, height, SHEET_COLUMNS)?;
    sheets.reorder_worksheets(&WORKSHEET_ORDER)?;
    Ok(())
}

/// Rows the Dashboard needs: `sheet_height`, or the lowest row any asset or op
/// reaches when that is further down. Early in a season the scoreboard can be
/// taller than the released-movies table.
pub fn grid_rows<'a>(
    sheet_height: u32,
    assets: &[RenderAsset],
    ops: impl IntoIterator<Item = &'a SheetOp>,
) -> u32 {
    assets
        .iter()
        .map(|a| a.range().end.row)
        .chain(ops.into_iter().filter_map(SheetOp::range).map(|r| r.end.row))
        .fold(sheet_height, u32::max)
}

pub fn render_cycle<S, C>(
    cfg: &DraftConfig,
    source: &S,
    sheets: &mut dyn Spreadsheet,
    clock: &C,
) -> Result<RenderSummary, PipelineError>
where
    S: TableSource + ?Sized,
    C: Clock + ?Sized,
{
    let tables = load_tables(source, &cfg.draft_id)?;
    let layout = compute_layout(tables.layout_inputs());
    let assets = build_assets(&tables, &layout, &cfg.name)?;
    let digest = plan_digest(&layout, &assets)?;
    debug!(?layout, "layout computed");

    let done_updating = is_done_updating(&tables.released, cfg.year, clock.current_year());
    let freshness = Freshness::new(clock.now(), data_through(source)?, done_updating);
    let ctx = RenderContext { name: cfg.name.clone(), year: cfg.year, layout, freshness };

    let hook_ops: Vec<SheetOp> = assets.iter().flat_map(|a| &a.hooks).flat_map(|h| h.ops(&ctx)).collect();
    let sheet_ops = sheet_level_ops(&ctx)?;
    let height = grid_rows(ctx.sheet_height(), &assets, hook_ops.iter().chain(&sheet_ops));

    provision(sheets, height)?;
    {
        let mut ws = sheets.worksheet(DASHBOARD)?;
        for asset in &assets {
            ws.write_values(asset.anchor, asset.grid())?;
            debug!(table = asset.kind.source(), range = %asset.range(), "asset written");
        }
        for op in hook_ops.into_iter().chain(sheet_ops) {
            ws.apply(op)?;
        }
        ws.resize(height, SHEET_COLUMNS)?;
        ws.flush()?;
    }
    info!(digest = %digest, assets = assets.len(), rows = height, "Dashboard updated and formatted");

    let missing_movies = log_missing_movies(source)?;
    let min_revenue = log_min_revenue_info(source, cfg.year)?;

    Ok(RenderSummary { layout, digest, assets: assets.len(), done_updating, missing_movies, min_revenue })
}
