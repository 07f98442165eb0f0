//! crates/bod_report/src/assets.rs
//! Table asset model: one `RenderAsset` per table that goes on the sheet.
//!
//! An asset is the table, the cell its header row starts at, and the hooks
//! run after every asset has been written. Hooks are plain data; turning them
//! into worksheet operations needs the `RenderContext` (see `context`).
//!
//! Assets never overlap. The scoreboard and released movies sit side by side
//! under row 4; the picks tables stack under the scoreboard at the rows the
//! layout computed.

use bod_core::{CellLocation, CellRange, CellValue, ReportKind, ReportTable};
use bod_layout::consts::{FIRST_DATA_ROW, HEADER_ROW, TITLE_ROW};
use bod_layout::{Layout, LayoutInputs};
use bod_sheets::format::CellFormat;
use serde::Serialize;
use tracing::info;

use crate::formats;
use crate::ReportError;

/// Picks titles are merged across this many columns (B..G).
const PICKS_TITLE_SPAN: u32 = 6;

const BETTER_PICK_REVENUE: &str = "Better Pick Scored Revenue";

/// The four tables read for one cycle, columns already renamed for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReportTables {
    pub scoreboard: ReportTable,
    pub released: ReportTable,
    pub worst_picks: ReportTable,
    pub best_picks: ReportTable,
}

impl ReportTables {
    pub fn get(&self, kind: ReportKind) -> &ReportTable {
        match kind {
            ReportKind::Scoreboard => &self.scoreboard,
            ReportKind::ReleasedMovies => &self.released,
            ReportKind::WorstPicks => &self.worst_picks,
            ReportKind::BestPicks => &self.best_picks,
        }
    }

    pub fn layout_inputs(&self) -> LayoutInputs {
        LayoutInputs {
            scoreboard_len: self.scoreboard.len(),
            released_len: self.released.len(),
            worst_picks_len: self.worst_picks.len(),
            best_picks_len: self.best_picks.len(),
        }
    }

    fn check_shapes(&self) -> Result<(), ReportError> {
        for kind in ReportKind::ALL {
            let expected = kind.columns().len();
            let got = self.get(kind).width();
            if got != expected {
                return Err(ReportError::Shape { table: kind.source(), expected, got });
            }
        }
        Ok(())
    }
}

/// Behaviour run against the worksheet once all data is written.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "hook", rename_all = "snake_case")]
pub enum PostWriteHook {
    /// Write `text` at `cell`, merge `merge`, format `cell`.
    SectionTitle { cell: CellLocation, text: String, merge: CellRange, format: CellFormat },
    HeaderFormat { range: CellRange },
    DataFormats { ranges: Vec<(CellRange, CellFormat)> },
    HighlightStillInTheaters { range: CellRange },
    /// Cells whose better-pick revenue is zero; written back as empty strings.
    BlankZeroBetterPicks { cells: Vec<CellLocation> },
    FreshnessMessage { cell: CellLocation },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderAsset {
    pub kind: ReportKind,
    pub table: ReportTable,
    /// Top-left of the header row.
    pub anchor: CellLocation,
    pub hooks: Vec<PostWriteHook>,
}

impl RenderAsset {
    /// Header plus data rows, as written at `anchor`.
    pub fn grid(&self) -> Vec<Vec<CellValue>> {
        self.table.to_grid()
    }

    /// Cells covered by the header and data rows.
    pub fn range(&self) -> CellRange {
        let rows = self.table.len() as u32;
        let cols = (self.table.width() as u32).max(1);
        CellRange::new(
            self.anchor,
            CellLocation { row: self.anchor.row + rows, col: self.anchor.col + cols - 1 },
        )
    }
}

fn column_ranges(
    spec: Vec<(&'static str, &'static str, CellFormat)>,
    first_row: u32,
    last_row: u32,
) -> Result<Vec<(CellRange, CellFormat)>, ReportError> {
    spec.into_iter()
        .map(|(a, b, f)| Ok((CellRange::columns(a, b, first_row, last_row)?, f)))
        .collect()
}

/// Header range spanning the table's width at the anchor row.
fn header_range(anchor: CellLocation, width: usize) -> Result<CellRange, ReportError> {
    let end = anchor.offset(0, width.saturating_sub(1) as i64)?;
    Ok(CellRange::new(anchor, end))
}

fn scoreboard_asset(table: &ReportTable, name: &str) -> Result<RenderAsset, ReportError> {
    let anchor = CellLocation::at_row("B", HEADER_ROW)?;
    let title = CellLocation::at_row("B", TITLE_ROW)?;
    let mut hooks = vec![
        PostWriteHook::SectionTitle {
            cell: title,
            text: name.to_string(),
            merge: CellRange::columns("B", "F", TITLE_ROW, TITLE_ROW)?,
            format: formats::title(),
        },
        PostWriteHook::HeaderFormat { range: CellRange::columns("B", "G", HEADER_ROW, HEADER_ROW)? },
    ];
    if !table.is_empty() {
        let end = HEADER_ROW + table.len() as u32;
        hooks.push(PostWriteHook::DataFormats {
            ranges: column_ranges(formats::scoreboard_columns(), FIRST_DATA_ROW, end)?,
        });
    }
    Ok(RenderAsset { kind: ReportKind::Scoreboard, table: table.clone(), anchor, hooks })
}

fn released_asset(table: &ReportTable, sheet_height: u32) -> Result<RenderAsset, ReportError> {
    let anchor = CellLocation::at_row("I", HEADER_ROW)?;
    let zero_cells = match table.column(BETTER_PICK_REVENUE) {
        Some(values) => values
            .enumerate()
            .filter(|(_, v)| v.is_zero())
            .map(|(i, _)| CellLocation::at_row("V", FIRST_DATA_ROW + i as u32))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let hooks = vec![
        PostWriteHook::SectionTitle {
            cell: CellLocation::at_row("I", TITLE_ROW)?,
            text: ReportKind::ReleasedMovies.title().to_string(),
            merge: CellRange::columns("I", "X", TITLE_ROW, TITLE_ROW)?,
            format: formats::title(),
        },
        PostWriteHook::HeaderFormat { range: CellRange::columns("I", "X", HEADER_ROW, HEADER_ROW)? },
        PostWriteHook::DataFormats {
            ranges: column_ranges(formats::released_columns(), FIRST_DATA_ROW, sheet_height)?,
        },
        PostWriteHook::HighlightStillInTheaters {
            range: CellRange::columns("X", "X", FIRST_DATA_ROW, sheet_height)?,
        },
        PostWriteHook::BlankZeroBetterPicks { cells: zero_cells },
        PostWriteHook::FreshnessMessage { cell: CellLocation::at_row("G", TITLE_ROW)? },
    ];
    Ok(RenderAsset { kind: ReportKind::ReleasedMovies, table: table.clone(), anchor, hooks })
}

/// Worst/Best picks at `B{row}`, truncated to `height` rows.
fn picks_asset(kind: ReportKind, table: &ReportTable, row: u32, height: usize) -> Result<RenderAsset, ReportError> {
    let table = table.head(height);
    let anchor = CellLocation::at_row("B", row)?;
    let title = anchor.offset(-1, 0)?;
    let merge_end = title.offset(0, i64::from(PICKS_TITLE_SPAN) - 1)?;
    let data_end = row + table.len() as u32;
    let hooks = vec![
        PostWriteHook::SectionTitle {
            cell: title,
            text: kind.title().to_string(),
            merge: CellRange::new(title, merge_end),
            format: formats::picks_title(),
        },
        PostWriteHook::HeaderFormat { range: header_range(anchor, table.width())? },
        PostWriteHook::DataFormats { ranges: column_ranges(formats::picks_columns(), row + 1, data_end)? },
    ];
    Ok(RenderAsset { kind, table, anchor, hooks })
}

/// Ordered assets for one cycle: scoreboard, released movies, then the picks
/// tables the layout has room for.
pub fn build_assets(tables: &ReportTables, layout: &Layout, name: &str) -> Result<Vec<RenderAsset>, ReportError> {
    tables.check_shapes()?;
    let sheet_height = layout.sheet_height() as u32;

    let mut assets = vec![
        scoreboard_asset(&tables.scoreboard, name)?,
        released_asset(&tables.released, sheet_height)?,
    ];

    if layout.shows_worst_picks() {
        assets.push(picks_asset(
            ReportKind::WorstPicks,
            &tables.worst_picks,
            layout.worst_picks_row_num,
            layout.worst_picks_height,
        )?);

        if let (true, Some(row)) = (layout.shows_best_picks(), layout.best_picks_row_num) {
            assets.push(picks_asset(ReportKind::BestPicks, &tables.best_picks, row, layout.best_picks_height)?);
            info!(
                "Showing both picks tables: worst_picks ({} rows) and best_picks ({} rows)",
                layout.worst_picks_height, layout.best_picks_height
            );
        }
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bod_layout::compute_layout;

    fn table(kind: ReportKind, rows: usize, fill: impl Fn(usize, usize) -> CellValue) -> ReportTable {
        let cols = kind.columns();
        let data = (0..rows).map(|r| (0..cols.len()).map(|c| fill(r, c)).collect()).collect();
        ReportTable::from_strs(cols, data).unwrap()
    }

    fn tables(s: usize, r: usize, w: usize, b: usize) -> ReportTables {
        ReportTables {
            scoreboard: table(ReportKind::Scoreboard, s, |r, _| CellValue::Int(r as i64)),
            released: table(ReportKind::ReleasedMovies, r, |r, c| {
                // every third movie has no better pick
                if c == 13 { CellValue::Int(if r % 3 == 0 { 0 } else { 100 }) } else { CellValue::text("x") }
            }),
            worst_picks: table(ReportKind::WorstPicks, w, |r, _| CellValue::Int(r as i64)),
            best_picks: table(ReportKind::BestPicks, b, |r, _| CellValue::Int(r as i64)),
        }
    }

    fn build(t: &ReportTables) -> Vec<RenderAsset> {
        let layout = compute_layout(t.layout_inputs());
        build_assets(t, &layout, "Friends 2025").unwrap()
    }

    #[test]
    fn both_picks_tables_are_truncated_and_anchored() {
        let assets = build(&tables(5, 100, 50, 50));
        let kinds: Vec<ReportKind> = assets.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ReportKind::ALL);

        let worst = &assets[2];
        assert_eq!(worst.anchor.to_string(), "B12");
        assert_eq!(worst.table.len(), 44);
        let best = &assets[3];
        assert_eq!(best.anchor.to_string(), "B59");
        assert_eq!(best.table.len(), 44);

        match &best.hooks[0] {
            PostWriteHook::SectionTitle { cell, text, merge, .. } => {
                assert_eq!(cell.to_string(), "B58");
                assert_eq!(text, "Best Picks");
                assert_eq!(merge.to_string(), "B58:G58");
            }
            other => panic!("unexpected first hook {other:?}"),
        }
        match &best.hooks[2] {
            PostWriteHook::DataFormats { ranges } => {
                assert_eq!(ranges[0].0.to_string(), "B60:D103");
                assert_eq!(ranges[2].0.to_string(), "G60:G103");
            }
            other => panic!("unexpected third hook {other:?}"),
        }
        // best picks end before the sheet does
        assert!(best.range().end.row <= 105);
    }

    #[test]
    fn single_table_fallback_drops_best_picks() {
        let assets = build(&tables(2, 8, 10, 10));
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[2].kind, ReportKind::WorstPicks);
        assert_eq!(assets[2].table.len(), 3);
        assert_eq!(assets[2].anchor.to_string(), "B9");
    }

    #[test]
    fn one_row_picks_tables_are_never_shown() {
        let assets = build(&tables(2, 40, 1, 30));
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn released_hooks_follow_the_sheet_height() {
        let assets = build(&tables(3, 10, 0, 0));
        let released = &assets[1];
        assert_eq!(released.anchor.to_string(), "I4");
        let hooks = &released.hooks;
        assert!(matches!(&hooks[0], PostWriteHook::SectionTitle { text, .. } if text == "Released Movies"));
        assert!(matches!(&hooks[1], PostWriteHook::HeaderFormat { range } if range.to_string() == "I4:X4"));
        match &hooks[2] {
            PostWriteHook::DataFormats { ranges } => {
                assert_eq!(ranges.len(), 10);
                assert_eq!(ranges[0].0.to_string(), "I5:K15");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&hooks[3], PostWriteHook::HighlightStillInTheaters { range } if range.to_string() == "X5:X15"));
        match &hooks[4] {
            PostWriteHook::BlankZeroBetterPicks { cells } => {
                let names: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
                assert_eq!(names, ["V5", "V8", "V11", "V14"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&hooks[5], PostWriteHook::FreshnessMessage { cell } if cell.to_string() == "G2"));
    }

    #[test]
    fn scoreboard_title_uses_the_dashboard_name() {
        let assets = build(&tables(4, 10, 0, 0));
        let sb = &assets[0];
        assert_eq!(sb.anchor.to_string(), "B4");
        assert!(matches!(
            &sb.hooks[0],
            PostWriteHook::SectionTitle { text, merge, .. } if text == "Friends 2025" && merge.to_string() == "B2:F2"
        ));
        match &sb.hooks[2] {
            PostWriteHook::DataFormats { ranges } => assert_eq!(ranges[1].0.to_string(), "C5:C8"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_scoreboard_has_no_data_formats() {
        let assets = build(&tables(0, 10, 0, 0));
        assert_eq!(assets[0].hooks.len(), 2);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let mut t = tables(1, 1, 0, 0);
        t.best_picks = ReportTable::empty(&["Rank"]);
        let layout = compute_layout(t.layout_inputs());
        let err = build_assets(&t, &layout, "x").unwrap_err();
        assert!(matches!(err, ReportError::Shape { table: "dashboards.best_picks", expected: 6, got: 1 }));
    }
}
