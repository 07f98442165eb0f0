//! crates/bod_report/src/context.rs
//! Typed context for post-write hooks, and hook → `SheetOp` translation.

use bod_core::{column_index, CellLocation, CellValue, ReportTable};
use bod_layout::Layout;
use bod_sheets::api::SheetOp;
use bod_sheets::format::CellFormat;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::assets::PostWriteHook;
use crate::formats;
use crate::ReportError;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STILL_IN_THEATERS: &str = "Still In Theaters";

/// The end-of-season heuristic: every released movie has left theaters, there
/// is at least one, and the draft year is over.
pub fn is_done_updating(released: &ReportTable, year: i32, current_year: i32) -> bool {
    let Some(mut flags) = released.column(STILL_IN_THEATERS) else {
        return false;
    };
    !released.is_empty() && flags.all(|v| v.as_str() == Some("No")) && year < current_year
}

/// Status text written at G2.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Freshness {
    pub message: String,
    pub done_updating: bool,
}

impl Freshness {
    pub fn new(now: DateTime<Utc>, data_through: Option<NaiveDateTime>, done_updating: bool) -> Self {
        let mut message = format!("Dashboard Last Updated\n{} UTC", now.format(DATETIME_FORMAT));
        if done_updating {
            message.push_str("\nDashboard is done updating\nand can be removed from the etl");
        }
        match data_through {
            Some(ts) => message.push_str(&format!("\nData Updated Through\n{} UTC", ts.format(DATETIME_FORMAT))),
            None => message.push_str("\nData Updated Through\nunknown"),
        }
        Self { message, done_updating }
    }
}

/// Everything hooks need besides the asset itself.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    pub name: String,
    pub year: i32,
    pub layout: Layout,
    pub freshness: Freshness,
}

impl RenderContext {
    pub fn sheet_height(&self) -> u32 {
        self.layout.sheet_height() as u32
    }
}

impl PostWriteHook {
    /// Worksheet operations for this hook, in the order they must run.
    pub fn ops(&self, ctx: &RenderContext) -> Vec<SheetOp> {
        match self {
            PostWriteHook::SectionTitle { cell, text, merge, format } => vec![
                SheetOp::WriteValues { anchor: *cell, values: vec![vec![CellValue::text(text.as_str())]] },
                SheetOp::Merge { range: *merge },
                SheetOp::Format { range: (*cell).into(), format: format.clone() },
            ],
            PostWriteHook::HeaderFormat { range } => {
                vec![SheetOp::Format { range: *range, format: formats::header() }]
            }
            PostWriteHook::DataFormats { ranges } => ranges
                .iter()
                .map(|(range, format)| SheetOp::Format { range: *range, format: format.clone() })
                .collect(),
            PostWriteHook::HighlightStillInTheaters { range } => {
                vec![SheetOp::Conditional { range: *range, rule: formats::still_in_theaters_rule() }]
            }
            PostWriteHook::BlankZeroBetterPicks { cells } => cells
                .iter()
                .map(|c| SheetOp::WriteValues { anchor: *c, values: vec![vec![CellValue::text("")]] })
                .collect(),
            PostWriteHook::FreshnessMessage { cell } => vec![
                SheetOp::WriteValues {
                    anchor: *cell,
                    values: vec![vec![CellValue::text(ctx.freshness.message.as_str())]],
                },
                SheetOp::Format { range: (*cell).into(), format: CellFormat::center() },
            ],
        }
    }
}

/// Notes and column widths applied once all assets are rendered.
pub fn sheet_level_ops(ctx: &RenderContext) -> Result<Vec<SheetOp>, ReportError> {
    let mut ops = Vec::with_capacity(formats::NOTES.len() + formats::COLUMN_WIDTHS.len());
    for (cell, text) in formats::NOTES {
        ops.push(SheetOp::Note { cell: cell.parse::<CellLocation>()?, text: text.to_string() });
    }
    for (col, px) in formats::COLUMN_WIDTHS {
        let pixels = if ctx.freshness.done_updating && col == formats::STATUS_COLUMN {
            formats::DONE_STATUS_WIDTH
        } else {
            px
        };
        ops.push(SheetOp::ColumnWidth { column: column_index(col)?, pixels });
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bod_core::ReportKind;
    use bod_layout::compute_layout_from;
    use chrono::TimeZone;

    fn released(flags: &[&str]) -> ReportTable {
        let cols = ReportKind::ReleasedMovies.columns();
        let rows = flags
            .iter()
            .map(|f| {
                let mut row = vec![CellValue::Missing; cols.len()];
                row[15] = CellValue::text(*f);
                row
            })
            .collect();
        ReportTable::from_strs(cols, rows).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 3, 9, 30, 0).unwrap()
    }

    #[test]
    fn done_updating_needs_rows_all_no_and_a_past_year() {
        assert!(is_done_updating(&released(&["No", "No"]), 2025, 2026));
        assert!(!is_done_updating(&released(&["No", "Yes"]), 2025, 2026));
        assert!(!is_done_updating(&released(&[]), 2025, 2026));
        assert!(!is_done_updating(&released(&["No"]), 2026, 2026));
        assert!(!is_done_updating(&ReportTable::empty(&["Title"]), 2025, 2026));
    }

    #[test]
    fn freshness_message_lines() {
        let through = NaiveDateTime::parse_from_str("2025-12-31 23:00:00", DATETIME_FORMAT).unwrap();
        let f = Freshness::new(now(), Some(through), false);
        assert_eq!(
            f.message,
            "Dashboard Last Updated\n2026-01-03 09:30:00 UTC\nData Updated Through\n2025-12-31 23:00:00 UTC"
        );

        let done = Freshness::new(now(), None, true);
        assert_eq!(
            done.message,
            "Dashboard Last Updated\n2026-01-03 09:30:00 UTC\nDashboard is done updating\nand can be removed from the etl\nData Updated Through\nunknown"
        );
    }

    fn ctx(done: bool) -> RenderContext {
        RenderContext {
            name: "Friends 2025".into(),
            year: 2025,
            layout: compute_layout_from(3, 10, 0, 0),
            freshness: Freshness::new(now(), None, done),
        }
    }

    #[test]
    fn title_hook_writes_merges_then_formats_the_cell() {
        let hook = PostWriteHook::SectionTitle {
            cell: "B2".parse().unwrap(),
            text: "Friends 2025".into(),
            merge: "B2:F2".parse().unwrap(),
            format: formats::title(),
        };
        let kinds: Vec<&str> = hook.ops(&ctx(false)).iter().map(SheetOp::kind).collect();
        assert_eq!(kinds, ["write_values", "merge", "format"]);
        assert!(matches!(&hook.ops(&ctx(false))[2], SheetOp::Format { range, .. } if range.to_string() == "B2"));
    }

    #[test]
    fn freshness_hook_writes_message_centered() {
        let ops = PostWriteHook::FreshnessMessage { cell: "G2".parse().unwrap() }.ops(&ctx(false));
        match &ops[0] {
            SheetOp::WriteValues { anchor, values } => {
                assert_eq!(anchor.to_string(), "G2");
                assert!(values[0][0].as_str().unwrap().starts_with("Dashboard Last Updated\n"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ops[1], SheetOp::Format { range: "G2".parse().unwrap(), format: CellFormat::center() });
    }

    #[test]
    fn sheet_level_ops_widen_status_column_only_when_done() {
        let width_of = |ops: &[SheetOp], col: u32| {
            ops.iter().find_map(|op| match op {
                SheetOp::ColumnWidth { column, pixels } if *column == col => Some(*pixels),
                _ => None,
            })
        };
        let ops = sheet_level_ops(&ctx(false)).unwrap();
        assert_eq!(ops.len(), 28);
        assert_eq!(width_of(&ops, 7), Some(164));
        assert_eq!(width_of(&ops, 1), Some(25));
        assert!(matches!(&ops[0], SheetOp::Note { cell, .. } if cell.to_string() == "U4"));

        let ops = sheet_level_ops(&ctx(true)).unwrap();
        assert_eq!(width_of(&ops, 7), Some(200));
    }
}
