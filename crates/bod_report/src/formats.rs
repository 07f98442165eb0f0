//! crates/bod_report/src/formats.rs
//! Fixed presentation of the Dashboard worksheet.

use bod_sheets::format::{CellFormat, Color, ConditionalRule, NumberFormat};

/// Dashboard and Released Movies titles.
pub fn title() -> CellFormat {
    CellFormat::center().font_size(20).bold()
}

/// Worst/Best Picks titles.
pub fn picks_title() -> CellFormat {
    CellFormat::center().bold()
}

pub fn header() -> CellFormat {
    CellFormat::center().font_size(10).bold()
}

fn left() -> CellFormat {
    CellFormat::left()
}

fn right() -> CellFormat {
    CellFormat::right()
}

fn currency(f: CellFormat) -> CellFormat {
    f.number(NumberFormat::currency())
}

fn percent(f: CellFormat) -> CellFormat {
    f.number(NumberFormat::percent())
}

/// `(first column, last column, format)` over the scoreboard data rows.
pub fn scoreboard_columns() -> Vec<(&'static str, &'static str, CellFormat)> {
    vec![
        ("B", "B", left()),
        ("C", "C", currency(right())),
        ("F", "F", percent(right())),
        ("G", "G", currency(right())),
    ]
}

/// Released movies, applied from the first data row to the sheet height.
pub fn released_columns() -> Vec<(&'static str, &'static str, CellFormat)> {
    vec![
        ("I", "K", left()),
        ("L", "M", currency(left())),
        ("N", "P", right()),
        ("Q", "Q", currency(right())),
        ("R", "R", percent(right())),
        ("S", "S", currency(right())),
        ("T", "T", percent(right())),
        ("V", "V", currency(right())),
        ("W", "W", right()),
        ("X", "X", CellFormat::center()),
    ]
}

/// Same for both picks tables.
pub fn picks_columns() -> Vec<(&'static str, &'static str, CellFormat)> {
    vec![
        ("B", "D", left()),
        ("E", "F", right()),
        ("G", "G", currency(right())),
    ]
}

/// Green fill for movies still in theaters.
pub fn still_in_theaters_rule() -> ConditionalRule {
    ConditionalRule::text_eq("Yes", CellFormat::new().background(Color::rgb(0.0, 0.9, 0.0)))
}

pub const NOTES: [(&str, &str); 3] = [
    (
        "U4",
        "A movie is considered a better pick if it was drafted after by a different drafter and made more revenue (adjusted for multiplier).",
    ),
    ("W4", "The first date a movie was seen in the database."),
    (
        "X4",
        "A movie is considered still in theaters if the first record is within the last week or the revenue has changed in the last week.",
    ),
];

/// Pixel widths, A..Y. A, H and Y are spacers.
pub const COLUMN_WIDTHS: [(&str, u32); 25] = [
    ("A", 25),
    ("B", 80),
    ("C", 284),
    ("D", 84),
    ("E", 116),
    ("F", 168),
    ("G", 164),
    ("H", 25),
    ("I", 42),
    ("J", 284),
    ("K", 80),
    ("L", 120),
    ("M", 120),
    ("N", 106),
    ("O", 88),
    ("P", 72),
    ("Q", 135),
    ("R", 142),
    ("S", 120),
    ("T", 136),
    ("U", 284),
    ("V", 200),
    ("W", 104),
    ("X", 106),
    ("Y", 25),
];

/// Column holding the freshness message.
pub const STATUS_COLUMN: &str = "G";
/// `STATUS_COLUMN` width once the message says the dashboard is done updating.
pub const DONE_STATUS_WIDTH: u32 = 200;
