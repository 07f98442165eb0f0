//! bod_layout: vertical layout of the dashboard's stacked tables.
//!
//! The dashboard sheet has two columns of content:
//!
//! ```text
//!   row 2      dashboard title (B)           Released Movies title (I)
//!   row 4      scoreboard header             released movies header
//!   row 5..    scoreboard rows               released movies rows ...
//!   ...        blank + "Worst Picks" title
//!   ...        worst picks header + rows
//!   ...        separator + "Best Picks" title
//!   ...        best picks header + rows
//! ```
//!
//! The picks tables live under the scoreboard and must end before the released
//! movies table does, so the sheet never grows past `released + 5` rows.
//! `compute_layout` decides how many of those rows each picks table gets.
//! It is a pure function of four lengths; no I/O, no clock, no hidden state.

#![forbid(unsafe_code)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Every row offset used by the layout and by the asset builder.
/// Nothing else in the workspace hard-codes these numbers.
pub mod consts {
    /// Row of the dashboard title and the released-movies title.
    pub const TITLE_ROW: u32 = 2;
    /// Header row of the scoreboard and the released-movies table.
    pub const HEADER_ROW: u32 = 4;
    /// First data row of the scoreboard and the released-movies table.
    pub const FIRST_DATA_ROW: u32 = HEADER_ROW + 1;

    /// Rows above the scoreboard data plus one (title, blank, header, ...).
    pub const TITLE_ROWS: i64 = 5;
    /// Blank row + picks section title between the scoreboard and the worst-picks header.
    pub const TITLE_GAP: i64 = 2;
    /// Rows between the scoreboard block and the picks block that are not
    /// available to picks data. The historical `-2` variant is not supported.
    pub const SPACING: i64 = 3;

    /// Title row + header row: the least a picks table needs to be worth showing.
    pub const MIN_ROWS_PER_TABLE: i64 = 2;
    /// Blank rows between the worst-picks and best-picks blocks.
    pub const SEPARATOR_ROWS: i64 = 2;
    /// The two picks section title rows.
    pub const SECTION_TITLE_ROWS: i64 = 2;
    /// Space required before both picks tables are shown.
    pub const TOTAL_REQUIRED: i64 = MIN_ROWS_PER_TABLE * 2 + SEPARATOR_ROWS;

    /// A picks table with this many rows or fewer carries no usable data.
    pub const MIN_USEFUL_LEN: usize = 1;

    /// Sheet height is the released-movies length plus this padding.
    pub const SHEET_PADDING_ROWS: usize = 5;
    /// Dashboard width (A..Y).
    pub const SHEET_COLUMNS: u32 = 25;
}

use consts::*;

/// The four lengths the layout depends on (data rows, header excluded).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayoutInputs {
    pub scoreboard_len: usize,
    pub released_len: usize,
    pub worst_picks_len: usize,
    pub best_picks_len: usize,
}

/// Computed row positions and heights for one render cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    pub inputs: LayoutInputs,
    /// May be negative: the scoreboard is taller than the released table allows.
    pub available_height: i64,
    pub add_both_picks_tables: bool,
    /// 1-indexed header row of the worst-picks table; computed even when hidden.
    pub worst_picks_row_num: u32,
    pub worst_picks_height: usize,
    /// Present only when both picks tables are shown.
    pub best_picks_row_num: Option<u32>,
    pub best_picks_height: usize,
}

impl Layout {
    /// Worst picks are rendered when they got rows and carry usable data.
    pub fn shows_worst_picks(&self) -> bool {
        self.worst_picks_height > 0 && self.inputs.worst_picks_len > MIN_USEFUL_LEN
    }

    pub fn shows_best_picks(&self) -> bool {
        self.add_both_picks_tables
    }

    /// Rows the Dashboard worksheet is created with.
    pub fn sheet_height(&self) -> usize {
        self.inputs.released_len + SHEET_PADDING_ROWS
    }
}

#[inline]
fn cap(space: i64, len: usize) -> usize {
    if space <= 0 { 0 } else { (space as usize).min(len) }
}

#[inline]
fn to_row(n: i64) -> u32 {
    u32::try_from(n.max(1)).unwrap_or(u32::MAX)
}

/// Compute the layout from the four table lengths.
///
/// Both picks tables are shown iff `available_height >= 6` and both tables
/// have more than one row. Capping by the table length always wins over the
/// space split, and the odd leftover row of the split goes to best picks.
/// Negative space degrades to zero heights.
pub fn compute_layout(inputs: LayoutInputs) -> Layout {
    let LayoutInputs { scoreboard_len, released_len, worst_picks_len, best_picks_len } = inputs;
    let scoreboard = scoreboard_len as i64;

    let available_height = released_len as i64 - scoreboard - SPACING;
    let worst_picks_row = TITLE_ROWS + scoreboard + TITLE_GAP;

    let both = available_height >= TOTAL_REQUIRED
        && worst_picks_len > MIN_USEFUL_LEN
        && best_picks_len > MIN_USEFUL_LEN;

    if both {
        let usable_height = available_height - SECTION_TITLE_ROWS - SEPARATOR_ROWS;
        let height_per_table = usable_height.div_euclid(2);
        let worst_picks_height = cap(height_per_table, worst_picks_len);
        // +1 for the worst-picks title row
        let best_picks_row = worst_picks_row + 1 + worst_picks_height as i64 + SEPARATOR_ROWS;
        let best_picks_height = cap(usable_height - worst_picks_height as i64, best_picks_len);

        return Layout {
            inputs,
            available_height,
            add_both_picks_tables: true,
            worst_picks_row_num: to_row(worst_picks_row),
            worst_picks_height,
            best_picks_row_num: Some(to_row(best_picks_row)),
            best_picks_height,
        };
    }

    let worst_picks_height = if available_height > 0 && worst_picks_len > MIN_USEFUL_LEN {
        cap(available_height, worst_picks_len)
    } else {
        0
    };

    Layout {
        inputs,
        available_height,
        add_both_picks_tables: false,
        worst_picks_row_num: to_row(worst_picks_row),
        worst_picks_height,
        best_picks_row_num: None,
        best_picks_height: 0,
    }
}

/// Positional convenience wrapper.
pub fn compute_layout_from(
    scoreboard_len: usize,
    released_len: usize,
    worst_picks_len: usize,
    best_picks_len: usize,
) -> Layout {
    compute_layout(LayoutInputs { scoreboard_len, released_len, worst_picks_len, best_picks_len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lay(s: usize, r: usize, w: usize, b: usize) -> Layout {
        compute_layout_from(s, r, w, b)
    }

    #[test]
    fn plenty_of_space_splits_evenly() {
        let l = lay(5, 100, 50, 50);
        assert_eq!(l.available_height, 92);
        assert!(l.add_both_picks_tables);
        assert_eq!(l.worst_picks_height, 44);
        assert_eq!(l.best_picks_height, 44);
        assert_eq!(l.worst_picks_row_num, 12);
        assert_eq!(l.best_picks_row_num, Some(59));
    }

    #[test]
    fn short_tables_are_capped_by_their_length() {
        let l = lay(5, 50, 10, 10);
        assert_eq!(l.available_height, 42);
        assert_eq!((l.worst_picks_height, l.best_picks_height), (10, 10));
        assert_eq!(l.best_picks_row_num, Some(25));
    }

    #[test]
    fn too_little_space_falls_back_to_one_table() {
        let l = lay(2, 8, 10, 10);
        assert_eq!(l.available_height, 3);
        assert!(!l.add_both_picks_tables);
        assert_eq!(l.worst_picks_height, 3);
        assert_eq!(l.best_picks_height, 0);
        assert_eq!(l.best_picks_row_num, None);
        assert!(l.shows_worst_picks());
        assert!(!l.shows_best_picks());
    }

    #[test]
    fn odd_usable_height_gives_remainder_to_best_picks() {
        let l = lay(2, 16, 10, 10);
        assert_eq!(l.available_height, 11);
        assert_eq!(l.worst_picks_height, 3);
        assert_eq!(l.best_picks_height, 4);
    }

    #[test]
    fn exact_minimum_space_shows_both() {
        let l = lay(5, 14, 2, 2);
        assert_eq!(l.available_height, 6);
        assert!(l.add_both_picks_tables);
        assert_eq!(l.worst_picks_height, 1);
        assert_eq!(l.best_picks_row_num, Some(16));
        assert_eq!(l.best_picks_height, 1);
    }

    #[test]
    fn minimal_space_with_tall_tables() {
        let l = lay(5, 15, 10, 10);
        assert_eq!(l.available_height, 7);
        assert_eq!(l.worst_picks_height, 1);
        assert_eq!(l.best_picks_row_num, Some(16));
        assert_eq!(l.best_picks_height, 2);
    }

    #[test]
    fn no_or_negative_space_shows_nothing() {
        let zero = lay(5, 8, 10, 10);
        assert_eq!(zero.available_height, 0);
        assert_eq!(zero.worst_picks_height, 0);
        assert!(!zero.shows_worst_picks());

        let neg = lay(20, 15, 10, 10);
        assert_eq!(neg.available_height, -8);
        assert_eq!(neg.worst_picks_row_num, 27);
        assert_eq!((neg.worst_picks_height, neg.best_picks_height), (0, 0));
    }

    #[test]
    fn single_row_tables_count_as_no_data() {
        let no_worst = lay(5, 50, 1, 10);
        assert!(!no_worst.add_both_picks_tables);
        assert_eq!(no_worst.worst_picks_height, 0);

        let no_best = lay(5, 50, 10, 1);
        assert!(!no_best.add_both_picks_tables);
        assert_eq!(no_best.worst_picks_height, 10);
        assert_eq!(no_best.best_picks_row_num, None);

        let empty = lay(5, 50, 0, 0);
        assert_eq!(empty.worst_picks_height, 0);
    }

    #[test]
    fn sheet_height_pads_released_length() {
        assert_eq!(lay(5, 100, 0, 0).sheet_height(), 105);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn heights_never_exceed_lengths(s in 0usize..200, r in 0usize..400, w in 0usize..200, b in 0usize..200) {
            let l = lay(s, r, w, b);
            prop_assert!(l.worst_picks_height <= w);
            prop_assert!(l.best_picks_height <= b);
        }

        #[test]
        fn both_tables_iff_space_and_data(s in 0usize..200, r in 0usize..400, w in 0usize..200, b in 0usize..200) {
            let l = lay(s, r, w, b);
            let expected = l.available_height >= 6 && w > 1 && b > 1;
            prop_assert_eq!(l.add_both_picks_tables, expected);
            prop_assert_eq!(l.best_picks_row_num.is_some(), expected);
        }

        #[test]
        fn worst_row_depends_only_on_scoreboard(s in 0usize..200, r in 0usize..400, w in 0usize..200, b in 0usize..200) {
            let l = lay(s, r, w, b);
            prop_assert_eq!(l.worst_picks_row_num as usize, 5 + s + 2);
        }

        #[test]
        fn layout_is_pure(s in 0usize..200, r in 0usize..400, w in 0usize..200, b in 0usize..200) {
            prop_assert_eq!(lay(s, r, w, b), lay(s, r, w, b));
        }

        #[test]
        fn picks_block_fits_above_sheet_bottom(s in 0usize..200, r in 0usize..400, w in 0usize..200, b in 0usize..200) {
            let l = lay(s, r, w, b);
            let bottom = match l.best_picks_row_num {
                Some(row) => row as usize + l.best_picks_height,
                None => l.worst_picks_row_num as usize + l.worst_picks_height,
            };
            if l.shows_worst_picks() {
                prop_assert!(bottom <= l.sheet_height());
            }
        }
    }
}
