//! crates/bod_pipeline/src/diagnostics.rs
//! Read-only checks run after the dashboard is written. Findings are log
//! lines for whoever maintains `manual_adds.csv`; they never fail the run.
//! The returned values exist for tests and the run summary.

use std::collections::BTreeSet;

use bod_core::CellValue;
use bod_io::TableSource;
use serde::Serialize;
use tracing::{info, warn};

use crate::PipelineError;

const DRAFTED_SQL: &str = "SELECT movie FROM cleaned.drafter";
const RELEASED_SQL: &str = "SELECT title FROM combined.base_query";

/// Lowest revenue among the rows of the most recent load for the year.
const MIN_REVENUE_SQL: &str = "\
SELECT title, revenue FROM (
    SELECT title, revenue, RANK() OVER (ORDER BY loaded_date DESC) AS rnk
    FROM cleaned.box_office_mojo_dump
    WHERE release_year = ?1
)
WHERE rnk = 1
ORDER BY revenue ASC NULLS LAST
LIMIT 1";

/// Released movies whose latest record is at or under the threshold.
const UNDER_MIN_SQL: &str = "\
SELECT latest.title FROM (
    SELECT title, revenue, ROW_NUMBER() OVER (PARTITION BY title ORDER BY loaded_date DESC) AS rn
    FROM cleaned.box_office_mojo_dump
    WHERE release_year = ?1
) AS latest
INNER JOIN combined.base_query AS base_query ON latest.title = base_query.title
WHERE latest.rn = 1 AND latest.revenue <= ?2";

/// First-column values as strings, deduplicated and sorted. NULL titles are
/// skipped: a drafter row without a movie has nothing to add to `manual_adds.csv`.
fn title_set<S: TableSource + ?Sized>(source: &S, sql: &str, params: &[CellValue]) -> Result<BTreeSet<String>, PipelineError> {
    let table = source.query(sql, params)?;
    Ok(table
        .rows()
        .iter()
        .filter_map(|row| row.first())
        .filter(|v| !v.is_missing())
        .map(|v| v.to_string())
        .collect())
}

/// Drafted movies with no row in the released-movies table, sorted.
pub fn log_missing_movies<S: TableSource + ?Sized>(source: &S) -> Result<Vec<String>, PipelineError> {
    let drafted = title_set(source, DRAFTED_SQL, &[])?;
    let released = title_set(source, RELEASED_SQL, &[])?;
    let missing: Vec<String> = drafted.difference(&released).cloned().collect();

    if missing.is_empty() {
        info!("All movies are on the scoreboard.");
    } else {
        warn!(
            "The following movies are missing from the scoreboard and should be added to the manual_adds.csv file:\n{}",
            missing.join(", ")
        );
    }
    Ok(missing)
}

/// Outcome of the minimum-revenue check.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MinRevenueReport {
    /// No revenue rows for the year; the second query was not run.
    NoData,
    Checked { threshold: CellValue, under_threshold: Vec<String> },
}

/// Flags movies whose latest revenue is no higher than the smallest figure
/// in the most recent data pull; their numbers are likely stale.
pub fn log_min_revenue_info<S: TableSource + ?Sized>(source: &S, year: i32) -> Result<MinRevenueReport, PipelineError> {
    let year = CellValue::Int(i64::from(year));
    let latest = source.query(MIN_REVENUE_SQL, std::slice::from_ref(&year))?;
    let threshold = latest
        .column("revenue")
        .and_then(|mut values| values.next().cloned())
        .filter(|v| !v.is_missing());
    let Some(threshold) = threshold else {
        info!("No revenue data found for this year.");
        return Ok(MinRevenueReport::NoData);
    };
    info!("Minimum revenue of most recent data: {threshold}");

    let under: Vec<String> = title_set(source, UNDER_MIN_SQL, &[year, threshold.clone()])?.into_iter().collect();
    if under.is_empty() {
        info!("All movies are above the minimum revenue of the most recent data pull.");
    } else {
        warn!(
            "The most recent records for the following movies are under the minimum revenue of the most recent data pull and may not have the correct revenue and should be added to the manual_adds.csv file:\n{}",
            under.join(", ")
        );
    }
    Ok(MinRevenueReport::Checked { threshold, under_threshold: under })
}
