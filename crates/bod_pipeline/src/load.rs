//! crates/bod_pipeline/src/load.rs
//! Reads the four report tables and the data-freshness timestamp.

use bod_core::{CellValue, ReportKind, TableRef};
use bod_io::TableSource;
use bod_report::ReportTables;
use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, warn};

use crate::PipelineError;

/// Newest publication timestamp in the cleaned fact table.
const DATA_THROUGH_SQL: &str =
    "SELECT MAX(published_timestamp_utc) AS published_timestamp_utc FROM cleaned.box_office_mojo_dump";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Every report table of `catalog`, with display column names.
pub fn load_tables<S: TableSource + ?Sized>(source: &S, catalog: &str) -> Result<ReportTables, PipelineError> {
    let read = |kind: ReportKind| -> Result<_, PipelineError> {
        let table_ref = TableRef::in_catalog(catalog, kind.source())?;
        let table = source.read_table(&table_ref, Some(kind.columns()))?;
        debug!(table = %table_ref, rows = table.len(), "report table loaded");
        Ok(table)
    };
    Ok(ReportTables {
        scoreboard: read(ReportKind::Scoreboard)?,
        released: read(ReportKind::ReleasedMovies)?,
        worst_picks: read(ReportKind::WorstPicks)?,
        best_picks: read(ReportKind::BestPicks)?,
    })
}

/// `None` when the fact table is empty or the value cannot be read as a timestamp.
pub fn data_through<S: TableSource + ?Sized>(source: &S) -> Result<Option<NaiveDateTime>, PipelineError> {
    let result = source.query(DATA_THROUGH_SQL, &[])?;
    let Some(value) = result.rows().first().and_then(|row| row.first()) else {
        return Ok(None);
    };
    let parsed = parse_timestamp(value);
    if parsed.is_none() && !value.is_missing() {
        warn!(value = %value, "unreadable published_timestamp_utc; freshness will read unknown");
    }
    Ok(parsed)
}

/// Text in one of the SQL datetime shapes (optionally RFC 3339), or epoch seconds.
pub(crate) fn parse_timestamp(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        }
        CellValue::Int(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bod_io::SqliteSource;

    #[test]
    fn timestamps_in_common_shapes() {
        let want = NaiveDateTime::parse_from_str("2025-06-01 12:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        for s in ["2025-06-01 12:30:00", "2025-06-01T12:30:00", "2025-06-01 12:30:00.000", "2025-06-01T14:30:00+02:00"] {
            assert_eq!(parse_timestamp(&CellValue::text(s)), Some(want), "{s}");
        }
        assert_eq!(parse_timestamp(&CellValue::Int(want.and_utc().timestamp())), Some(want));
        assert_eq!(parse_timestamp(&CellValue::text("yesterday")), None);
        assert_eq!(parse_timestamp(&CellValue::Missing), None);
    }

    #[test]
    fn empty_fact_table_has_no_timestamp() {
        let src = SqliteSource::open_in_memory("d").unwrap();
        src.connection()
            .execute_batch("CREATE TABLE cleaned.box_office_mojo_dump (title TEXT, published_timestamp_utc TEXT);")
            .unwrap();
        assert_eq!(data_through(&src).unwrap(), None);

        src.connection()
            .execute_batch(
                "INSERT INTO cleaned.box_office_mojo_dump VALUES
                   ('A', '2025-06-01 12:30:00'), ('B', '2025-06-02 08:00:00');",
            )
            .unwrap();
        let ts = data_through(&src).unwrap().unwrap();
        assert_eq!(ts.to_string(), "2025-06-02 08:00:00");
    }

    #[test]
    fn missing_report_table_is_a_data_error() {
        let src = SqliteSource::open_in_memory("d").unwrap();
        assert!(matches!(load_tables(&src, "d"), Err(PipelineError::Data(_))));
    }
}
