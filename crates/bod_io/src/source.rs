//! crates/bod_io/src/source.rs
//! Tabular data source. The transformation engine materializes its models as
//! `catalog.schema.table`; here a catalog is a directory named after the draft
//! and every schema is one SQLite file inside it, attached under the schema name:
//!
//! ```text
//! <database_dir>/<draft_id>/raw.db         -> "raw"
//! <database_dir>/<draft_id>/cleaned.db     -> "cleaned"
//! <database_dir>/<draft_id>/combined.db    -> "combined"
//! <database_dir>/<draft_id>/dashboards.db  -> "dashboards"
//! ```
//!
//! Reads are plain `SELECT`s; non-finite floats come back as `CellValue::Missing`.

use std::path::Path;

use bod_core::{CellValue, ReportTable, TableRef};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::config::DraftConfig;
use crate::IoError;

/// Read access to materialized tables.
pub trait TableSource {
    /// `SELECT *` from a fully-qualified table. When `columns` is given the
    /// result columns are renamed positionally; a count mismatch is an error.
    fn read_table(&self, table: &TableRef, columns: Option<&[&str]>) -> Result<ReportTable, IoError>;

    /// Run an arbitrary read query with positional `?N` parameters.
    fn query(&self, sql: &str, params: &[CellValue]) -> Result<ReportTable, IoError>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn read_table(&self, table: &TableRef, columns: Option<&[&str]>) -> Result<ReportTable, IoError> {
        (**self).read_table(table, columns)
    }

    fn query(&self, sql: &str, params: &[CellValue]) -> Result<ReportTable, IoError> {
        (**self).query(sql, params)
    }
}

/// SQLite-backed source for one catalog.
pub struct SqliteSource {
    catalog: String,
    conn: Connection,
}

impl SqliteSource {
    /// Schemas the transformation project writes.
    pub const SCHEMAS: [&'static str; 4] = ["raw", "cleaned", "combined", "dashboards"];

    /// Open `<database_dir>/<catalog>/` and attach every schema file present.
    pub fn open(database_dir: &Path, catalog: &str) -> Result<Self, IoError> {
        let dir = database_dir.join(catalog);
        if !dir.is_dir() {
            return Err(IoError::Path { path: dir, msg: "catalog directory not found".into() });
        }
        let conn = Connection::open_in_memory()?;
        for schema in Self::SCHEMAS {
            let file = dir.join(format!("{schema}.db"));
            if !file.is_file() {
                warn!(catalog, schema, "schema file missing; tables in it will not resolve");
                continue;
            }
            let path = file
                .to_str()
                .ok_or_else(|| IoError::Path { path: file.clone(), msg: "non UTF-8 path".into() })?;
            conn.execute(&format!("ATTACH DATABASE ?1 AS \"{schema}\""), [path])?;
            debug!(catalog, schema, "attached");
        }
        Ok(Self { catalog: catalog.to_string(), conn })
    }

    pub fn for_config(cfg: &DraftConfig) -> Result<Self, IoError> {
        Self::open(&cfg.database_dir, &cfg.draft_id)
    }

    /// Every schema attached as an empty in-memory database.
    pub fn open_in_memory(catalog: &str) -> Result<Self, IoError> {
        let conn = Connection::open_in_memory()?;
        for schema in Self::SCHEMAS {
            conn.execute(&format!("ATTACH DATABASE ':memory:' AS \"{schema}\""), [])?;
        }
        Ok(Self { catalog: catalog.to_string(), conn })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Direct handle, used to seed fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn select(&self, sql: &str, params: &[CellValue]) -> Result<ReportTable, IoError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let bound = params.iter().map(to_sql_value);
        let mut rows = stmt.query(rusqlite::params_from_iter(bound))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(from_sql_value(row.get_ref(i)?));
            }
            out.push(cells);
        }
        Ok(ReportTable::new(columns, out)?)
    }
}

impl TableSource for SqliteSource {
    fn read_table(&self, table: &TableRef, columns: Option<&[&str]>) -> Result<ReportTable, IoError> {
        if table.catalog() != self.catalog {
            return Err(IoError::TableNotFound(table.to_string()));
        }
        let sql = format!("SELECT * FROM \"{}\".\"{}\"", table.schema(), table.table());
        let data = self.select(&sql, &[]).map_err(|e| match e {
            IoError::Sqlite(inner) if inner.to_string().contains("no such table") => {
                IoError::TableNotFound(table.to_string())
            }
            other => other,
        })?;
        debug!(table = %table, rows = data.len(), "table read");
        match columns {
            Some(names) => Ok(data.with_columns(names)?),
            None => Ok(data),
        }
    }

    fn query(&self, sql: &str, params: &[CellValue]) -> Result<ReportTable, IoError> {
        self.select(sql, params)
    }
}

fn to_sql_value(v: &CellValue) -> Value {
    match v {
        CellValue::Missing => Value::Null,
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
        CellValue::Int(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sql_value(v: ValueRef<'_>) -> CellValue {
    match v {
        ValueRef::Null => CellValue::Missing,
        ValueRef::Integer(i) => CellValue::Int(i),
        ValueRef::Real(f) => CellValue::float(f),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => CellValue::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteSource {
        let src = SqliteSource::open_in_memory("friends_2025").unwrap();
        src.connection()
            .execute_batch(
                "CREATE TABLE dashboards.scoreboard (name TEXT, scored_revenue REAL);
                 INSERT INTO dashboards.scoreboard VALUES ('Ann', 1e999), ('Bo', 250.5), ('Cy', NULL);",
            )
            .unwrap();
        src
    }

    #[test]
    fn reads_qualified_table_and_normalizes_infinity() {
        let src = seeded();
        let t: TableRef = "friends_2025.dashboards.scoreboard".parse().unwrap();
        let table = src.read_table(&t, None).unwrap();
        assert_eq!(table.columns(), ["name", "scored_revenue"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0][1], CellValue::Missing);
        assert_eq!(table.rows()[1][1], CellValue::Float(250.5));
        assert_eq!(table.rows()[2][1], CellValue::Missing);
    }

    #[test]
    fn display_columns_replace_source_names() {
        let src = seeded();
        let t: TableRef = "friends_2025.dashboards.scoreboard".parse().unwrap();
        let table = src.read_table(&t, Some(&["Name", "Scored Revenue"])).unwrap();
        assert_eq!(table.columns(), ["Name", "Scored Revenue"]);
        assert!(matches!(src.read_table(&t, Some(&["Name"])), Err(IoError::Core(_))));
    }

    #[test]
    fn other_catalogs_and_missing_tables_are_not_found() {
        let src = seeded();
        let other: TableRef = "work_2025.dashboards.scoreboard".parse().unwrap();
        assert!(matches!(src.read_table(&other, None), Err(IoError::TableNotFound(_))));
        let missing: TableRef = "friends_2025.dashboards.best_picks".parse().unwrap();
        assert!(matches!(src.read_table(&missing, None), Err(IoError::TableNotFound(_))));
    }

    #[test]
    fn queries_bind_parameters() {
        let src = seeded();
        let t = src
            .query(
                "SELECT name FROM dashboards.scoreboard WHERE scored_revenue > ?1",
                &[CellValue::Int(100)],
            )
            .unwrap();
        assert_eq!(t.rows(), [vec![CellValue::text("Bo")]]);
    }
}
