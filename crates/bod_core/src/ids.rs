//! Fully-qualified table references: `catalog.schema.table`.

use core::fmt;
use core::str::FromStr;

use crate::errors::CoreError;

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 128
        && s.bytes().all(|b| matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_'))
}

/// `catalog.schema.table`. Every part is a plain identifier so it can be
/// quoted into SQL without escaping concerns.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TableRef {
    catalog: String,
    schema: String,
    table: String,
}

impl TableRef {
    pub fn new(catalog: &str, schema: &str, table: &str) -> Result<Self, CoreError> {
        if !(is_ident(catalog) && is_ident(schema) && is_ident(table)) {
            return Err(CoreError::InvalidTableRef(format!("{catalog}.{schema}.{table}")));
        }
        Ok(Self { catalog: catalog.to_string(), schema: schema.to_string(), table: table.to_string() })
    }

    /// Qualify a `schema.table` pair under `catalog`.
    pub fn in_catalog(catalog: &str, schema_table: &str) -> Result<Self, CoreError> {
        let (schema, table) = schema_table
            .split_once('.')
            .ok_or_else(|| CoreError::InvalidTableRef(schema_table.to_string()))?;
        Self::new(catalog, schema, table)
    }

    pub fn catalog(&self) -> &str { &self.catalog }
    pub fn schema(&self) -> &str { &self.schema }
    pub fn table(&self) -> &str { &self.table }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl FromStr for TableRef {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(sc), Some(t), None) => Self::new(c, sc, t),
            _ => Err(CoreError::InvalidTableRef(s.to_string())),
        }
    }
}
