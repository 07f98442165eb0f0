//! crates/bod_core/src/cell.rs
//! One spreadsheet/database cell. Non-finite floats never survive construction:
//! `inf`, `-inf` and `NaN` collapse into `Missing` so nothing downstream has to
//! special-case them.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single cell value. `Missing` serializes as JSON `null`.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CellValue {
    #[default]
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Float constructor that normalizes non-finite values to `Missing`.
    pub fn float(v: f64) -> Self {
        if v.is_finite() { CellValue::Float(v) } else { CellValue::Missing }
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric view (ints widen to f64). Text is not parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for numeric zero (`0` or `0.0`); text and missing are never zero.
    pub fn is_zero(&self) -> bool {
        self.as_f64() == Some(0.0)
    }

    /// Re-apply the non-finite rule to an existing value.
    pub fn normalized(self) -> Self {
        match self {
            CellValue::Float(v) => CellValue::float(v),
            other => other,
        }
    }
}

/// String coercion used for set comparisons and for writing plain text.
/// `Missing` renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self { CellValue::Text(s.to_string()) }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self { CellValue::Text(s) }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self { CellValue::Int(i) }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self { CellValue::float(v) }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self { CellValue::Bool(b) }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_floats_become_missing() {
        assert_eq!(CellValue::float(f64::INFINITY), CellValue::Missing);
        assert_eq!(CellValue::float(f64::NEG_INFINITY), CellValue::Missing);
        assert_eq!(CellValue::from(f64::NAN), CellValue::Missing);
        assert_eq!(CellValue::Float(f64::NAN).normalized(), CellValue::Missing);
        assert_eq!(CellValue::float(1.5), CellValue::Float(1.5));
    }

    #[test]
    fn zero_detection_is_numeric_only() {
        assert!(CellValue::Int(0).is_zero());
        assert!(CellValue::Float(0.0).is_zero());
        assert!(!CellValue::text("0").is_zero());
        assert!(!CellValue::Missing.is_zero());
        assert!(!CellValue::Int(3).is_zero());
    }

    #[test]
    fn display_coerces_to_plain_text() {
        assert_eq!(CellValue::text("Dune").to_string(), "Dune");
        assert_eq!(CellValue::Int(42).to_string(), "42");
        assert_eq!(CellValue::Missing.to_string(), "");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_serializes_as_null() {
        let row = vec![CellValue::Missing, CellValue::Int(1), CellValue::text("x")];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[null,1,"x"]"#);
    }
}
