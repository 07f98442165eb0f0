//! crates/bod_report/src/digest.rs
//! SHA-256 of a render plan (layout + assets).
//!
//! Bytes are the compact JSON of the plan after a round-trip through
//! `serde_json::Value`, whose maps iterate in key order, so field order in the
//! Rust types does not leak into the digest. The freshness message is not part
//! of the plan: two cycles over the same data hash the same.

use bod_layout::Layout;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::assets::RenderAsset;
use crate::ReportError;

#[derive(Serialize)]
struct PlanView<'a> {
    layout: &'a Layout,
    assets: &'a [RenderAsset],
}

/// Lowercase hex SHA-256 over any serializable value's canonical JSON.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, ReportError> {
    let canonical = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec(&canonical)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub fn plan_digest(layout: &Layout, assets: &[RenderAsset]) -> Result<String, ReportError> {
    sha256_canonical(&PlanView { layout, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{build_assets, ReportTables};
    use bod_core::{CellValue, ReportKind, ReportTable};
    use bod_layout::compute_layout;

    fn tables(score: i64) -> ReportTables {
        let sb = ReportKind::Scoreboard.columns();
        let mut row = vec![CellValue::text("Ann")];
        row.extend((1..sb.len()).map(|_| CellValue::Int(score)));
        ReportTables {
            scoreboard: ReportTable::from_strs(sb, vec![row]).unwrap(),
            released: ReportTable::empty(ReportKind::ReleasedMovies.columns()),
            worst_picks: ReportTable::empty(ReportKind::WorstPicks.columns()),
            best_picks: ReportTable::empty(ReportKind::BestPicks.columns()),
        }
    }

    fn digest(t: &ReportTables) -> String {
        let layout = compute_layout(t.layout_inputs());
        let assets = build_assets(t, &layout, "League").unwrap();
        plan_digest(&layout, &assets).unwrap()
    }

    #[test]
    fn same_data_same_digest() {
        let a = digest(&tables(10));
        assert_eq!(a, digest(&tables(10)));
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn any_value_change_moves_the_digest() {
        assert_ne!(digest(&tables(10)), digest(&tables(11)));
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = sha256_canonical(&serde_json::json!({ "b": 1, "a": 2 })).unwrap();
        let b = sha256_canonical(&serde_json::json!({ "a": 2, "b": 1 })).unwrap();
        assert_eq!(a, b);
    }
}
