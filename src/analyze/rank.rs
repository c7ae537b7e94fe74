// src/analyze/rank.rs

use super::coerce::coerce_change;
use crate::dataset::{Cell, Dataset};
use crate::error::AnalysisError;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// One ranked instrument.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mover {
    pub symbol: String,
    pub change: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MoverRanking {
    /// Largest changes first.
    pub gainers: Vec<Mover>,
    /// Smallest changes first.
    pub decliners: Vec<Mover>,
}

/// Top `n` gainers and decliners of `dataset` by `change_column`.
///
/// Rows whose change cannot be coerced to a number take part in neither list.
/// Ties keep their original row order. When fewer than `n` rows qualify, all
/// of them are returned, so the two lists may share rows.
pub fn rank(
    dataset: &Dataset,
    symbol_column: &str,
    change_column: &str,
    n: usize,
) -> Result<MoverRanking, AnalysisError> {
    if n == 0 {
        return Err(AnalysisError::InvalidCount);
    }
    let missing = |c: &str| AnalysisError::MissingColumn(c.to_string());
    let sym_idx = dataset
        .column_index(symbol_column)
        .ok_or_else(|| missing(symbol_column))?;
    let chg_idx = dataset
        .column_index(change_column)
        .ok_or_else(|| missing(change_column))?;

    let candidates: Vec<(&Cell, f64)> = dataset
        .rows()
        .filter_map(|row| coerce_change(&row[chg_idx]).map(|v| (&row[sym_idx], v)))
        .collect();

    let excluded = dataset.len() - candidates.len();
    if excluded > 0 {
        debug!(excluded, column = change_column, "skipped unparsable change values");
    }

    // slice::sort_by is stable, so equal changes stay in row order.
    // NaN never gets here; partial_cmp keeps 0.0 and -0.0 equal.
    let pick = |cmp: fn(&f64, &f64) -> Ordering| {
        let mut sorted = candidates.clone();
        sorted.sort_by(|a, b| cmp(&a.1, &b.1));
        sorted
            .into_iter()
            .take(n)
            .map(|(sym, change)| Mover {
                symbol: sym.to_string(),
                change,
            })
            .collect::<Vec<_>>()
    };

    Ok(MoverRanking {
        gainers: pick(|a: &f64, b: &f64| b.partial_cmp(a).unwrap_or(Ordering::Equal)),
        decliners: pick(|a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal)),
    })
}
