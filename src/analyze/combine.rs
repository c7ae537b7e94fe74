// src/analyze/combine.rs

use crate::dataset::{Cell, Dataset, TableSet};
use crate::error::AnalysisError;
use tracing::debug;

/// Concatenate the named datasets in `keys` order.
///
/// Columns are the union of all sources in first-seen order; a row from a
/// source lacking some column gets `Missing` there.
pub fn combine<S: AsRef<str>>(tables: &TableSet, keys: &[S]) -> Result<Dataset, AnalysisError> {
    let sources = keys
        .iter()
        .map(|k| {
            let k = k.as_ref();
            tables
                .get(k)
                .ok_or_else(|| AnalysisError::MissingKey(k.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns: Vec<String> = Vec::new();
    for ds in &sources {
        for c in ds.columns() {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }

    let mut out = Dataset::new(columns.clone());
    for ds in &sources {
        let mapping: Vec<Option<usize>> = columns.iter().map(|c| ds.column_index(c)).collect();
        for row in ds.rows() {
            out.push_row(
                mapping
                    .iter()
                    .map(|idx| idx.map_or(Cell::Missing, |i| row[i].clone()))
                    .collect(),
            );
        }
    }

    debug!(sources = sources.len(), rows = out.len(), "combined tables");
    Ok(out)
}
