// src/analyze/coerce.rs

use crate::dataset::Cell;

/// Numeric value of a percentage-change cell.
///
/// Numbers pass through; text is trimmed, trailing `%` signs are dropped and
/// the rest parsed as a decimal. Anything unparsable, missing or NaN is `None`.
/// Negative zero comes back as `0.0`.
pub fn coerce_change(cell: &Cell) -> Option<f64> {
    let v = match cell {
        Cell::Number(v) => *v,
        Cell::Text(s) => s.trim().trim_end_matches('%').trim_end().parse::<f64>().ok()?,
        Cell::Missing => return None,
    };
    (!v.is_nan()).then_some(v + 0.0)
}
