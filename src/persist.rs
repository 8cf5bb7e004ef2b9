//! Persisted grid shape and best-effort salvage of damaged state.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::Grid;

/// `{ "width": w, "height": h, "data": [[f64; w]; h] }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Vec<f64>>,
}

impl GridState {
    /// Strict conversion into row-major storage. Fails with a description of
    /// the first violated invariant.
    pub fn to_grid(&self) -> Result<Grid<f64>, String> {
        if self.width < 2 || self.height < 2 {
            return Err(format!(
                "shape {}x{} is smaller than 2x2",
                self.width, self.height
            ));
        }
        if self.data.len() != self.height {
            return Err(format!(
                "expected {} rows, found {}",
                self.height,
                self.data.len()
            ));
        }
        if let Some((y, row)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.width)
        {
            return Err(format!(
                "row {y} has {} values, expected {}",
                row.len(),
                self.width
            ));
        }
        if self.data.iter().flatten().any(|v| !v.is_finite()) {
            return Err("data contains non-finite values".into());
        }
        Grid::from_rows(self.data.clone()).ok_or_else(|| "rows are ragged".into())
    }
}

/// Salvages heights from an arbitrary JSON value shaped roughly like a
/// `GridState`: rows are trimmed to the shortest row and non-numeric values
/// become 0.0. The declared width and height are ignored.
///
/// Returns None if `data` is not an array of arrays, or if what remains is
/// smaller than 2x2.
pub fn salvage(value: &Value) -> Option<Grid<f64>> {
    let Some(rows) = value.get("data").and_then(Value::as_array) else {
        warn!("grid data is not an array, nothing to salvage");
        return None;
    };
    let Some(rows) = rows.iter().map(Value::as_array).collect::<Option<Vec<_>>>() else {
        warn!("grid data has rows that are not arrays, nothing to salvage");
        return None;
    };

    let width = rows.iter().map(|r| r.len()).min().unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        debug!("trimming ragged rows to width {width}");
    }

    let trimmed: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            row[..width]
                .iter()
                .map(|v| v.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0))
                .collect()
        })
        .collect();

    let state = GridState {
        width,
        height: trimmed.len(),
        data: trimmed,
    };
    match state.to_grid() {
        Ok(grid) => Some(grid),
        Err(reason) => {
            warn!("salvaged grid is still invalid: {reason}");
            None
        }
    }
}
