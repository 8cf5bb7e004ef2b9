//! Cached contour data over a height field, kept current by recomputing
//! synchronously inside every mutation.

pub mod grid;
pub mod window;

use serde::Serialize;

use crate::config::Settings;
use crate::contour::{Banding, CellData, ContourLine, assemble_lines};
use crate::diagonal::select_diagonal_for;
use crate::error::Result;
use crate::lut::Diagonal;
use crate::subdivide::contour_stops_between;

pub use grid::{ComputedScalarGrid, EdgeStops};
pub use window::ComputedCellWindow;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    #[default]
    Stale,
    Recomputing,
    Fresh,
}

/// Per-cell results; nothing here is shared with a neighbour.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CellContours {
    pub diagonal: Diagonal,
    pub diagonal_stops: Vec<f64>,
    pub lines: Vec<ContourLine>,
}

#[inline]
pub(crate) fn edge_stops(a: f64, b: f64, settings: &Settings) -> Result<Vec<f64>> {
    contour_stops_between(a, b, settings)
}

/// Diagonal, diagonal stops and contour lines of one cell whose side stops
/// are already known.
pub(crate) fn contour_cell(
    corners: [f64; 4],
    sides: [&[f64]; 4],
    settings: &Settings,
    banding: &Banding,
) -> Result<CellContours> {
    let diagonal = select_diagonal_for(sides);
    let (a, b) = diagonal.corners();
    let diagonal_stops = edge_stops(corners[a.index()], corners[b.index()], settings)?;
    let cell = CellData {
        corners,
        sides,
        diagonal,
        diagonal_stops: &diagonal_stops,
    };
    let lines = assemble_lines(&cell, banding)?;
    Ok(CellContours {
        diagonal,
        diagonal_stops,
        lines,
    })
}
