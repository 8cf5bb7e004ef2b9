//! Serializable snapshot of a computed grid, written by the CLI and returned
//! by the HTTP service.

use serde::Serialize;

use crate::compute::ComputedScalarGrid;
use crate::contour::{ContourLine, LabelAnchor};
use crate::lut::{Diagonal, Edge};
use crate::point::Point;
use crate::subdivide::edge_spans;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeReport {
    pub cell: Point,
    pub edge: Edge,
    pub stops: Vec<f64>,
    /// Gaps between consecutive stops, ends included.
    pub spans: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellReport {
    pub cell: Point,
    pub lines: Vec<ContourLine>,
    /// One per line that has a segment to put a label on.
    pub labels: Vec<LabelAnchor>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub width: usize,
    pub height: usize,
    pub step: f64,
    /// The input was damaged and went through recovery.
    pub salvaged: bool,
    pub heights: Vec<Vec<f64>>,
    pub diagonals: Vec<Vec<Diagonal>>,
    pub edges: Vec<EdgeReport>,
    pub cells: Vec<CellReport>,
}

impl Report {
    pub fn new(grid: &ComputedScalarGrid, salvaged: bool) -> Self {
        let edges = grid
            .stops_for_all_sides()
            .into_iter()
            .map(|e| EdgeReport {
                cell: e.cell,
                edge: e.edge,
                stops: e.stops.to_vec(),
                spans: edge_spans(e.stops),
            })
            .collect();

        let mut cells = Vec::new();
        for y in 0..grid.height().saturating_sub(1) {
            for x in 0..grid.width().saturating_sub(1) {
                let cell = Point::new(x as i32, y as i32);
                let lines = grid.height_lines_of(cell).map(<[ContourLine]>::to_vec).unwrap_or_default();
                if lines.is_empty() {
                    continue;
                }
                let labels = lines.iter().filter_map(ContourLine::label_anchor).collect();
                cells.push(CellReport { cell, lines, labels });
            }
        }

        Self {
            width: grid.width(),
            height: grid.height(),
            step: grid.step(),
            salvaged,
            heights: grid.state().data,
            diagonals: grid.diagonals(),
            edges,
            cells,
        }
    }

    pub fn line_count(&self) -> usize {
        self.cells.iter().map(|c| c.lines.len()).sum()
    }
}
