use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CacheState, CellContours, contour_cell, edge_stops};
use crate::config::{Settings, validate_step};
use crate::contour::{Banding, ContourLine};
use crate::error::{GridError, Result};
use crate::field::HeightField;
use crate::grid::Grid;
use crate::lut::{Corner, Diagonal, Edge, Side};
use crate::observer::{Observers, SubscriptionId};
use crate::persist::GridState;
use crate::point::Point;
use crate::scalar::{GridEvent, ScalarGrid};

/// One edge's stops, as listed by `stops_for_all_sides`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeStops<'a> {
    pub cell: Point,
    pub edge: Edge,
    pub stops: &'a [f64],
}

/// Everything derived from the heights. Built whole, then swapped in.
#[derive(Clone, Debug, PartialEq)]
struct Caches {
    /// Edge (x, y)-(x+1, y); `w-1` x `h`.
    horizontal: Grid<Vec<f64>>,
    /// Edge (x, y)-(x, y+1); `w` x `h-1`.
    vertical: Grid<Vec<f64>>,
    diagonals: Grid<Diagonal>,
    diagonal_stops: Grid<Vec<f64>>,
    lines: Grid<Vec<ContourLine>>,
}

impl Caches {
    fn empty() -> Self {
        Self {
            horizontal: Grid::new(0, 0),
            vertical: Grid::new(0, 0),
            diagonals: Grid::new(0, 0),
            diagonal_stops: Grid::new(0, 0),
            lines: Grid::new(0, 0),
        }
    }

    fn build(heights: &Grid<f64>, settings: &Settings) -> Result<Self> {
        let (w, h) = (heights.w, heights.h);
        if w < 2 || h < 2 {
            return Err(GridError::InvalidGrid(format!(
                "cannot contour a {w}x{h} grid"
            )));
        }

        let mut horizontal = Grid::new(w - 1, h);
        for y in 0..h {
            for x in 0..w - 1 {
                let stops = edge_stops(*heights.get(x, y), *heights.get(x + 1, y), settings)?;
                horizontal.set(x, y, stops);
            }
        }
        let mut vertical = Grid::new(w, h - 1);
        for y in 0..h - 1 {
            for x in 0..w {
                let stops = edge_stops(*heights.get(x, y), *heights.get(x, y + 1), settings)?;
                vertical.set(x, y, stops);
            }
        }

        let banding = Banding::new(settings, true);
        let mut caches = Self {
            horizontal,
            vertical,
            diagonals: Grid::new(w - 1, h - 1),
            diagonal_stops: Grid::new(w - 1, h - 1),
            lines: Grid::new(w - 1, h - 1),
        };
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let corners = Corner::ALL.map(|c| {
                    let o = c.offset();
                    *heights.get(x + o.x as usize, y + o.y as usize)
                });
                let CellContours {
                    diagonal,
                    diagonal_stops,
                    lines,
                } = contour_cell(corners, caches.sides_of(x, y), settings, &banding)?;
                trace!(
                    "cell ({x}, {y}): {diagonal:?}, {} lines",
                    lines.len()
                );
                caches.diagonals.set(x, y, diagonal);
                caches.diagonal_stops.set(x, y, diagonal_stops);
                caches.lines.set(x, y, lines);
            }
        }
        Ok(caches)
    }

    /// Indexed by `Side::index`.
    fn sides_of(&self, x: usize, y: usize) -> [&[f64]; 4] {
        [
            self.horizontal.get(x, y).as_slice(),
            self.horizontal.get(x, y + 1).as_slice(),
            self.vertical.get(x, y).as_slice(),
            self.vertical.get(x + 1, y).as_slice(),
        ]
    }
}

/// A `ScalarGrid` with edge stops, diagonals and contour lines kept current.
///
/// Every mutation recomputes before it returns. A mutation whose recompute
/// fails is rolled back, so callers never see heights without matching
/// contours. Observers hear about a change only after the recompute.
#[derive(Debug)]
pub struct ComputedScalarGrid {
    grid: ScalarGrid,
    settings: Settings,
    caches: Caches,
    state: CacheState,
    observers: Observers<GridEvent>,
}

impl ComputedScalarGrid {
    pub fn new(mut grid: ScalarGrid, settings: Settings) -> Result<Self> {
        settings.validate()?;
        grid.validate()?;
        if settings.expansion_locked {
            grid.set_expansion_locked(true);
        }
        let mut computed = Self {
            grid,
            settings,
            caches: Caches::empty(),
            state: CacheState::Stale,
            observers: Observers::new(),
        };
        computed.recompute()?;
        Ok(computed)
    }

    pub fn from_state(state: &GridState, settings: Settings) -> Result<Self> {
        Self::new(ScalarGrid::from_state(state)?, settings)
    }

    #[inline]
    pub fn grid(&self) -> &ScalarGrid {
        &self.grid
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn cache_state(&self) -> CacheState {
        self.state
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn is_valid(&self) -> bool {
        self.grid.is_valid()
    }

    pub fn is_expansion_locked(&self) -> bool {
        self.grid.is_expansion_locked()
    }

    pub fn set_expansion_locked(&mut self, locked: bool) {
        self.grid.set_expansion_locked(locked);
        self.settings.expansion_locked = locked;
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GridEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn state(&self) -> GridState {
        self.grid.state()
    }

    pub fn get(&self, pos: Point) -> Result<f64> {
        self.grid.get(pos)
    }

    pub fn set(&mut self, pos: Point, height: f64) -> Result<()> {
        let previous = self.grid.heights().clone();
        self.grid.set(pos, height)?;
        self.commit(previous, GridEvent::HeightSet { pos, height })
    }

    pub fn get_corner_of(&self, cell: Point, corner: Corner) -> Result<f64> {
        self.grid.get_corner_of(cell, corner)
    }

    pub fn set_corner_of(&mut self, cell: Point, corner: Corner, height: f64) -> Result<()> {
        if !self.grid.is_valid_cell(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        self.set(cell + corner.offset(), height)
    }

    pub fn expand_left(&mut self) -> Result<()> {
        self.expand_by(Point::new(-1, 0))
    }

    pub fn expand_right(&mut self) -> Result<()> {
        self.expand_by(Point::new(1, 0))
    }

    pub fn expand_up(&mut self) -> Result<()> {
        self.expand_by(Point::new(0, -1))
    }

    pub fn expand_down(&mut self) -> Result<()> {
        self.expand_by(Point::new(0, 1))
    }

    pub fn expand_by(&mut self, amount: Point) -> Result<()> {
        if amount == Point::ZERO {
            return Ok(());
        }
        let previous = self.grid.heights().clone();
        self.grid.expand_by(amount)?;
        self.commit(previous, GridEvent::Expanded { amount })
    }

    pub fn load(&mut self, state: &GridState) -> Result<()> {
        let previous = self.grid.heights().clone();
        self.grid.load(state)?;
        self.commit(previous, GridEvent::Loaded)
    }

    /// `ScalarGrid::load_value` followed by a recompute. Errors only if the
    /// loaded heights cannot be contoured, in which case the old heights
    /// stay.
    pub fn load_value(&mut self, value: &Value) -> Result<bool> {
        let strict = GridState::deserialize(value)
            .ok()
            .filter(|state| state.to_grid().is_ok());
        if let Some(state) = strict {
            self.load(&state)?;
            return Ok(true);
        }
        warn!("persisted grid is not valid, attempting recovery");
        let previous = self.grid.heights().clone();
        let salvaged = self.grid.attempt_recovery(value);
        self.commit(previous, GridEvent::Recovered { salvaged })?;
        Ok(salvaged)
    }

    pub fn clear(&mut self) -> Result<()> {
        let previous = self.grid.heights().clone();
        self.grid.clear();
        self.commit(previous, GridEvent::Cleared)
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.settings.step
    }

    /// Rebands every cell. On failure the old step stays in effect.
    pub fn set_step(&mut self, step: f64) -> Result<()> {
        validate_step(step)?;
        let previous = self.settings.step;
        self.settings.step = step;
        if let Err(e) = self.recompute() {
            warn!("step {step} could not be applied ({e}), keeping {previous}");
            self.settings.step = previous;
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers.notify(&GridEvent::StepChanged { step });
        Ok(())
    }

    fn recompute(&mut self) -> Result<()> {
        self.state = CacheState::Recomputing;
        match Caches::build(self.grid.heights(), &self.settings) {
            Ok(caches) => {
                self.caches = caches;
                self.state = CacheState::Fresh;
                debug!(
                    "recomputed {}x{} cells at step {}",
                    self.caches.lines.w, self.caches.lines.h, self.settings.step
                );
                Ok(())
            }
            Err(e) => {
                self.state = CacheState::Stale;
                Err(e)
            }
        }
    }

    /// Recomputes after a change to the heights. The old caches survive a
    /// failed build, so restoring the heights restores consistency.
    fn commit(&mut self, previous: Grid<f64>, event: GridEvent) -> Result<()> {
        if let Err(e) = self.recompute() {
            warn!("recompute failed ({e}), rolling back");
            self.grid.restore(previous);
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers.notify(&event);
        Ok(())
    }

    fn cell_index(&self, cell: Point) -> Result<(usize, usize)> {
        cell.to_index()
            .filter(|&(x, y)| self.caches.lines.contains(x, y))
            .ok_or(GridError::OutOfBounds(cell))
    }

    pub fn height_lines_of(&self, cell: Point) -> Result<&[ContourLine]> {
        let (x, y) = self.cell_index(cell)?;
        Ok(self.caches.lines.get(x, y))
    }

    pub fn diagonal_of(&self, cell: Point) -> Result<Diagonal> {
        let (x, y) = self.cell_index(cell)?;
        Ok(*self.caches.diagonals.get(x, y))
    }

    /// Four sides in canonical order, then the active diagonal.
    pub fn edges_of(&self, cell: Point) -> Result<[Edge; 5]> {
        let diagonal = self.diagonal_of(cell)?;
        Ok([
            Side::Top.into(),
            Side::Bottom.into(),
            Side::Left.into(),
            Side::Right.into(),
            diagonal.into(),
        ])
    }

    /// Stops along one edge of a cell. Only the active diagonal has stops.
    pub fn stops_for(&self, cell: Point, edge: Edge) -> Result<&[f64]> {
        let (x, y) = self.cell_index(cell)?;
        match edge {
            Edge::Side(side) => Ok(self.caches.sides_of(x, y)[side.index()]),
            Edge::Diagonal(d) if d == *self.caches.diagonals.get(x, y) => {
                Ok(self.caches.diagonal_stops.get(x, y))
            }
            Edge::Diagonal(d) => Err(GridError::InvalidArgument(format!(
                "{d:?} is not the active diagonal of cell {cell}"
            ))),
        }
    }

    /// Every edge of the grid once: each cell's top, left and diagonal, plus
    /// the right side of the last column and the bottom of the last row.
    pub fn stops_for_all_sides(&self) -> Vec<EdgeStops<'_>> {
        let (cw, ch) = (self.caches.lines.w, self.caches.lines.h);
        let mut out = Vec::with_capacity(cw * ch * 3 + cw + ch);
        for y in 0..ch {
            for x in 0..cw {
                let cell = Point::new(x as i32, y as i32);
                let sides = self.caches.sides_of(x, y);
                let mut edges: Vec<(Edge, &[f64])> = vec![
                    (Side::Top.into(), sides[Side::Top.index()]),
                    (Side::Left.into(), sides[Side::Left.index()]),
                    (
                        (*self.caches.diagonals.get(x, y)).into(),
                        self.caches.diagonal_stops.get(x, y),
                    ),
                ];
                if x == cw - 1 {
                    edges.push((Side::Right.into(), sides[Side::Right.index()]));
                }
                if y == ch - 1 {
                    edges.push((Side::Bottom.into(), sides[Side::Bottom.index()]));
                }
                out.extend(
                    edges
                        .into_iter()
                        .map(|(edge, stops)| EdgeStops { cell, edge, stops }),
                );
            }
        }
        out
    }

    /// Active diagonal of every cell, row by row.
    pub fn diagonals(&self) -> Vec<Vec<Diagonal>> {
        self.caches.diagonals.to_rows()
    }
}

impl HeightField for ComputedScalarGrid {
    fn width(&self) -> usize {
        ComputedScalarGrid::width(self)
    }

    fn height(&self) -> usize {
        ComputedScalarGrid::height(self)
    }

    fn is_valid(&self) -> bool {
        ComputedScalarGrid::is_valid(self)
    }

    fn is_expansion_locked(&self) -> bool {
        ComputedScalarGrid::is_expansion_locked(self)
    }

    fn get(&self, pos: Point) -> Result<f64> {
        ComputedScalarGrid::get(self, pos)
    }

    fn set(&mut self, pos: Point, height: f64) -> Result<()> {
        ComputedScalarGrid::set(self, pos, height)
    }

    fn expand_by(&mut self, amount: Point) -> Result<()> {
        ComputedScalarGrid::expand_by(self, amount)
    }

    fn contour_step(&self) -> Option<f64> {
        Some(self.step())
    }
}
