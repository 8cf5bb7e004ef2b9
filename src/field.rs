use crate::error::{GridError, Result};
use crate::lut::Corner;
use crate::point::Point;
use crate::scalar::ScalarGrid;

/// Editable corner-height field a `CellWindow` can move over.
///
/// Implemented by the bare grid and by the computed grid, so a window edit on
/// the latter keeps its caches current.
pub trait HeightField {
    /// Corner count along x.
    fn width(&self) -> usize;
    /// Corner count along y.
    fn height(&self) -> usize;
    fn is_valid(&self) -> bool;
    fn is_expansion_locked(&self) -> bool;

    fn get(&self, pos: Point) -> Result<f64>;
    fn set(&mut self, pos: Point, height: f64) -> Result<()>;
    fn expand_by(&mut self, amount: Point) -> Result<()>;

    /// Step the field already contours at, if it keeps contours of its own.
    fn contour_step(&self) -> Option<f64> {
        None
    }

    fn is_valid_cell(&self, cell: Point) -> bool {
        cell.to_index()
            .is_some_and(|(x, y)| x + 1 < self.width() && y + 1 < self.height())
    }

    fn get_corner_of(&self, cell: Point, corner: Corner) -> Result<f64> {
        if !self.is_valid_cell(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        self.get(cell + corner.offset())
    }

    fn set_corner_of(&mut self, cell: Point, corner: Corner, height: f64) -> Result<()> {
        if !self.is_valid_cell(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        self.set(cell + corner.offset(), height)
    }
}

impl HeightField for ScalarGrid {
    fn width(&self) -> usize {
        ScalarGrid::width(self)
    }

    fn height(&self) -> usize {
        ScalarGrid::height(self)
    }

    fn is_valid(&self) -> bool {
        ScalarGrid::is_valid(self)
    }

    fn is_expansion_locked(&self) -> bool {
        ScalarGrid::is_expansion_locked(self)
    }

    fn get(&self, pos: Point) -> Result<f64> {
        ScalarGrid::get(self, pos)
    }

    fn set(&mut self, pos: Point, height: f64) -> Result<()> {
        ScalarGrid::set(self, pos, height)
    }

    fn expand_by(&mut self, amount: Point) -> Result<()> {
        ScalarGrid::expand_by(self, amount)
    }
}
