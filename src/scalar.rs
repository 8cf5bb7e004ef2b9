use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::grid::Grid;
use crate::lut::Corner;
use crate::observer::{Observers, SubscriptionId};
use crate::persist::{GridState, salvage};
use crate::point::Point;

/// Smallest grid: one cell, four corners.
pub const MIN_SIZE: usize = 2;

/// What changed, delivered to observers after the change is complete.
#[derive(Clone, Debug, PartialEq)]
pub enum GridEvent {
    HeightSet { pos: Point, height: f64 },
    Expanded { amount: Point },
    Loaded,
    Recovered { salvaged: bool },
    Cleared,
    StepChanged { step: f64 },
}

/// Resizable field of corner heights. `width` x `height` corners span
/// `(width - 1)` x `(height - 1)` cells.
#[derive(Debug)]
pub struct ScalarGrid {
    heights: Grid<f64>,
    valid: bool,
    expansion_locked: bool,
    observers: Observers<GridEvent>,
}

impl Default for ScalarGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal when the heights are equal; lock state and observers are ignored.
impl PartialEq for ScalarGrid {
    fn eq(&self, other: &Self) -> bool {
        self.heights == other.heights
    }
}

impl ScalarGrid {
    /// 2x2 grid of zeros.
    pub fn new() -> Self {
        Self {
            heights: Grid::new(MIN_SIZE, MIN_SIZE),
            valid: true,
            expansion_locked: false,
            observers: Observers::new(),
        }
    }

    pub fn from_state(state: &GridState) -> Result<Self> {
        let heights = state.to_grid().map_err(GridError::InvalidGrid)?;
        Ok(Self {
            heights,
            ..Self::new()
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.heights.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.heights.h
    }

    #[inline]
    pub fn heights(&self) -> &Grid<f64> {
        &self.heights
    }

    /// Result of the last `validate`.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_expansion_locked(&self) -> bool {
        self.expansion_locked
    }

    pub fn set_expansion_locked(&mut self, locked: bool) {
        self.expansion_locked = locked;
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GridEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    #[inline]
    pub fn is_valid_position(&self, pos: Point) -> bool {
        pos.to_index()
            .is_some_and(|(x, y)| self.heights.contains(x, y))
    }

    #[inline]
    pub fn is_valid_cell(&self, cell: Point) -> bool {
        cell.to_index()
            .is_some_and(|(x, y)| x + 1 < self.width() && y + 1 < self.height())
    }

    fn index_of(&self, pos: Point) -> Result<(usize, usize)> {
        pos.to_index()
            .filter(|&(x, y)| self.heights.contains(x, y))
            .ok_or(GridError::OutOfBounds(pos))
    }

    pub fn get(&self, pos: Point) -> Result<f64> {
        let (x, y) = self.index_of(pos)?;
        Ok(*self.heights.get(x, y))
    }

    pub fn set(&mut self, pos: Point, height: f64) -> Result<()> {
        let (x, y) = self.index_of(pos)?;
        if !height.is_finite() {
            return Err(GridError::InvalidArgument(format!(
                "height must be finite, got {height}"
            )));
        }
        self.heights.set(x, y, height);
        self.observers.notify(&GridEvent::HeightSet { pos, height });
        Ok(())
    }

    pub fn get_corner_of(&self, cell: Point, corner: Corner) -> Result<f64> {
        if !self.is_valid_cell(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        self.get(cell + corner.offset())
    }

    pub fn set_corner_of(&mut self, cell: Point, corner: Corner, height: f64) -> Result<()> {
        if !self.is_valid_cell(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        self.set(cell + corner.offset(), height)
    }

    /// All four corner heights of a cell, indexed by `Corner::index`.
    pub fn corners_of(&self, cell: Point) -> Result<[f64; 4]> {
        let mut out = [0.0; 4];
        for c in Corner::ALL {
            out[c.index()] = self.get_corner_of(cell, c)?;
        }
        Ok(out)
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.expansion_locked {
            Err(GridError::ExpansionLocked)
        } else {
            Ok(())
        }
    }

    /// Adds a column of zeros on the left; existing columns shift right.
    pub fn expand_left(&mut self) -> Result<()> {
        self.expand_by(Point::new(-1, 0))
    }

    pub fn expand_right(&mut self) -> Result<()> {
        self.expand_by(Point::new(1, 0))
    }

    /// Adds a row of zeros on top; existing rows shift down.
    pub fn expand_up(&mut self) -> Result<()> {
        self.expand_by(Point::new(0, -1))
    }

    pub fn expand_down(&mut self) -> Result<()> {
        self.expand_by(Point::new(0, 1))
    }

    /// Grows by `|amount.x|` columns and `|amount.y|` rows. Negative x grows
    /// left, negative y grows up.
    pub fn expand_by(&mut self, amount: Point) -> Result<()> {
        self.check_unlocked()?;
        if amount == Point::ZERO {
            return Ok(());
        }

        for _ in 0..amount.x.unsigned_abs() {
            let at = if amount.x < 0 { 0 } else { self.heights.w };
            self.heights.insert_column(at);
        }
        for _ in 0..amount.y.unsigned_abs() {
            let at = if amount.y < 0 { 0 } else { self.heights.h };
            self.heights.insert_row(at);
        }
        debug!(
            "expanded grid by {amount} to {}x{}",
            self.width(),
            self.height()
        );

        self.validate()?;
        self.observers.notify(&GridEvent::Expanded { amount });
        Ok(())
    }

    /// Checks shape and contents, updating the valid flag.
    pub fn validate(&mut self) -> Result<()> {
        let result = self.check();
        self.valid = result.is_ok();
        result
    }

    fn check(&self) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        if w < MIN_SIZE || h < MIN_SIZE {
            return Err(GridError::InvalidGrid(format!(
                "shape {w}x{h} is smaller than 2x2"
            )));
        }
        if self.heights.data.len() != w * h {
            return Err(GridError::InvalidGrid(format!(
                "{} values for a {w}x{h} grid",
                self.heights.data.len()
            )));
        }
        if self.heights.data.iter().any(|v| !v.is_finite()) {
            return Err(GridError::InvalidGrid(
                "data contains non-finite values".into(),
            ));
        }
        Ok(())
    }

    /// Back to the 2x2 zero default.
    pub fn clear(&mut self) {
        self.reset();
        self.observers.notify(&GridEvent::Cleared);
    }

    fn reset(&mut self) {
        self.heights = Grid::new(MIN_SIZE, MIN_SIZE);
        self.valid = true;
    }

    pub fn state(&self) -> GridState {
        GridState {
            width: self.width(),
            height: self.height(),
            data: self.heights.to_rows(),
        }
    }

    /// Replaces the whole grid. Nothing changes if `state` is invalid.
    pub fn load(&mut self, state: &GridState) -> Result<()> {
        let heights = state.to_grid().map_err(GridError::InvalidGrid)?;
        self.heights = heights;
        self.validate()?;
        self.observers.notify(&GridEvent::Loaded);
        Ok(())
    }

    /// Loads persisted state, recovering what it can when the state is
    /// damaged. Never fails; returns false if the grid had to be reset.
    pub fn load_value(&mut self, value: &Value) -> bool {
        let strict = parse_state(value)
            .and_then(|state| state.to_grid().map_err(GridError::InvalidGrid));
        match strict {
            Ok(heights) => {
                self.heights = heights;
                self.valid = true;
                self.observers.notify(&GridEvent::Loaded);
                true
            }
            Err(e) => {
                warn!("persisted grid is not valid ({e}), attempting recovery");
                self.attempt_recovery(value)
            }
        }
    }

    /// Best-effort rebuild from damaged persisted state. The grid is valid
    /// afterwards either way; false means nothing could be salvaged and the
    /// grid was reset to the default.
    pub fn attempt_recovery(&mut self, value: &Value) -> bool {
        let salvaged = match salvage(value) {
            Some(heights) => {
                self.heights = heights;
                self.valid = true;
                true
            }
            None => {
                self.reset();
                false
            }
        };
        debug!(
            "recovery {}: grid is {}x{}",
            if salvaged { "succeeded" } else { "failed" },
            self.width(),
            self.height()
        );
        self.observers.notify(&GridEvent::Recovered { salvaged });
        salvaged
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.state())
    }

    /// `load_value` for JSON text. Text that does not parse at all resets
    /// the grid.
    pub fn load_json(&mut self, text: &str) -> bool {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.load_value(&value),
            Err(e) => {
                warn!("persisted grid is not JSON ({e}), clearing");
                self.attempt_recovery(&Value::Null)
            }
        }
    }

    /// Puts back heights taken from this grid earlier. No notification.
    pub(crate) fn restore(&mut self, heights: Grid<f64>) {
        self.heights = heights;
        self.valid = true;
    }
}

fn parse_state(value: &Value) -> Result<GridState> {
    GridState::deserialize(value).map_err(|e| GridError::InvalidGrid(e.to_string()))
}
