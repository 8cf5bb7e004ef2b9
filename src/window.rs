use log::debug;

use crate::error::{GridError, Result};
use crate::field::HeightField;
use crate::lut::{Corner, Direction};
use crate::observer::{Observers, SubscriptionId};
use crate::point::Point;

#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
    Moved { from: Point, to: Point, expanded: bool },
    Reset,
    HeightSet { corner: Corner, height: f64 },
    StepChanged { step: f64 },
}

/// Single-cell cursor over a height field, for focused editing.
///
/// Borrows the field; the position is the cell's top-left corner.
#[derive(Debug)]
pub struct CellWindow<'g, F: HeightField + ?Sized> {
    field: &'g mut F,
    position: Point,
    observers: Observers<WindowEvent>,
}

impl<'g, F: HeightField + ?Sized> CellWindow<'g, F> {
    /// Window over cell (0, 0).
    pub fn new(field: &'g mut F) -> Result<Self> {
        Self::at(field, Point::ZERO)
    }

    pub fn at(field: &'g mut F, position: Point) -> Result<Self> {
        if !field.is_valid() {
            return Err(GridError::InvalidGrid("window over an invalid grid".into()));
        }
        if !field.is_valid_cell(position) {
            return Err(GridError::OutOfBounds(position));
        }
        Ok(Self {
            field,
            position,
            observers: Observers::new(),
        })
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    #[inline]
    pub fn field(&self) -> &F {
        &*self.field
    }

    /// Releases the field, keeping the position for a later `at`.
    pub fn into_position(self) -> Point {
        self.position
    }

    /// Puts the cursor back without notifying.
    pub(crate) fn restore_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn is_valid(&self) -> bool {
        self.field.is_valid() && self.field.is_valid_cell(self.position)
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&WindowEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn reset(&mut self) {
        self.position = Point::ZERO;
        self.observers.notify(&WindowEvent::Reset);
    }

    pub fn get(&self, corner: Corner) -> Result<f64> {
        self.field.get_corner_of(self.position, corner)
    }

    pub fn set(&mut self, corner: Corner, height: f64) -> Result<()> {
        self.field.set_corner_of(self.position, corner, height)?;
        self.observers
            .notify(&WindowEvent::HeightSet { corner, height });
        Ok(())
    }

    /// Corner heights indexed by `Corner::index`.
    pub fn corners(&self) -> Result<[f64; 4]> {
        let mut out = [0.0; 4];
        for c in Corner::ALL {
            out[c.index()] = self.get(c)?;
        }
        Ok(out)
    }

    /// True if the neighbouring cell exists without growing the field.
    pub fn can_offset_by(&self, direction: Direction) -> bool {
        self.field
            .is_valid_cell(self.position + direction.offset())
    }

    /// True if `offset_by` would succeed, growing the field if needed.
    pub fn can_move(&self, direction: Direction) -> bool {
        !self.field.is_expansion_locked() || self.can_offset_by(direction)
    }

    /// Moves one cell. Past the edge the field grows first, unless expansion
    /// is locked, in which case nothing changes and the move fails.
    pub fn offset_by(&mut self, direction: Direction) -> Result<()> {
        let from = self.position;
        let target = from + direction.offset();

        if self.field.is_valid_cell(target) {
            self.position = target;
            self.observers.notify(&WindowEvent::Moved {
                from,
                to: target,
                expanded: false,
            });
            return Ok(());
        }

        if self.field.is_expansion_locked() {
            return Err(GridError::OutOfBounds(target));
        }

        let amount = self.expansion_to_reach(target);
        self.field.expand_by(amount)?;

        // growth on the left/top shifts the old cells, so the target lands on 0
        let to = Point::new(target.x.max(0), target.y.max(0));
        if !self.field.is_valid_cell(to) {
            return Err(GridError::InvalidGrid(format!(
                "expanding by {amount} did not make cell {to} valid"
            )));
        }
        debug!("window moved {from} -> {to} after expanding by {amount}");

        self.position = to;
        self.observers.notify(&WindowEvent::Moved {
            from,
            to,
            expanded: true,
        });
        Ok(())
    }

    /// Smallest signed expansion that makes `cell` a valid cell.
    fn expansion_to_reach(&self, cell: Point) -> Point {
        let overshoot = |v: i32, cells: usize| {
            let last = cells as i32 - 1;
            if v < 0 {
                v
            } else if v > last {
                v - last
            } else {
                0
            }
        };
        Point::new(
            overshoot(cell.x, self.field.width() - 1),
            overshoot(cell.y, self.field.height() - 1),
        )
    }
}
