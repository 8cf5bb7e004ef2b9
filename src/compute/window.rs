use log::{debug, warn};

use super::{CacheState, CellContours, contour_cell, edge_stops};
use crate::config::{Settings, validate_step};
use crate::contour::{Banding, ContourLine};
use crate::error::{GridError, Result};
use crate::field::HeightField;
use crate::lut::{Corner, Diagonal, Direction, Edge, Side};
use crate::observer::{Observers, SubscriptionId};
use crate::point::Point;
use crate::window::{CellWindow, WindowEvent};

#[derive(Clone, Debug, Default, PartialEq)]
struct CellCache {
    /// Indexed by `Side::index`.
    sides: [Vec<f64>; 4],
    contours: CellContours,
}

impl CellCache {
    /// Every corner takes part in grouping here, on-step or not.
    fn build(corners: [f64; 4], settings: &Settings) -> Result<Self> {
        let mut sides: [Vec<f64>; 4] = Default::default();
        for side in Side::ALL {
            let (a, b) = side.corners();
            sides[side.index()] = edge_stops(corners[a.index()], corners[b.index()], settings)?;
        }
        let banding = Banding::new(settings, false);
        let contours = contour_cell(corners, sides.each_ref().map(Vec::as_slice), settings, &banding)?;
        Ok(Self { sides, contours })
    }
}

/// `CellWindow` that recomputes its one cell after every change.
///
/// Nothing is shared with neighbouring cells. A change whose recompute
/// fails is undone, except that a grid expansion made by a move stays.
///
/// Over a field that contours itself the window starts at the field's step,
/// so both band the cell alike. `set_step` afterwards changes only the
/// window.
#[derive(Debug)]
pub struct ComputedCellWindow<'g, F: HeightField + ?Sized> {
    window: CellWindow<'g, F>,
    settings: Settings,
    cache: CellCache,
    state: CacheState,
    observers: Observers<WindowEvent>,
}

impl<'g, F: HeightField + ?Sized> ComputedCellWindow<'g, F> {
    pub fn new(field: &'g mut F, settings: Settings) -> Result<Self> {
        Self::at(field, Point::ZERO, settings)
    }

    pub fn at(field: &'g mut F, position: Point, mut settings: Settings) -> Result<Self> {
        if let Some(step) = field.contour_step() {
            settings.step = step;
        }
        settings.validate()?;
        let mut computed = Self {
            window: CellWindow::at(field, position)?,
            settings,
            cache: CellCache::default(),
            state: CacheState::Stale,
            observers: Observers::new(),
        };
        computed.recompute()?;
        Ok(computed)
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.window.position()
    }

    pub fn field(&self) -> &F {
        self.window.field()
    }

    pub fn into_position(self) -> Point {
        self.window.into_position()
    }

    #[inline]
    pub fn cache_state(&self) -> CacheState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.window.is_valid()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&WindowEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn get(&self, corner: Corner) -> Result<f64> {
        self.window.get(corner)
    }

    pub fn corners(&self) -> Result<[f64; 4]> {
        self.window.corners()
    }

    pub fn can_offset_by(&self, direction: Direction) -> bool {
        self.window.can_offset_by(direction)
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        self.window.can_move(direction)
    }

    pub fn set(&mut self, corner: Corner, height: f64) -> Result<()> {
        let previous = self.window.get(corner)?;
        self.window.set(corner, height)?;
        if let Err(e) = self.recompute() {
            warn!("corner {corner} = {height} cannot be contoured ({e}), restoring {previous}");
            self.window.set(corner, previous)?;
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers
            .notify(&WindowEvent::HeightSet { corner, height });
        Ok(())
    }

    /// Moves one cell, growing the field past its edge when allowed.
    pub fn offset_by(&mut self, direction: Direction) -> Result<()> {
        let from = self.window.position();
        let size = (self.field().width(), self.field().height());
        self.window.offset_by(direction)?;
        let expanded = size != (self.field().width(), self.field().height());

        if let Err(e) = self.recompute() {
            warn!("cell at {} cannot be contoured ({e}), moving back", self.position());
            // growth on the left/top shifted the old cell
            let shift = Point::new(
                i32::from(direction == Direction::Left && from.x == 0),
                i32::from(direction == Direction::Up && from.y == 0),
            );
            self.window.restore_position(from + shift);
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers.notify(&WindowEvent::Moved {
            from,
            to: self.position(),
            expanded,
        });
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        let from = self.window.position();
        self.window.reset();
        if let Err(e) = self.recompute() {
            self.window.restore_position(from);
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers.notify(&WindowEvent::Reset);
        Ok(())
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.settings.step
    }

    pub fn set_step(&mut self, step: f64) -> Result<()> {
        validate_step(step)?;
        let previous = self.settings.step;
        self.settings.step = step;
        if let Err(e) = self.recompute() {
            self.settings.step = previous;
            self.state = CacheState::Fresh;
            return Err(e);
        }
        self.observers.notify(&WindowEvent::StepChanged { step });
        Ok(())
    }

    fn recompute(&mut self) -> Result<()> {
        self.state = CacheState::Recomputing;
        let built = self
            .window
            .corners()
            .and_then(|corners| CellCache::build(corners, &self.settings));
        match built {
            Ok(cache) => {
                self.cache = cache;
                self.state = CacheState::Fresh;
                debug!(
                    "recomputed cell {}: {:?}, {} lines",
                    self.position(),
                    self.cache.contours.diagonal,
                    self.cache.contours.lines.len()
                );
                Ok(())
            }
            Err(e) => {
                self.state = CacheState::Stale;
                Err(e)
            }
        }
    }

    pub fn diagonal(&self) -> Diagonal {
        self.cache.contours.diagonal
    }

    /// Four sides in canonical order, then the active diagonal.
    pub fn edges(&self) -> [Edge; 5] {
        [
            Side::Top.into(),
            Side::Bottom.into(),
            Side::Left.into(),
            Side::Right.into(),
            self.diagonal().into(),
        ]
    }

    pub fn stops_for(&self, edge: Edge) -> Result<&[f64]> {
        match edge {
            Edge::Side(side) => Ok(&self.cache.sides[side.index()]),
            Edge::Diagonal(d) if d == self.diagonal() => Ok(&self.cache.contours.diagonal_stops),
            Edge::Diagonal(d) => Err(GridError::InvalidArgument(format!(
                "{d:?} is not the active diagonal of cell {}",
                self.position()
            ))),
        }
    }

    pub fn height_lines(&self) -> &[ContourLine] {
        &self.cache.contours.lines
    }
}
