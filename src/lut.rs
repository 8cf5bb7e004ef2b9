//! Fixed lookup tables: corners, sides, diagonals, directions and the
//! side-ordering → diagonal table used by the diagonal heuristic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::point::{Point, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Offset of this corner from the cell's top-left corner.
    #[inline]
    pub const fn offset(self) -> Point {
        match self {
            Corner::TopLeft => Point::new(0, 0),
            Corner::TopRight => Point::new(1, 0),
            Corner::BottomLeft => Point::new(0, 1),
            Corner::BottomRight => Point::new(1, 1),
        }
    }

    #[inline]
    pub fn local_position(self) -> Vec2 {
        self.offset().as_vec2()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Corner {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Corner::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| GridError::InvalidArgument(format!("unknown corner `{s}`")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Canonical order. Also the tie-break order of the diagonal heuristic.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    #[inline]
    pub const fn corners(self) -> (Corner, Corner) {
        match self {
            Side::Top => (Corner::TopLeft, Corner::TopRight),
            Side::Bottom => (Corner::BottomLeft, Corner::BottomRight),
            Side::Left => (Corner::TopLeft, Corner::BottomLeft),
            Side::Right => (Corner::TopRight, Corner::BottomRight),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagonal {
    /// Top-left to bottom-right.
    #[default]
    TopLeftBottomRight,
    /// Bottom-left to top-right.
    BottomLeftTopRight,
}

impl Diagonal {
    pub const ALL: [Diagonal; 2] = [Diagonal::TopLeftBottomRight, Diagonal::BottomLeftTopRight];

    #[inline]
    pub const fn corners(self) -> (Corner, Corner) {
        match self {
            Diagonal::TopLeftBottomRight => (Corner::TopLeft, Corner::BottomRight),
            Diagonal::BottomLeftTopRight => (Corner::BottomLeft, Corner::TopRight),
        }
    }
}

/// Anything stops can lie on: one of the four sides or one of the diagonals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Side(Side),
    Diagonal(Diagonal),
}

impl Edge {
    #[inline]
    pub const fn corners(self) -> (Corner, Corner) {
        match self {
            Edge::Side(s) => s.corners(),
            Edge::Diagonal(d) => d.corners(),
        }
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Edge::Diagonal(_))
    }

    /// Cell-local position of the point at `t` along this edge.
    #[inline]
    pub fn point_at(self, t: f64) -> Vec2 {
        let (a, b) = self.corners();
        Vec2::lerp(a.local_position(), b.local_position(), t)
    }
}

impl From<Side> for Edge {
    fn from(s: Side) -> Self {
        Edge::Side(s)
    }
}

impl From<Diagonal> for Edge {
    fn from(d: Diagonal) -> Self {
        Edge::Diagonal(d)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit offset; y grows downwards.
    #[inline]
    pub const fn offset(self) -> Point {
        match self {
            Direction::Up => Point::new(0, -1),
            Direction::Down => Point::new(0, 1),
            Direction::Left => Point::new(-1, 0),
            Direction::Right => Point::new(1, 0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| GridError::InvalidArgument(format!("unknown direction `{s}`")))
    }
}

use Diagonal::{BottomLeftTopRight as BLTR, TopLeftBottomRight as TLBR};
use Side::{Bottom as B, Left as L, Right as R, Top as T};

/// Sides sorted by descending stop count → active diagonal.
/// One entry per permutation of the four sides. Several entries are
/// tie-break judgment calls; do not derive.
pub const DIAGONAL_TABLE: [([Side; 4], Diagonal); 24] = [
    ([T, B, L, R], TLBR), // opposite sides have the most points
    ([B, T, L, R], BLTR), // opposite sides have the most points
    ([L, T, B, R], TLBR),
    ([T, L, B, R], TLBR),
    ([B, L, T, R], BLTR),
    ([L, B, T, R], BLTR),
    ([L, B, R, T], BLTR),
    ([B, L, R, T], BLTR),
    ([R, L, B, T], TLBR), // opposite sides have the most points
    ([L, R, B, T], BLTR), // opposite sides have the most points
    ([B, R, L, T], TLBR),
    ([R, B, L, T], TLBR),
    ([R, T, L, B], BLTR),
    ([T, R, L, B], BLTR),
    ([L, R, T, B], TLBR), // opposite sides have the most points
    ([R, L, T, B], BLTR), // opposite sides have the most points
    ([T, L, R, B], TLBR),
    ([L, T, R, B], TLBR),
    ([B, T, R, L], TLBR), // opposite sides have the most points
    ([T, B, R, L], BLTR), // opposite sides have the most points
    ([R, B, T, L], TLBR),
    ([B, R, T, L], TLBR),
    ([T, R, B, L], BLTR),
    ([R, T, B, L], BLTR),
];

/// Table lookup. None only for an ordering that is not a permutation.
pub fn lookup_diagonal(order: [Side; 4]) -> Option<Diagonal> {
    DIAGONAL_TABLE
        .iter()
        .find(|(key, _)| *key == order)
        .map(|&(_, d)| d)
}
