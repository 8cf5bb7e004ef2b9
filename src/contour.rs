//! Groups the corners and stops of one cell by banded height and links each
//! group into a contour polyline.

use log::{debug, trace};
use serde::Serialize;

use crate::config::Settings;
use crate::error::{GridError, Result};
use crate::lut::{Corner, Diagonal, Edge, Side};
use crate::point::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PointSource {
    Corner { corner: Corner },
    Stop { edge: Edge, index: usize, t: f64 },
}

/// A corner or a stop, with its banded height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ContourPoint {
    #[serde(flatten)]
    pub source: PointSource,
    pub height: f64,
}

impl ContourPoint {
    #[inline]
    pub fn is_corner(&self) -> bool {
        matches!(self.source, PointSource::Corner { .. })
    }

    #[inline]
    pub fn is_on_diagonal(&self) -> bool {
        matches!(self.source, PointSource::Stop { edge, .. } if edge.is_diagonal())
    }

    /// Position inside the unit cell, y down.
    pub fn local_position(&self) -> Vec2 {
        match self.source {
            PointSource::Corner { corner } => corner.local_position(),
            PointSource::Stop { edge, t, .. } => edge.point_at(t),
        }
    }
}

/// 2 or 3 points of equal banded height inside one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContourLine {
    pub height: f64,
    pub points: Vec<ContourPoint>,
}

/// Where a height label goes: the longest segment of a line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub a: Vec2,
    pub b: Vec2,
    pub height: f64,
}

impl ContourLine {
    /// Longest segment in cell-local coordinates; the later segment wins
    /// ties.
    pub fn label_anchor(&self) -> Option<LabelAnchor> {
        let mut best: Option<(f64, Vec2, Vec2)> = None;
        for pair in self.points.windows(2) {
            let a = pair[0].local_position();
            let b = pair[1].local_position();
            let len = Vec2::distance(a, b);
            if best.is_none_or(|(l, _, _)| l <= len) {
                best = Some((len, a, b));
            }
        }
        best.map(|(_, a, b)| LabelAnchor {
            a,
            b,
            height: self.height,
        })
    }
}

/// Everything the assembler needs about one cell.
#[derive(Clone, Copy, Debug)]
pub struct CellData<'a> {
    /// Indexed by `Corner::index`.
    pub corners: [f64; 4],
    /// Indexed by `Side::index`.
    pub sides: [&'a [f64]; 4],
    pub diagonal: Diagonal,
    pub diagonal_stops: &'a [f64],
}

impl CellData<'_> {
    #[inline]
    pub fn corner(&self, c: Corner) -> f64 {
        self.corners[c.index()]
    }

    pub fn stops(&self, edge: Edge) -> Option<&[f64]> {
        match edge {
            Edge::Side(s) => Some(self.sides[s.index()]),
            Edge::Diagonal(d) if d == self.diagonal => Some(self.diagonal_stops),
            Edge::Diagonal(_) => None,
        }
    }

    /// Four sides in canonical order, then the active diagonal.
    pub fn edges(&self) -> [Edge; 5] {
        [
            Edge::Side(Side::Top),
            Edge::Side(Side::Bottom),
            Edge::Side(Side::Left),
            Edge::Side(Side::Right),
            Edge::Diagonal(self.diagonal),
        ]
    }
}

/// How heights are banded into groups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Banding {
    pub resolution: f64,
    pub step: f64,
    /// When set, corners further than this from a multiple of `step` are
    /// left out.
    pub corner_tolerance: Option<f64>,
}

impl Banding {
    pub fn new(settings: &Settings, snap_corners: bool) -> Self {
        Self {
            resolution: settings.grouping_resolution(),
            step: settings.step,
            corner_tolerance: snap_corners.then_some(settings.corner_tolerance),
        }
    }

    /// Height rounded to a whole number of resolution units. Stays a float
    /// so that heights far beyond the `i64` range keep distinct keys.
    #[inline]
    fn key(&self, height: f64) -> f64 {
        let key = (height / self.resolution).round();
        // -0.0 and 0.0 band together
        if key == 0.0 { 0.0 } else { key }
    }

    #[inline]
    fn banded(&self, key: f64) -> f64 {
        key * self.resolution
    }

    fn keeps_corner(&self, height: f64) -> bool {
        match self.corner_tolerance {
            Some(tol) => (height - (height / self.step).round() * self.step).abs() <= tol,
            None => true,
        }
    }
}

/// Corners first, then stops edge by edge, each with its raw height.
fn collect_points(cell: &CellData<'_>, banding: &Banding) -> Vec<(f64, PointSource)> {
    let mut points = Vec::new();
    for corner in Corner::ALL {
        let h = cell.corner(corner);
        if banding.keeps_corner(h) {
            points.push((h, PointSource::Corner { corner }));
        }
    }
    for edge in cell.edges() {
        let (ca, cb) = edge.corners();
        let (a, b) = (cell.corner(ca), cell.corner(cb));
        let stops = cell.stops(edge).unwrap_or_default();
        for (index, &t) in stops.iter().enumerate() {
            points.push((a + (b - a) * t, PointSource::Stop { edge, index, t }));
        }
    }
    points
}

/// Buckets points by banded height, buckets in first-encounter order.
pub fn group_by_height(cell: &CellData<'_>, banding: &Banding) -> Vec<Vec<ContourPoint>> {
    let mut groups: Vec<(u64, Vec<ContourPoint>)> = Vec::new();
    for (raw, source) in collect_points(cell, banding) {
        let key = banding.key(raw);
        let point = ContourPoint {
            source,
            height: banding.banded(key),
        };
        let bits = key.to_bits();
        match groups.iter_mut().find(|(k, _)| *k == bits) {
            Some((_, group)) => group.push(point),
            None => groups.push((bits, vec![point])),
        }
    }
    groups.into_iter().map(|(_, g)| g).collect()
}

/// The line a same-height group forms, if any.
///
/// Three corners and four points of one height are ambiguous and left
/// without a line.
pub fn line_from_group(group: &[ContourPoint]) -> Result<Option<ContourLine>> {
    let line = |points: Vec<ContourPoint>| ContourLine {
        height: points[0].height,
        points,
    };

    match group.len() {
        0 | 1 => Ok(None),
        2 => Ok(Some(line(group.to_vec()))),
        3 => {
            if group.iter().all(ContourPoint::is_corner) {
                return Ok(None);
            }
            let (middle, ends): (Vec<ContourPoint>, Vec<ContourPoint>) =
                group.iter().partition(|p| p.is_on_diagonal());
            if middle.len() != 1 {
                debug!(
                    "skipping 3-point group at {} with {} diagonal points",
                    group[0].height,
                    middle.len()
                );
                return Ok(None);
            }
            Ok(Some(line(vec![ends[0], middle[0], ends[1]])))
        }
        4 => Ok(None),
        n => Err(GridError::UnexpectedGroupSize(n)),
    }
}

/// All contour lines of one cell.
pub fn assemble_lines(cell: &CellData<'_>, banding: &Banding) -> Result<Vec<ContourLine>> {
    let groups = group_by_height(cell, banding);
    trace!("{} height groups", groups.len());
    let mut lines = Vec::new();
    for group in &groups {
        if let Some(line) = line_from_group(group)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const NONE: &[f64] = &[];

    fn banding(step: f64) -> Banding {
        Banding::new(
            &Settings {
                step,
                ..Settings::default()
            },
            false,
        )
    }

    fn corner(c: Corner, h: f64) -> ContourPoint {
        ContourPoint {
            source: PointSource::Corner { corner: c },
            height: h,
        }
    }

    fn stop(edge: impl Into<Edge>, t: f64, h: f64) -> ContourPoint {
        ContourPoint {
            source: PointSource::Stop {
                edge: edge.into(),
                index: 0,
                t,
            },
            height: h,
        }
    }

    #[test]
    fn singletons_make_no_line() {
        assert_eq!(line_from_group(&[]).unwrap(), None);
        assert_eq!(line_from_group(&[corner(Corner::TopLeft, 1.0)]).unwrap(), None);
    }

    #[test]
    fn pairs_make_one_segment() {
        let g = [stop(Side::Top, 0.5, 1.0), corner(Corner::BottomLeft, 1.0)];
        let line = line_from_group(&g).unwrap().unwrap();
        assert_eq!(line.points, g.to_vec());
        assert_eq!(line.height, 1.0);
    }

    #[test]
    fn triple_puts_diagonal_point_in_the_middle() {
        let d = stop(Diagonal::TopLeftBottomRight, 0.5, 1.0);
        let g = [stop(Side::Top, 0.5, 1.0), stop(Side::Right, 0.5, 1.0), d];
        let line = line_from_group(&g).unwrap().unwrap();
        assert_eq!(line.points, vec![g[0], d, g[1]]);
    }

    #[test]
    fn three_corners_and_four_points_stay_unresolved() {
        let corners = [
            corner(Corner::TopLeft, 0.0),
            corner(Corner::TopRight, 0.0),
            corner(Corner::BottomLeft, 0.0),
        ];
        assert_eq!(line_from_group(&corners).unwrap(), None);

        let four = [
            stop(Side::Top, 0.5, 1.0),
            stop(Side::Bottom, 0.5, 1.0),
            stop(Side::Left, 0.5, 1.0),
            stop(Side::Right, 0.5, 1.0),
        ];
        assert_eq!(line_from_group(&four).unwrap(), None);
    }

    #[test]
    fn triple_without_diagonal_point_is_skipped() {
        let g = [
            corner(Corner::TopLeft, 1.0),
            corner(Corner::TopRight, 1.0),
            stop(Side::Bottom, 0.5, 1.0),
        ];
        assert_eq!(line_from_group(&g).unwrap(), None);
    }

    #[test]
    fn five_points_are_an_internal_error() {
        let g = [stop(Side::Top, 0.5, 1.0); 5];
        assert_eq!(line_from_group(&g), Err(GridError::UnexpectedGroupSize(5)));
    }

    #[test]
    fn groups_follow_first_encounter_order() {
        let top = [0.5];
        let bottom = [0.5];
        let cell = CellData {
            corners: [0.0, 2.0, 0.0, 2.0],
            sides: [&top, &bottom, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: NONE,
        };
        let groups = group_by_height(&cell, &banding(1.0));
        let heights: Vec<f64> = groups.iter().map(|g| g[0].height).collect();
        assert_eq!(heights, vec![0.0, 2.0, 1.0]);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 2]);
    }

    #[test]
    fn sloped_cell_yields_lines_along_sides_and_through_middle() {
        let top = [0.5];
        let bottom = [0.5];
        let cell = CellData {
            corners: [0.0, 2.0, 0.0, 2.0],
            sides: [&top, &bottom, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: &[0.5],
        };
        // the diagonal stop joins the height-1 group, making it a triple
        let lines = assemble_lines(&cell, &banding(1.0)).unwrap();
        assert_eq!(lines.len(), 3);
        let mid = &lines[2];
        assert_eq!(mid.height, 1.0);
        assert!(mid.points[1].is_on_diagonal());
        let xs: Vec<Vec2> = mid.points.iter().map(ContourPoint::local_position).collect();
        assert_eq!(xs, vec![Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5), Vec2::new(0.5, 1.0)]);
    }

    #[test]
    fn off_step_corners_can_be_left_out() {
        let cell = CellData {
            corners: [0.3, 0.3, 0.0, 0.0],
            sides: [NONE, NONE, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: NONE,
        };
        let settings = Settings::default();
        let all = assemble_lines(&cell, &Banding::new(&settings, false)).unwrap();
        assert_eq!(all.len(), 2);
        let snapped = assemble_lines(&cell, &Banding::new(&settings, true)).unwrap();
        assert_eq!(snapped.len(), 1);
        assert_eq!(snapped[0].height, 0.0);
    }

    #[test]
    fn fine_steps_keep_adjacent_levels_apart() {
        // 0.001 apart rounds together at two decimals
        let top: Vec<f64> = (1..10).map(|k| k as f64 / 10.0).collect();
        let cell = CellData {
            corners: [0.0, 0.01, 0.0, 0.0],
            sides: [&top, NONE, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: NONE,
        };
        let groups = group_by_height(&cell, &banding(0.001));
        assert!(groups.iter().all(|g| g.len() <= 3), "{groups:?}");
        assert!(assemble_lines(&cell, &banding(0.001)).is_ok());
    }

    #[test]
    fn irrational_step_groups_each_level_once() {
        let step = std::f64::consts::PI / 10.0;
        let top = crate::subdivide::stops_between(0.0, 1.0, step, 100).unwrap();
        let bottom = crate::subdivide::stops_between(0.0, 1.0, step, 100).unwrap();
        let cell = CellData {
            corners: [0.0, 1.0, 0.0, 1.0],
            sides: [&top, &bottom, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: NONE,
        };
        let lines = assemble_lines(&cell, &Banding::new(&Settings { step, ..Settings::default() }, true))
            .unwrap();
        // three levels, each a vertical segment from top to bottom
        let levels: Vec<_> = lines.iter().filter(|l| l.points.iter().all(|p| !p.is_corner())).collect();
        assert_eq!(levels.len(), 3);
        for l in levels {
            assert_eq!(l.points.len(), 2);
        }
    }

    #[test]
    fn huge_heights_keep_levels_apart() {
        let step = 1e16;
        let top = crate::subdivide::stops_between(1e17, 2e17, step, 100).unwrap();
        let cell = CellData {
            corners: [1e17, 2e17, 1e17, 2e17],
            sides: [&top, &top, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: &top,
        };
        let groups = group_by_height(&cell, &banding(step));
        // two corner levels plus nine interior levels of three stops each
        assert_eq!(groups.len(), 11);
        assert!(groups.iter().all(|g| g.len() <= 3), "{groups:?}");
        let lines = assemble_lines(&cell, &banding(step)).unwrap();
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn negative_zero_bands_with_zero() {
        let cell = CellData {
            corners: [-0.0, 0.0, 1.0, 1.0],
            sides: [NONE, NONE, NONE, NONE],
            diagonal: Diagonal::TopLeftBottomRight,
            diagonal_stops: NONE,
        };
        let groups = group_by_height(&cell, &banding(1.0));
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2]);
    }

    #[test]
    fn label_anchor_takes_the_longest_segment() {
        let line = ContourLine {
            height: 1.0,
            points: vec![
                stop(Side::Top, 0.9, 1.0),
                stop(Diagonal::TopLeftBottomRight, 0.5, 1.0),
                stop(Side::Left, 0.75, 1.0),
            ],
        };
        let anchor = line.label_anchor().unwrap();
        assert_eq!(anchor.a, Vec2::new(0.9, 0.0));
        assert_eq!(anchor.b, Vec2::new(0.5, 0.5));
        assert_eq!(anchor.height, 1.0);
    }

    #[test]
    fn label_anchor_prefers_later_segment_on_ties() {
        let line = ContourLine {
            height: 2.0,
            points: vec![
                stop(Side::Top, 0.5, 2.0),
                stop(Diagonal::TopLeftBottomRight, 0.5, 2.0),
                stop(Side::Bottom, 0.5, 2.0),
            ],
        };
        let anchor = line.label_anchor().unwrap();
        assert_eq!(anchor.a, Vec2::new(0.5, 0.5));
        assert_eq!(anchor.b, Vec2::new(0.5, 1.0));
        assert_eq!(ContourLine { height: 0.0, points: vec![] }.label_anchor(), None);
    }
}
