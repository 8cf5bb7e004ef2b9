use std::cell::RefCell;
use std::rc::Rc;

use heightlines::compute::{ComputedCellWindow, ComputedScalarGrid};
use heightlines::config::Settings;
use heightlines::lut::{Corner, Diagonal, Direction, Side};
use heightlines::persist::GridState;
use heightlines::point::Point;
use heightlines::scalar::{GridEvent, ScalarGrid};
use heightlines::window::CellWindow;
use heightlines::GridError;
use test_log::test;

fn state(rows: Vec<Vec<f64>>) -> GridState {
    GridState {
        width: rows[0].len(),
        height: rows.len(),
        data: rows,
    }
}

fn three_by_three() -> ScalarGrid {
    ScalarGrid::from_state(&state(vec![
        vec![0.0, 1.0, 2.0],
        vec![1.0, 2.0, 3.0],
        vec![2.0, 3.0, 4.0],
    ]))
    .unwrap()
}

#[test]
fn sloped_cell_stops_and_diagonal() {
    let settings = Settings {
        step: 1.0,
        ..Settings::default()
    };
    let grid = ComputedScalarGrid::from_state(&state(vec![vec![0.0, 2.0], vec![0.0, 2.0]]), settings)
        .unwrap();
    let cell = Point::ZERO;
    assert_eq!(grid.stops_for(cell, Side::Top.into()), Ok(&[0.5][..]));
    assert_eq!(grid.stops_for(cell, Side::Bottom.into()), Ok(&[0.5][..]));
    assert!(grid.stops_for(cell, Side::Left.into()).unwrap().is_empty());
    assert!(grid.stops_for(cell, Side::Right.into()).unwrap().is_empty());
    assert_eq!(grid.diagonal_of(cell), Ok(Diagonal::TopLeftBottomRight));
    assert_eq!(grid.edges_of(cell).unwrap()[4], Diagonal::TopLeftBottomRight.into());
}

#[test]
fn unlocked_move_off_the_right_edge_expands() {
    let mut grid = three_by_three();
    let mut window = CellWindow::at(&mut grid, Point::new(1, 1)).unwrap();
    window.offset_by(Direction::Right).unwrap();
    assert_eq!(window.position(), Point::new(2, 1));
    assert_eq!(window.corners(), Ok([3.0, 0.0, 4.0, 0.0]));
    drop(window);
    assert_eq!((grid.width(), grid.height()), (4, 3));
}

#[test]
fn locked_move_off_the_right_edge_fails() {
    let mut grid = three_by_three();
    grid.set_expansion_locked(true);
    let before = grid.state();
    let mut window = CellWindow::at(&mut grid, Point::new(1, 1)).unwrap();
    assert_eq!(
        window.offset_by(Direction::Right),
        Err(GridError::OutOfBounds(Point::new(2, 1)))
    );
    assert_eq!(window.position(), Point::new(1, 1));
    drop(window);
    assert_eq!(grid.state(), before);
}

#[test]
fn computed_window_edits_reach_the_grid_caches() {
    let mut grid = ComputedScalarGrid::new(three_by_three(), Settings::default()).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&events);
    grid.subscribe(move |ev| e.borrow_mut().push(ev.clone()));

    let mut window = ComputedCellWindow::at(&mut grid, Point::new(1, 1), Settings::default()).unwrap();
    window.set(Corner::BottomRight, 0.0).unwrap();
    window.offset_by(Direction::Down).unwrap();
    let position = window.into_position();
    assert_eq!(position, Point::new(1, 2));

    assert_eq!(grid.height(), 4);
    assert_eq!(grid.get(Point::new(2, 2)), Ok(0.0));
    // 3.0 -> 0.0 along the bottom of cell (1, 1)
    assert_eq!(
        grid.stops_for(Point::new(1, 1), Side::Bottom.into())
            .map(<[f64]>::len),
        Ok(5)
    );
    assert_eq!(
        *events.borrow(),
        vec![
            GridEvent::HeightSet {
                pos: Point::new(2, 2),
                height: 0.0
            },
            GridEvent::Expanded {
                amount: Point::new(0, 1)
            },
        ]
    );
}

#[test]
fn persisted_state_round_trips_through_the_computed_grid() {
    let grid = ComputedScalarGrid::new(three_by_three(), Settings::default()).unwrap();
    let text = serde_json::to_string(&grid.state()).unwrap();
    let parsed: GridState = serde_json::from_str(&text).unwrap();
    let reloaded = ComputedScalarGrid::from_state(&parsed, Settings::default()).unwrap();
    assert_eq!(reloaded.grid(), grid.grid());
    assert_eq!(reloaded.diagonals(), grid.diagonals());
    assert_eq!(reloaded.stops_for_all_sides(), grid.stops_for_all_sides());
}

#[test]
fn every_edge_of_a_larger_grid_is_listed_once() {
    let rows: Vec<Vec<f64>> = (0..5)
        .map(|y| (0..6).map(|x| ((x * 7 + y * 3) % 5) as f64 * 0.7).collect())
        .collect();
    let grid = ComputedScalarGrid::from_state(&state(rows), Settings::default()).unwrap();
    let all = grid.stops_for_all_sides();
    // 5x4 cells: 3 per cell, plus 4 right sides and 5 bottoms
    assert_eq!(all.len(), 20 * 3 + 4 + 5);
    assert_eq!(all.iter().filter(|e| e.edge.is_diagonal()).count(), 20);
}
