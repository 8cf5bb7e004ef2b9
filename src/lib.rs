pub mod compute;
pub mod config;
pub mod contour;
pub mod diagonal;
pub mod error;
pub mod field;
pub mod grid;
pub mod lut;
pub mod observer;
pub mod persist;
pub mod point;
pub mod report;
pub mod scalar;
pub mod subdivide;
pub mod window;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use compute::ComputedScalarGrid;
use config::Settings;
use error::Result;
use report::Report;
use scalar::{GridEvent, ScalarGrid};

pub use error::GridError;

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Loads a persisted grid (recovering it if damaged), contours it and
/// returns the report with per-stage timings.
pub fn contour(value: &Value, settings: &Settings) -> Result<(Report, Vec<Timing>)> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Load, falling back to recovery
    let t = Instant::now();
    let mut grid = ScalarGrid::new();
    let recovered = Rc::new(Cell::new(false));
    let flag = Rc::clone(&recovered);
    let id = grid.subscribe(move |ev| {
        if matches!(ev, GridEvent::Recovered { .. }) {
            flag.set(true);
        }
    });
    grid.load_value(value);
    grid.unsubscribe(id);
    timings.push(Timing {
        name: "load",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Stops, diagonals and lines
    let t = Instant::now();
    let computed = ComputedScalarGrid::new(grid, settings.clone())?;
    timings.push(Timing {
        name: "compute",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 3. Report
    let t = Instant::now();
    let report = Report::new(&computed, recovered.get());
    timings.push(Timing {
        name: "report",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    Ok((report, timings))
}
