use crate::config::{Settings, validate_step};
use crate::error::{GridError, Result};

/// Stops closer than this to a corner duplicate the corner itself.
pub const EDGE_EPSILON: f64 = 1e-5;

/// Normalized positions `t ∈ (0, 1)` of every multiple of `step` strictly
/// between `height_a` and `height_b`.
///
/// `t` is measured from `height_a` toward `height_b`, so the sequence is
/// increasing whichever endpoint is larger. More than `max_stops` stops, or a
/// step too small to move a height of this magnitude, is `InvalidArgument`.
pub fn stops_between(height_a: f64, height_b: f64, step: f64, max_stops: usize) -> Result<Vec<f64>> {
    validate_step(step)?;

    let flipped = height_a > height_b;
    let a = height_a.min(height_b);
    let b = height_a.max(height_b);
    if a == b {
        return Ok(Vec::new());
    }

    let magnitude = a.abs().max(b.abs());
    if magnitude + step == magnitude {
        return Err(GridError::InvalidArgument(format!(
            "step {step} is below the float resolution at height {magnitude}"
        )));
    }
    let span = b - a;
    let count = (span / step).ceil();
    if count > max_stops as f64 {
        return Err(GridError::InvalidArgument(format!(
            "step {step} puts about {count} stops between {a} and {b}, limit is {max_stops}"
        )));
    }

    let mut first = (a / step).floor() * step;
    if first <= a {
        first += step;
    }

    let mut stops: Vec<f64> = (0..)
        .map(|k| first + k as f64 * step)
        .take_while(|&p| p < b)
        .map(|p| (p - a) / span)
        .collect();

    if flipped {
        stops.reverse();
        for t in &mut stops {
            *t = 1.0 - *t;
        }
    }
    // near the float resolution neighbouring multiples can round together
    stops.retain(|&t| t > 0.0 && t < 1.0);
    stops.dedup_by(|later, earlier| *later <= *earlier);
    Ok(stops)
}

/// `stops_between` without stops within `settings.edge_epsilon` of either
/// corner.
pub fn contour_stops_between(height_a: f64, height_b: f64, settings: &Settings) -> Result<Vec<f64>> {
    let epsilon = settings.edge_epsilon;
    let mut stops = stops_between(height_a, height_b, settings.step, settings.max_stops_per_edge)?;
    stops.retain(|&t| t > epsilon && t < 1.0 - epsilon);
    Ok(stops)
}

/// Lengths between consecutive stops along an edge, both ends included, as
/// fractions of the edge. Always one more entry than `stops`.
pub fn edge_spans(stops: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    let mut spans = Vec::with_capacity(stops.len() + 1);
    for &t in stops {
        spans.push(t - prev);
        prev = t;
    }
    spans.push(1.0 - prev);
    spans
}
