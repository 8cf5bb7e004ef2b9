use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::subdivide::EDGE_EPSILON;

/// All tunable parameters of the contour computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Height increment between bands.
    pub step: f64,

    // Grouping
    /// Decimal places heights are banded to when grouping contour points.
    pub grouping_decimals: u32,
    /// Whole-grid corners further than this from a step multiple do not
    /// take part in contour lines.
    pub corner_tolerance: f64,
    /// Stops closer than this to either end of an edge are dropped.
    pub edge_epsilon: f64,
    /// Edges that would carry more stops than this are rejected, which keeps
    /// every recompute bounded.
    pub max_stops_per_edge: usize,

    // Editing
    pub expansion_locked: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step: 0.5,
            grouping_decimals: 2,
            corner_tolerance: 0.001,
            edge_epsilon: EDGE_EPSILON,
            max_stops_per_edge: 10_000,
            expansion_locked: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        validate_step(self.step)?;
        if !(self.corner_tolerance.is_finite() && self.corner_tolerance >= 0.0) {
            return Err(GridError::InvalidArgument(format!(
                "corner tolerance must be finite and non-negative, got {}",
                self.corner_tolerance
            )));
        }
        if !(self.edge_epsilon.is_finite() && (0.0..0.5).contains(&self.edge_epsilon)) {
            return Err(GridError::InvalidArgument(format!(
                "edge epsilon must lie in [0, 0.5), got {}",
                self.edge_epsilon
            )));
        }
        if self.max_stops_per_edge == 0 {
            return Err(GridError::InvalidArgument(
                "max stops per edge must be positive".to_string(),
            ));
        }
        if self.grouping_decimals > 12 {
            return Err(GridError::InvalidArgument(format!(
                "grouping decimals must be at most 12, got {}",
                self.grouping_decimals
            )));
        }
        Ok(())
    }

    /// Resolution heights are banded to: the decimal granularity, refined to
    /// a tenth of the step when the step is finer than that.
    pub fn grouping_resolution(&self) -> f64 {
        let decimal = 10f64.powi(-(self.grouping_decimals as i32));
        decimal.min(self.step / 10.0)
    }
}

pub fn validate_step(step: f64) -> Result<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidArgument(format!(
            "step must be finite and positive, got {step}"
        )))
    }
}
