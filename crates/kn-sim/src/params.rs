//! User-facing query parameters and canvas geometry.

use kn_core::Point2D;
use tracing::debug;

/// Which text inputs failed to parse in the last
/// [`QueryParams::update_from_text`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamValidity {
    pub num_neighbours_ok:     bool,
    pub distance_threshold_ok: bool,
}

impl ParamValidity {
    pub fn all_ok(self) -> bool {
        self.num_neighbours_ok && self.distance_threshold_ok
    }
}

/// Neighbour count and distance threshold as the user entered them.
///
/// `distance_threshold` is in pixels; negative means no cutoff.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QueryParams {
    pub num_neighbours:     u32,
    pub distance_threshold: f64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self { num_neighbours: 10, distance_threshold: 50.0 }
    }
}

impl QueryParams {
    /// Parse both inputs.  A field that does not parse keeps its last good
    /// value and is flagged in the returned [`ParamValidity`].
    pub fn update_from_text(&mut self, num_neighbours: &str, distance_threshold: &str) -> ParamValidity {
        let mut validity = ParamValidity::default();

        if let Ok(k) = num_neighbours.trim().parse::<u32>() {
            self.num_neighbours = k;
            validity.num_neighbours_ok = true;
        }
        match distance_threshold.trim().parse::<f64>() {
            Ok(t) if !t.is_nan() => {
                self.distance_threshold = t;
                validity.distance_threshold_ok = true;
            }
            _ => {}
        }

        if !validity.all_ok() {
            debug!(?validity, kept = ?self, "rejected query parameter input");
        }
        validity
    }

    /// Threshold in normalised units for a canvas `width` pixels wide.
    pub fn normalized_threshold(&self, width: f64) -> f64 {
        self.distance_threshold / width.max(1.0)
    }
}

/// Pixel dimensions of the drawing surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Canvas {
    pub width:  f64,
    pub height: f64,
}

impl Canvas {
    /// Dimensions below one pixel (or NaN) are clamped to one.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width: width.max(1.0), height: height.max(1.0) }
    }

    /// Pixel position → normalised `[0,1]²` coordinates.
    pub fn normalize(&self, px: f64, py: f64) -> Point2D {
        Point2D::new(px / self.width, py / self.height)
    }

    /// Normalised coordinates → pixel position.
    pub fn denormalize(&self, p: Point2D) -> (f64, f64) {
        (p.x * self.width, p.y * self.height)
    }
}
