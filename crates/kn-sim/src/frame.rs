//! Renderer-facing frame data and the [`FrameSink`] seam.

use kn_core::{Mode, Point2D, Timestamp};
use kn_index::IndexAdapter;

use crate::QueryResult;

/// Overlay colours, cycled over nodes in pre-order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    Purple,
    Brown,
    Black,
}

impl PaletteColor {
    pub const CYCLE: [PaletteColor; 3] = [PaletteColor::Purple, PaletteColor::Brown, PaletteColor::Black];

    pub fn for_index(i: usize) -> Self {
        Self::CYCLE[i % Self::CYCLE.len()]
    }
}

/// One tree node's rectangle, ready to outline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OverlayRect {
    pub depth: usize,
    pub min:   Point2D,
    pub max:   Point2D,
    pub color: PaletteColor,
}

/// Node rectangles of the live index at `now`, root first.
///
/// Moving-mode bounds are extrapolated to `now`; they may extend past the
/// unit square.
pub fn grid_overlay(index: &IndexAdapter, now: Timestamp) -> Vec<OverlayRect> {
    index
        .node_rects(now)
        .into_iter()
        .enumerate()
        .map(|(i, r)| OverlayRect {
            depth: r.depth,
            min:   r.min,
            max:   r.max,
            color: PaletteColor::for_index(i),
        })
        .collect()
}

/// One rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub now:       Timestamp,
    pub mode:      Mode,
    pub reference: Point2D,
    /// Normalised; negative means unbounded.
    pub threshold: f64,
    pub result:    QueryResult,
    /// Present only when the grid is switched on.
    pub overlay:   Option<Vec<OverlayRect>>,
}

/// Destination for rendered frames.
pub trait FrameSink {
    fn on_frame(&mut self, _frame: &Frame) {}
}

/// A [`FrameSink`] that discards everything.
pub struct NoopSink;

impl FrameSink for NoopSink {}
