//! `QueryEngine` — per-frame k-NN query and matched/unmatched partition.

use rustc_hash::FxHashSet;
use tracing::trace;

use kn_core::{Point2D, PointId, Timestamp};
use kn_index::IndexAdapter;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::frame::{Frame, grid_overlay};
use crate::{Canvas, QueryParams, SharedIndex};

/// A point's current position, ready to draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DisplayPoint {
    pub id:       PointId,
    pub position: Point2D,
}

/// The two partitions a renderer draws.
///
/// `matched` is nearest first; `unmatched` is ordered by id.  Points whose
/// current position lies outside the unit square appear in neither.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub matched:   Vec<DisplayPoint>,
    pub unmatched: Vec<DisplayPoint>,
}

impl QueryResult {
    pub fn visible(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

/// Stateless query front end.  Never mutates the index.
pub struct QueryEngine;

impl QueryEngine {
    /// Partition every live point around `reference` at `now`.
    ///
    /// `threshold` is in normalised units.  Negative or NaN means no cutoff;
    /// otherwise hits must lie within `threshold` (inclusive).
    pub fn query(
        index:     &IndexAdapter,
        reference: Point2D,
        k:         u32,
        threshold: f64,
        now:       Timestamp,
    ) -> QueryResult {
        let cutoff = (threshold >= 0.0).then(|| threshold * threshold);
        let hits = index.nearest(reference, k as usize, cutoff, now);

        let matched_ids: FxHashSet<PointId> = hits.iter().map(|m| m.id).collect();
        let matched: Vec<DisplayPoint> = hits
            .iter()
            .filter_map(|m| visible(m.id, m.point.position_at(now)))
            .collect();

        let mut rest = Vec::with_capacity(index.live_count().saturating_sub(matched_ids.len()));
        index.tree().for_each(|id, p| {
            if !matched_ids.contains(&id) {
                rest.push((id, *p));
            }
        });

        #[cfg(feature = "parallel")]
        let iter = rest.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = rest.iter();

        let mut unmatched: Vec<DisplayPoint> = iter
            .filter_map(|(id, p)| visible(*id, p.position_at(now)))
            .collect();
        unmatched.sort_unstable_by_key(|d| d.id);

        trace!(k, threshold, matched = matched.len(), unmatched = unmatched.len(), "query");
        QueryResult { matched, unmatched }
    }

    /// Everything a renderer needs for one frame, taken under one lock.
    pub fn frame(
        shared:    &SharedIndex,
        params:    &QueryParams,
        canvas:    &Canvas,
        reference: Point2D,
        grid:      bool,
    ) -> Frame {
        let index = shared.lock();
        let now = index.now();
        let threshold = params.normalized_threshold(canvas.width);
        let result = Self::query(&index, reference, params.num_neighbours, threshold, now);
        let overlay = grid.then(|| grid_overlay(&index, now));
        Frame {
            now,
            mode: index.mode(),
            reference,
            threshold,
            result,
            overlay,
        }
    }
}

fn visible(id: PointId, position: Point2D) -> Option<DisplayPoint> {
    position.in_unit_square().then_some(DisplayPoint { id, position })
}
