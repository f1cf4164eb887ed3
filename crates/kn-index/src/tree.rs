//! `ModeTree` — one k-d tree in either encoding, behind a single API.

use kn_core::{Mode, MotionPoint, Point2D, PointId, Timestamp};
use kn_kdtree::{KdResult, MovingTree, NodeBounds, SquaredEuclidean, StaticTree, TimeTranslated};

/// A query hit: the stored point state and its distance to the reference.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Match {
    pub id:         PointId,
    pub point:      MotionPoint,
    pub distance_2: f64,
}

/// A tree node's bounding rectangle in normalised display space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeRect {
    pub depth: usize,
    pub min:   Point2D,
    pub max:   Point2D,
}

/// The live index.  The variant *is* the mode; the two encodings never
/// share a tree.
pub enum ModeTree {
    Static(StaticTree<MotionPoint>),
    Moving(MovingTree<MotionPoint>),
}

impl ModeTree {
    pub fn empty(mode: Mode, bucket_capacity: usize) -> Self {
        match mode {
            Mode::Static => ModeTree::Static(StaticTree::new(SquaredEuclidean, bucket_capacity)),
            Mode::VelocityAugmented => {
                ModeTree::Moving(MovingTree::new(TimeTranslated, bucket_capacity))
            }
        }
    }

    /// Balanced tree over `points`, ids assigned in order.
    pub fn bulk_load(mode: Mode, bucket_capacity: usize, points: Vec<MotionPoint>) -> KdResult<Self> {
        Ok(match mode {
            Mode::Static => ModeTree::Static(StaticTree::bulk_load(
                SquaredEuclidean,
                bucket_capacity,
                points.into_iter().map(|p| {
                    let s = MotionPoint::stationary(p.x, p.y);
                    (s.static_coords(), s)
                }),
            )?),
            Mode::VelocityAugmented => ModeTree::Moving(MovingTree::bulk_load(
                TimeTranslated,
                bucket_capacity,
                points.into_iter().map(|p| (p.moving_coords(), p)),
            )?),
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            ModeTree::Static(_) => Mode::Static,
            ModeTree::Moving(_) => Mode::VelocityAugmented,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ModeTree::Static(t) => t.len(),
            ModeTree::Moving(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn removal_count(&self) -> usize {
        match self {
            ModeTree::Static(t) => t.removal_count(),
            ModeTree::Moving(t) => t.removal_count(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            ModeTree::Static(t) => t.height(),
            ModeTree::Moving(t) => t.height(),
        }
    }

    pub fn get(&self, id: PointId) -> Option<&MotionPoint> {
        match self {
            ModeTree::Static(t) => t.get(id),
            ModeTree::Moving(t) => t.get(id),
        }
    }

    /// Insert `p`.  In static mode its velocity and timestamp are dropped.
    pub fn insert(&mut self, p: MotionPoint) -> KdResult<PointId> {
        match self {
            ModeTree::Static(t) => {
                let s = MotionPoint::stationary(p.x, p.y);
                t.insert(s.static_coords(), s)
            }
            ModeTree::Moving(t) => t.insert(p.moving_coords(), p),
        }
    }

    pub fn move_point(&mut self, id: PointId, p: MotionPoint) -> KdResult<()> {
        match self {
            ModeTree::Static(t) => {
                let s = MotionPoint::stationary(p.x, p.y);
                t.move_point(id, s.static_coords(), s)
            }
            ModeTree::Moving(t) => t.move_point(id, p.moving_coords(), p),
        }
    }

    pub fn export(&self) -> Vec<(PointId, MotionPoint)> {
        match self {
            ModeTree::Static(t) => t.export(),
            ModeTree::Moving(t) => t.export(),
        }
    }

    /// Iterate live points without copying.  Order is unspecified.
    pub fn for_each(&self, mut f: impl FnMut(PointId, &MotionPoint)) {
        match self {
            ModeTree::Static(t) => t.iter().for_each(|(id, p)| f(id, p)),
            ModeTree::Moving(t) => t.iter().for_each(|(id, p)| f(id, p)),
        }
    }

    pub fn regenerate(&mut self) {
        match self {
            ModeTree::Static(t) => t.regenerate(),
            ModeTree::Moving(t) => t.regenerate(),
        }
    }

    /// Up to `k` points nearest to `reference` as seen at `now`.
    ///
    /// The moving query vector is `(rx, ry, 0, 0, now)`: a stationary
    /// reference observed at `now`.
    pub fn nearest(
        &self,
        reference:      Point2D,
        now:            Timestamp,
        k:              usize,
        max_distance_2: Option<f64>,
    ) -> Vec<Match> {
        match self {
            ModeTree::Static(t) => t
                .nearest(&[reference.x, reference.y], k, max_distance_2)
                .into_iter()
                .map(|n| Match { id: n.id, point: *n.value, distance_2: n.distance_2 })
                .collect(),
            ModeTree::Moving(t) => t
                .nearest(&[reference.x, reference.y, 0.0, 0.0, now.as_f64()], k, max_distance_2)
                .into_iter()
                .map(|n| Match { id: n.id, point: *n.value, distance_2: n.distance_2 })
                .collect(),
        }
    }

    /// Pre-order node rectangles.  Moving bounds are extrapolated corner by
    /// corner: each stored corner is read as a point `(x, y, vx, vy, t)` and
    /// advanced to `now`.
    pub fn node_rects(&self, now: Timestamp) -> Vec<NodeRect> {
        match self {
            ModeTree::Static(t) => t
                .nodes()
                .into_iter()
                .map(|n: NodeBounds<2>| NodeRect {
                    depth: n.depth,
                    min:   Point2D::new(n.min[0], n.min[1]),
                    max:   Point2D::new(n.max[0], n.max[1]),
                })
                .collect(),
            ModeTree::Moving(t) => {
                let at = now.as_f64();
                t.nodes()
                    .into_iter()
                    .map(|n: NodeBounds<5>| {
                        let (min_x, min_y) = TimeTranslated::extrapolate(&n.min, at);
                        let (max_x, max_y) = TimeTranslated::extrapolate(&n.max, at);
                        NodeRect {
                            depth: n.depth,
                            min:   Point2D::new(min_x, min_y),
                            max:   Point2D::new(max_x, max_y),
                        }
                    })
                    .collect()
            }
        }
    }
}
