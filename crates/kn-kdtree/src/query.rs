//! k-nearest-neighbour search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use kn_core::PointId;

use crate::Metric;
use crate::tree::{KdTree, NodeKind};

/// One query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour<'a, T> {
    pub id:         PointId,
    pub distance_2: f64,
    pub value:      &'a T,
}

/// Heap element ordered by `(distance_2, id)` so the heap top is the
/// current worst match and ties resolve toward the lower id.
struct Candidate {
    distance_2: f64,
    id:         PointId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_2
            .total_cmp(&other.distance_2)
            .then(self.id.cmp(&other.id))
    }
}

impl<const D: usize, M: Metric<D>, T> KdTree<D, M, T> {
    /// Up to `k` live points closest to `query`, nearest first.
    ///
    /// With `max_distance_2 = Some(r2)` only points with `distance_2 <= r2`
    /// qualify; a NaN cutoff matches nothing.  `k = 0` always returns an
    /// empty list.  Equidistant points are ordered by ascending id.
    pub fn nearest(
        &self,
        query:          &[f64; D],
        k:              usize,
        max_distance_2: Option<f64>,
    ) -> Vec<Neighbour<'_, T>> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let cutoff = max_distance_2.unwrap_or(f64::INFINITY);
        let mut heap = BinaryHeap::with_capacity(k.min(self.len()) + 1);
        self.search(root, query, k, cutoff, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .filter_map(|c| {
                self.live.get(&c.id).map(|slot| Neighbour {
                    id:         c.id,
                    distance_2: c.distance_2,
                    value:      &slot.value,
                })
            })
            .collect()
    }

    /// Current pruning radius: the cutoff until `k` candidates are held,
    /// then the worst held distance.
    #[inline]
    fn radius(heap: &BinaryHeap<Candidate>, k: usize, cutoff: f64) -> f64 {
        if heap.len() < k {
            cutoff
        } else {
            heap.peek().map_or(cutoff, |worst| worst.distance_2)
        }
    }

    /// Branch and bound over an explicit stack, nearer child first.  Each
    /// node is pruned against the radius current at the moment it is popped.
    fn search(
        &self,
        root:   u32,
        query:  &[f64; D],
        k:      usize,
        cutoff: f64,
        heap:   &mut BinaryHeap<Candidate>,
    ) {
        let bound = |at: u32| {
            let n = &self.nodes[at as usize];
            self.metric.bounds_distance_2(query, &n.min, &n.max)
        };

        let mut stack = vec![(root, bound(root))];
        while let Some((at, at_bound)) = stack.pop() {
            // `!(a <= b)` rather than `a > b` so a NaN bound is pruned.
            if !(at_bound <= Self::radius(heap, k, cutoff)) {
                continue;
            }
            match &self.nodes[at as usize].kind {
                NodeKind::Leaf(bucket) => {
                    for &e in bucket {
                        let entry = &self.entries[e as usize];
                        if !entry.live {
                            continue;
                        }
                        let distance_2 = self.metric.distance_2(query, &entry.coords);
                        if !(distance_2 <= cutoff) {
                            continue;
                        }
                        let cand = Candidate { distance_2, id: entry.id };
                        if heap.len() < k {
                            heap.push(cand);
                        } else if heap.peek().is_some_and(|worst| cand < *worst) {
                            heap.pop();
                            heap.push(cand);
                        }
                    }
                }
                NodeKind::Split { left, right, .. } => {
                    let (l, r) = (bound(*left), bound(*right));
                    // Far child first so the near one is popped next.
                    if l <= r {
                        stack.push((*right, r));
                        stack.push((*left, l));
                    } else {
                        stack.push((*left, l));
                        stack.push((*right, r));
                    }
                }
            }
        }
    }
}
