//! The k-d tree and its mutation API.
//!
//! # Data layout
//!
//! Entries live in a flat `Vec<Entry>`; leaves hold buckets of entry
//! indices; internal nodes hold a split axis/value and two child indices.
//! Every node carries the bounding box of all entries ever placed beneath it
//! since the last rebuild, dead ones included.
//!
//! ```text
//! live:    PointId → Slot { entry, value }       (FxHashMap)
//! entries: [ Entry { coords, id, live } ... ]     (dead entries stay until regenerate)
//! nodes:   [ Node { min, max, Leaf(bucket) | Split { axis, value, left, right } } ... ]
//! ```

use rustc_hash::FxHashMap;

use kn_core::PointId;

use crate::{KdError, KdResult, Metric, SquaredEuclidean, TimeTranslated};

/// 2-D tree used for static points.
pub type StaticTree<T> = KdTree<2, SquaredEuclidean, T>;

/// 5-D `(x, y, vx, vy, t)` tree used for moving points.
pub type MovingTree<T> = KdTree<5, TimeTranslated, T>;

// ── Internal storage ──────────────────────────────────────────────────────────

pub(crate) struct Entry<const D: usize> {
    pub(crate) coords: [f64; D],
    pub(crate) id:     PointId,
    pub(crate) live:   bool,
}

pub(crate) enum NodeKind {
    Leaf(Vec<u32>),
    Split { axis: usize, value: f64, left: u32, right: u32 },
}

pub(crate) struct Node<const D: usize> {
    pub(crate) min:  [f64; D],
    pub(crate) max:  [f64; D],
    pub(crate) kind: NodeKind,
}

impl<const D: usize> Node<D> {
    #[inline]
    fn extend(&mut self, c: &[f64; D]) {
        for i in 0..D {
            self.min[i] = self.min[i].min(c[i]);
            self.max[i] = self.max[i].max(c[i]);
        }
    }
}

pub(crate) struct Slot<T> {
    pub(crate) entry: u32,
    pub(crate) value: T,
}

// ── NodeBounds ────────────────────────────────────────────────────────────────

/// Bounding box of one tree node, as yielded by [`KdTree::nodes`].
///
/// Coordinates are in the tree's native space; for a [`MovingTree`] the
/// box is the raw `(x, y, vx, vy, t)` hull and must be extrapolated before
/// it means anything on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeBounds<const D: usize> {
    /// Distance from the root (root = 0).
    pub depth: usize,
    pub min:   [f64; D],
    pub max:   [f64; D],
    pub leaf:  bool,
}

// ── KdTree ────────────────────────────────────────────────────────────────────

/// Bucketed k-d tree keyed by [`PointId`], carrying a value `T` per point.
pub struct KdTree<const D: usize, M: Metric<D>, T> {
    pub(crate) metric:  M,
    pub(crate) nodes:   Vec<Node<D>>,
    pub(crate) root:    Option<u32>,
    pub(crate) entries: Vec<Entry<D>>,
    pub(crate) live:    FxHashMap<PointId, Slot<T>>,
    removal_count:      usize,
    bucket_capacity:    usize,
    next_id:            u32,
}

impl<const D: usize, M: Metric<D>, T> KdTree<D, M, T> {
    /// Create an empty tree.  `bucket_capacity` is clamped to at least 2.
    pub fn new(metric: M, bucket_capacity: usize) -> Self {
        Self {
            metric,
            nodes:           Vec::new(),
            root:            None,
            entries:         Vec::new(),
            live:            FxHashMap::default(),
            removal_count:   0,
            bucket_capacity: bucket_capacity.max(2),
            next_id:         0,
        }
    }

    /// Build a balanced tree over `items` in one pass.
    ///
    /// Ids are assigned sequentially in iteration order.  Time complexity:
    /// O(N log N).
    pub fn bulk_load<I>(metric: M, bucket_capacity: usize, items: I) -> KdResult<Self>
    where
        I: IntoIterator<Item = ([f64; D], T)>,
    {
        let mut tree = Self::new(metric, bucket_capacity);
        for (coords, value) in items {
            let id = PointId(tree.next_id);
            check_finite(id, &coords)?;
            tree.next_id += 1;
            let entry = tree.entries.len() as u32;
            tree.entries.push(Entry { coords, id, live: true });
            tree.live.insert(id, Slot { entry, value });
        }
        tree.rebuild();
        Ok(tree)
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Soft deletes accumulated since the last rebuild.
    pub fn removal_count(&self) -> usize {
        self.removal_count
    }

    pub fn dimensions(&self) -> usize {
        D
    }

    /// Longest root-to-leaf path, counted in nodes.  `0` for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(u32, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((at, depth)) = stack.pop() {
            height = height.max(depth);
            if let NodeKind::Split { left, right, .. } = self.nodes[at as usize].kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        height
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn contains(&self, id: PointId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn get(&self, id: PointId) -> Option<&T> {
        self.live.get(&id).map(|s| &s.value)
    }

    /// Current coordinates of a live point.
    pub fn coords(&self, id: PointId) -> Option<&[f64; D]> {
        self.live.get(&id).map(|s| &self.entries[s.entry as usize].coords)
    }

    /// Iterator over all live points.  Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &T)> + '_ {
        self.live.iter().map(|(&id, s)| (id, &s.value))
    }

    /// Snapshot of all live points, sorted by id.
    pub fn export(&self) -> Vec<(PointId, T)>
    where
        T: Clone,
    {
        let mut out: Vec<(PointId, T)> = self.iter().map(|(id, v)| (id, v.clone())).collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert a new point and return its id.
    ///
    /// # Errors
    ///
    /// [`KdError::NonFinite`] if any coordinate is NaN or infinite.
    pub fn insert(&mut self, coords: [f64; D], value: T) -> KdResult<PointId> {
        let id = PointId(self.next_id);
        check_finite(id, &coords)?;
        self.next_id += 1;
        let entry = self.place(coords, id);
        self.live.insert(id, Slot { entry, value });
        Ok(id)
    }

    /// Move a live point to `coords`, replacing its value.
    ///
    /// The previous entry becomes a soft delete and `removal_count` grows by
    /// one.  Nothing changes on error.
    pub fn move_point(&mut self, id: PointId, coords: [f64; D], value: T) -> KdResult<()> {
        let old = match self.live.get(&id) {
            Some(slot) => slot.entry,
            None => return Err(KdError::UnknownPoint(id)),
        };
        check_finite(id, &coords)?;

        self.entries[old as usize].live = false;
        self.removal_count += 1;
        let entry = self.place(coords, id);
        if let Some(slot) = self.live.get_mut(&id) {
            slot.entry = entry;
            slot.value = value;
        }
        Ok(())
    }

    /// Drop all soft-deleted entries and rebuild a balanced tree over the
    /// live set.  No-op when there is nothing to drop.
    ///
    /// Time complexity: O(N log N) in the live count.
    pub fn regenerate(&mut self) {
        if self.removal_count == 0 {
            return;
        }
        self.rebuild();
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Pre-order (node, left, right) list of all node bounding boxes.
    pub fn nodes(&self) -> Vec<NodeBounds<D>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((at, depth)) = stack.pop() {
            let node = &self.nodes[at as usize];
            let leaf = match node.kind {
                NodeKind::Leaf(_) => true,
                NodeKind::Split { left, right, .. } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                    false
                }
            };
            out.push(NodeBounds { depth, min: node.min, max: node.max, leaf });
        }
        out
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Append an entry and hang it on the leaf its coordinates descend to,
    /// widening every box on the way.  Returns the entry index.
    fn place(&mut self, coords: [f64; D], id: PointId) -> u32 {
        let entry = self.entries.len() as u32;
        self.entries.push(Entry { coords, id, live: true });

        let Some(mut at) = self.root else {
            self.root = Some(self.push_node(coords, coords, NodeKind::Leaf(vec![entry])));
            return entry;
        };

        loop {
            let node = &mut self.nodes[at as usize];
            node.extend(&coords);
            match &mut node.kind {
                NodeKind::Split { axis, value, left, right } => {
                    at = if coords[*axis] < *value { *left } else { *right };
                }
                NodeKind::Leaf(bucket) => {
                    bucket.push(entry);
                    if bucket.len() > self.bucket_capacity {
                        self.split_leaf(at);
                    }
                    return entry;
                }
            }
        }
    }

    /// Purge dead entries from an overfull leaf; if it is still overfull,
    /// split it at the median of its widest axis.
    ///
    /// A leaf whose entries coincide on every split axis cannot be separated
    /// and is left oversized.
    fn split_leaf(&mut self, at: u32) {
        let axes = self.metric.split_axes().min(D).max(1);
        let node = &self.nodes[at as usize];
        if (0..axes).all(|i| node.min[i] == node.max[i]) {
            return;
        }

        let kind = std::mem::replace(&mut self.nodes[at as usize].kind, NodeKind::Leaf(Vec::new()));
        let NodeKind::Leaf(mut bucket) = kind else {
            self.nodes[at as usize].kind = kind;
            return;
        };

        let entries = &self.entries;
        bucket.retain(|&e| entries[e as usize].live);
        if bucket.len() <= self.bucket_capacity {
            self.nodes[at as usize].kind = NodeKind::Leaf(bucket);
            return;
        }

        let (min, max) = self.hull(&bucket);
        let axis = widest_axis(&min, &max, axes);
        if min[axis] == max[axis] {
            self.nodes[at as usize].kind = NodeKind::Leaf(bucket);
            return;
        }
        let entries = &self.entries;
        bucket.sort_unstable_by(|&a, &b| {
            entries[a as usize].coords[axis].total_cmp(&entries[b as usize].coords[axis])
        });
        // Entries below `value` go left, the rest right, matching descent in
        // `place`.  When the median equals the minimum, split just above it
        // so a run of duplicates ends up in a leaf of its own.
        let coord = |e: &u32| entries[*e as usize].coords[axis];
        let mut value = coord(&bucket[bucket.len() / 2]);
        let mut split = bucket.partition_point(|e| coord(e) < value);
        if split == 0 {
            split = bucket.partition_point(|e| coord(e) <= min[axis]);
            value = coord(&bucket[split]);
        }
        let upper = bucket.split_off(split);

        let left = self.push_leaf(bucket);
        let right = self.push_leaf(upper);
        self.nodes[at as usize].kind = NodeKind::Split { axis, value, left, right };
    }

    /// Compact the entry list down to live points and bulk-build from it.
    fn rebuild(&mut self) {
        let mut ids: Vec<PointId> = self.live.keys().copied().collect();
        ids.sort_unstable();

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(slot) = self.live.get_mut(&id) {
                let coords = self.entries[slot.entry as usize].coords;
                slot.entry = entries.len() as u32;
                entries.push(Entry { coords, id, live: true });
            }
        }
        self.entries = entries;
        self.nodes.clear();
        self.removal_count = 0;

        let mut order: Vec<u32> = (0..self.entries.len() as u32).collect();
        self.root = if order.is_empty() { None } else { Some(self.build(&mut order)) };
    }

    fn build(&mut self, order: &mut [u32]) -> u32 {
        if order.len() <= self.bucket_capacity {
            return self.push_leaf(order.to_vec());
        }

        let (min, max) = self.hull(order);
        let axis = widest_axis(&min, &max, self.metric.split_axes().min(D));
        let mid = order.len() / 2;
        let entries = &self.entries;
        order.select_nth_unstable_by(mid, |&a, &b| {
            entries[a as usize].coords[axis].total_cmp(&entries[b as usize].coords[axis])
        });
        let value = self.entries[order[mid] as usize].coords[axis];

        let (lower, upper) = order.split_at_mut(mid);
        let left = self.build(lower);
        let right = self.build(upper);
        self.push_node(min, max, NodeKind::Split { axis, value, left, right })
    }

    /// Bounding box of a non-empty set of entries.
    fn hull(&self, members: &[u32]) -> ([f64; D], [f64; D]) {
        let mut min = [f64::INFINITY; D];
        let mut max = [f64::NEG_INFINITY; D];
        for &e in members {
            let c = &self.entries[e as usize].coords;
            for i in 0..D {
                min[i] = min[i].min(c[i]);
                max[i] = max[i].max(c[i]);
            }
        }
        (min, max)
    }

    fn push_leaf(&mut self, bucket: Vec<u32>) -> u32 {
        let (min, max) = self.hull(&bucket);
        self.push_node(min, max, NodeKind::Leaf(bucket))
    }

    fn push_node(&mut self, min: [f64; D], max: [f64; D], kind: NodeKind) -> u32 {
        self.nodes.push(Node { min, max, kind });
        (self.nodes.len() - 1) as u32
    }
}

fn check_finite<const D: usize>(id: PointId, coords: &[f64; D]) -> KdResult<()> {
    if coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(KdError::NonFinite(id))
    }
}

/// Axis among the first `axes` with the largest extent.
fn widest_axis<const D: usize>(min: &[f64; D], max: &[f64; D], axes: usize) -> usize {
    (0..axes.max(1))
        .max_by(|&a, &b| (max[a] - min[a]).total_cmp(&(max[b] - min[b])))
        .unwrap_or(0)
}
