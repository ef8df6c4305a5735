//! Spatial index over catalog positions for radius queries.
//!
//! A k-d tree stored as a flat node arena over a permutation of the catalog.
//! Build is O(n log n) (median split by `select_nth_unstable`), a radius query
//! is O(log n + k). Both build and query are iterative, so coincident or
//! clustered positions cannot blow the stack: a node becomes a leaf when it
//! is small, too deep, or all of its points coincide.
//!
//! The index borrows the catalog and records the epoch it was built for. It
//! is rebuilt every cycle and is `Sync`, so any number of threads may query
//! a built index concurrently.
use thiserror::Error;
use tracing::debug;

use crate::state::{distance, Catalog, CatalogEntry, Vec3};

/// Nodes at or below this many points are scanned linearly.
const LEAF_CAPACITY: usize = 8;

/// Hard cap on tree depth. Balanced splits never reach it below 2^48 points.
const MAX_DEPTH: usize = 48;

/// Entries may differ from the build epoch by at most this much (s).
pub(crate) const EPOCH_TOLERANCE_S: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("catalog is empty, nothing to index")]
    EmptyCatalog,

    #[error("object {id} is at epoch {entry_epoch}, index is being built for {epoch}")]
    EpochMismatch { id: u32, entry_epoch: f64, epoch: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    Branch {
        axis: usize,
        split: f64,
        left: usize,
        right: usize,
    },
}

/// A catalog entry returned by a radius query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub entry: &'a CatalogEntry,
    pub distance_km: f64,
}

#[derive(Debug)]
pub struct SpatialIndex<'a> {
    entries: &'a [CatalogEntry],
    /// Permutation of entry indices; every leaf owns a contiguous range.
    order: Vec<usize>,
    nodes: Vec<Node>,
    epoch: f64,
    depth: usize,
}

impl<'a> SpatialIndex<'a> {
    /// Index every catalog position. All entries must be at `epoch`.
    pub fn build(catalog: &'a Catalog, epoch: f64) -> Result<Self, IndexError> {
        let entries = catalog.entries();
        if entries.is_empty() {
            return Err(IndexError::EmptyCatalog);
        }
        if let Some(stale) = entries
            .iter()
            .find(|e| (e.state.epoch - epoch).abs() > EPOCH_TOLERANCE_S)
        {
            return Err(IndexError::EpochMismatch {
                id: stale.id.0,
                entry_epoch: stale.state.epoch,
                epoch,
            });
        }

        let n = entries.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut nodes = vec![Node::Leaf { start: 0, end: n }];
        let mut max_depth = 0;

        // (node slot, range start, range end, depth)
        let mut stack = vec![(0usize, 0usize, n, 0usize)];
        while let Some((slot, start, end, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if end - start <= LEAF_CAPACITY || depth >= MAX_DEPTH {
                nodes[slot] = Node::Leaf { start, end };
                continue;
            }

            let (axis, spread) = widest_axis(entries, &order[start..end]);
            if spread <= 0.0 {
                // Every point in this range coincides.
                nodes[slot] = Node::Leaf { start, end };
                continue;
            }

            let mid = start + (end - start) / 2;
            order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
                entries[a].state.r[axis].total_cmp(&entries[b].state.r[axis])
            });
            let split = entries[order[mid]].state.r[axis];

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { start, end: mid });
            nodes.push(Node::Leaf { start: mid, end });
            nodes[slot] = Node::Branch { axis, split, left, right };

            stack.push((left, start, mid, depth + 1));
            stack.push((right, mid, end, depth + 1));
        }

        debug!(objects = n, nodes = nodes.len(), depth = max_depth, epoch, "spatial index built");

        Ok(SpatialIndex {
            entries,
            order,
            nodes,
            epoch,
            depth: max_depth,
        })
    }

    /// All entries strictly within `radius_km` of `point`, in no particular order.
    pub fn query_radius(&self, point: &Vec3, radius_km: f64) -> Vec<Neighbor<'a>> {
        let mut found = Vec::new();
        if radius_km.is_nan() || radius_km <= 0.0 {
            return found;
        }

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf { start, end } => {
                    for &i in &self.order[start..end] {
                        let entry = &self.entries[i];
                        let d = distance(&entry.state.r, point);
                        if d < radius_km {
                            found.push(Neighbor { entry, distance_km: d });
                        }
                    }
                }
                Node::Branch { axis, split, left, right } => {
                    // Points equal to the split value may sit on either side.
                    if point[axis] - radius_km <= split {
                        stack.push(left);
                    }
                    if point[axis] + radius_km >= split {
                        stack.push(right);
                    }
                }
            }
        }
        found
    }

    /// Epoch the indexed positions belong to.
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Axis with the largest coordinate spread over a set of entries.
fn widest_axis(entries: &[CatalogEntry], subset: &[usize]) -> (usize, f64) {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for &i in subset {
        let r = &entries[i].state.r;
        for k in 0..3 {
            lo[k] = lo[k].min(r[k]);
            hi[k] = hi[k].max(r[k]);
        }
    }
    (0..3)
        .map(|k| (k, hi[k] - lo[k]))
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
}
