//! Value types shared by traversal, selection, and persistence (neighbours,
//! edges, and edge handles). Distances are squared Euclidean values; ordering
//! falls back to the node id so ties resolve deterministically.

use std::cmp::Ordering;

/// Node discovered during a search, including its distance from the query.
///
/// # Examples
/// ```
/// use navgraph_core::Neighbour;
///
/// let near = Neighbour { id: 7, distance: 0.5 };
/// let tie = Neighbour { id: 3, distance: 0.5 };
/// assert!(tie < near, "equal distances order by id");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Id of the neighbour within the [`crate::VectorStore`].
    pub id: usize,
    /// Squared distance between the query and [`Neighbour::id`].
    pub distance: f32,
}

impl Eq for Neighbour {}

impl Ord for Neighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Edge> for Neighbour {
    fn from(edge: Edge) -> Self {
        Self {
            id: edge.target,
            distance: edge.distance,
        }
    }
}

/// Min-heap adaptor for [`Neighbour`] so `BinaryHeap` pops the closest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ReverseNeighbour {
    pub(crate) inner: Neighbour,
}

impl ReverseNeighbour {
    pub(crate) fn new(id: usize, distance: f32) -> Self {
        Self {
            inner: Neighbour { id, distance },
        }
    }
}

impl Ord for ReverseNeighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        other.inner.cmp(&self.inner)
    }
}

impl PartialOrd for ReverseNeighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Directed link stored in a node's adjacency at one layer.
///
/// `distance` caches the squared distance between the owning node and
/// `target` at the time the edge was created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Node the edge points to.
    pub target: usize,
    /// Cached squared distance between the owner and `target`.
    pub distance: f32,
}

impl Edge {
    /// Creates an edge towards `target` at the given cached distance.
    #[must_use]
    pub const fn new(target: usize, distance: f32) -> Self {
        Self { target, distance }
    }
}

impl From<Neighbour> for Edge {
    fn from(neighbour: Neighbour) -> Self {
        Self {
            target: neighbour.id,
            distance: neighbour.distance,
        }
    }
}

/// Identifies an edge by position rather than by address.
///
/// Adjacency lists reallocate during insertion, so callers hold handles and
/// resolve them through [`crate::Hnsw::edge`] when they need the edge.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EdgeHandle {
    /// Node owning the adjacency list.
    pub node: usize,
    /// Layer of the adjacency list.
    pub layer: usize,
    /// Position of the edge within the list.
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn reverse_neighbour_heap_pops_closest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(ReverseNeighbour::new(1, 3.0));
        heap.push(ReverseNeighbour::new(2, 1.0));
        heap.push(ReverseNeighbour::new(0, 1.0));
        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|n| n.inner.id)).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }
}
