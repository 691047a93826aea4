pub mod dijkstra;
pub mod shortest_path;

use num_traits::Float;

use crate::collections::ChainedHashMap;
use crate::errors::PathPlannerError;
use crate::graph::{EdgeId, Graph, VertexId};

pub use dijkstra::{settle, shortest_path_lengths};
pub use shortest_path::{path_to_source, shortest_path_tree};

/// Final distance of every vertex from the source (infinite when unreachable)
pub type DistanceMap<W> = ChainedHashMap<VertexId, W>;

/// Shortest-path tree
/// Each reachable vertex other than the source maps to the edge it is reached by
pub type PathTree = ChainedHashMap<VertexId, EdgeId>;

/// Position at which each vertex was removed from Dijkstra's queue
pub type SettleOrder = ChainedHashMap<VertexId, usize>;


/// Result of a single-source shortest path run
#[derive(Debug)]
pub struct ShortestPaths<W> {
    source: VertexId,
    distances: DistanceMap<W>,
    tree: PathTree,
}

impl<W: Float> ShortestPaths<W> {

    /// Run Dijkstra's algorithm from `source`, then build the shortest-path tree
    pub fn compute<V>(graph: &Graph<V, W>, source: VertexId) -> Result<Self, PathPlannerError> {
        let (distances, order) = settle(graph, source)?;
        let tree = shortest_path_tree(graph, source, &distances, &order)?;
        Ok(Self { source, distances, tree })
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    /// Shortest distance to `vertex`, infinite if it cannot be reached
    pub fn distance(&self, vertex: VertexId) -> W {
        self.distances.get(&vertex).copied().unwrap_or_else(|_| W::infinity())
    }

    pub fn is_reachable(&self, vertex: VertexId) -> bool {
        self.distance(vertex).is_finite()
    }

    /// Edge by which `vertex` is reached on a shortest path
    pub fn parent_edge(&self, vertex: VertexId) -> Option<EdgeId> {
        self.tree.get(&vertex).ok().copied()
    }

    pub fn distances(&self) -> &DistanceMap<W> {
        &self.distances
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    /// Vertices from the source to `goal`, both included
    pub fn path_to<V>(&self, graph: &Graph<V, W>, goal: VertexId) -> Result<Vec<VertexId>, PathPlannerError> {
        path_to_source(graph, &self.tree, self.source, goal)
    }
}
