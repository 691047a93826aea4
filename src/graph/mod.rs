use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::collections::{ChainedHashMap, FxIndexSet};
use crate::errors::GraphError;


static NEXT_VERTEX_ID: AtomicUsize = AtomicUsize::new(0);
static NEXT_EDGE_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a vertex, unique across every graph in the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(usize);

/// Identity of an edge, unique across every graph in the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

impl VertexId {
    fn next() -> Self {
        Self(NEXT_VERTEX_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl EdgeId {
    fn next() -> Self {
        Self(NEXT_EDGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which adjacency to consult on a directed graph
/// Undirected graphs give the same answer for both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}


/// Vertex payload, compared by identity rather than by element
#[derive(Debug, Clone)]
pub struct Vertex<V> {
    id: VertexId,
    element: V,
}

impl<V> Vertex<V> {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn element(&self) -> &V {
        &self.element
    }
}

#[derive(Debug, Clone)]
pub struct Edge<E> {
    id: EdgeId,
    origin: VertexId,
    destination: VertexId,
    element: E,
}

impl<E> Edge<E> {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn origin(&self) -> VertexId {
        self.origin
    }

    pub fn destination(&self) -> VertexId {
        self.destination
    }

    /// (origin, destination)
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.origin, self.destination)
    }

    /// Endpoint across the edge from `vertex`
    pub fn opposite(&self, vertex: VertexId) -> Result<VertexId, GraphError> {
        if vertex == self.origin {
            Ok(self.destination)
        } else if vertex == self.destination {
            Ok(self.origin)
        } else {
            Err(GraphError::NotAnEndpoint { edge: self.id, vertex })
        }
    }
}


/// neighbor -> edge connecting to it
type Adjacency = ChainedHashMap<VertexId, EdgeId>;

/// Graph stored as an adjacency map
///
/// Vertices and edges live in id-keyed arenas. Each vertex owns a secondary
/// map from neighbor to the incident edge. Directed graphs keep separate
/// outgoing and incoming maps; an undirected graph only has the outgoing
/// one and uses it for both directions, so one edge object is referenced
/// from both of its endpoints.
///
/// For every edge `e = (u, v)`: `outgoing[u][v] == e` and `incoming[v][u] == e`.
#[derive(Debug)]
pub struct Graph<V, E> {
    directed: bool,
    vertices: ChainedHashMap<VertexId, Vertex<V>>,
    edges: ChainedHashMap<EdgeId, Edge<E>>,
    outgoing: ChainedHashMap<VertexId, Adjacency>,
    incoming: Option<ChainedHashMap<VertexId, Adjacency>>, // None when undirected
}

impl<V, E> Graph<V, E> {

    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            vertices: ChainedHashMap::new(),
            edges: ChainedHashMap::new(),
            outgoing: ChainedHashMap::new(),
            incoming: directed.then(ChainedHashMap::new),
        }
    }

    pub fn directed() -> Self {
        Self::new(true)
    }

    pub fn undirected() -> Self {
        Self::new(false)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    /// Every edge exactly once, collected from the adjacency maps
    pub fn edges(&self) -> FxIndexSet<EdgeId> {
        self.outgoing
            .values()
            .flat_map(|adjacency| adjacency.values().copied())
            .collect()
    }

    pub fn vertex(&self, vertex: VertexId) -> Result<&Vertex<V>, GraphError> {
        self.vertices.get(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))
    }

    pub fn element(&self, vertex: VertexId) -> Result<&V, GraphError> {
        self.vertex(vertex).map(Vertex::element)
    }

    pub fn edge(&self, edge: EdgeId) -> Result<&Edge<E>, GraphError> {
        self.edges.get(&edge).map_err(|_| GraphError::InvalidEdge(edge))
    }

    /// Edge from `u` to `v`, if there is one
    ///
    /// Symmetric on undirected graphs. Absence is an ordinary answer here,
    /// so unknown vertices also give `None`.
    pub fn get_edge(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.outgoing
            .get(&u)
            .ok()
            .and_then(|adjacency| adjacency.get(&v).ok())
            .copied()
    }

    pub fn degree(&self, vertex: VertexId, direction: Direction) -> Result<usize, GraphError> {
        self.adjacency(vertex, direction).map(ChainedHashMap::len)
    }

    /// Edges leaving (or entering) `vertex`; all incident edges when undirected
    pub fn incident_edges(
        &self,
        vertex: VertexId,
        direction: Direction,
    ) -> Result<impl Iterator<Item = EdgeId> + '_, GraphError> {
        Ok(self.adjacency(vertex, direction)?.values().copied())
    }

    pub fn add_vertex(&mut self, element: V) -> VertexId {
        let id = VertexId::next();
        self.vertices.insert(id, Vertex { id, element });
        self.outgoing.insert(id, Adjacency::new());
        if let Some(incoming) = self.incoming.as_mut() {
            incoming.insert(id, Adjacency::new());
        }
        id
    }

    /// Connect `u` to `v`
    /// Rejected when the pair is already connected in that direction
    pub fn add_edge(&mut self, u: VertexId, v: VertexId, element: E) -> Result<EdgeId, GraphError> {
        self.vertex(u)?;
        self.vertex(v)?;
        if self.get_edge(u, v).is_some() {
            return Err(GraphError::EdgeExists(u, v));
        }

        let id = EdgeId::next();
        self.edges.insert(id, Edge { id, origin: u, destination: v, element });
        self.outgoing_mut(u)?.insert(v, id);
        self.incoming_mut(v)?.insert(u, id);
        Ok(id)
    }

    /// Remove `edge` from both endpoints and return its element
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<E, GraphError> {
        let (u, v) = self.edge(edge)?.endpoints();
        self.outgoing_mut(u)?.remove(&v).map_err(|_| GraphError::InvalidEdge(edge))?;
        // an undirected self-loop has a single adjacency entry
        if self.directed || u != v {
            self.incoming_mut(v)?.remove(&u).map_err(|_| GraphError::InvalidEdge(edge))?;
        }
        self.edges
            .remove(&edge)
            .map(|edge| edge.element)
            .map_err(|_| GraphError::InvalidEdge(edge))
    }

    /// Remove `vertex` and every edge touching it; returns its element
    ///
    /// Each incident edge is first unlinked from the other endpoint's map, so
    /// no surviving vertex keeps a reference to a removed edge.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<V, GraphError> {
        self.vertex(vertex)?;

        let outgoing: Vec<(VertexId, EdgeId)> = self
            .adjacency(vertex, Direction::Outgoing)?
            .iter()
            .map(|(neighbor, edge)| (*neighbor, *edge))
            .collect();
        for &(destination, edge) in &outgoing {
            if destination != vertex {
                self.incoming_mut(destination)?
                    .remove(&vertex)
                    .map_err(|_| GraphError::InvalidEdge(edge))?;
            }
            self.edges.remove(&edge).map_err(|_| GraphError::InvalidEdge(edge))?;
        }
        self.outgoing.remove(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))?;

        if let Some(incoming) = self.incoming.as_mut() {
            let adjacency = incoming.remove(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))?;
            for (origin, edge) in adjacency.iter() {
                if *origin == vertex {
                    continue; // self-loop, already dropped with the outgoing map
                }
                self.outgoing
                    .get_mut(origin)
                    .and_then(|map| map.remove(&vertex))
                    .map_err(|_| GraphError::InvalidEdge(*edge))?;
                self.edges.remove(edge).map_err(|_| GraphError::InvalidEdge(*edge))?;
            }
        }

        debug!(?vertex, removed_edges = outgoing.len(), "removed vertex");
        self.vertices
            .remove(&vertex)
            .map(|vertex| vertex.element)
            .map_err(|_| GraphError::InvalidVertex(vertex))
    }

    fn adjacency(&self, vertex: VertexId, direction: Direction) -> Result<&Adjacency, GraphError> {
        let map = match (direction, &self.incoming) {
            (Direction::Incoming, Some(incoming)) => incoming,
            _ => &self.outgoing,
        };
        map.get(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))
    }

    fn outgoing_mut(&mut self, vertex: VertexId) -> Result<&mut Adjacency, GraphError> {
        self.outgoing.get_mut(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))
    }

    fn incoming_mut(&mut self, vertex: VertexId) -> Result<&mut Adjacency, GraphError> {
        let map = match self.incoming.as_mut() {
            Some(incoming) => incoming,
            None => &mut self.outgoing,
        };
        map.get_mut(&vertex).map_err(|_| GraphError::InvalidVertex(vertex))
    }
}
