use crate::collections::{AdaptablePriorityQueue, ChainedHashMap, Locator};
use crate::errors::PathPlannerError;
use crate::graph::{Direction, Graph, VertexId};
use super::{DistanceMap, SettleOrder};

use num_traits::Float;
use tracing::debug;


/// Shortest distance from `source` to every vertex using Dijkstra's Algorithm
/// https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm
///
/// Edge elements are the weights and must be non-negative; an infinite
/// weight never wins a relaxation. Every vertex of the graph appears in the
/// returned map, with an infinite distance when it cannot be reached.
pub fn shortest_path_lengths<V, W>(graph: &Graph<V, W>, source: VertexId) -> Result<DistanceMap<W>, PathPlannerError>
where
    W: Float,
{
    settle(graph, source).map(|(distances, _)| distances)
}


/// Dijkstra's main loop, also recording the rank at which each vertex left the queue
///
/// The source has rank 0. A vertex's final distance is always set by a
/// relaxation from a vertex of lower rank.
pub fn settle<V, W>(graph: &Graph<V, W>, source: VertexId) -> Result<(DistanceMap<W>, SettleOrder), PathPlannerError>
where
    W: Float,
{
    graph.vertex(source)?;

    // Tentative distances, keyed by vertex
    // Every vertex starts in the queue: the source at zero, the rest at infinity
    let mut distances: DistanceMap<W> = DistanceMap::new();
    let mut queue: AdaptablePriorityQueue<W, VertexId> = AdaptablePriorityQueue::new();
    let mut locators: ChainedHashMap<VertexId, Locator> = ChainedHashMap::new();

    for vertex in graph.vertices() {
        let distance = if vertex == source { W::zero() } else { W::infinity() };
        distances.insert(vertex, distance);
        locators.insert(vertex, queue.insert(distance, vertex));
    }

    // settled vertices - distance is final, no longer in the queue
    let mut cloud: DistanceMap<W> = DistanceMap::new();
    let mut order = SettleOrder::new();

    // Loop over each vertex in the queue, removing the closest one
    while !queue.is_empty() {
        let (distance, vertex) = queue.remove_min()?;
        order.insert(vertex, cloud.len());
        cloud.insert(vertex, distance);

        // relax every edge leaving the settled vertex
        for edge_id in graph.incident_edges(vertex, Direction::Outgoing)? {
            let edge = graph.edge(edge_id)?;
            let neighbor = edge.opposite(vertex)?;
            if cloud.contains_key(&neighbor) {
                continue;
            }

            let weight = *edge.element();
            debug_assert!(!(weight < W::zero()), "negative edge weight");

            let new_distance = distance + weight;
            let best = distances.get_mut(&neighbor)?;
            if new_distance < *best {
                // We've found a better path to this neighbor
                *best = new_distance;
                queue.update(locators.get(&neighbor)?, new_distance, neighbor)?;
            }
        }
    }

    debug!(settled = cloud.len(), "dijkstra finished");
    Ok((cloud, order))
}
