use crate::errors::PathPlannerError;
use crate::graph::{Direction, Graph, VertexId};
use super::{DistanceMap, PathTree, SettleOrder};

use num_traits::Float;


/// Build the shortest-path tree rooted at `source` from final distances
///
/// Every vertex with a finite distance (other than the source) is mapped to
/// the first incoming edge `(u, v)` with `distance[v] == distance[u] + weight`
/// where `u` was settled before `v`. Parents always rank lower than their
/// children, so zero-weight edges between equally distant vertices cannot
/// close a cycle. Running this after Dijkstra's main loop means only final
/// distances are consulted, never a parent that a later relaxation would replace.
pub fn shortest_path_tree<V, W>(
    graph: &Graph<V, W>,
    source: VertexId,
    distances: &DistanceMap<W>,
    order: &SettleOrder,
) -> Result<PathTree, PathPlannerError>
where
    W: Float,
{
    let mut tree = PathTree::new();

    for (&vertex, &distance) in distances.iter() {
        if vertex == source || !distance.is_finite() {
            continue;
        }
        let Ok(&rank) = order.get(&vertex) else {
            continue;
        };

        for edge_id in graph.incident_edges(vertex, Direction::Incoming)? {
            let edge = graph.edge(edge_id)?;
            let parent = edge.opposite(vertex)?;
            let (Ok(&parent_distance), Ok(&parent_rank)) = (distances.get(&parent), order.get(&parent)) else {
                continue;
            };

            if parent_rank < rank && distance == parent_distance + *edge.element() {
                tree.insert(vertex, edge_id);
                break;
            }
        }
    }

    Ok(tree)
}


/// Construct the shortest path by walking the tree from the goal back to the source
/// Returns the ordered path as a vector of vertices from source to goal
/// tree: PathTree - parent edge of every reachable vertex
/// goal: VertexId - vertex to walk back from, it has no tree entry when unreachable
pub fn path_to_source<V, W>(graph: &Graph<V, W>, tree: &PathTree, source: VertexId, goal: VertexId) -> Result<Vec<VertexId>, PathPlannerError> {

    let mut path = vec![goal];
    let mut current = goal;

    // Trace back from goal to source
    while current != source {
        // a real path visits each tree entry at most once
        if path.len() > tree.len() {
            return Err(PathPlannerError::NoPathFound);
        }

        let edge_id = tree.get(&current).map_err(|_| PathPlannerError::NoPathFound)?;
        current = graph.edge(*edge_id)?.opposite(current)?;
        path.push(current);
    }

    // The path is in reverse order, so reverse it
    path.reverse();

    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_algos::settle;

    /// 0 - 1 - 2
    /// |       |
    /// 3 - 4 - 5     every edge weighs 1
    fn ring() -> (Graph<usize, f64>, Vec<VertexId>) {
        let mut graph = Graph::undirected();
        let ids: Vec<VertexId> = (0..6).map(|n| graph.add_vertex(n)).collect();
        for (u, v) in [(0, 1), (1, 2), (2, 5), (0, 3), (3, 4), (4, 5)] {
            graph.add_edge(ids[u], ids[v], 1.0).unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn test_tree_has_every_reachable_vertex_but_source() {
        let (graph, ids) = ring();
        let (distances, order) = settle(&graph, ids[0]).unwrap();
        let tree = shortest_path_tree(&graph, ids[0], &distances, &order).unwrap();

        assert_eq!(tree.len(), 5);
        assert!(!tree.contains_key(&ids[0]));

        // every tree edge is tight
        for (&vertex, &edge_id) in tree.iter() {
            let edge = graph.edge(edge_id).unwrap();
            let parent = edge.opposite(vertex).unwrap();
            assert_eq!(distances.get(&vertex).unwrap() - distances.get(&parent).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_tree_skips_unreachable() {
        let mut graph: Graph<char, f64> = Graph::undirected();
        let a = graph.add_vertex('a');
        let b = graph.add_vertex('b');
        let c = graph.add_vertex('c');
        let d = graph.add_vertex('d');
        graph.add_edge(a, b, 1.0).unwrap();
        graph.add_edge(c, d, 1.0).unwrap();

        let (distances, order) = settle(&graph, a).unwrap();
        let tree = shortest_path_tree(&graph, a, &distances, &order).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains_key(&c));
        assert!(!tree.contains_key(&d));
    }

    #[test]
    fn test_path_reconstruction() {
        let (graph, ids) = ring();
        let (distances, order) = settle(&graph, ids[0]).unwrap();
        let tree = shortest_path_tree(&graph, ids[0], &distances, &order).unwrap();

        // Test path from 0 to 2: 0 -> 1 -> 2
        let path = path_to_source(&graph, &tree, ids[0], ids[2]).unwrap();
        assert_eq!(path, vec![ids[0], ids[1], ids[2]]);

        // 5 is reached through either side of the ring
        let path = path_to_source(&graph, &tree, ids[0], ids[5]).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), Some(&ids[0]));
        assert_eq!(path.last(), Some(&ids[5]));
        for pair in path.windows(2) {
            assert!(graph.get_edge(pair[0], pair[1]).is_some());
        }
    }

    #[test]
    fn test_zero_weight_edges_keep_tree_acyclic() {
        // a chain of free edges all sits at distance 1
        let mut graph: Graph<usize, f64> = Graph::undirected();
        let ids: Vec<VertexId> = (0..5).map(|n| graph.add_vertex(n)).collect();
        graph.add_edge(ids[0], ids[1], 1.0).unwrap();
        graph.add_edge(ids[0], ids[4], 1.0).unwrap();
        for (u, v) in [(1, 2), (2, 3), (3, 4)] {
            graph.add_edge(ids[u], ids[v], 0.0).unwrap();
        }

        let (distances, order) = settle(&graph, ids[0]).unwrap();
        let tree = shortest_path_tree(&graph, ids[0], &distances, &order).unwrap();
        assert_eq!(tree.len(), 4);

        for &goal in &ids[1..] {
            let path = path_to_source(&graph, &tree, ids[0], goal).unwrap();
            assert_eq!(path.first(), Some(&ids[0]));
            assert_eq!(path.last(), Some(&goal));
            assert_eq!(distances.get(&goal), Ok(&1.0));
        }
    }

    #[test]
    fn test_settle_order_starts_at_source() {
        let (graph, ids) = ring();
        let (_, order) = settle(&graph, ids[0]).unwrap();
        assert_eq!(order.len(), 6);
        assert_eq!(order.get(&ids[0]), Ok(&0));
        // 5 is the only vertex two hops beyond the neighbours of the source
        assert_eq!(order.get(&ids[5]), Ok(&5));
    }

    #[test]
    fn test_path_to_source_itself() {
        let (graph, ids) = ring();
        let path = path_to_source(&graph, &PathTree::new(), ids[0], ids[0]).unwrap();
        assert_eq!(path, vec![ids[0]]);
    }

    #[test]
    fn test_missing_tree_entry() {
        let (graph, ids) = ring();
        let result = path_to_source(&graph, &PathTree::new(), ids[0], ids[4]);
        assert!(matches!(result, Err(PathPlannerError::NoPathFound)));
    }

    #[test]
    fn test_cyclic_tree_terminates() {
        let (graph, ids) = ring();
        // 1 and 2 point at each other, neither reaches the source
        let mut tree = PathTree::new();
        let edge = graph.get_edge(ids[1], ids[2]).unwrap();
        tree.insert(ids[1], edge);
        tree.insert(ids[2], edge);

        let result = path_to_source(&graph, &tree, ids[0], ids[2]);
        assert!(matches!(result, Err(PathPlannerError::NoPathFound)));
    }
}
