use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{EdgeId, VertexId};


/// Failures raised by the hash map and the priority queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("key not found")]
    KeyNotFound, // get/remove on an absent key
    #[error("priority queue is empty")]
    EmptyQueue,
    #[error("locator does not refer to a live entry of this queue")]
    InvalidLocator, // foreign queue, or entry already removed
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("vertex {0:?} does not belong to this graph")]
    InvalidVertex(VertexId),
    #[error("edge {0:?} does not belong to this graph")]
    InvalidEdge(EdgeId),
    #[error("vertex {vertex:?} is not an endpoint of edge {edge:?}")]
    NotAnEndpoint { edge: EdgeId, vertex: VertexId },
    #[error("an edge from {0:?} to {1:?} already exists")]
    EdgeExists(VertexId, VertexId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("map contains no cells")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    IrregularRow { row: usize, expected: usize, found: usize },
    #[error("invalid character {found:?} at row {row}, column {col}")]
    InvalidCharacter { found: char, row: usize, col: usize },
    #[error("map has no robot ('R') cell")]
    MissingRobot,
    #[error("map has no goal ('G') cell")]
    MissingGoal,
    #[error("map has more than one robot ('R') cell")]
    DuplicateRobot,
    #[error("map has more than one goal ('G') cell")]
    DuplicateGoal,
}

#[derive(Debug, Error)]
pub enum PathPlannerError {
    #[error("no path found to the goal")]
    NoPathFound, // Unable to walk the shortest-path tree back to the start
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error("i/o failure on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
