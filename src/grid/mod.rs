use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::collections::ChainedHashMap;
use crate::errors::{GridError, PathPlannerError};
use crate::graph::{Graph, VertexId};
use crate::graph_algos::ShortestPaths;

pub const OBSTACLE: char = '#';
pub const OPEN: char = '.';
pub const ROBOT: char = 'R';
pub const GOAL: char = 'G';
/// Marks the robot's route in a rendered map
pub const PATH: char = 'O';

/// Weight of an edge between two traversable cells
const STEP_COST: f64 = 1.0;

/// (row, column)
pub type Coord = (usize, usize);


/// Rectangular map of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<char>>,
}

impl Grid {

    /// Parse a map, one row per line
    ///
    /// Rows must all have the same width and use only `#`, `.`, `R` and `G`.
    /// Trailing empty lines are ignored.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut rows: Vec<&str> = text.lines().collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        Self::from_rows(rows)
    }

    pub fn from_rows<I, S>(rows: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cells: Vec<Vec<char>> = rows.into_iter().map(|row| row.as_ref().chars().collect()).collect();
        let expected = cells.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(GridError::Empty);
        }

        for (row, line) in cells.iter().enumerate() {
            if line.len() != expected {
                return Err(GridError::IrregularRow { row, expected, found: line.len() });
            }
            if let Some((col, &found)) = line
                .iter()
                .enumerate()
                .find(|(_, c)| !matches!(**c, OBSTACLE | OPEN | ROBOT | GOAL))
            {
                return Err(GridError::InvalidCharacter { found, row, col });
            }
        }

        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn get(&self, (row, col): Coord) -> Option<char> {
        self.cells.get(row).and_then(|line| line.get(col)).copied()
    }

    /// Every coordinate holding `cell`, row by row
    pub fn find(&self, cell: char) -> Vec<Coord> {
        self.coords().filter(|&coord| self.get(coord) == Some(cell)).collect()
    }

    /// All coordinates, row by row
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows()).flat_map(move |row| (0..self.cols()).map(move |col| (row, col)))
    }

    /// Copy of the map with `marker` written over each coordinate
    /// Robot and goal cells keep their own characters
    pub fn with_marks(&self, coords: &[Coord], marker: char) -> Self {
        let mut marked = self.clone();
        for &(row, col) in coords {
            if let Some(cell) = marked.cells.get_mut(row).and_then(|line| line.get_mut(col)) {
                if *cell != ROBOT && *cell != GOAL {
                    *cell = marker;
                }
            }
        }
        marked
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

/// Rows joined by `\n`, without a trailing newline
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.cells.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            for cell in row {
                write!(f, "{cell}")?;
            }
        }
        Ok(())
    }
}


/// Undirected graph view of a [`Grid`]
///
/// Every cell becomes a vertex holding its character. Each pair of 4-adjacent
/// cells gets one edge, weighing 1 when both cells are passable and infinity
/// when either is an obstacle. The map does not wrap around its borders.
#[derive(Debug)]
pub struct GridGraph {
    graph: Graph<char, f64>,
    start: VertexId,
    goal: VertexId,
    coords: ChainedHashMap<VertexId, Coord>,
}

impl GridGraph {

    /// Exactly one robot and one goal cell are required
    pub fn from_grid(grid: &Grid) -> Result<Self, PathPlannerError> {
        let start = single_cell(grid, ROBOT, GridError::MissingRobot, GridError::DuplicateRobot)?;
        let goal = single_cell(grid, GOAL, GridError::MissingGoal, GridError::DuplicateGoal)?;

        let mut graph = Graph::undirected();
        let mut coords = ChainedHashMap::new();
        let mut vertices: Vec<Vec<VertexId>> = Vec::with_capacity(grid.rows());

        for (row, line) in grid.cells.iter().enumerate() {
            let mut vertex_row = Vec::with_capacity(line.len());
            for (col, &cell) in line.iter().enumerate() {
                let vertex = graph.add_vertex(cell);
                coords.insert(vertex, (row, col));
                vertex_row.push(vertex);
            }
            vertices.push(vertex_row);
        }

        // link each cell to the cell on its right and the cell below it,
        // which covers every 4-adjacent pair exactly once
        for (row, line) in grid.cells.iter().enumerate() {
            for (col, &cell) in line.iter().enumerate() {
                let u = vertices[row][col];
                let neighbors = [(row, col + 1), (row + 1, col)];
                for (n_row, n_col) in neighbors {
                    let Some(other) = grid.get((n_row, n_col)) else {
                        continue;
                    };
                    let v = vertices[n_row][n_col];
                    if graph.get_edge(u, v).is_some() {
                        continue;
                    }
                    let weight = if cell == OBSTACLE || other == OBSTACLE {
                        f64::INFINITY
                    } else {
                        STEP_COST
                    };
                    graph.add_edge(u, v, weight)?;
                }
            }
        }

        let start = vertices[start.0][start.1];
        let goal = vertices[goal.0][goal.1];
        debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "built grid graph"
        );

        Ok(Self { graph, start, goal, coords })
    }

    pub fn graph(&self) -> &Graph<char, f64> {
        &self.graph
    }

    /// Vertex of the robot's cell
    pub fn start(&self) -> VertexId {
        self.start
    }

    pub fn goal(&self) -> VertexId {
        self.goal
    }

    pub fn coord(&self, vertex: VertexId) -> Option<Coord> {
        self.coords.get(&vertex).ok().copied()
    }

    pub fn vertex_at(&self, coord: Coord) -> Option<VertexId> {
        self.coords
            .iter()
            .find(|(_, c)| **c == coord)
            .map(|(vertex, _)| *vertex)
    }

    /// Shortest distances and tree from the robot's cell
    pub fn solve(&self) -> Result<ShortestPaths<f64>, PathPlannerError> {
        ShortestPaths::compute(&self.graph, self.start)
    }

    /// Cells strictly between the robot and the goal, walking back from the goal
    pub fn path_coords(&self, paths: &ShortestPaths<f64>) -> Result<Vec<Coord>, PathPlannerError> {
        let path = paths.path_to(&self.graph, self.goal)?;
        let mut coords = Vec::with_capacity(path.len().saturating_sub(2));

        for &vertex in path.iter().rev() {
            if vertex == self.start || vertex == self.goal {
                continue;
            }
            let coord = self.coord(vertex).ok_or(PathPlannerError::NoPathFound)?;
            coords.push(coord);
        }

        Ok(coords)
    }

    /// Copy of `grid` with the robot's shortest route drawn with `marker`
    ///
    /// When the goal is unreachable the copy is returned unmarked. `grid`
    /// is never modified, so rendering twice gives identical maps.
    pub fn render(&self, grid: &Grid, paths: &ShortestPaths<f64>, marker: char) -> Result<Grid, PathPlannerError> {
        if !paths.is_reachable(self.goal) {
            return Ok(grid.clone());
        }
        let coords = self.path_coords(paths)?;
        Ok(grid.with_marks(&coords, marker))
    }
}

fn single_cell(grid: &Grid, cell: char, missing: GridError, duplicate: GridError) -> Result<Coord, GridError> {
    match grid.find(cell).as_slice() {
        [] => Err(missing),
        [coord] => Ok(*coord),
        _ => Err(duplicate),
    }
}
