use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::PathPlannerError;
use crate::grid::{Grid, GridGraph, PATH};


/// Settings for [`robot_solution_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Character drawn on every cell of the robot's route
    pub path_marker: char,
    /// Appended to the input file stem to name the output file
    pub solution_suffix: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            path_marker: PATH,
            solution_suffix: "_SOLUTION".to_string(),
        }
    }
}

/// How the search ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOutcome {
    /// Number of steps on the shortest route from robot to goal
    Reachable { length: f64 },
    /// Obstacles separate the robot from the goal
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// File the annotated map was written to
    pub output: PathBuf,
    pub outcome: PathOutcome,
}


/// Solve a map held in memory
/// Returns the annotated map, which is the input unchanged when the goal is unreachable
pub fn solve_grid(grid: &Grid, config: &SolverConfig) -> Result<(Grid, PathOutcome), PathPlannerError> {
    let grid_graph = GridGraph::from_grid(grid)?;
    let paths = grid_graph.solve()?;

    let distance = paths.distance(grid_graph.goal());
    if !distance.is_finite() {
        warn!("goal is unreachable from start");
        return Ok((grid.clone(), PathOutcome::Unreachable));
    }

    info!(length = distance, "found shortest path to the goal");
    let rendered = grid_graph.render(grid, &paths, config.path_marker)?;
    Ok((rendered, PathOutcome::Reachable { length: distance }))
}

/// Read the map at `path`, solve it and write the result next to it
///
/// The path length, or the fact that the goal is unreachable, is reported
/// through `tracing` events and is only printed once the caller installs a
/// subscriber. The returned [`Solution::outcome`] carries the same information.
pub fn robot_solution(path: impl AsRef<Path>) -> Result<Solution, PathPlannerError> {
    robot_solution_with(path, &SolverConfig::default())
}

pub fn robot_solution_with(path: impl AsRef<Path>, config: &SolverConfig) -> Result<Solution, PathPlannerError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| PathPlannerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let grid = Grid::parse(&text)?;
    let (rendered, outcome) = solve_grid(&grid, config)?;

    let output = solution_path(path, &config.solution_suffix);
    fs::write(&output, rendered.to_string()).map_err(|source| PathPlannerError::Io {
        path: output.clone(),
        source,
    })?;

    info!(output = %output.display(), "solution written");
    Ok(Solution { output, outcome })
}

/// `maps/level.txt` -> `maps/level_SOLUTION.txt`
fn solution_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.txt"))
}
