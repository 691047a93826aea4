pub mod collections;
pub mod errors;
pub mod graph;
pub mod graph_algos;
pub mod grid;
pub mod robot;

pub use errors::PathPlannerError;
pub use grid::{Grid, GridGraph};
pub use robot::{PathOutcome, Solution, SolverConfig, robot_solution, robot_solution_with, solve_grid};
