pub mod options;
pub(crate) mod sat;
pub mod solver;
pub mod termination;

pub use solver::SatisfactionSolver;
pub use solver::SolverStatistics;
