use thiserror::Error;

/// Errors surfaced through the public solver API. Conflicts encountered
/// during search above the root level are never errors; they are resolved by
/// learning and backtracking.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    /// An empty clause was derived at the root level; the formula is
    /// permanently unsatisfiable and every later solve call reports
    /// unsatisfiable without searching.
    #[error("adding the clause results in a root-level contradiction")]
    StructuralContradiction,
    /// The clause arena ran out of ids.
    #[error("the clause allocator is exhausted")]
    AllocatorExhaustion,
}
