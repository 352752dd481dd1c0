mod clause_reference;
mod hash_structures;
mod key_value_heap;
mod keyed_vec;
mod literal;
pub(crate) mod random;
pub(crate) mod sequence_generators;
mod solve_result;
mod solver_error;
mod trail;
mod variable;

pub(crate) use clause_reference::ClauseReference;
pub(crate) use hash_structures::HashMap;
pub(crate) use hash_structures::HashSet;
pub(crate) use key_value_heap::KeyValueHeap;
pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;
pub use literal::Literal;
pub use random::Random;
pub use sequence_generators::SequenceGeneratorType;
pub use solve_result::Solution;
pub use solve_result::SolveResult;
pub use solver_error::SolverError;
pub(crate) use trail::Trail;
pub use variable::PropositionalVariable;
pub(crate) use variable::PropositionalVariableGeneratorIterator;
