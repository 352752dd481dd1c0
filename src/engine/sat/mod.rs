mod assignments;
mod clause;
mod clause_allocator;
mod learned_clause_manager;
mod learned_clause_minimiser;
mod restart_strategy;
mod value_selector;
mod variable_selection;

pub(crate) use assignments::Assignments;
pub(crate) use clause_allocator::ClauseAllocator;
pub(crate) use learned_clause_manager::LearnedClauseManager;
pub(crate) use learned_clause_minimiser::LearnedClauseMinimiser;
pub(crate) use restart_strategy::RestartStrategy;
pub(crate) use value_selector::ValueSelector;
pub(crate) use variable_selection::VariableSelector;
