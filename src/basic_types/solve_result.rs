use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;

/// The outcome of a call to solve.
#[derive(Debug, Clone)]
pub enum SolveResult {
    /// A total assignment satisfying every clause was found.
    Satisfiable(Solution),
    /// The clause set is unsatisfiable regardless of assumptions.
    Unsatisfiable,
    /// The clause set is unsatisfiable under the given assumptions; the
    /// payload is a subset of the assumptions responsible for the conflict.
    UnsatisfiableUnderAssumptions(Vec<Literal>),
    /// A resource budget was exhausted before a verdict was reached.
    Unknown,
}

impl SolveResult {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SolveResult::Satisfiable(_))
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(
            self,
            SolveResult::Unsatisfiable | SolveResult::UnsatisfiableUnderAssumptions(_)
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SolveResult::Unknown)
    }
}

/// A total truth assignment captured when the search concluded satisfiable.
#[derive(Debug, Clone)]
pub struct Solution {
    truth_values: KeyedVec<PropositionalVariable, bool>,
}

impl Solution {
    pub(crate) fn new(truth_values: KeyedVec<PropositionalVariable, bool>) -> Solution {
        Solution { truth_values }
    }

    pub fn num_propositional_variables(&self) -> usize {
        self.truth_values.len()
    }

    pub fn get_literal_value(&self, literal: Literal) -> bool {
        self.truth_values[literal.get_propositional_variable()] == literal.is_positive()
    }

    /// The solution as literals, one per variable.
    pub fn get_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.truth_values
            .iter()
            .enumerate()
            .map(|(index, truth_value)| {
                Literal::new(PropositionalVariable::new(index as u32), *truth_value)
            })
    }
}
