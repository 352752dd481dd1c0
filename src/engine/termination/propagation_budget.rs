use super::TerminationCondition;

/// A [`TerminationCondition`] which triggers after a number of propagated
/// literals.
#[derive(Debug, Copy, Clone)]
pub struct PropagationBudget {
    budget: u64,
    num_propagations: u64,
}

impl PropagationBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_propagations: 0,
        }
    }
}

impl TerminationCondition for PropagationBudget {
    fn should_stop(&mut self) -> bool {
        self.num_propagations >= self.budget
    }

    fn literal_has_been_propagated(&mut self) {
        self.num_propagations += 1;
    }
}
