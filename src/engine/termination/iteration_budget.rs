use super::TerminationCondition;

/// A [`TerminationCondition`] which triggers after a number of iterations of
/// the outer search loop.
#[derive(Debug, Copy, Clone)]
pub struct IterationBudget {
    budget: u64,
    num_iterations: u64,
}

impl IterationBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_iterations: 0,
        }
    }

    pub fn num_iterations(&self) -> u64 {
        self.num_iterations
    }
}

impl TerminationCondition for IterationBudget {
    fn should_stop(&mut self) -> bool {
        self.num_iterations >= self.budget
    }

    fn iteration_has_completed(&mut self) {
        self.num_iterations += 1;
    }
}
